use std::path::{Path, PathBuf};

use super::error::{Result, UploadError};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Content {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// A file selected for upload but not yet transferred
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
    name: String,
    content: Content,
}

impl PendingFile {
    /// Select a file on disk. The name is the final path component; the
    /// content is read when the upload runs.
    ///
    /// Returns `None` when there is no file name or it is not valid UTF-8,
    /// since the name becomes the storage key.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let name = path.file_name()?.to_str()?.to_string();
        Some(Self {
            name,
            content: Content::Path(path),
        })
    }

    /// Select an in-memory file
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: Content::Bytes(bytes.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.content {
            Content::Path(path) => Some(path),
            Content::Bytes(_) => None,
        }
    }

    /// Read the whole content
    pub async fn read(&self) -> Result<Vec<u8>> {
        match &self.content {
            Content::Path(path) => {
                tokio::fs::read(path)
                    .await
                    .map_err(|source| UploadError::ReadFailed {
                        name: self.name.clone(),
                        source,
                    })
            }
            Content::Bytes(bytes) => Ok(bytes.clone()),
        }
    }
}

/// The single upload slot: either nothing is selected or exactly one file is
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UploadState {
    #[default]
    Empty,
    Holding(PendingFile),
}

impl UploadState {
    /// Hold `file`, returning the file it replaced
    pub fn select(&mut self, file: PendingFile) -> Option<PendingFile> {
        match std::mem::replace(self, Self::Holding(file)) {
            Self::Holding(previous) => Some(previous),
            Self::Empty => None,
        }
    }

    /// Drop the held file, if any
    pub fn clear(&mut self) -> Option<PendingFile> {
        match std::mem::take(self) {
            Self::Holding(previous) => Some(previous),
            Self::Empty => None,
        }
    }

    pub fn pending(&self) -> Option<&PendingFile> {
        match self {
            Self::Holding(file) => Some(file),
            Self::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_select_replaces_previous() {
        let mut state = UploadState::default();
        assert!(state.is_empty());

        assert_eq!(state.select(PendingFile::from_bytes("a.csv", "a")), None);
        let replaced = state.select(PendingFile::from_bytes("b.csv", "b"));

        assert_eq!(replaced.map(|f| f.name().to_string()), Some("a.csv".into()));
        assert_eq!(state.pending().map(PendingFile::name), Some("b.csv"));
    }

    #[test]
    fn test_clear() {
        let mut state = UploadState::Holding(PendingFile::from_bytes("a.csv", "a"));
        assert!(state.clear().is_some());
        assert!(state.is_empty());

        // Clearing an empty slot is a no-op
        assert!(state.clear().is_none());
        assert!(state.is_empty());
    }

    #[test]
    fn test_from_path_uses_file_name() {
        let file = PendingFile::from_path("/tmp/imports/orders.csv").unwrap();
        assert_eq!(file.name(), "orders.csv");
        assert_eq!(file.path(), Some(Path::new("/tmp/imports/orders.csv")));

        assert!(PendingFile::from_path("/").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_from_path_rejects_non_utf8_name() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let path = Path::new("/tmp/imports").join(OsStr::from_bytes(b"orders-\xff.csv"));
        assert!(PendingFile::from_path(path).is_none());
    }

    #[tokio::test]
    async fn test_read_from_disk() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"sku,qty\nA1,3\n").unwrap();

        let file = PendingFile::from_path(tmp.path()).unwrap();
        assert_eq!(file.read().await.unwrap(), b"sku,qty\nA1,3\n");
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = PendingFile::from_path(dir.path().join("gone.csv")).unwrap();

        let err = file.read().await.unwrap_err();
        assert!(matches!(err, UploadError::ReadFailed { ref name, .. } if name == "gone.csv"));
    }
}
