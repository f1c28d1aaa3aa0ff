use reqwest::StatusCode;
use std::fmt;
use thiserror::Error;

/// Which network call of the handshake an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Requesting the signed URL from the backend
    SignedTarget,
    /// PUT of the file bytes to object storage
    Transfer,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SignedTarget => f.write_str("signed URL request"),
            Self::Transfer => f.write_str("file transfer"),
        }
    }
}

/// A request that never produced a response (DNS, TLS, connection reset...)
#[derive(Error, Debug)]
#[error("{message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        // reqwest's Display hides the cause chain; keep it for the user.
        let mut message = error.to_string();
        let mut source = std::error::Error::source(&error);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = std::error::Error::source(cause);
        }
        Self { message }
    }
}

/// Errors that can occur during the signed-URL upload handshake
#[derive(Error, Debug)]
pub enum UploadError {
    /// Upload triggered with nothing selected
    #[error("No file selected")]
    NoFileSelected,

    /// Backend answered 401
    #[error("Credentials rejected by the signed URL endpoint (401)")]
    CredentialRejected,

    /// Backend answered 403
    #[error("Access denied by the signed URL endpoint (403)")]
    AccessDenied,

    /// Backend answered with any other non-success status
    #[error("Signed URL endpoint failed with status {status}")]
    BackendFailed { status: StatusCode },

    /// Backend answered 2xx but the payload carries no usable `signedUrl`
    #[error("Malformed signed URL response: {reason}")]
    MalformedBackendResponse { reason: String },

    /// Object storage rejected the PUT
    #[error("Failed to upload file: {status}")]
    TransferFailed { status: StatusCode },

    /// No response at all
    #[error("Network error during {stage}: {source}")]
    Transport {
        stage: Stage,
        #[source]
        source: TransportError,
    },

    /// The pending file could not be read
    #[error("Failed to read {name}: {source}")]
    ReadFailed {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

impl UploadError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedBackendResponse {
            reason: reason.into(),
        }
    }

    /// Map a non-success status of the signed URL request to its error
    pub fn from_backend_status(status: StatusCode) -> Self {
        if status == StatusCode::UNAUTHORIZED {
            Self::CredentialRejected
        } else if status == StatusCode::FORBIDDEN {
            Self::AccessDenied
        } else {
            Self::BackendFailed { status }
        }
    }

    /// Whether trying again with the same file (and possibly new credentials)
    /// can succeed. Access denial needs a permission change first.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::NoFileSelected | Self::AccessDenied)
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            Self::NoFileSelected => "No file selected! Choose a CSV file first.".to_string(),
            Self::CredentialRejected => "Unauthorized: Please provide valid credentials.\n\n\
                 Possible solutions:\n  \
                 1. Check CSV_IMPORT_TOKEN (or --token) is set and current\n  \
                 2. Check CSV_IMPORT_AUTH_SCHEME matches what the endpoint expects"
                .to_string(),
            Self::AccessDenied => {
                "Access denied! You do not have permission to access this resource.\n\n\
                 Ask an administrator to grant your account import permissions."
                    .to_string()
            }
            Self::BackendFailed { status } => {
                format!(
                    "Server error occurred while requesting an upload URL ({}).\n\n\
                     Possible solutions:\n  \
                     1. Verify CSV_IMPORT_URL points at the signed URL endpoint\n  \
                     2. Try again later",
                    status
                )
            }
            Self::MalformedBackendResponse { reason } => {
                format!(
                    "Failed to get signed URL from server: {}\n\n\
                     The file was not uploaded. Verify CSV_IMPORT_URL points at the signed URL endpoint.",
                    reason
                )
            }
            Self::TransferFailed { status } => {
                format!(
                    "Failed to upload file: {}\n\n\
                     The file is still selected, you can retry without choosing it again.",
                    status
                )
            }
            Self::Transport { stage, source } => {
                format!(
                    "Network or server error occurred during {}: {}\n\n\
                     Possible solutions:\n  \
                     1. Check your internet connection\n  \
                     2. Check if you're behind a proxy/firewall",
                    stage, source
                )
            }
            Self::ReadFailed { name, .. } => {
                format!(
                    "{}\n\nPossible solutions:\n  \
                     1. Verify the file exists: ls -la {}\n  \
                     2. Ensure you have read access to the file",
                    self, name
                )
            }
        }
    }
}

/// Result type for upload operations
pub type Result<T> = std::result::Result<T, UploadError>;
