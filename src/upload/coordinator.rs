use reqwest::Url;
use tracing::{info, warn};

use super::credential::Credential;
use super::error::{Result, Stage, UploadError};
use super::state::UploadState;
use super::target::{SignedTarget, signed_target_request_url};
use super::transport::Transport;

/// Content type declared on every transfer. Callers only run this flow for CSV.
pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// Outcome of a completed upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub name: String,
    pub bytes: u64,
    /// Object location without the signature
    pub location: String,
}

/// Runs the signed URL handshake: ask the backend for a signed URL, then PUT
/// the file straight to storage.
pub struct UploadCoordinator<T> {
    transport: T,
    endpoint: Url,
}

impl<T: Transport> UploadCoordinator<T> {
    pub fn new(transport: T, endpoint: Url) -> Self {
        Self {
            transport,
            endpoint,
        }
    }

    /// Upload the held file
    ///
    /// On success the state becomes `Empty`. Any error leaves the state
    /// untouched, so a failed upload can be retried without reselecting.
    pub async fn upload(
        &self,
        state: &mut UploadState,
        credential: Option<&Credential>,
    ) -> Result<UploadReceipt> {
        let file = state.pending().ok_or(UploadError::NoFileSelected)?;
        let name = file.name().to_string();
        let body = file.read().await?;
        let bytes = body.len() as u64;

        let target = self.request_signed_target(&name, credential).await?;
        info!("Uploading {} ({} bytes) to {}", name, bytes, target.location());

        self.transfer(&target, body).await?;

        state.clear();
        info!("Uploaded {}", name);

        Ok(UploadReceipt {
            name,
            bytes,
            location: target.location(),
        })
    }

    async fn request_signed_target(
        &self,
        name: &str,
        credential: Option<&Credential>,
    ) -> Result<SignedTarget> {
        let url = signed_target_request_url(&self.endpoint, name);
        info!("Requesting signed URL for {}", name);
        if credential.is_none() {
            warn!("No credential configured, requesting signed URL anonymously");
        }

        let authorization = credential.map(Credential::header_value);
        let reply = self
            .transport
            .get(&url, authorization.as_deref())
            .await
            .map_err(|source| UploadError::Transport {
                stage: Stage::SignedTarget,
                source,
            })?;

        if !reply.status.is_success() {
            warn!("Signed URL request for {} failed: {}", name, reply.status);
            return Err(UploadError::from_backend_status(reply.status));
        }

        let body = reply
            .body
            .ok_or_else(|| UploadError::malformed("response body could not be read"))?;

        SignedTarget::from_response(&body).inspect_err(|e| {
            warn!("Rejected signed URL response for {}: {}", name, e);
        })
    }

    async fn transfer(&self, target: &SignedTarget, body: Vec<u8>) -> Result<()> {
        let reply = self
            .transport
            .put(target.url(), body, CSV_CONTENT_TYPE)
            .await
            .map_err(|source| UploadError::Transport {
                stage: Stage::Transfer,
                source,
            })?;

        if !reply.status.is_success() {
            warn!("Transfer to {} failed: {}", target.location(), reply.status);
            return Err(UploadError::TransferFailed {
                status: reply.status,
            });
        }

        Ok(())
    }
}
