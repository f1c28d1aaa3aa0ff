pub mod coordinator;
pub mod credential;
pub mod error;
pub mod helpers;
pub mod state;
pub mod target;
#[cfg(test)]
pub(crate) mod testing;
pub mod transport;

pub use coordinator::{CSV_CONTENT_TYPE, UploadCoordinator, UploadReceipt};
pub use credential::{AuthScheme, Credential};
pub use error::{Stage, TransportError, UploadError};
pub use helpers::{format_size, is_csv};
pub use state::{PendingFile, UploadState};
pub use target::{SignedTarget, signed_target_request_url};
pub use transport::{HttpTransport, Reply, Transport};
