pub mod config;
pub mod upload;

pub use config::Config;
pub use upload::{
    Credential, HttpTransport, PendingFile, UploadCoordinator, UploadError, UploadReceipt,
    UploadState,
};
