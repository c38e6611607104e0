use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures of the background-removal flow.
///
/// Every variant leaves the workflow able to skip removal and continue
/// with the unprocessed crop.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RemovalError {
    /// No credential could be obtained, or it was empty.
    #[error("API key is not available. Please try again later.")]
    CredentialUnavailable,

    /// The service rejected the credential.
    #[error("Invalid API key. Please contact support.")]
    InvalidCredential,

    /// The service is throttling requests.
    #[error("API rate limit exceeded. Please try again later or contact support.")]
    RateLimited,

    /// The request never produced a response.
    #[error("Unable to connect to the background removal service. Please check your internet connection and try again.")]
    NetworkUnavailable,

    /// Any other failure, with detail from the service when available.
    #[error("Background removal failed: {0}")]
    RemoteProcessingFailed(String),
}

impl RemovalError {
    /// Whether asking the user to retry can succeed without outside help.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, RemovalError::InvalidCredential)
    }
}
