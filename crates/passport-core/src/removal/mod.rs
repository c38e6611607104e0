//! Background removal through a remote foreground-extraction service.
//!
//! The flow is: load the API key (cached for the process lifetime), encode
//! the crop as PNG, submit it, decode the RGBA result. [`BackgroundRemover`]
//! tracks the outcome as a [`ProcessingState`].

mod adapter;
#[cfg(feature = "remove-bg")]
mod client;
mod credential;
mod error;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use adapter::{BackgroundRemover, ProcessingState, RemovalStatus};
#[cfg(feature = "remove-bg")]
pub use client::{classify_failure, RemoveBgClient};
pub use credential::{CachedCredential, CredentialError, CredentialProvider, StaticCredential};
pub use error::RemovalError;

/// Default remove.bg endpoint.
pub const DEFAULT_REMOVAL_ENDPOINT: &str = "https://api.remove.bg/v1.0/removebg";

/// The external capability: encoded image in, foreground-isolated image out.
#[async_trait]
pub trait ForegroundExtractor: Send + Sync {
    /// Submit `image_png` and return the encoded result.
    async fn extract_foreground(
        &self,
        api_key: &str,
        image_png: Vec<u8>,
    ) -> Result<Vec<u8>, RemovalError>;
}

/// Where and how to reach the removal service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemovalConfig {
    pub endpoint: String,
    /// Header carrying the API key.
    pub api_key_header: String,
    pub timeout_secs: u64,
}

impl Default for RemovalConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_REMOVAL_ENDPOINT.to_string(),
            api_key_header: "X-Api-Key".to_string(),
            timeout_secs: 30,
        }
    }
}
