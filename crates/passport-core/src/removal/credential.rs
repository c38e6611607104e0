//! API credential retrieval and process-lifetime caching.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::OnceCell;

use super::RemovalError;

/// A credential source failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to load API key: {0}")]
pub struct CredentialError(pub String);

/// Read-only accessor for the background-removal API key.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn api_key(&self) -> Result<String, CredentialError>;
}

/// A key known up front.
#[derive(Debug, Clone)]
pub struct StaticCredential(String);

impl StaticCredential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

#[async_trait]
impl CredentialProvider for StaticCredential {
    async fn api_key(&self) -> Result<String, CredentialError> {
        Ok(self.0.clone())
    }
}

/// Caches the first non-empty key for the life of the process.
///
/// Failures and empty keys are not cached: the next call asks the
/// provider again.
pub struct CachedCredential {
    provider: Arc<dyn CredentialProvider>,
    key: OnceCell<String>,
    loading: AtomicBool,
    last_error: Mutex<Option<String>>,
}

impl std::fmt::Debug for CachedCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedCredential")
            .field("loaded", &self.key.initialized())
            .field("loading", &self.is_loading())
            .finish()
    }
}

impl CachedCredential {
    pub fn new(provider: Arc<dyn CredentialProvider>) -> Self {
        Self {
            provider,
            key: OnceCell::new(),
            loading: AtomicBool::new(false),
            last_error: Mutex::new(None),
        }
    }

    /// The cached key, fetching it on first use.
    ///
    /// # Errors
    ///
    /// `RemovalError::CredentialUnavailable` if the provider fails or
    /// returns a blank key.
    pub async fn get(&self) -> Result<&str, RemovalError> {
        let key = self
            .key
            .get_or_try_init(|| async {
                self.loading.store(true, Ordering::SeqCst);
                let result = self.provider.api_key().await;
                self.loading.store(false, Ordering::SeqCst);

                match result {
                    Ok(key) if !key.trim().is_empty() => {
                        self.set_error(None);
                        tracing::debug!("api key loaded");
                        Ok(key)
                    }
                    Ok(_) => {
                        tracing::warn!("credential provider returned an empty api key");
                        self.set_error(Some("API key is empty".to_string()));
                        Err(RemovalError::CredentialUnavailable)
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "credential provider failed");
                        self.set_error(Some(e.to_string()));
                        Err(RemovalError::CredentialUnavailable)
                    }
                }
            })
            .await?;
        Ok(key.as_str())
    }

    pub fn is_loaded(&self) -> bool {
        self.key.initialized()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Message from the most recent failed load, if the key is not loaded.
    pub fn error(&self) -> Option<String> {
        self.last_error.lock().ok().and_then(|e| e.clone())
    }

    fn set_error(&self, error: Option<String>) {
        if let Ok(mut slot) = self.last_error.lock() {
            *slot = error;
        }
    }
}
