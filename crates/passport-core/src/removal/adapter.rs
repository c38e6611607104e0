//! Background-removal state tracking around an external extractor.

use std::sync::Arc;

use super::{CachedCredential, CredentialProvider, ForegroundExtractor, RemovalError};
use crate::decode::{decode_image_no_orientation, DecodedImage};
use crate::encode::encode_png;

/// Outcome of the most recent removal request.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ProcessingState {
    #[default]
    Idle,
    Pending,
    Succeeded(Arc<DecodedImage>),
    Failed(RemovalError),
}

/// Snapshot of the adapter for display.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RemovalStatus {
    pub is_processing: bool,
    pub error: Option<RemovalError>,
    pub processed_image: Option<Arc<DecodedImage>>,
    pub is_loading_credential: bool,
    pub credential_error: Option<String>,
}

/// Submits images to a [`ForegroundExtractor`] and tracks the result.
pub struct BackgroundRemover {
    credential: CachedCredential,
    extractor: Arc<dyn ForegroundExtractor>,
    state: ProcessingState,
    last_input: Option<Arc<DecodedImage>>,
}

impl std::fmt::Debug for BackgroundRemover {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundRemover")
            .field("credential", &self.credential)
            .field("state", &self.state)
            .finish()
    }
}

impl BackgroundRemover {
    pub fn new(
        credentials: Arc<dyn CredentialProvider>,
        extractor: Arc<dyn ForegroundExtractor>,
    ) -> Self {
        Self {
            credential: CachedCredential::new(credentials),
            extractor,
            state: ProcessingState::Idle,
            last_input: None,
        }
    }

    pub fn state(&self) -> &ProcessingState {
        &self.state
    }

    pub fn status(&self) -> RemovalStatus {
        RemovalStatus {
            is_processing: self.state == ProcessingState::Pending,
            error: match &self.state {
                ProcessingState::Failed(e) => Some(e.clone()),
                _ => None,
            },
            processed_image: match &self.state {
                ProcessingState::Succeeded(img) => Some(Arc::clone(img)),
                _ => None,
            },
            is_loading_credential: self.credential.is_loading(),
            credential_error: self.credential.error(),
        }
    }

    /// Fetch the credential ahead of the first request.
    pub async fn preload_credential(&self) -> Result<(), RemovalError> {
        self.credential.get().await.map(|_| ())
    }

    /// Whether the credential is loaded and no request is in flight.
    pub fn can_remove(&self) -> bool {
        self.credential.is_loaded() && self.state != ProcessingState::Pending
    }

    /// Run a removal and record the outcome.
    pub async fn process(
        &mut self,
        image: Arc<DecodedImage>,
    ) -> Result<Arc<DecodedImage>, RemovalError> {
        self.state = ProcessingState::Pending;
        self.last_input = Some(Arc::clone(&image));

        match self.remove(&image).await {
            Ok(processed) => {
                let processed = Arc::new(processed);
                self.state = ProcessingState::Succeeded(Arc::clone(&processed));
                Ok(processed)
            }
            Err(e) => {
                self.state = ProcessingState::Failed(e.clone());
                Err(e)
            }
        }
    }

    /// Re-run the full flow, credential check included, on the last input.
    ///
    /// Returns `None` if nothing has been submitted yet.
    pub async fn retry(&mut self) -> Option<Result<Arc<DecodedImage>, RemovalError>> {
        let input = self.last_input.clone()?;
        tracing::debug!("retrying background removal");
        Some(self.process(input).await)
    }

    /// Forget the last input and outcome. The cached credential is kept.
    pub fn reset(&mut self) {
        self.state = ProcessingState::Idle;
        self.last_input = None;
    }

    /// The stateless removal flow: credential, PNG upload, decode.
    ///
    /// The result always carries an alpha channel.
    ///
    /// # Errors
    ///
    /// Returns `CredentialUnavailable` before any request if there is no
    /// key, the extractor's error if the call fails, and
    /// `RemoteProcessingFailed` if the response is not an image.
    pub async fn remove(&self, image: &DecodedImage) -> Result<DecodedImage, RemovalError> {
        let key = self.credential.get().await?;

        let png =
            encode_png(image).map_err(|e| RemovalError::RemoteProcessingFailed(e.to_string()))?;
        let bytes = self.extractor.extract_foreground(key, png).await?;

        let decoded = decode_image_no_orientation(&bytes).map_err(|e| {
            tracing::warn!(error = %e, "background removal returned an undecodable body");
            RemovalError::RemoteProcessingFailed("Response is not a valid image".to_string())
        })?;
        let processed = if decoded.has_alpha() {
            decoded
        } else {
            match decoded.to_rgba_image() {
                Some(rgba) => DecodedImage::from_rgba_image(rgba),
                None => decoded,
            }
        };

        tracing::info!(
            width = processed.width,
            height = processed.height,
            "background removed"
        );
        Ok(processed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::PixelLayout;
    use crate::removal::{CredentialError, StaticCredential};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays canned responses and records the keys it saw.
    struct FakeExtractor {
        responses: Mutex<Vec<Result<Vec<u8>, RemovalError>>>,
        keys: Mutex<Vec<String>>,
    }

    impl FakeExtractor {
        fn new(mut responses: Vec<Result<Vec<u8>, RemovalError>>) -> Arc<Self> {
            responses.reverse();
            Arc::new(Self {
                responses: Mutex::new(responses),
                keys: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.keys.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ForegroundExtractor for FakeExtractor {
        async fn extract_foreground(
            &self,
            api_key: &str,
            image_png: Vec<u8>,
        ) -> Result<Vec<u8>, RemovalError> {
            assert!(image::load_from_memory(&image_png).is_ok());
            self.keys.lock().unwrap().push(api_key.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(RemovalError::NetworkUnavailable))
        }
    }

    struct FailingCredential(AtomicUsize);

    #[async_trait]
    impl CredentialProvider for FailingCredential {
        async fn api_key(&self) -> Result<String, CredentialError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(CredentialError("down".into()))
        }
    }

    fn crop() -> Arc<DecodedImage> {
        Arc::new(DecodedImage::new(8, 10, vec![100u8; 8 * 10 * 3]))
    }

    fn cutout_png() -> Vec<u8> {
        let img =
            DecodedImage::from_raw(8, 10, PixelLayout::Rgba8, [50, 60, 70, 0].repeat(80)).unwrap();
        encode_png(&img).unwrap()
    }

    fn remover(extractor: Arc<FakeExtractor>) -> BackgroundRemover {
        BackgroundRemover::new(Arc::new(StaticCredential::new("secret")), extractor)
    }

    #[tokio::test]
    async fn test_success_yields_alpha_image() {
        let extractor = FakeExtractor::new(vec![Ok(cutout_png())]);
        let mut remover = remover(extractor.clone());

        let out = remover.process(crop()).await.unwrap();
        assert!(out.has_alpha());
        assert_eq!(out.dimensions(), (8, 10));
        assert!(matches!(remover.state(), ProcessingState::Succeeded(_)));
        assert_eq!(extractor.keys.lock().unwrap().as_slice(), ["secret"]);

        let status = remover.status();
        assert!(!status.is_processing);
        assert!(status.processed_image.is_some());
        assert_eq!(status.error, None);
    }

    #[tokio::test]
    async fn test_opaque_response_gains_alpha() {
        let opaque = encode_png(&DecodedImage::new(2, 2, vec![9u8; 12])).unwrap();
        let mut remover = remover(FakeExtractor::new(vec![Ok(opaque)]));
        let out = remover.process(crop()).await.unwrap();
        assert_eq!(out.layout, PixelLayout::Rgba8);
    }

    #[tokio::test]
    async fn test_rate_limit_then_retry() {
        let extractor =
            FakeExtractor::new(vec![Err(RemovalError::RateLimited), Ok(cutout_png())]);
        let mut remover = remover(extractor.clone());

        assert_eq!(
            remover.process(crop()).await,
            Err(RemovalError::RateLimited)
        );
        assert_eq!(
            remover.state(),
            &ProcessingState::Failed(RemovalError::RateLimited)
        );
        assert_eq!(remover.status().error, Some(RemovalError::RateLimited));

        let retried = remover.retry().await.unwrap();
        assert!(retried.is_ok());
        assert_eq!(extractor.calls(), 2);
    }

    #[tokio::test]
    async fn test_retry_without_input() {
        let mut remover = remover(FakeExtractor::new(vec![]));
        assert!(remover.retry().await.is_none());
    }

    #[tokio::test]
    async fn test_missing_credential_skips_network() {
        let extractor = FakeExtractor::new(vec![Ok(cutout_png())]);
        let provider = Arc::new(FailingCredential(AtomicUsize::new(0)));
        let mut remover = BackgroundRemover::new(provider.clone(), extractor.clone());

        assert_eq!(
            remover.process(crop()).await,
            Err(RemovalError::CredentialUnavailable)
        );
        assert_eq!(extractor.calls(), 0);
        assert!(remover.status().credential_error.is_some());
        assert!(!remover.can_remove());

        // Retry re-checks the credential.
        let _ = remover.retry().await;
        assert_eq!(provider.0.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_garbage_response_is_processing_failure() {
        let mut remover = remover(FakeExtractor::new(vec![Ok(b"not an image".to_vec())]));
        assert!(matches!(
            remover.process(crop()).await,
            Err(RemovalError::RemoteProcessingFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_reset_returns_to_idle() {
        let mut remover = remover(FakeExtractor::new(vec![Ok(cutout_png())]));
        remover.process(crop()).await.unwrap();
        remover.reset();
        assert_eq!(remover.state(), &ProcessingState::Idle);
        assert!(remover.can_remove());
    }
}
