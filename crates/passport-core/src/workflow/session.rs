//! Async driver that executes workflow effects.

use std::collections::VecDeque;

use super::state::{Effect, Event, Step, Workflow};
use crate::composite::composite_over_color;
use crate::config::PassportConfig;
use crate::decode::{decode_image, DataUrl, DecodedImage};
use crate::encode::{export_image, SaveTarget};
use crate::error::PipelineError;
use crate::raster::{self, extract_crop, Canvas, CanvasError};
use crate::removal::BackgroundRemover;

/// One user's pass through the wizard.
///
/// Effects run one at a time in the order the workflow issued them, so
/// each step's output is complete before the next step starts.
pub struct Session<T: SaveTarget> {
    workflow: Workflow,
    remover: BackgroundRemover,
    target: T,
}

impl<T: SaveTarget> Session<T> {
    pub fn new(config: PassportConfig, remover: BackgroundRemover, target: T) -> Self {
        Self {
            workflow: Workflow::new(config),
            remover,
            target,
        }
    }

    /// A session calling remove.bg with the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Config` if the configuration is invalid or
    /// the HTTP client cannot be built.
    #[cfg(feature = "remove-bg")]
    pub fn with_remove_bg(
        config: PassportConfig,
        credentials: std::sync::Arc<dyn crate::removal::CredentialProvider>,
        target: T,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let client = crate::removal::RemoveBgClient::new(config.removal.clone())?;
        let remover = BackgroundRemover::new(credentials, std::sync::Arc::new(client));
        Ok(Self::new(config, remover, target))
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    pub fn remover(&self) -> &BackgroundRemover {
        &self.remover
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    /// Validate and decode an uploaded file, then load it.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::UploadOutOfStep` outside the upload step,
    /// `PipelineError::Upload` for a rejected type or size (the workflow is
    /// left untouched) and `PipelineError::Decode` if the bytes are not a
    /// readable image.
    pub async fn upload(&mut self, mime: &str, bytes: &[u8]) -> Result<(), PipelineError> {
        let step = self.workflow.step();
        if step != Step::Upload {
            return Err(PipelineError::UploadOutOfStep(step));
        }
        self.workflow
            .config()
            .upload
            .validate(mime, bytes.len() as u64)?;
        let image = decode_image(bytes)?;
        tracing::info!(
            mime,
            width = image.width,
            height = image.height,
            "upload decoded"
        );
        self.dispatch(Event::ImageLoaded(image)).await
    }

    /// Like [`upload`](Self::upload), for a base64 `data:` URL.
    pub async fn upload_data_url(&mut self, url: &str) -> Result<(), PipelineError> {
        let data = DataUrl::parse(url)?;
        self.upload(&data.mime, &data.bytes).await
    }

    /// Apply `event` and run every effect it leads to.
    ///
    /// Failures are recorded in the workflow state; the first one is also
    /// returned.
    pub async fn dispatch(&mut self, event: Event) -> Result<(), PipelineError> {
        if matches!(event, Event::Reset) {
            self.remover.reset();
        }

        let mut queue = VecDeque::from([event]);
        let mut first_error = None;
        while let Some(event) = queue.pop_front() {
            for effect in self.workflow.handle(event) {
                let (completion, error) = self.run(effect).await;
                if first_error.is_none() {
                    first_error = error;
                }
                queue.extend(completion);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Render the crop editor preview at the measured viewport size.
    ///
    /// Returns `Ok(None)` before an image is loaded or a viewport has been
    /// measured.
    pub fn render_preview(&self) -> Result<Option<DecodedImage>, CanvasError> {
        let (Some(source), Some(editor)) = (self.workflow.source(), self.workflow.editor()) else {
            return Ok(None);
        };
        let Some(viewport) = editor.viewport() else {
            return Ok(None);
        };

        let mut canvas = Canvas::new(
            viewport.width.round() as u32,
            viewport.height.round() as u32,
        )?;
        let drawn = raster::render_preview(
            &mut canvas,
            source.image(),
            editor,
            &self.workflow.config().preview,
        )?;
        Ok(drawn.then(|| canvas.into_image()))
    }

    async fn run(&mut self, effect: Effect) -> (Option<Event>, Option<PipelineError>) {
        match effect {
            Effect::RenderPreview => (None, None),
            Effect::ExtractCrop {
                id,
                image,
                area,
                output,
                filter,
            } => {
                let result = extract_crop(&image, area, output, filter);
                let error = result.as_ref().err().cloned().map(PipelineError::from);
                (Some(Event::CropFinished { id, result }), error)
            }
            Effect::RemoveBackground { id, image } => {
                let result = self.remover.process(image).await;
                let error = result.as_ref().err().cloned().map(PipelineError::from);
                (Some(Event::RemovalFinished { id, result }), error)
            }
            Effect::Composite {
                id,
                foreground,
                color,
                output,
                filter,
            } => {
                let result = composite_over_color(&foreground, color, output, filter);
                let error = result.as_ref().err().cloned().map(PipelineError::from);
                (Some(Event::CompositeFinished { id, result }), error)
            }
            Effect::Export {
                id,
                image,
                format,
                options,
            } => {
                let saved = export_image(&image, format, &options)
                    .and_then(|file| self.target.save(&file).map(|_| file.filename));
                match saved {
                    Ok(filename) => (
                        Some(Event::ExportFinished {
                            id,
                            result: Ok(filename),
                        }),
                        None,
                    ),
                    Err(e) => (
                        Some(Event::ExportFinished {
                            id,
                            result: Err(e.to_string()),
                        }),
                        Some(e.into()),
                    ),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::decode::PixelLayout;
    use crate::encode::{encode_png, DirectoryTarget, EncodeError, ExportFormat, ExportedFile};
    use crate::geometry::Size;
    use crate::removal::{ForegroundExtractor, RemovalError, StaticCredential};
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    struct Canned(Mutex<Vec<Result<Vec<u8>, RemovalError>>>);

    #[async_trait]
    impl ForegroundExtractor for Canned {
        async fn extract_foreground(
            &self,
            _api_key: &str,
            _image_png: Vec<u8>,
        ) -> Result<Vec<u8>, RemovalError> {
            self.0
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(RemovalError::NetworkUnavailable))
        }
    }

    #[derive(Default)]
    struct Memory(Vec<ExportedFile>);

    impl SaveTarget for Memory {
        fn save(&mut self, file: &ExportedFile) -> Result<Option<PathBuf>, EncodeError> {
            self.0.push(file.clone());
            Ok(None)
        }
    }

    fn session(responses: Vec<Result<Vec<u8>, RemovalError>>) -> Session<Memory> {
        let remover = BackgroundRemover::new(
            Arc::new(StaticCredential::new("key")),
            Arc::new(Canned(Mutex::new(responses))),
        );
        Session::new(PassportConfig::default(), remover, Memory::default())
    }

    fn png_upload() -> Vec<u8> {
        encode_png(&DecodedImage::new(60, 40, vec![150u8; 60 * 40 * 3])).unwrap()
    }

    fn transparent_png() -> Vec<u8> {
        let img =
            DecodedImage::from_raw(413, 531, PixelLayout::Rgba8, [1, 2, 3, 0].repeat(413 * 531))
                .unwrap();
        encode_png(&img).unwrap()
    }

    async fn cropped(session: &mut Session<impl SaveTarget>) {
        session.upload("image/png", &png_upload()).await.unwrap();
        session
            .dispatch(Event::ViewportMeasured(Size::new(300.0, 300.0)))
            .await
            .unwrap();
        session.dispatch(Event::ConfirmCrop).await.unwrap();
        assert_eq!(session.workflow().step(), Step::Background);
    }

    #[tokio::test]
    async fn test_rejected_upload_leaves_state() {
        let mut s = session(vec![]);
        let err = s.upload("image/gif", &png_upload()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Upload(_)));
        assert_eq!(s.workflow().step(), Step::Upload);

        let err = s.upload("image/png", b"not a png").await.unwrap_err();
        assert!(matches!(err, PipelineError::Decode(_)));
        assert_eq!(s.workflow().step(), Step::Upload);
    }

    #[tokio::test]
    async fn test_upload_outside_upload_step_is_rejected() {
        let mut s = session(vec![]);
        s.upload("image/png", &png_upload()).await.unwrap();
        let first = s.workflow().source().unwrap().generation();

        let err = s.upload("image/png", &png_upload()).await.unwrap_err();
        assert!(matches!(err, PipelineError::UploadOutOfStep(Step::Crop)));
        assert_eq!(s.workflow().source().unwrap().generation(), first);

        s.dispatch(Event::Reset).await.unwrap();
        s.upload("image/png", &png_upload()).await.unwrap();
        assert_eq!(s.workflow().step(), Step::Crop);
    }

    #[tokio::test]
    async fn test_data_url_upload() {
        let mut s = session(vec![]);
        let url = DataUrl::encode("image/png", &png_upload());
        s.upload_data_url(&url).await.unwrap();
        assert_eq!(s.workflow().step(), Step::Crop);
    }

    #[tokio::test]
    async fn test_preview_renders_at_viewport_size() {
        let mut s = session(vec![]);
        s.upload("image/png", &png_upload()).await.unwrap();
        assert_eq!(s.render_preview().unwrap(), None);

        s.dispatch(Event::ViewportMeasured(Size::new(320.0, 240.0)))
            .await
            .unwrap();
        let preview = s.render_preview().unwrap().unwrap();
        assert_eq!(preview.dimensions(), (320, 240));
    }

    #[tokio::test]
    async fn test_large_jpeg_to_png_file() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();

        let photo = DecodedImage::new(4000, 3000, vec![90u8; 4000 * 3000 * 3]);
        let jpeg = crate::encode::encode_jpeg(&photo, 80).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let remover = BackgroundRemover::new(
            Arc::new(StaticCredential::new("key")),
            Arc::new(Canned(Mutex::new(vec![]))),
        );
        let mut s = Session::new(
            PassportConfig::default(),
            remover,
            DirectoryTarget::new(dir.path()),
        );

        s.upload("image/jpeg", &jpeg).await.unwrap();
        s.dispatch(Event::ViewportMeasured(Size::new(800.0, 600.0)))
            .await
            .unwrap();
        let area = s.workflow().editor().unwrap().crop_area().unwrap();
        assert!((area.x + area.width / 2.0 - 2000.0).abs() < 1.0);
        assert!((area.y + area.height / 2.0 - 1500.0).abs() < 1.0);

        s.dispatch(Event::ConfirmCrop).await.unwrap();
        s.dispatch(Event::SkipRemoval).await.unwrap();
        s.dispatch(Event::Continue).await.unwrap();
        s.dispatch(Event::Download(ExportFormat::Png)).await.unwrap();

        let path = dir.path().join("passport-photo-3.5x4.5cm.png");
        let saved = crate::decode::decode_image(&std::fs::read(path).unwrap()).unwrap();
        assert_eq!(saved.dimensions(), (413, 531));
        assert!(saved.is_opaque());
    }

    #[tokio::test]
    async fn test_skip_and_download() {
        let mut s = session(vec![]);
        cropped(&mut s).await;
        s.dispatch(Event::SkipRemoval).await.unwrap();
        s.dispatch(Event::Continue).await.unwrap();
        s.dispatch(Event::Download(ExportFormat::Jpg)).await.unwrap();

        let saved = &s.target().0;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].filename, "passport-photo-3.5x4.5cm.jpg");
        assert_eq!(
            s.workflow().last_download(),
            Some("passport-photo-3.5x4.5cm.jpg")
        );
    }

    #[tokio::test]
    async fn test_removal_and_color_change() {
        let mut s = session(vec![Ok(transparent_png())]);
        cropped(&mut s).await;

        s.dispatch(Event::RemoveBackground).await.unwrap();
        assert_eq!(s.workflow().step(), Step::Color);
        assert!(s.workflow().background_removed());

        s.dispatch(Event::SelectColor(Rgb::BLACK)).await.unwrap();
        s.dispatch(Event::SelectColor(Rgb::BLUE)).await.unwrap();
        s.dispatch(Event::Continue).await.unwrap();

        let final_image = s.workflow().final_image().unwrap().image();
        assert_eq!(final_image.pixel_rgba(10, 10), Some([0, 0, 255, 255]));
    }

    #[tokio::test]
    async fn test_removal_failure_is_returned_and_skippable() {
        let mut s = session(vec![Err(RemovalError::RateLimited)]);
        cropped(&mut s).await;

        let err = s.dispatch(Event::RemoveBackground).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Removal(RemovalError::RateLimited)
        ));
        assert_eq!(s.remover().status().error, Some(RemovalError::RateLimited));

        s.dispatch(Event::SkipRemoval).await.unwrap();
        assert_eq!(s.workflow().step(), Step::Color);
        assert!(!s.workflow().background_removed());
    }

    #[tokio::test]
    async fn test_export_error_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let remover = BackgroundRemover::new(
            Arc::new(StaticCredential::new("key")),
            Arc::new(Canned(Mutex::new(vec![]))),
        );
        let mut s = Session::new(
            PassportConfig::default(),
            remover,
            DirectoryTarget::new(dir.path().join("missing")),
        );
        cropped(&mut s).await;
        s.dispatch(Event::SkipRemoval).await.unwrap();
        s.dispatch(Event::Continue).await.unwrap();

        let err = s
            .dispatch(Event::Download(ExportFormat::Png))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Encode(EncodeError::Save { .. })));
        assert!(s.workflow().last_error().is_some());
    }

    #[tokio::test]
    async fn test_reset_clears_remover() {
        let mut s = session(vec![Ok(transparent_png())]);
        cropped(&mut s).await;
        s.dispatch(Event::RemoveBackground).await.unwrap();

        s.dispatch(Event::Reset).await.unwrap();
        assert_eq!(s.workflow().step(), Step::Upload);
        assert_eq!(
            s.remover().state(),
            &crate::removal::ProcessingState::Idle
        );
    }
}
