//! The step-by-step orchestrator as a pure state machine.
//!
//! [`Workflow::handle`] takes an [`Event`], updates the state and returns
//! the [`Effect`]s the host must run. It never does I/O or pixel work
//! itself. Work effects carry a [`RequestId`]; their completion events
//! must echo it back, and a completion whose id is no longer the pending
//! one for its kind is dropped as stale.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::artifact::{Artifact, ArtifactKind};
use crate::color::Rgb;
use crate::config::PassportConfig;
use crate::decode::{DecodedImage, FilterType};
use crate::encode::{ExportFormat, ExportOptions};
use crate::geometry::{CropArea, CropEditor, OutputSize, Point, Size};
use crate::raster::CanvasError;
use crate::removal::RemovalError;

/// Wizard steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Upload,
    Crop,
    Background,
    Color,
    Download,
}

impl Step {
    pub const ALL: [Step; 5] = [
        Step::Upload,
        Step::Crop,
        Step::Background,
        Step::Color,
        Step::Download,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn previous(self) -> Option<Step> {
        self.index().checked_sub(1).map(|i| Step::ALL[i])
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Upload => "upload",
            Step::Crop => "crop",
            Step::Background => "background",
            Step::Color => "color",
            Step::Download => "download",
        };
        f.write_str(name)
    }
}

/// Sequence stamp of a work effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where background removal stands for the current crop.
#[derive(Debug, Clone, PartialEq)]
pub enum RemovalPhase {
    Idle,
    Pending(RequestId),
    Succeeded,
    Skipped,
    Failed(RemovalError),
}

/// Inputs to the workflow.
#[derive(Debug)]
pub enum Event {
    /// A validated upload finished decoding.
    ImageLoaded(DecodedImage),
    ViewportMeasured(Size),
    PointerDown(Point),
    PointerMove(Point),
    PointerUp,
    /// The pointer left the editor surface; ends any drag.
    PointerLeave,
    ZoomChanged(f64),
    ConfirmCrop,
    CropFinished {
        id: RequestId,
        result: Result<DecodedImage, CanvasError>,
    },
    RemoveBackground,
    RetryRemoval,
    RemovalFinished {
        id: RequestId,
        result: Result<Arc<DecodedImage>, RemovalError>,
    },
    SkipRemoval,
    SelectColor(Rgb),
    CompositeFinished {
        id: RequestId,
        result: Result<DecodedImage, CanvasError>,
    },
    /// Advance from the current step once its output exists.
    Continue,
    Download(ExportFormat),
    /// `Ok` carries the saved filename, `Err` a user-facing message.
    ExportFinished {
        id: RequestId,
        result: Result<String, String>,
    },
    Back,
    GoTo(Step),
    /// Start over: release everything and restore the default color.
    Reset,
}

/// Work the host must perform, reporting back through the matching event.
#[derive(Debug, Clone)]
pub enum Effect {
    /// Editor state changed; re-render the crop preview.
    RenderPreview,
    ExtractCrop {
        id: RequestId,
        image: Arc<DecodedImage>,
        area: CropArea,
        output: OutputSize,
        filter: FilterType,
    },
    RemoveBackground {
        id: RequestId,
        image: Arc<DecodedImage>,
    },
    Composite {
        id: RequestId,
        foreground: Arc<DecodedImage>,
        color: Rgb,
        output: OutputSize,
        filter: FilterType,
    },
    Export {
        id: RequestId,
        image: Arc<DecodedImage>,
        format: ExportFormat,
        options: ExportOptions,
    },
}

/// The passport photo wizard.
#[derive(Debug)]
pub struct Workflow {
    config: PassportConfig,
    step: Step,
    source: Option<Artifact>,
    editor: Option<CropEditor>,
    crop: Option<Artifact>,
    processed: Option<Artifact>,
    composite: Option<Artifact>,
    final_image: Option<Artifact>,
    background: Rgb,
    removal: RemovalPhase,
    pending_crop: Option<RequestId>,
    pending_composite: Option<RequestId>,
    pending_export: Option<RequestId>,
    last_error: Option<String>,
    last_download: Option<String>,
    next_request: u64,
    next_generation: u64,
}

impl Workflow {
    pub fn new(config: PassportConfig) -> Self {
        let background = config.default_background;
        Self {
            config,
            step: Step::Upload,
            source: None,
            editor: None,
            crop: None,
            processed: None,
            composite: None,
            final_image: None,
            background,
            removal: RemovalPhase::Idle,
            pending_crop: None,
            pending_composite: None,
            pending_export: None,
            last_error: None,
            last_download: None,
            next_request: 0,
            next_generation: 0,
        }
    }

    pub fn config(&self) -> &PassportConfig {
        &self.config
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn source(&self) -> Option<&Artifact> {
        self.source.as_ref()
    }

    pub fn editor(&self) -> Option<&CropEditor> {
        self.editor.as_ref()
    }

    pub fn crop(&self) -> Option<&Artifact> {
        self.crop.as_ref()
    }

    pub fn processed(&self) -> Option<&Artifact> {
        self.processed.as_ref()
    }

    /// The current color's composite, when the background was removed.
    pub fn composite(&self) -> Option<&Artifact> {
        self.composite.as_ref()
    }

    pub fn final_image(&self) -> Option<&Artifact> {
        self.final_image.as_ref()
    }

    /// What the Color step shows: the composite if the background was
    /// removed, otherwise the crop.
    pub fn color_preview(&self) -> Option<&Artifact> {
        if self.background_removed() {
            self.composite.as_ref()
        } else {
            self.crop.as_ref()
        }
    }

    pub fn background(&self) -> Rgb {
        self.background
    }

    pub fn removal(&self) -> &RemovalPhase {
        &self.removal
    }

    pub fn background_removed(&self) -> bool {
        self.removal == RemovalPhase::Succeeded && self.processed.is_some()
    }

    /// Message of the most recent failed crop, composite or export.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_download(&self) -> Option<&str> {
        self.last_download.as_deref()
    }

    /// Whether any work effect is awaiting its completion.
    pub fn is_busy(&self) -> bool {
        self.pending_crop.is_some()
            || self.pending_composite.is_some()
            || self.pending_export.is_some()
            || matches!(self.removal, RemovalPhase::Pending(_))
    }

    /// Whether `step` has the inputs it needs.
    pub fn can_enter(&self, step: Step) -> bool {
        match step {
            Step::Upload => true,
            Step::Crop => self.source.is_some(),
            Step::Background => self.crop.is_some(),
            Step::Color => {
                self.crop.is_some()
                    && matches!(self.removal, RemovalPhase::Succeeded | RemovalPhase::Skipped)
            }
            Step::Download => self.final_image.is_some(),
        }
    }

    /// Apply one event.
    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::ImageLoaded(image) => self.on_image_loaded(image),
            Event::ViewportMeasured(size) => {
                self.with_editor(|editor| editor.measure_viewport(size))
            }
            Event::PointerDown(at) => self.with_editor(|editor| {
                editor.pointer_down(at);
                false
            }),
            Event::PointerMove(at) => self.with_editor(|editor| editor.pointer_move(at)),
            Event::PointerUp | Event::PointerLeave => self.with_editor(|editor| {
                editor.pointer_up();
                false
            }),
            Event::ZoomChanged(zoom) => self.with_editor(|editor| {
                let before = editor.transform().zoom;
                editor.set_zoom(zoom) != before
            }),
            Event::ConfirmCrop => self.on_confirm_crop(),
            Event::CropFinished { id, result } => self.on_crop_finished(id, result),
            Event::RemoveBackground | Event::RetryRemoval => self.request_removal(),
            Event::RemovalFinished { id, result } => self.on_removal_finished(id, result),
            Event::SkipRemoval => self.on_skip_removal(),
            Event::SelectColor(color) => self.on_select_color(color),
            Event::CompositeFinished { id, result } => self.on_composite_finished(id, result),
            Event::Continue => self.on_continue(),
            Event::Download(format) => self.on_download(format),
            Event::ExportFinished { id, result } => self.on_export_finished(id, result),
            Event::Back => match self.step.previous() {
                Some(step) => self.enter(step),
                None => Vec::new(),
            },
            Event::GoTo(step) => {
                if step != self.step && self.can_enter(step) {
                    self.enter(step)
                } else {
                    tracing::debug!(%step, current = %self.step, "ignoring step jump");
                    Vec::new()
                }
            }
            Event::Reset => {
                self.reset();
                Vec::new()
            }
        }
    }

    fn on_image_loaded(&mut self, image: DecodedImage) -> Vec<Effect> {
        if self.step != Step::Upload {
            tracing::debug!(step = %self.step, "ignoring image outside the upload step");
            return Vec::new();
        }
        let size = Size::from(image.dimensions());
        self.clear_from_crop();
        self.editor = Some(CropEditor::new(
            size,
            self.config.aspect_ratio(),
            self.config.zoom,
        ));
        self.source = Some(self.artifact(ArtifactKind::Upload, Arc::new(image)));
        self.set_step(Step::Crop);
        Vec::new()
    }

    /// Run `f` on the editor during the Crop step; request a re-render when
    /// it reports a visible change.
    fn with_editor(&mut self, f: impl FnOnce(&mut CropEditor) -> bool) -> Vec<Effect> {
        if self.step != Step::Crop {
            return Vec::new();
        }
        match self.editor.as_mut().map(f) {
            Some(true) => vec![Effect::RenderPreview],
            _ => Vec::new(),
        }
    }

    fn on_confirm_crop(&mut self) -> Vec<Effect> {
        if self.step != Step::Crop {
            return Vec::new();
        }
        let (Some(source), Some(area)) = (
            self.source.as_ref(),
            self.editor.as_ref().and_then(CropEditor::crop_area),
        ) else {
            tracing::debug!("crop confirmed before the viewport was measured");
            return Vec::new();
        };
        let image = Arc::clone(source.image());
        let id = self.next_request_id();
        self.pending_crop = Some(id);
        self.last_error = None;
        vec![Effect::ExtractCrop {
            id,
            image,
            area,
            output: self.config.output_size(),
            filter: self.config.filter,
        }]
    }

    fn on_crop_finished(
        &mut self,
        id: RequestId,
        result: Result<DecodedImage, CanvasError>,
    ) -> Vec<Effect> {
        if !take_if_current(&mut self.pending_crop, id, "crop") {
            return Vec::new();
        }
        match result {
            Ok(image) => {
                self.clear_from_crop();
                self.crop = Some(self.artifact(ArtifactKind::Crop, Arc::new(image)));
                self.set_step(Step::Background);
            }
            Err(e) => {
                tracing::warn!(error = %e, "crop extraction failed");
                self.last_error = Some(e.to_string());
            }
        }
        Vec::new()
    }

    fn request_removal(&mut self) -> Vec<Effect> {
        if self.step != Step::Background {
            return Vec::new();
        }
        if matches!(self.removal, RemovalPhase::Pending(_)) {
            tracing::debug!("background removal already in flight");
            return Vec::new();
        }
        let Some(crop) = self.crop.as_ref() else {
            return Vec::new();
        };
        let image = Arc::clone(crop.image());
        let id = self.next_request_id();
        self.processed = None;
        self.removal = RemovalPhase::Pending(id);
        vec![Effect::RemoveBackground { id, image }]
    }

    fn on_removal_finished(
        &mut self,
        id: RequestId,
        result: Result<Arc<DecodedImage>, RemovalError>,
    ) -> Vec<Effect> {
        if self.removal != RemovalPhase::Pending(id) {
            tracing::debug!(%id, "dropping stale removal result");
            return Vec::new();
        }
        match result {
            Ok(image) => {
                self.processed = Some(self.artifact(ArtifactKind::Processed, image));
                self.removal = RemovalPhase::Succeeded;
                self.enter(Step::Color)
            }
            Err(e) => {
                tracing::warn!(error = %e, retryable = e.is_retryable(), "background removal failed");
                self.removal = RemovalPhase::Failed(e);
                Vec::new()
            }
        }
    }

    fn on_skip_removal(&mut self) -> Vec<Effect> {
        if self.step != Step::Background || self.crop.is_none() {
            return Vec::new();
        }
        self.processed = None;
        self.removal = RemovalPhase::Skipped;
        self.enter(Step::Color)
    }

    fn on_select_color(&mut self, color: Rgb) -> Vec<Effect> {
        if color != self.background {
            // Entering Color again composites with the new color.
            self.final_image = None;
            self.composite = None;
            self.pending_composite = None;
        }
        self.background = color;
        if self.step == Step::Color && self.background_removed() {
            self.request_composite()
        } else {
            Vec::new()
        }
    }

    fn request_composite(&mut self) -> Vec<Effect> {
        let Some(processed) = self.processed.as_ref() else {
            return Vec::new();
        };
        let foreground = Arc::clone(processed.image());
        let id = self.next_request_id();
        self.pending_composite = Some(id);
        self.composite = None;
        vec![Effect::Composite {
            id,
            foreground,
            color: self.background,
            output: self.config.output_size(),
            filter: self.config.filter,
        }]
    }

    fn on_composite_finished(
        &mut self,
        id: RequestId,
        result: Result<DecodedImage, CanvasError>,
    ) -> Vec<Effect> {
        if !take_if_current(&mut self.pending_composite, id, "composite") {
            return Vec::new();
        }
        match result {
            Ok(image) => {
                self.composite = Some(self.artifact(ArtifactKind::Composite, Arc::new(image)));
            }
            Err(e) => {
                tracing::warn!(error = %e, "compositing failed");
                self.last_error = Some(e.to_string());
            }
        }
        Vec::new()
    }

    fn on_continue(&mut self) -> Vec<Effect> {
        match self.step {
            Step::Crop => self.on_confirm_crop(),
            Step::Background if self.background_removed() => self.enter(Step::Color),
            Step::Color => {
                if self.pending_composite.is_some() {
                    tracing::debug!("continue ignored while compositing");
                    return Vec::new();
                }
                let Some(preview) = self.color_preview() else {
                    return Vec::new();
                };
                let image = Arc::clone(preview.image());
                self.final_image = Some(self.artifact(ArtifactKind::Final, image));
                self.enter(Step::Download)
            }
            _ => Vec::new(),
        }
    }

    fn on_download(&mut self, format: ExportFormat) -> Vec<Effect> {
        if self.step != Step::Download {
            return Vec::new();
        }
        let Some(image) = self.final_image.as_ref().map(|a| Arc::clone(a.image())) else {
            return Vec::new();
        };
        let id = self.next_request_id();
        self.pending_export = Some(id);
        self.last_error = None;
        vec![Effect::Export {
            id,
            image,
            format,
            options: self.config.export_options(),
        }]
    }

    fn on_export_finished(&mut self, id: RequestId, result: Result<String, String>) -> Vec<Effect> {
        if !take_if_current(&mut self.pending_export, id, "export") {
            return Vec::new();
        }
        match result {
            Ok(filename) => {
                tracing::info!(%filename, "download complete");
                self.last_download = Some(filename);
            }
            Err(message) => {
                tracing::warn!(error = %message, "export failed");
                self.last_error = Some(message);
            }
        }
        Vec::new()
    }

    /// Move to `step`, then run its entry rules.
    fn enter(&mut self, step: Step) -> Vec<Effect> {
        self.set_step(step);
        match step {
            Step::Crop => vec![Effect::RenderPreview],
            Step::Color if self.background_removed() && self.composite.is_none() => {
                self.request_composite()
            }
            _ => Vec::new(),
        }
    }

    /// Change step, forgetting requests that belong to the step being left.
    fn set_step(&mut self, step: Step) {
        if step == self.step {
            return;
        }
        if step != Step::Crop {
            self.pending_crop = None;
            if let Some(editor) = self.editor.as_mut() {
                editor.pointer_up();
            }
        }
        if step != Step::Background {
            if let RemovalPhase::Pending(id) = self.removal {
                tracing::debug!(%id, "abandoning in-flight background removal");
                self.removal = RemovalPhase::Idle;
            }
        }
        if step != Step::Color {
            self.pending_composite = None;
        }
        if step != Step::Download {
            self.pending_export = None;
        }
        tracing::info!(from = %self.step, to = %step, "step changed");
        self.step = step;
    }

    /// Release the crop and everything derived from it.
    fn clear_from_crop(&mut self) {
        self.crop = None;
        self.processed = None;
        self.composite = None;
        self.final_image = None;
        self.removal = RemovalPhase::Idle;
        self.pending_crop = None;
        self.pending_composite = None;
        self.pending_export = None;
        self.last_error = None;
    }

    fn reset(&mut self) {
        self.clear_from_crop();
        self.source = None;
        self.editor = None;
        self.background = self.config.default_background;
        self.last_download = None;
        self.set_step(Step::Upload);
    }

    fn next_request_id(&mut self) -> RequestId {
        self.next_request += 1;
        RequestId(self.next_request)
    }

    fn artifact(&mut self, kind: ArtifactKind, image: Arc<DecodedImage>) -> Artifact {
        self.next_generation += 1;
        Artifact::new(kind, self.next_generation, image)
    }
}

/// Clear `slot` and return `true` if it holds `id`.
fn take_if_current(slot: &mut Option<RequestId>, id: RequestId, kind: &str) -> bool {
    if *slot == Some(id) {
        *slot = None;
        true
    } else {
        tracing::debug!(%id, kind, "dropping stale result");
        false
    }
}
