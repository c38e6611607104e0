//! Pipeline configuration.
//!
//! Every field has a default matching the 3.5 × 4.5 cm passport format, so
//! an empty JSON object is a valid configuration:
//!
//! ```json
//! {
//!   "paper": { "width_cm": 5.0, "height_cm": 5.0, "dpi": 300 },
//!   "jpeg_quality": 90
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::{default_presets, BackgroundPreset, Rgb};
use crate::decode::{FilterType, UploadPolicy};
use crate::encode::{ExportOptions, DEFAULT_JPEG_QUALITY};
use crate::geometry::{OutputSize, ZoomRange};
use crate::raster::{PreviewStyle, MAX_CANVAS_DIMENSION};
use crate::removal::RemovalConfig;

const CM_PER_INCH: f64 = 2.54;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to create HTTP client: {0}")]
    HttpClient(String),
}

/// Physical print size of the photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperSize {
    pub width_cm: f64,
    pub height_cm: f64,
    pub dpi: u32,
    /// Filename label; derived from the size when absent.
    pub label: Option<String>,
}

impl Default for PaperSize {
    fn default() -> Self {
        Self {
            width_cm: 3.5,
            height_cm: 4.5,
            dpi: 300,
            label: None,
        }
    }
}

impl PaperSize {
    /// Pixel size at the configured DPI, rounded to the nearest pixel.
    pub fn output_size(&self) -> OutputSize {
        let px = |cm: f64| (cm / CM_PER_INCH * self.dpi as f64).round() as u32;
        OutputSize::new(px(self.width_cm), px(self.height_cm))
    }

    /// Width / height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width_cm / self.height_cm
    }

    /// e.g. `3.5x4.5cm`
    pub fn label(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| format!("{}x{}cm", self.width_cm, self.height_cm))
    }
}

/// Top-level configuration for the passport photo pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassportConfig {
    pub paper: PaperSize,
    /// JPEG export quality, 1-100.
    pub jpeg_quality: u8,
    pub upload: UploadPolicy,
    pub zoom: ZoomRange,
    /// Resampling filter for crop extraction and compositing.
    pub filter: FilterType,
    pub preview: PreviewStyle,
    pub removal: RemovalConfig,
    pub background_presets: Vec<BackgroundPreset>,
    pub default_background: Rgb,
}

impl Default for PassportConfig {
    fn default() -> Self {
        Self {
            paper: PaperSize::default(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            upload: UploadPolicy::default(),
            zoom: ZoomRange::default(),
            filter: FilterType::default(),
            preview: PreviewStyle::default(),
            removal: RemovalConfig::default(),
            background_presets: default_presets(),
            default_background: Rgb::WHITE,
        }
    }
}

impl PassportConfig {
    /// Parse and validate a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed JSON and
    /// `ConfigError::Invalid` for values that fail [`validate`](Self::validate).
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        let paper = &self.paper;
        if !(paper.width_cm > 0.0 && paper.width_cm.is_finite())
            || !(paper.height_cm > 0.0 && paper.height_cm.is_finite())
        {
            return invalid(format!(
                "paper size must be positive, got {}x{} cm",
                paper.width_cm, paper.height_cm
            ));
        }
        if paper.dpi == 0 {
            return invalid("dpi must be positive".to_string());
        }
        let output = paper.output_size();
        if output.width == 0
            || output.height == 0
            || output.width > MAX_CANVAS_DIMENSION
            || output.height > MAX_CANVAS_DIMENSION
        {
            return invalid(format!(
                "output size {}x{} px is out of range",
                output.width, output.height
            ));
        }

        if !(1..=100).contains(&self.jpeg_quality) {
            return invalid(format!(
                "jpeg_quality must be 1-100, got {}",
                self.jpeg_quality
            ));
        }

        let zoom = &self.zoom;
        if !(zoom.min > 0.0) || !(zoom.max >= zoom.min) || !(zoom.step >= 0.0) {
            return invalid(format!(
                "zoom range [{}, {}] step {} is invalid",
                zoom.min, zoom.max, zoom.step
            ));
        }

        if self.upload.max_bytes == 0 || self.upload.accepted_mime_types.is_empty() {
            return invalid("upload policy accepts nothing".to_string());
        }

        if self.removal.endpoint.is_empty() || self.removal.api_key_header.is_empty() {
            return invalid("removal endpoint and header must be set".to_string());
        }

        Ok(())
    }

    pub fn output_size(&self) -> OutputSize {
        self.paper.output_size()
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.paper.aspect_ratio()
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            output: self.output_size(),
            jpeg_quality: self.jpeg_quality,
            label: self.paper.label(),
        }
    }
}
