//! Final export: flatten, encode, name, save.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{encode_jpeg, encode_png, EncodeError, DEFAULT_JPEG_QUALITY};
use crate::composite::flatten;
use crate::decode::DecodedImage;
use crate::geometry::OutputSize;

/// File formats offered for download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Jpg,
    Png,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Jpg => "jpg",
            ExportFormat::Png => "png",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Jpg => "image/jpeg",
            ExportFormat::Png => "image/png",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(ExportFormat::Jpg),
            "png" => Ok(ExportFormat::Png),
            other => Err(format!("Unsupported export format: {}", other)),
        }
    }
}

/// Output size, quality and naming for exports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub output: OutputSize,
    /// JPEG quality (1-100). Ignored for PNG.
    pub jpeg_quality: u8,
    /// Paper label used in the filename, e.g. `3.5x4.5cm`.
    pub label: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            output: OutputSize::PASSPORT,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            label: "3.5x4.5cm".to_string(),
        }
    }
}

/// An encoded file ready to be handed to a [`SaveTarget`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub filename: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// `passport-photo-<label>.<ext>`
pub fn export_filename(label: &str, format: ExportFormat) -> String {
    format!("passport-photo-{}.{}", label, format.extension())
}

/// Flatten `image` onto a fresh opaque canvas of the output size and
/// encode it.
///
/// # Errors
///
/// Returns an error if flattening or encoding fails.
pub fn encode_for_export(
    image: &DecodedImage,
    format: ExportFormat,
    options: &ExportOptions,
) -> Result<Vec<u8>, EncodeError> {
    let flat = flatten(image, options.output)?;
    match format {
        ExportFormat::Jpg => encode_jpeg(&flat, options.jpeg_quality),
        ExportFormat::Png => encode_png(&flat),
    }
}

/// Encode `image` and wrap it with its download name and MIME type.
pub fn export_image(
    image: &DecodedImage,
    format: ExportFormat,
    options: &ExportOptions,
) -> Result<ExportedFile, EncodeError> {
    let bytes = encode_for_export(image, format, options)?;
    let file = ExportedFile {
        filename: export_filename(&options.label, format),
        mime_type: format.mime_type(),
        bytes,
    };
    tracing::info!(
        filename = %file.filename,
        bytes = file.bytes.len(),
        "encoded export"
    );
    Ok(file)
}

/// Destination for the "save as" side effect.
pub trait SaveTarget {
    /// Persist `file`, returning where it went if that is meaningful.
    fn save(&mut self, file: &ExportedFile) -> Result<Option<PathBuf>, EncodeError>;
}

/// Saves exports into a directory under their download name.
#[derive(Debug, Clone)]
pub struct DirectoryTarget {
    dir: PathBuf,
}

impl DirectoryTarget {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SaveTarget for DirectoryTarget {
    fn save(&mut self, file: &ExportedFile) -> Result<Option<PathBuf>, EncodeError> {
        let path = self.dir.join(&file.filename);
        fs::write(&path, &file.bytes).map_err(|source| EncodeError::Save {
            path: path.clone(),
            source,
        })?;
        tracing::info!(path = %path.display(), "saved export");
        Ok(Some(path))
    }
}
