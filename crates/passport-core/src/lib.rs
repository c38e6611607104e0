//! Passport Core - passport photo pipeline
//!
//! This crate turns an uploaded photo into a fixed-size passport photo:
//! crop geometry, crop extraction, optional background removal through a
//! remote service, compositing over a solid color, and export encoding.
//! The [`workflow`] module ties the steps together as a state machine
//! driven by UI events.

pub mod color;
pub mod composite;
pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
pub mod geometry;
pub mod raster;
pub mod removal;
pub mod workflow;

pub use color::{BackgroundPreset, Rgb};
pub use config::{ConfigError, PaperSize, PassportConfig};
pub use decode::{DecodeError, DecodedImage, FilterType, PixelLayout};
pub use encode::{EncodeError, ExportFormat, ExportedFile, SaveTarget};
pub use error::PipelineError;
pub use geometry::{CropArea, CropEditor, OutputSize, Point, Rect, Size};
pub use raster::CanvasError;
pub use removal::{BackgroundRemover, RemovalError};
pub use workflow::{Event, Session, Step, Workflow};
