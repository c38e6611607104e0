//! Owned handles for intermediate images.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::decode::DecodedImage;

/// Which pipeline stage produced an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactKind {
    Upload,
    Crop,
    Processed,
    Composite,
    Final,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtifactKind::Upload => "upload",
            ArtifactKind::Crop => "crop",
            ArtifactKind::Processed => "processed",
            ArtifactKind::Composite => "composite",
            ArtifactKind::Final => "final",
        };
        f.write_str(name)
    }
}

/// A workflow-owned image.
///
/// The workflow holds exactly one handle per slot; replacing or clearing
/// the slot drops the handle, which releases it. Effects receive shared
/// `Arc` clones of the pixels, so an in-flight job keeps its input alive
/// even after the handle is released.
pub struct Artifact {
    kind: ArtifactKind,
    generation: u64,
    image: Arc<DecodedImage>,
}

impl Artifact {
    pub(crate) fn new(kind: ArtifactKind, generation: u64, image: Arc<DecodedImage>) -> Self {
        tracing::debug!(
            %kind,
            generation,
            width = image.width,
            height = image.height,
            "acquired artifact"
        );
        Self {
            kind,
            generation,
            image,
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// Unique within one workflow; later artifacts have larger values.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn image(&self) -> &Arc<DecodedImage> {
        &self.image
    }
}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifact")
            .field("kind", &self.kind)
            .field("generation", &self.generation)
            .field("dimensions", &self.image.dimensions())
            .finish()
    }
}

impl Drop for Artifact {
    fn drop(&mut self) {
        tracing::debug!(kind = %self.kind, generation = self.generation, "released artifact");
    }
}
