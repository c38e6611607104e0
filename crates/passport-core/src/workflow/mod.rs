//! Upload → crop → background → color → download orchestration.
//!
//! [`Workflow`] is the synchronous state machine; [`Session`] drives it,
//! running each requested effect (pixel work, the removal service, the
//! save target) and feeding the completion back in.

mod artifact;
mod session;
mod state;

pub use artifact::{Artifact, ArtifactKind};
pub use session::Session;
pub use state::{Effect, Event, RemovalPhase, RequestId, Step, Workflow};
