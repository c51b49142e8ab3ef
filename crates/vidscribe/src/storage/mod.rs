pub mod artifacts;

pub use artifacts::{remove_artifact, ArtifactStore};
