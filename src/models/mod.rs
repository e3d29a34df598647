pub mod artifact;
pub mod artifact_options;
pub mod loaders;
pub mod pipeline_state;
pub mod source;

pub use artifact::{ArtifactStatus, ArtifactType, GenerationResult, TaskStatus};
pub use artifact_options::ArtifactSettings;
pub use loaders::load_artifact_settings;
pub use pipeline_state::{PipelineState, PipelineStatus, Step, TaskRecord};
pub use source::{FileDescriptor, NotebookInfo, SourceInfo, SourceKind, SourceRef, SourceStatus};
