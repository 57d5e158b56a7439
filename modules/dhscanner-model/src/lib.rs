//! Domain-agnostic types shared by every stage of the pipeline: the closed
//! language set, job identifiers, artifact kinds, job status, and the log
//! sink's event vocabulary. Zero knowledge of HTTP, SQL, or Redis.

pub mod context;
pub mod job;
pub mod language;

pub use context::Context;
pub use job::{ArtifactKind, JobId, JobStatus};
pub use language::Language;
