pub mod schema;
pub mod store;

pub use store::{ArtifactStore, CallableRecord, FactsRecord, FileRecord};
