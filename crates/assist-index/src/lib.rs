//! Persisted vector index over document chunks.
//!
//! Built once offline, loaded read-only at process start, never mutated at
//! query time. The manifest pins the embedding configuration the artifact
//! was built with; a mismatched query-time configuration is refused at open.

pub mod manifest;
pub mod schema;
pub mod search;
pub mod writer;

pub use manifest::IndexManifest;
pub use search::VectorIndex;
pub use writer::IndexBuilder;
