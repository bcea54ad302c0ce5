#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod config;
pub mod error;
pub mod fallback;
pub mod traits;
pub mod types;

pub use error::{Error, GenerationError, Result, TranslationError};
pub use types::{Candidate, DocumentChunk, Language, PipelineResponse, RankedCandidate};
