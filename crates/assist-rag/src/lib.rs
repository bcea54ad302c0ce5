//! The retrieval-augmented answer pipeline.
//!
//! Composes embedding similarity search, cross-encoder reranking, context
//! assembly, constrained generation and the bilingual translation boundary
//! into one `answer(query, language)` contract. The pipeline is stateless
//! across turns: conversation history belongs to the caller.

pub mod context;
pub mod generate;
pub mod pipeline;
pub mod retriever;
pub mod translate;

pub use generate::HostedGenerator;
pub use pipeline::{pipeline_ready, Pipeline};
pub use retriever::Retriever;
pub use translate::{GoogleTranslator, TranslationBoundary};
