//! Pipeline orchestration: the public `answer(query, language)` contract.

use std::sync::Arc;

use tracing::info;

use assist_core::config::PipelineConfig;
use assist_core::fallback::is_fallback;
use assist_core::traits::{Embedder, Generator, Reranker, Translator, VectorSearch};
use assist_core::types::{Language, PipelineResponse};
use assist_core::{Error, Result};
use assist_index::VectorIndex;

use crate::context;
use crate::generate::HostedGenerator;
use crate::retriever::Retriever;
use crate::translate::{GoogleTranslator, TranslationBoundary};

pub struct Pipeline {
    config: PipelineConfig,
    retriever: Retriever,
    reranker: Arc<dyn Reranker>,
    generator: Arc<dyn Generator>,
    boundary: TranslationBoundary,
}

impl Pipeline {
    /// Production wiring: load the embedding and reranker models, open the
    /// persisted index, construct the hosted generator and translator.
    /// `MissingIndex` surfaces here and must stop the process from serving.
    pub async fn open(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let embedder: Arc<dyn Embedder> = Arc::from(
            assist_embed::default_embedder(&config.embedding)
                .map_err(|e| Error::InvalidConfig(e.to_string()))?,
        );
        let index: Arc<dyn VectorSearch> = Arc::new(VectorIndex::open(&config).await?);
        let reranker: Arc<dyn Reranker> = Arc::from(
            assist_rerank::default_reranker(&config.reranker)
                .map_err(|e| Error::InvalidConfig(e.to_string()))?,
        );
        let generator: Arc<dyn Generator> = Arc::new(HostedGenerator::new(&config.generator)?);
        let translator: Arc<dyn Translator> = Arc::new(GoogleTranslator::new(&config.translation));
        Ok(Self::from_parts(config, embedder, index, reranker, generator, translator))
    }

    /// Wire the pipeline from explicit stage implementations.
    pub fn from_parts(
        config: PipelineConfig,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorSearch>,
        reranker: Arc<dyn Reranker>,
        generator: Arc<dyn Generator>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        let retriever = Retriever::new(embedder, index, config.pipeline.retrieval_k);
        Self {
            config,
            retriever,
            reranker,
            generator,
            boundary: TranslationBoundary::new(translator),
        }
    }

    /// Answer one query. Strictly sequential stages; the pipeline reads no
    /// state other than its inputs and the read-only index.
    ///
    /// Retrieval-class failures are fatal for the request with no partial
    /// answer. A generation failure is surfaced as an error and never
    /// replaced by the fallback sentence, which must only ever originate
    /// from the model's explicit "not found" decision.
    pub async fn answer(&self, query: &str, ui_language: Language) -> Result<PipelineResponse> {
        let working_query = self.boundary.to_pipeline_language(query, ui_language).await;

        let candidates = self.retriever.retrieve(&working_query).await?;
        let ranked = self
            .reranker
            .rerank(&working_query, candidates, self.config.pipeline.rerank_top_n)
            .map_err(|e| Error::Retrieval(format!("reranking failed: {e}")))?;
        let context = context::assemble(&ranked);

        let raw_answer = self.generator.generate(&context, &working_query).await?;

        // Fallback detection runs on the raw English output, before any
        // translation: the sentence is only byte-stable in the pipeline's
        // working language.
        let fallback = is_fallback(&raw_answer);
        let answer_text = self.boundary.to_user_language(&raw_answer, ui_language, fallback).await;

        info!(language = ui_language.code(), is_fallback = fallback, "query answered");
        Ok(PipelineResponse { answer_text, is_fallback: fallback })
    }
}

/// Startup readiness probe: false when the index artifact is absent, which
/// means the offline build step has not run and no query can be served.
pub fn pipeline_ready(config: &PipelineConfig) -> bool {
    VectorIndex::artifact_exists(config)
}
