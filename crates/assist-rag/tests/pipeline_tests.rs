use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use assist_core::config::PipelineConfig;
use assist_core::error::{GenerationError, TranslationError};
use assist_core::fallback::{FALLBACK_EN, FALLBACK_TA};
use assist_core::traits::{Embedder, Generator, Translator, VectorSearch};
use assist_core::types::{Candidate, DocumentChunk, Language};
use assist_core::Error;
use assist_embed::HashEmbedder;
use assist_index::IndexManifest;
use assist_rag::{pipeline_ready, Pipeline};
use assist_rerank::LexicalReranker;

fn candidate(id: &str, text: &str, similarity: f32) -> Candidate {
    Candidate {
        chunk: DocumentChunk {
            id: id.to_string(),
            text: text.to_string(),
            source_metadata: Default::default(),
        },
        similarity_score: similarity,
    }
}

/// Vector search stub ignoring the query vector.
struct StubIndex {
    candidates: Vec<Candidate>,
}

#[async_trait]
impl VectorSearch for StubIndex {
    async fn search(&self, _query_vec: &[f32], k: usize) -> anyhow::Result<Vec<Candidate>> {
        Ok(self.candidates.iter().take(k).cloned().collect())
    }
}

/// Generator stub recording what reached it.
struct StubGenerator {
    answer: Result<String, ()>,
    seen: Arc<Mutex<Vec<(String, String)>>>,
}

impl StubGenerator {
    fn answering(answer: &str) -> (Self, Arc<Mutex<Vec<(String, String)>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        (Self { answer: Ok(answer.to_string()), seen: seen.clone() }, seen)
    }

    fn failing() -> Self {
        Self { answer: Err(()), seen: Arc::new(Mutex::new(Vec::new())) }
    }
}

#[async_trait]
impl Generator for StubGenerator {
    async fn generate(&self, context: &str, question: &str) -> Result<String, GenerationError> {
        self.seen
            .lock()
            .expect("lock")
            .push((context.to_string(), question.to_string()));
        match &self.answer {
            Ok(text) => Ok(text.clone()),
            Err(()) => Err(GenerationError::ApiRequest { message: "connection reset".to_string() }),
        }
    }
}

/// Translator stub: either prefixes the target code or always fails.
struct StubTranslator {
    fail: bool,
    calls: Arc<Mutex<Vec<(String, String, String)>>>,
}

impl StubTranslator {
    fn working() -> (Self, Arc<Mutex<Vec<(String, String, String)>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        (Self { fail: false, calls: calls.clone() }, calls)
    }

    fn failing() -> Self {
        Self { fail: true, calls: Arc::new(Mutex::new(Vec::new())) }
    }
}

#[async_trait]
impl Translator for StubTranslator {
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslationError> {
        self.calls
            .lock()
            .expect("lock")
            .push((text.to_string(), source.to_string(), target.to_string()));
        if self.fail {
            return Err(TranslationError::Request { message: "service unavailable".to_string() });
        }
        Ok(format!("{target}:{text}"))
    }
}

fn test_config(k: usize, top_n: usize) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.pipeline.retrieval_k = k;
    config.pipeline.rerank_top_n = top_n;
    config.embedding.dim = 32;
    config
}

fn build_pipeline(
    config: PipelineConfig,
    candidates: Vec<Candidate>,
    generator: StubGenerator,
    translator: StubTranslator,
) -> Pipeline {
    Pipeline::from_parts(
        config,
        Arc::new(HashEmbedder::new(32)),
        Arc::new(StubIndex { candidates }),
        Arc::new(LexicalReranker),
        Arc::new(generator),
        Arc::new(translator),
    )
}

#[tokio::test]
async fn english_answer_is_grounded_in_top_context() {
    let (generator, seen) = StubGenerator::answering("You can dial the emergency helpline at 100.");
    let (translator, calls) = StubTranslator::working();
    let pipeline = build_pipeline(
        test_config(5, 2),
        vec![
            candidate("c1", "Emergency helpline: 100. Fire service: 101.", 0.9),
            candidate("c2", "Station working hours are 9 to 5.", 0.5),
        ],
        generator,
        translator,
    );

    let response = pipeline
        .answer("What are the emergency contact numbers?", Language::English)
        .await
        .expect("answer");

    assert!(response.answer_text.contains("100"));
    assert!(!response.is_fallback);

    let seen = seen.lock().expect("lock");
    let (context, question) = &seen[0];
    assert!(context.contains("Emergency helpline: 100"), "top chunk reached the generator");
    assert_eq!(question, "What are the emergency contact numbers?");
    assert!(calls.lock().expect("lock").is_empty(), "English round trips skip translation");
}

#[tokio::test]
async fn retrieval_k_bounds_the_context() {
    let (generator, seen) = StubGenerator::answering("ok");
    let (translator, _) = StubTranslator::working();
    let pipeline = build_pipeline(
        test_config(2, 10),
        vec![
            candidate("c1", "alpha", 0.9),
            candidate("c2", "bravo", 0.8),
            candidate("c3", "charlie", 0.7),
            candidate("c4", "delta", 0.6),
        ],
        generator,
        translator,
    );

    pipeline.answer("query", Language::English).await.expect("answer");

    let seen = seen.lock().expect("lock");
    let (context, _) = &seen[0];
    assert_eq!(
        context.matches("\n\n---\n\n").count(),
        1,
        "only K=2 candidates survive retrieval, so the context has two chunks"
    );
}

#[tokio::test]
async fn fallback_in_english_is_the_canonical_sentence() {
    let (generator, _) = StubGenerator::answering(FALLBACK_EN);
    let (translator, _) = StubTranslator::working();
    let pipeline = build_pipeline(
        test_config(5, 2),
        vec![candidate("c1", "unrelated content", 0.4)],
        generator,
        translator,
    );

    let response = pipeline
        .answer("Something the documents never mention", Language::English)
        .await
        .expect("answer");
    assert!(response.is_fallback);
    assert_eq!(response.answer_text, FALLBACK_EN);
}

#[tokio::test]
async fn tamil_fallback_uses_the_canonical_table_not_the_service() {
    let (generator, _) = StubGenerator::answering(FALLBACK_EN);
    let (translator, calls) = StubTranslator::working();
    let pipeline = build_pipeline(
        test_config(5, 2),
        vec![candidate("c1", "unrelated content", 0.4)],
        generator,
        translator,
    );

    let response = pipeline
        .answer("ஆவணங்களில் இல்லாத கேள்வி", Language::Tamil)
        .await
        .expect("answer");

    assert!(response.is_fallback);
    assert_eq!(response.answer_text, FALLBACK_TA, "fixed Tamil sentence, not a live translation");

    let calls = calls.lock().expect("lock");
    assert!(
        calls.iter().all(|(_, _, target)| target == "en"),
        "only the inbound query was translated; the fallback never was"
    );
}

#[tokio::test]
async fn tamil_answers_translate_in_and_out() {
    let (generator, seen) = StubGenerator::answering("Dial 100 for emergencies.");
    let (translator, _) = StubTranslator::working();
    let pipeline = build_pipeline(
        test_config(5, 2),
        vec![candidate("c1", "Emergency helpline: 100.", 0.9)],
        generator,
        translator,
    );

    let response = pipeline
        .answer("அவசர எண்கள் என்ன?", Language::Tamil)
        .await
        .expect("answer");

    let seen = seen.lock().expect("lock");
    let (_, question) = &seen[0];
    assert_eq!(question, "en:அவசர எண்கள் என்ன?", "retrieval ran on the translated query");
    assert_eq!(response.answer_text, "ta:Dial 100 for emergencies.");
    assert!(!response.is_fallback);
}

#[tokio::test]
async fn failed_inbound_translation_degrades_to_original_query() {
    let (generator, seen) = StubGenerator::answering("Dial 100.");
    let pipeline = build_pipeline(
        test_config(5, 2),
        vec![candidate("c1", "Emergency helpline: 100.", 0.9)],
        generator,
        StubTranslator::failing(),
    );

    let response = pipeline
        .answer("அவசர எண்கள் என்ன?", Language::Tamil)
        .await
        .expect("translation failure must not abort the pipeline");

    let seen = seen.lock().expect("lock");
    let (_, question) = &seen[0];
    assert_eq!(question, "அவசர எண்கள் என்ன?", "original text used as the retrieval query");
    // Outbound translation failed too, so the English answer comes back.
    assert_eq!(response.answer_text, "Dial 100.");
}

#[tokio::test]
async fn generation_failure_is_an_error_not_a_fallback() {
    let (translator, _) = StubTranslator::working();
    let pipeline = build_pipeline(
        test_config(5, 2),
        vec![candidate("c1", "Emergency helpline: 100.", 0.9)],
        StubGenerator::failing(),
        translator,
    );

    match pipeline.answer("anything", Language::English).await {
        Err(Error::Generation(GenerationError::ApiRequest { .. })) => {}
        Err(e) => panic!("expected a generation error, got {e:?}"),
        Ok(response) => panic!(
            "transport errors must never become answers (got {:?})",
            response.answer_text
        ),
    }
}

#[tokio::test]
async fn readiness_tracks_the_index_artifact() {
    let tmp = tempfile::TempDir::new().expect("tempdir");

    let mut config = PipelineConfig::default();
    config.index.path = tmp.path().join("never-built").to_string_lossy().to_string();
    assert!(!pipeline_ready(&config), "no artifact, not ready");

    let built = tmp.path().join("built");
    std::fs::create_dir_all(&built).expect("mkdir");
    IndexManifest::new(&config.embedding.model_id, config.embedding.dim, 1)
        .write(&built)
        .expect("write manifest");
    config.index.path = built.to_string_lossy().to_string();
    assert!(pipeline_ready(&config), "artifact present, ready");
}

#[tokio::test]
async fn open_without_artifact_is_missing_index() {
    std::env::set_var("APP_USE_FAKE_EMBEDDINGS", "1");

    let tmp = tempfile::TempDir::new().expect("tempdir");
    let mut config = PipelineConfig::default();
    config.index.path = tmp.path().join("never-built").to_string_lossy().to_string();

    match Pipeline::open(config).await {
        Err(Error::MissingIndex { .. }) => {}
        Err(e) => panic!("expected MissingIndex, got {e:?}"),
        Ok(_) => panic!("expected MissingIndex, got a pipeline"),
    }
}
