use std::collections::HashMap;

use tempfile::TempDir;

use assist_core::config::PipelineConfig;
use assist_core::traits::{Embedder, VectorSearch};
use assist_core::types::DocumentChunk;
use assist_core::Error;
use assist_embed::HashEmbedder;
use assist_index::{IndexBuilder, IndexManifest, VectorIndex};

const TEST_DIM: usize = 64;

fn chunk(id: &str, text: &str) -> DocumentChunk {
    let mut source_metadata = HashMap::new();
    source_metadata.insert("source".to_string(), format!("{id}.pdf"));
    DocumentChunk { id: id.to_string(), text: text.to_string(), source_metadata }
}

fn test_config(index_dir: &std::path::Path) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.index.path = index_dir.to_string_lossy().to_string();
    config.embedding.dim = TEST_DIM;
    config
}

async fn build_test_index(index_dir: &std::path::Path) -> IndexManifest {
    let embedder = HashEmbedder::new(TEST_DIM);
    let chunks = vec![
        chunk("c1", "Emergency helpline: 100. Fire service: 101."),
        chunk("c2", "Police stations are open around the clock."),
        chunk("c3", "Complaints can be filed at any station in the district."),
    ];
    let builder = IndexBuilder::create(index_dir, "chunks").await.expect("builder");
    builder
        .build(&chunks, &embedder, "BAAI/bge-small-en-v1.5")
        .await
        .expect("build index")
}

#[tokio::test]
async fn build_then_search_round_trip() {
    let tmp = TempDir::new().expect("tempdir");
    let manifest = build_test_index(tmp.path()).await;
    assert_eq!(manifest.chunk_count, 3);
    assert_eq!(manifest.dim, TEST_DIM);

    let config = test_config(tmp.path());
    let index = VectorIndex::open(&config).await.expect("open index");

    let embedder = HashEmbedder::new(TEST_DIM);
    let query_vec = embedder.embed("Emergency helpline: 100. Fire service: 101.").expect("embed");
    let hits = index.search(&query_vec, 2).await.expect("search");

    assert!(hits.len() <= 2, "at most k candidates");
    assert!(!hits.is_empty(), "index is not empty");
    assert_eq!(hits[0].chunk.id, "c1", "identical text is the nearest neighbor");
    assert_eq!(hits[0].chunk.source_metadata.get("source").map(String::as_str), Some("c1.pdf"));
    for pair in hits.windows(2) {
        assert!(
            pair[0].similarity_score >= pair[1].similarity_score,
            "candidates ordered by descending similarity"
        );
    }
}

#[tokio::test]
async fn search_never_returns_more_than_index_holds() {
    let tmp = TempDir::new().expect("tempdir");
    build_test_index(tmp.path()).await;

    let config = test_config(tmp.path());
    let index = VectorIndex::open(&config).await.expect("open index");
    let embedder = HashEmbedder::new(TEST_DIM);
    let query_vec = embedder.embed("anything at all").expect("embed");
    let hits = index.search(&query_vec, 50).await.expect("search");
    assert_eq!(hits.len(), 3, "k larger than the corpus yields the whole corpus");
}

#[tokio::test]
async fn open_missing_artifact_is_missing_index() {
    let tmp = TempDir::new().expect("tempdir");
    let config = test_config(&tmp.path().join("never-built"));
    assert!(!VectorIndex::artifact_exists(&config));
    match VectorIndex::open(&config).await {
        Err(Error::MissingIndex { .. }) => {}
        Err(e) => panic!("expected MissingIndex, got {e:?}"),
        Ok(_) => panic!("expected MissingIndex, got an opened index"),
    }
}

#[tokio::test]
async fn open_with_wrong_embedding_config_is_rejected() {
    let tmp = TempDir::new().expect("tempdir");
    build_test_index(tmp.path()).await;

    let mut config = test_config(tmp.path());
    config.embedding.model_id = "some/other-model".to_string();
    match VectorIndex::open(&config).await {
        Err(Error::InvalidConfig(msg)) => {
            assert!(msg.contains("built with embedding model"), "got: {msg}");
        }
        Err(e) => panic!("expected InvalidConfig, got {e:?}"),
        Ok(_) => panic!("expected InvalidConfig, got an opened index"),
    }
}

#[tokio::test]
async fn builder_refuses_empty_chunk_set() {
    let tmp = TempDir::new().expect("tempdir");
    let embedder = HashEmbedder::new(TEST_DIM);
    let builder = IndexBuilder::create(tmp.path(), "chunks").await.expect("builder");
    assert!(builder.build(&[], &embedder, "m").await.is_err());
}
