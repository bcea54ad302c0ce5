use std::env;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use assist_core::config::PipelineConfig;
use assist_core::types::DocumentChunk;
use assist_embed::default_embedder;
use assist_index::IndexBuilder;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <chunks.jsonl> [index_dir]", args[0]);
        eprintln!("Each line: {{\"id\": \"...\", \"text\": \"...\", \"source_metadata\": {{...}}}}");
        std::process::exit(1);
    }
    let chunks_path = PathBuf::from(&args[1]);

    let config = PipelineConfig::load()?;
    let index_dir = args.get(2).map(PathBuf::from).unwrap_or_else(|| config.index_path());

    let chunks = load_chunks(&chunks_path)?;
    if chunks.is_empty() {
        eprintln!("No chunks found in {}", chunks_path.display());
        std::process::exit(1);
    }
    println!("Loaded {} chunks from {}", chunks.len(), chunks_path.display());

    let embedder = default_embedder(&config.embedding)?;
    let builder = IndexBuilder::create(&index_dir, &config.index.table).await?;
    let manifest = builder
        .build(&chunks, embedder.as_ref(), &config.embedding.model_id)
        .await?;

    println!(
        "Indexed {} chunks into {} (model {}, dim {})",
        manifest.chunk_count,
        index_dir.display(),
        manifest.embedding_model,
        manifest.dim
    );
    Ok(())
}

fn load_chunks(path: &PathBuf) -> anyhow::Result<Vec<DocumentChunk>> {
    let file = File::open(path)?;
    let mut chunks = Vec::new();
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let chunk: DocumentChunk = serde_json::from_str(&line)
            .map_err(|e| anyhow::anyhow!("bad chunk record on line {}: {e}", line_no + 1))?;
        chunks.push(chunk);
    }
    Ok(chunks)
}
