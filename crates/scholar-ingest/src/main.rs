//! Ingest CLI: read a line-delimited JSON chunk corpus, embed in batches,
//! and upsert unit-norm vectors into the vector store using deterministic
//! point ids (so repeat runs are idempotent).

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use scholar_core::config::ScholarConfig;
use scholar_core::constants::INGEST_BATCH_SIZE;
use scholar_core::models::PointPayload;
use scholar_core::traits::Embedder;
use scholar_embeddings::OnnxEmbedder;
use scholar_index::{PointRecord, QdrantIndex};

#[derive(Parser, Debug)]
#[command(name = "scholar-ingest", about = "Embed chunks.jsonl and upsert to the vector store")]
struct Args {
    /// Line-delimited JSON file of chunks.
    #[arg(default_value = "chunks.jsonl")]
    chunks_file: PathBuf,

    /// Embedding batch size.
    #[arg(long, default_value_t = INGEST_BATCH_SIZE)]
    batch_size: usize,
}

/// The field to embed: `text`, falling back to `title`.
fn text_for_embedding(chunk: &serde_json::Value) -> String {
    match chunk.get("text").and_then(|t| t.as_str()) {
        Some(text) if !text.trim().is_empty() => text.to_string(),
        _ => chunk
            .get("title")
            .and_then(|t| t.as_str())
            .unwrap_or_default()
            .to_string(),
    }
}

/// Payload mirror of the chunk essentials carried next to the vector.
fn payload_from(chunk: &serde_json::Value) -> Option<PointPayload> {
    let chunk_id = chunk.get("chunk_id").and_then(|v| v.as_str())?;
    Some(PointPayload {
        chunk_id: chunk_id.to_string(),
        title: chunk
            .get("title")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        chunk_type: chunk
            .get("chunk_type")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        metadata: chunk.get("metadata").cloned().unwrap_or(serde_json::Value::Null),
    })
}

fn read_jsonl(path: &PathBuf) -> Result<Vec<serde_json::Value>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut chunks = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        chunks.push(serde_json::from_str(&line).with_context(|| "parsing chunk line")?);
    }
    Ok(chunks)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let config = ScholarConfig::from_env();

    let chunks = read_jsonl(&args.chunks_file)?;
    info!(count = chunks.len(), file = %args.chunks_file.display(), "loaded chunks");

    let index = QdrantIndex::new(&config.dense)?;
    index.ensure_collection(config.dense.dimensions)?;

    let embedder = OnnxEmbedder::load(
        &config.embedding.model_dir,
        config.embedding.max_seq_len,
        config.embedding.dimensions,
    )?;

    let batch_size = args.batch_size.max(1);
    let mut upserted = 0usize;
    for batch in chunks.chunks(batch_size) {
        let texts: Vec<String> = batch.iter().map(text_for_embedding).collect();
        let vectors = embedder.embed_batch(&texts)?;
        let points: Vec<PointRecord> = batch
            .iter()
            .zip(vectors)
            .filter_map(|(chunk, vector)| payload_from(chunk).map(|p| PointRecord::new(p, vector)))
            .collect();
        index.upsert_points(&points)?;
        upserted += points.len();
        info!(upserted, "batch upserted");
    }

    info!(
        upserted,
        collection = %config.dense.collection,
        "ingest complete"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_falls_back_to_title() {
        let with_text = json!({ "text": "body", "title": "t" });
        assert_eq!(text_for_embedding(&with_text), "body");
        let blank_text = json!({ "text": "  ", "title": "t" });
        assert_eq!(text_for_embedding(&blank_text), "t");
        let neither = json!({});
        assert_eq!(text_for_embedding(&neither), "");
    }

    #[test]
    fn payload_requires_chunk_id() {
        assert!(payload_from(&json!({ "title": "t" })).is_none());
        let payload = payload_from(&json!({
            "chunk_id": "TOPIC-11",
            "title": "Databases and SQL",
            "chunk_type": "course",
            "metadata": { "course_id": "C2" },
        }))
        .unwrap();
        assert_eq!(payload.chunk_id, "TOPIC-11");
        assert_eq!(payload.metadata["course_id"], "C2");
    }
}
