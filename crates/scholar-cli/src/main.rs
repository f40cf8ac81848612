//! Terminal entry point: compose the engine against the live services
//! (vector store, lexical index, SQLite, LLM endpoint) and answer one
//! query, or just dump the retrieved context.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use scholar_core::config::ScholarConfig;
use scholar_core::traits::{Embedder, TokenCounter};
use scholar_embeddings::{CrossEncoderScorer, OnnxEmbedder};
use scholar_index::{LexicalIndex, QdrantIndex};
use scholar_retrieval::engine::{EngineComponents, RetrievalEngine};
use scholar_storage::SqliteStore;

#[derive(Parser, Debug)]
#[command(name = "scholar", about = "Ask the curriculum engine a question")]
struct Args {
    /// The question. Multiple words are joined with spaces.
    #[arg(required = true)]
    query: Vec<String>,

    /// Print the retrieved context chunks instead of generating an answer.
    #[arg(long)]
    retrieve_only: bool,
}

fn build_engine(config: &ScholarConfig) -> Result<RetrievalEngine> {
    let embedder = Arc::new(OnnxEmbedder::load(
        &config.embedding.model_dir,
        config.embedding.max_seq_len,
        config.embedding.dimensions,
    )?);
    let scorer = Arc::new(CrossEncoderScorer::load(
        &config.embedding.cross_encoder_dir,
        embedder.clone() as Arc<dyn Embedder>,
    ));
    let dense = Arc::new(QdrantIndex::new(&config.dense)?);
    let lexical = Arc::new(LexicalIndex::new(&config.lexical.index_dir));
    let store = Arc::new(SqliteStore::open(
        &config.storage.db_path,
        config.storage.read_pool_size,
    )?);
    let generator = Arc::from(scholar_llm::create_provider(&config.llm)?);

    info!(
        embedder = embedder.name(),
        cross_encoder = scorer.has_pair_model(),
        "engine components ready"
    );

    Ok(RetrievalEngine::new(
        EngineComponents {
            embedder: embedder.clone(),
            dense,
            lexical,
            scorer,
            chunks: store.clone(),
            curriculum: store,
            generator,
            token_counter: embedder as Arc<dyn TokenCounter>,
        },
        config.retrieval.clone(),
        config.prompt.clone(),
        config.llm.max_tokens,
    ))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let query = args.query.join(" ");
    let config = ScholarConfig::from_env();
    let engine = build_engine(&config)?;

    if args.retrieve_only {
        let context = engine.retrieve(&query)?;
        info!(chunks = context.len(), "retrieved context");
        for (i, chunk) in context.iter().enumerate() {
            println!("---- CONTEXT {} ----", i + 1);
            println!("id: {} ({})", chunk.chunk_id, chunk.chunk_type);
            println!("title: {}", chunk.title);
            let preview: String = chunk.text.chars().take(800).collect();
            println!("{preview}");
        }
        return Ok(());
    }

    let result = engine.ask(&query, None)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
