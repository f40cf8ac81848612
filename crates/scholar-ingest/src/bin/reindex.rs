//! Rebuild the BM25 lexical index from the relational chunk store.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use scholar_core::config::ScholarConfig;
use scholar_core::traits::LexicalSearcher;
use scholar_index::LexicalIndex;
use scholar_storage::SqliteStore;

#[derive(Parser, Debug)]
#[command(name = "scholar-reindex", about = "Rebuild the lexical index from the chunk store")]
struct Args {
    /// Sanity-check query to run after the rebuild.
    #[arg(long, default_value = "binary search")]
    probe: String,
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

    let store = SqliteStore::open(&config.storage.db_path, config.storage.read_pool_size)?;
    let chunks = store.load_all_chunks()?;
    info!(chunks = chunks.len(), "loaded chunk rows");

    let index = LexicalIndex::new(&config.lexical.index_dir);
    index.rebuild(&chunks)?;
    info!(dir = %config.lexical.index_dir, "lexical index rebuilt");

    let hits = index.search(&args.probe, 10)?;
    info!(probe = %args.probe, hits = hits.len(), "sanity probe");
    for id in hits {
        info!(chunk_id = %id, "probe hit");
    }
    Ok(())
}
