//! # scholar-index
//!
//! The two non-relational evidence paths: [`QdrantIndex`], a REST client
//! for the vector store (cosine top-K, scroll-by-chunk-id hydration,
//! idempotent upsert), and [`LexicalIndex`], a directory-backed BM25 index
//! rebuilt from the authoritative chunk store.

pub mod dense;
pub mod lexical;

pub use dense::{PointRecord, QdrantIndex};
pub use lexical::LexicalIndex;
