//! BM25 lexical index over tantivy.
//!
//! The index lives in a directory and is rebuilt wholesale from the
//! authoritative chunk store. A missing or unopenable directory is a valid
//! degraded state: `search` returns nothing and the caller continues
//! dense-only.

use std::path::{Path, PathBuf};

use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, Schema, STORED, STRING, TEXT, Value};
use tantivy::{doc, Index, TantivyDocument};
use tracing::{debug, warn};

use scholar_core::errors::{IndexError, ScholarResult};
use scholar_core::models::Chunk;
use scholar_core::traits::LexicalSearcher;

const WRITER_HEAP_BYTES: usize = 50_000_000;

fn build_schema() -> (Schema, Field, Field, Field) {
    let mut builder = Schema::builder();
    let chunk_id = builder.add_text_field("chunk_id", STRING | STORED);
    let title = builder.add_text_field("title", TEXT);
    let text = builder.add_text_field("text", TEXT);
    (builder.build(), chunk_id, title, text)
}

/// Strip query-parser operator syntax; end users get no operator surface.
fn sanitize_query(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '+' | '-' | '^' | '`' | ':' | '{' | '}' | '[' | ']' | '(' | ')' | '~' | '!' | '*'
            | '\\' | '"' | '\'' => ' ',
            _ => c,
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Directory-backed BM25 index over `{title, text}`.
pub struct LexicalIndex {
    index_dir: PathBuf,
}

impl LexicalIndex {
    pub fn new(index_dir: impl AsRef<Path>) -> Self {
        LexicalIndex {
            index_dir: index_dir.as_ref().to_path_buf(),
        }
    }

    fn lexical_err(e: impl std::fmt::Display) -> scholar_core::errors::ScholarError {
        IndexError::Lexical {
            reason: e.to_string(),
        }
        .into()
    }

    /// Atomically replace the index contents with `chunks`.
    /// Everything happens inside a single commit.
    pub fn rebuild(&self, chunks: &[Chunk]) -> ScholarResult<()> {
        std::fs::create_dir_all(&self.index_dir).map_err(Self::lexical_err)?;
        let (schema, chunk_id_f, title_f, text_f) = build_schema();
        let index = match Index::open_in_dir(&self.index_dir) {
            Ok(existing) => existing,
            Err(_) => Index::create_in_dir(&self.index_dir, schema).map_err(Self::lexical_err)?,
        };
        let mut writer = index
            .writer::<TantivyDocument>(WRITER_HEAP_BYTES)
            .map_err(Self::lexical_err)?;
        writer.delete_all_documents().map_err(Self::lexical_err)?;
        for chunk in chunks {
            writer
                .add_document(doc!(
                    chunk_id_f => chunk.chunk_id.clone(),
                    title_f => chunk.title.clone(),
                    text_f => chunk.text.clone(),
                ))
                .map_err(Self::lexical_err)?;
        }
        writer.commit().map_err(Self::lexical_err)?;
        debug!(docs = chunks.len(), dir = %self.index_dir.display(), "lexical index rebuilt");
        Ok(())
    }
}

impl LexicalSearcher for LexicalIndex {
    fn search(&self, query: &str, top_k: usize) -> ScholarResult<Vec<String>> {
        if !self.index_dir.exists() {
            return Ok(Vec::new());
        }
        let index = match Index::open_in_dir(&self.index_dir) {
            Ok(index) => index,
            Err(e) => {
                warn!(dir = %self.index_dir.display(), error = %e, "lexical index unopenable, degrading to dense-only");
                return Ok(Vec::new());
            }
        };

        let sanitized = sanitize_query(query);
        if sanitized.is_empty() {
            return Ok(Vec::new());
        }

        let schema = index.schema();
        let chunk_id_f = schema.get_field("chunk_id").map_err(Self::lexical_err)?;
        let title_f = schema.get_field("title").map_err(Self::lexical_err)?;
        let text_f = schema.get_field("text").map_err(Self::lexical_err)?;

        let reader = index.reader().map_err(Self::lexical_err)?;
        let searcher = reader.searcher();
        let parser = QueryParser::for_index(&index, vec![title_f, text_f]);
        let parsed = match parser.parse_query(&sanitized) {
            Ok(q) => q,
            Err(e) => {
                warn!(error = %e, "lexical query unparseable after sanitizing");
                return Ok(Vec::new());
            }
        };

        let hits = searcher
            .search(&parsed, &TopDocs::with_limit(top_k))
            .map_err(Self::lexical_err)?;
        let mut ids = Vec::with_capacity(hits.len());
        for (_score, addr) in hits {
            let retrieved: TantivyDocument = searcher.doc(addr).map_err(Self::lexical_err)?;
            if let Some(id) = retrieved.get_first(chunk_id_f).and_then(|v| v.as_str()) {
                ids.push(id.to_string());
            }
        }
        debug!(hits = ids.len(), top_k, "lexical search");
        Ok(ids)
    }
}
