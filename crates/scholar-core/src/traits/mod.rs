//! Subsystem seams. The orchestrator composes these trait objects so every
//! heavy dependency (ONNX sessions, vector store, SQLite, LLM endpoints)
//! can be swapped for a mock in tests.

pub mod embedding;
pub mod generator;
pub mod index;
pub mod storage;

pub use embedding::{Embedder, PairScorer, TokenCounter, WhitespaceCounter};
pub use generator::TextGenerator;
pub use index::{LexicalSearcher, VectorSearcher};
pub use storage::{ChunkStore, CurriculumStore};
