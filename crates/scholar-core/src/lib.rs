//! # scholar-core
//!
//! Foundation crate for the scholar engine.
//! Defines all shared types, traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod ids;
pub mod intent;
pub mod models;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::ScholarConfig;
pub use errors::{ScholarError, ScholarResult};
pub use intent::Intent;
pub use models::{Candidate, Chunk, ChunkType, Confidence, PointPayload, QueryResult};
