//! # scholar-gateway
//!
//! The session-aware front door. Rewrites context-dependent follow-ups
//! against prior turn state, resolves source payloads by deterministic
//! point id (with an LRU+TTL cache), forwards queries to the backend, and
//! exposes `/metrics`, `/health`, and `/ready`.

pub mod metrics;
pub mod points;
pub mod rewrite;
pub mod server;
pub mod session;

pub use server::{build_router, AppState};
pub use session::{ConversationState, CourseRef, MemorySessionStore, SessionStore, SqliteSessionStore};
