//! Shared data models: chunks, retrieval candidates, query DTOs.

pub mod candidate;
pub mod chunk;
pub mod curriculum;
pub mod query;
pub mod verification;

pub use candidate::{Candidate, PointPayload};
pub use chunk::{Chunk, ChunkType};
pub use curriculum::{CodeTitle, CourseSchedule, DateRange, ScheduleRange};
pub use query::{Confidence, ConversationTurn, QueryRequest, QueryResult, RankedSource};
pub use verification::VerificationReport;
