//! Row shapes returned by the supplemental curriculum reads.

use serde::Serialize;

/// A class joined with its topic, for date and instructor listings.
#[derive(Debug, Clone, Serialize)]
pub struct ClassTopicRow {
    pub class_id: i64,
    pub learned_at: Option<String>,
    pub topic_code: String,
    pub topic_title: String,
}

/// An assignment row with its due date.
#[derive(Debug, Clone, Serialize)]
pub struct AssignmentRow {
    pub assignment_id: i64,
    pub title: String,
    pub due_date: Option<String>,
}

/// A topic with its assignment count.
#[derive(Debug, Clone, Serialize)]
pub struct TopicAssignmentCount {
    pub code: String,
    pub title: String,
    pub assignments_count: i64,
}

/// An instructor row.
#[derive(Debug, Clone, Serialize)]
pub struct InstructorRow {
    pub id: i64,
    pub name: String,
}
