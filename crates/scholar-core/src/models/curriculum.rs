//! Small result rows returned by the relational store.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A (code, title) row, used by course and topic listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeTitle {
    pub code: String,
    pub title: String,
}

/// Earliest/latest timestamps for a set of class sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub earliest: Option<NaiveDateTime>,
    pub latest: Option<NaiveDateTime>,
}

impl DateRange {
    pub fn is_empty(&self) -> bool {
        self.earliest.is_none() && self.latest.is_none()
    }

    /// Whether the range collapses to a single calendar day.
    pub fn single_day(&self) -> Option<chrono::NaiveDate> {
        match (self.earliest, self.latest) {
            (Some(e), Some(l)) if e.date() == l.date() => Some(e.date()),
            _ => None,
        }
    }
}

/// Course schedule lookup result, mirroring the backend read endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseSchedule {
    pub found: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<ScheduleRange>,
}

/// ISO timestamps of the first and last scheduled class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earliest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest: Option<String>,
}
