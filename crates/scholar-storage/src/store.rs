//! `SqliteStore`: chunk rows plus the deterministic curriculum reads.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use scholar_core::errors::{ScholarResult, StorageError};
use scholar_core::models::{Chunk, ChunkType, CodeTitle, DateRange};
use scholar_core::traits::{ChunkStore, CurriculumStore};

use crate::pool::ReadPool;
use crate::rows::{AssignmentRow, ClassTopicRow, InstructorRow, TopicAssignmentCount};
use crate::schema::init_schema;
use crate::to_storage_err;

/// Accepted `learned_at` / timestamp spellings in stored rows.
fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ts);
        }
    }
    None
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// SQLite-backed relational store. One write connection, a round-robin
/// read pool for file-backed databases. In-memory databases route reads
/// through the writer since separate connections would not share state.
pub struct SqliteStore {
    writer: Mutex<Connection>,
    readers: Option<ReadPool>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>, read_pool_size: usize) -> ScholarResult<Self> {
        let path = path.as_ref();
        let writer = Connection::open(path).map_err(to_storage_err)?;
        writer
            .pragma_update(None, "journal_mode", "WAL")
            .map_err(to_storage_err)?;
        init_schema(&writer)?;
        let readers = ReadPool::open(path, read_pool_size)?;
        debug!(path = %path.display(), readers = readers.size(), "relational store opened");
        Ok(SqliteStore {
            writer: Mutex::new(writer),
            readers: Some(readers),
        })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> ScholarResult<Self> {
        let writer = Connection::open_in_memory().map_err(to_storage_err)?;
        init_schema(&writer)?;
        Ok(SqliteStore {
            writer: Mutex::new(writer),
            readers: None,
        })
    }

    fn with_read<F, T>(&self, f: F) -> ScholarResult<T>
    where
        F: FnOnce(&Connection) -> ScholarResult<T>,
    {
        match &self.readers {
            Some(pool) => pool.with_conn(f),
            None => {
                let guard = self.writer.lock().map_err(|e| StorageError::PoolPoisoned {
                    reason: e.to_string(),
                })?;
                f(&guard)
            }
        }
    }

    fn with_write<F, T>(&self, f: F) -> ScholarResult<T>
    where
        F: FnOnce(&Connection) -> ScholarResult<T>,
    {
        let guard = self.writer.lock().map_err(|e| StorageError::PoolPoisoned {
            reason: e.to_string(),
        })?;
        f(&guard)
    }

    // --- Writes (seeding, reindexing, tests) ---

    pub fn upsert_chunk(&self, chunk: &Chunk) -> ScholarResult<()> {
        self.with_write(|conn| {
            conn.execute(
                "INSERT INTO chunks (chunk_id, chunk_type, title, text, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(chunk_id) DO UPDATE SET
                    chunk_type = excluded.chunk_type,
                    title = excluded.title,
                    text = excluded.text,
                    metadata = excluded.metadata",
                params![
                    chunk.chunk_id,
                    chunk.chunk_type.as_str(),
                    chunk.title,
                    chunk.text,
                    chunk.metadata.to_string(),
                ],
            )
            .map_err(to_storage_err)?;
            Ok(())
        })
    }

    pub fn insert_course(&self, code: &str, title: &str, description: &str) -> ScholarResult<i64> {
        self.with_write(|conn| {
            conn.execute(
                "INSERT INTO courses (code, title, description) VALUES (?1, ?2, ?3)",
                params![code, title, description],
            )
            .map_err(to_storage_err)?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn insert_topic(
        &self,
        course_id: i64,
        code: &str,
        title: &str,
        position: i64,
    ) -> ScholarResult<i64> {
        self.with_write(|conn| {
            conn.execute(
                "INSERT INTO topics (course_id, code, title, position) VALUES (?1, ?2, ?3, ?4)",
                params![course_id, code, title, position],
            )
            .map_err(to_storage_err)?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn insert_instructor(&self, name: &str) -> ScholarResult<i64> {
        self.with_write(|conn| {
            conn.execute("INSERT INTO instructors (name) VALUES (?1)", params![name])
                .map_err(to_storage_err)?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn insert_class(
        &self,
        topic_id: i64,
        instructor_id: Option<i64>,
        title: &str,
        class_number: i64,
        learned_at: Option<&str>,
    ) -> ScholarResult<i64> {
        self.with_write(|conn| {
            conn.execute(
                "INSERT INTO classes (topic_id, instructor_id, title, class_number, learned_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![topic_id, instructor_id, title, class_number, learned_at],
            )
            .map_err(to_storage_err)?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn insert_assignment(&self, title: &str, due_date: Option<&str>) -> ScholarResult<i64> {
        self.with_write(|conn| {
            conn.execute(
                "INSERT INTO assignments (title, due_date) VALUES (?1, ?2)",
                params![title, due_date],
            )
            .map_err(to_storage_err)?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn link_assignment_topic(&self, assignment_id: i64, topic_id: i64) -> ScholarResult<()> {
        self.with_write(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO assignment_topics (assignment_id, topic_id) VALUES (?1, ?2)",
                params![assignment_id, topic_id],
            )
            .map_err(to_storage_err)?;
            Ok(())
        })
    }

    // --- Reads ---

    fn resolve_topic_id(conn: &Connection, topic_code: &str) -> ScholarResult<Option<i64>> {
        conn.query_row(
            "SELECT id FROM topics WHERE UPPER(code) = UPPER(?1)",
            params![topic_code.trim()],
            |row| row.get(0),
        )
        .optional()
        .map_err(to_storage_err)
    }

    fn row_to_chunk(
        chunk_id: String,
        chunk_type: String,
        title: String,
        text: String,
        metadata: Option<String>,
    ) -> ScholarResult<Chunk> {
        let parsed_type = ChunkType::parse(&chunk_type).ok_or(StorageError::UnknownChunkType {
            chunk_id: chunk_id.clone(),
            value: chunk_type,
        })?;
        let metadata = metadata
            .and_then(|m| serde_json::from_str(&m).ok())
            .unwrap_or(serde_json::Value::Null);
        Ok(Chunk {
            chunk_id,
            chunk_type: parsed_type,
            title,
            text,
            metadata,
        })
    }

    /// Every chunk row, for lexical index rebuilds.
    pub fn load_all_chunks(&self) -> ScholarResult<Vec<Chunk>> {
        self.with_read(|conn| {
            let mut stmt = conn
                .prepare("SELECT chunk_id, chunk_type, title, text, metadata FROM chunks")
                .map_err(to_storage_err)?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Option<String>>(4)?,
                    ))
                })
                .map_err(to_storage_err)?;
            let mut chunks = Vec::new();
            for row in rows {
                let (id, ty, title, text, meta) = row.map_err(to_storage_err)?;
                chunks.push(Self::row_to_chunk(id, ty, title, text, meta)?);
            }
            Ok(chunks)
        })
    }

    /// Topics (with their classes) taught on a given ISO date.
    pub fn topics_on_date(&self, iso_date: &str) -> ScholarResult<Vec<ClassTopicRow>> {
        self.class_topic_query(
            "SELECT c.id, c.learned_at, t.code, t.title
             FROM classes c JOIN topics t ON c.topic_id = t.id
             WHERE DATE(c.learned_at) = ?1 ORDER BY t.code",
            params![iso_date],
        )
    }

    /// Classes taught on a given ISO date, in session order.
    pub fn classes_on_date(&self, iso_date: &str) -> ScholarResult<Vec<ClassTopicRow>> {
        self.class_topic_query(
            "SELECT c.id, c.learned_at, t.code, t.title
             FROM classes c JOIN topics t ON c.topic_id = t.id
             WHERE DATE(c.learned_at) = ?1 ORDER BY c.learned_at",
            params![iso_date],
        )
    }

    /// Classes taught by an instructor, case-insensitive name match.
    pub fn classes_by_instructor(&self, name: &str) -> ScholarResult<Vec<ClassTopicRow>> {
        self.class_topic_query(
            "SELECT c.id, c.learned_at, t.code, t.title
             FROM classes c
             JOIN instructors i ON c.instructor_id = i.id
             JOIN topics t ON c.topic_id = t.id
             WHERE UPPER(i.name) = UPPER(?1) ORDER BY c.learned_at",
            params![name.trim()],
        )
    }

    fn class_topic_query(
        &self,
        sql: &str,
        args: impl rusqlite::Params,
    ) -> ScholarResult<Vec<ClassTopicRow>> {
        self.with_read(|conn| {
            let mut stmt = conn.prepare(sql).map_err(to_storage_err)?;
            let rows = stmt
                .query_map(args, |row| {
                    Ok(ClassTopicRow {
                        class_id: row.get(0)?,
                        learned_at: row.get(1)?,
                        topic_code: row.get(2)?,
                        topic_title: row.get(3)?,
                    })
                })
                .map_err(to_storage_err)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(to_storage_err)
        })
    }

    /// Assignments attached (via topic) to a class, due-date order.
    pub fn assignments_for_class(
        &self,
        class_id: i64,
        limit: usize,
    ) -> ScholarResult<Vec<AssignmentRow>> {
        self.assignment_query(
            "SELECT a.id, a.title, a.due_date
             FROM assignments a
             JOIN assignment_topics at_ ON a.id = at_.assignment_id
             JOIN classes c ON at_.topic_id = c.topic_id
             WHERE c.id = ?1 ORDER BY a.due_date LIMIT ?2",
            params![class_id, limit as i64],
        )
    }

    /// Assignments due on a specific ISO date.
    pub fn assignments_due_on_date(&self, iso_date: &str) -> ScholarResult<Vec<AssignmentRow>> {
        self.assignment_query(
            "SELECT id, title, due_date FROM assignments WHERE due_date = ?1 ORDER BY due_date",
            params![iso_date],
        )
    }

    fn assignment_query(
        &self,
        sql: &str,
        args: impl rusqlite::Params,
    ) -> ScholarResult<Vec<AssignmentRow>> {
        self.with_read(|conn| {
            let mut stmt = conn.prepare(sql).map_err(to_storage_err)?;
            let rows = stmt
                .query_map(args, |row| {
                    Ok(AssignmentRow {
                        assignment_id: row.get(0)?,
                        title: row.get(1)?,
                        due_date: row.get(2)?,
                    })
                })
                .map_err(to_storage_err)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(to_storage_err)
        })
    }

    /// Topics that have never been taught.
    pub fn topics_never_taught(&self) -> ScholarResult<Vec<CodeTitle>> {
        self.code_title_query(
            "SELECT t.code, t.title FROM topics t
             LEFT JOIN classes c ON c.topic_id = t.id
             WHERE c.id IS NULL ORDER BY t.code",
        )
    }

    /// Classes whose topic has no assignments mapped.
    pub fn classes_with_no_assignments(&self) -> ScholarResult<Vec<ClassTopicRow>> {
        self.class_topic_query(
            "SELECT c.id, c.learned_at, t.code, t.title
             FROM classes c JOIN topics t ON c.topic_id = t.id
             LEFT JOIN assignment_topics at_ ON at_.topic_id = c.topic_id
             WHERE at_.assignment_id IS NULL ORDER BY c.id",
            params![],
        )
    }

    /// Assignment count per topic, including zeros, descending.
    pub fn count_assignments_per_topic(&self) -> ScholarResult<Vec<TopicAssignmentCount>> {
        self.topic_count_query(
            "SELECT t.code, t.title, COUNT(at_.assignment_id)
             FROM topics t LEFT JOIN assignment_topics at_ ON at_.topic_id = t.id
             GROUP BY t.id ORDER BY COUNT(at_.assignment_id) DESC",
            params![],
        )
    }

    /// Topics with the most assignments.
    pub fn topics_with_most_assignments(
        &self,
        limit: usize,
    ) -> ScholarResult<Vec<TopicAssignmentCount>> {
        self.topic_count_query(
            "SELECT t.code, t.title, COUNT(at_.assignment_id)
             FROM topics t JOIN assignment_topics at_ ON at_.topic_id = t.id
             GROUP BY t.id ORDER BY COUNT(at_.assignment_id) DESC LIMIT ?1",
            params![limit as i64],
        )
    }

    fn topic_count_query(
        &self,
        sql: &str,
        args: impl rusqlite::Params,
    ) -> ScholarResult<Vec<TopicAssignmentCount>> {
        self.with_read(|conn| {
            let mut stmt = conn.prepare(sql).map_err(to_storage_err)?;
            let rows = stmt
                .query_map(args, |row| {
                    Ok(TopicAssignmentCount {
                        code: row.get(0)?,
                        title: row.get(1)?,
                        assignments_count: row.get(2)?,
                    })
                })
                .map_err(to_storage_err)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(to_storage_err)
        })
    }

    /// All instructors, by name.
    pub fn list_instructors(&self) -> ScholarResult<Vec<InstructorRow>> {
        self.with_read(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, name FROM instructors ORDER BY name")
                .map_err(to_storage_err)?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(InstructorRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                })
                .map_err(to_storage_err)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(to_storage_err)
        })
    }

    /// First and last class timestamps for a topic code.
    pub fn first_last_class_for_topic(&self, topic_code: &str) -> ScholarResult<Option<DateRange>> {
        // Same aggregation as learned_at_range; kept as its own entry point
        // because callers present "first/last" differently from "learned".
        self.learned_at_range(topic_code)
    }

    /// Schedule range for a course matched by title, case-insensitive.
    /// Returns `(course_code, range)` when the course has scheduled classes.
    pub fn course_schedule_by_title(
        &self,
        title: &str,
    ) -> ScholarResult<Option<(String, DateRange)>> {
        self.with_read(|conn| {
            let row = conn
                .query_row(
                    "SELECT co.code, MIN(c.learned_at), MAX(c.learned_at)
                     FROM courses co
                     JOIN topics t ON t.course_id = co.id
                     JOIN classes c ON c.topic_id = t.id
                     WHERE UPPER(co.title) = UPPER(?1)
                     GROUP BY co.id",
                    params![title.trim()],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, Option<String>>(1)?,
                            row.get::<_, Option<String>>(2)?,
                        ))
                    },
                )
                .optional()
                .map_err(to_storage_err)?;
            Ok(row.map(|(code, earliest, latest)| {
                let range = DateRange {
                    earliest: earliest.as_deref().and_then(parse_timestamp),
                    latest: latest.as_deref().and_then(parse_timestamp),
                };
                (code, range)
            }))
        })
    }

    fn code_title_query(&self, sql: &str) -> ScholarResult<Vec<CodeTitle>> {
        self.with_read(|conn| {
            let mut stmt = conn.prepare(sql).map_err(to_storage_err)?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(CodeTitle {
                        code: row.get(0)?,
                        title: row.get(1)?,
                    })
                })
                .map_err(to_storage_err)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(to_storage_err)
        })
    }
}

impl ChunkStore for SqliteStore {
    fn fetch_chunks(&self, chunk_ids: &[String]) -> ScholarResult<HashMap<String, Chunk>> {
        if chunk_ids.is_empty() {
            return Ok(HashMap::new());
        }
        self.with_read(|conn| {
            let sql = format!(
                "SELECT chunk_id, chunk_type, title, text, metadata
                 FROM chunks WHERE chunk_id IN ({})",
                placeholders(chunk_ids.len())
            );
            let mut stmt = conn.prepare(&sql).map_err(to_storage_err)?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(chunk_ids.iter()), |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Option<String>>(4)?,
                    ))
                })
                .map_err(to_storage_err)?;
            let mut out = HashMap::new();
            for row in rows {
                let (id, ty, title, text, meta) = row.map_err(to_storage_err)?;
                let chunk = Self::row_to_chunk(id, ty, title, text, meta)?;
                out.insert(chunk.chunk_id.clone(), chunk);
            }
            Ok(out)
        })
    }
}

impl CurriculumStore for SqliteStore {
    fn list_courses(&self) -> ScholarResult<Vec<CodeTitle>> {
        self.code_title_query("SELECT code, title FROM courses ORDER BY code")
    }

    fn list_topics(&self) -> ScholarResult<Vec<CodeTitle>> {
        self.code_title_query("SELECT code, title FROM topics ORDER BY code")
    }

    fn learned_at_range(&self, topic_code: &str) -> ScholarResult<Option<DateRange>> {
        self.with_read(|conn| {
            let Some(topic_id) = Self::resolve_topic_id(conn, topic_code)? else {
                return Ok(None);
            };
            let (earliest, latest) = conn
                .query_row(
                    "SELECT MIN(learned_at), MAX(learned_at) FROM classes WHERE topic_id = ?1",
                    params![topic_id],
                    |row| {
                        Ok((
                            row.get::<_, Option<String>>(0)?,
                            row.get::<_, Option<String>>(1)?,
                        ))
                    },
                )
                .map_err(to_storage_err)?;
            let range = DateRange {
                earliest: earliest.as_deref().and_then(parse_timestamp),
                latest: latest.as_deref().and_then(parse_timestamp),
            };
            Ok(if range.is_empty() { None } else { Some(range) })
        })
    }

    fn count_classes_for_topic(&self, topic_code: &str) -> ScholarResult<Option<u32>> {
        self.with_read(|conn| {
            let Some(topic_id) = Self::resolve_topic_id(conn, topic_code)? else {
                return Ok(None);
            };
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM classes WHERE topic_id = ?1",
                    params![topic_id],
                    |row| row.get(0),
                )
                .map_err(to_storage_err)?;
            Ok(Some(count as u32))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_spellings_parse() {
        for s in [
            "2025-06-21T00:00:00",
            "2025-06-21 00:00:00",
            "2025-06-21T00:00",
            "2025-06-21T00:00:00.000",
        ] {
            assert!(parse_timestamp(s).is_some(), "failed for {s}");
        }
        assert!(parse_timestamp("June 21, 2025").is_none());
    }

    #[test]
    fn placeholders_joins_question_marks() {
        assert_eq!(placeholders(3), "?, ?, ?");
    }
}
