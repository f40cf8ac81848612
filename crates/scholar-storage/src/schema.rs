//! Curriculum schema bootstrap.

use rusqlite::Connection;

use scholar_core::errors::ScholarResult;

use crate::to_storage_err;

/// Create every table the engine reads. Idempotent.
pub fn init_schema(conn: &Connection) -> ScholarResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS chunks (
             chunk_id   TEXT PRIMARY KEY,
             chunk_type TEXT NOT NULL,
             title      TEXT NOT NULL DEFAULT '',
             text       TEXT NOT NULL,
             metadata   TEXT,
             created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
         );
         CREATE TABLE IF NOT EXISTS courses (
             id          INTEGER PRIMARY KEY,
             code        TEXT NOT NULL UNIQUE,
             title       TEXT NOT NULL,
             description TEXT
         );
         CREATE TABLE IF NOT EXISTS topics (
             id        INTEGER PRIMARY KEY,
             course_id INTEGER NOT NULL REFERENCES courses(id),
             code      TEXT NOT NULL UNIQUE,
             title     TEXT NOT NULL,
             position  INTEGER
         );
         CREATE TABLE IF NOT EXISTS instructors (
             id   INTEGER PRIMARY KEY,
             name TEXT NOT NULL
         );
         CREATE TABLE IF NOT EXISTS classes (
             id            INTEGER PRIMARY KEY,
             topic_id      INTEGER NOT NULL REFERENCES topics(id),
             instructor_id INTEGER REFERENCES instructors(id),
             title         TEXT,
             content       TEXT,
             class_number  INTEGER,
             learned_at    TEXT
         );
         CREATE TABLE IF NOT EXISTS assignments (
             id       INTEGER PRIMARY KEY,
             title    TEXT NOT NULL,
             due_date TEXT
         );
         CREATE TABLE IF NOT EXISTS assignment_topics (
             assignment_id INTEGER NOT NULL REFERENCES assignments(id),
             topic_id      INTEGER NOT NULL REFERENCES topics(id),
             PRIMARY KEY (assignment_id, topic_id)
         );
         CREATE INDEX IF NOT EXISTS idx_topics_course ON topics(course_id);
         CREATE INDEX IF NOT EXISTS idx_classes_topic ON classes(topic_id);
         CREATE INDEX IF NOT EXISTS idx_classes_learned_at ON classes(learned_at);",
    )
    .map_err(to_storage_err)
}
