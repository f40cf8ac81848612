//! Round-robin pool of read-only connections (WAL keeps them unblocked by
//! the writer).

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rusqlite::Connection;

use scholar_core::errors::{ScholarResult, StorageError};

use crate::to_storage_err;

const MAX_POOL_SIZE: usize = 8;

pub struct ReadPool {
    connections: Vec<Mutex<Connection>>,
    next: AtomicUsize,
}

impl ReadPool {
    /// Open `pool_size` read-only connections to the database file.
    pub fn open(path: &Path, pool_size: usize) -> ScholarResult<Self> {
        let size = pool_size.clamp(1, MAX_POOL_SIZE);
        let mut connections = Vec::with_capacity(size);
        for _ in 0..size {
            let conn = Connection::open_with_flags(
                path,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .map_err(to_storage_err)?;
            conn.pragma_update(None, "query_only", true)
                .map_err(to_storage_err)?;
            connections.push(Mutex::new(conn));
        }
        Ok(ReadPool {
            connections,
            next: AtomicUsize::new(0),
        })
    }

    /// Run a closure against the next connection, round-robin.
    pub fn with_conn<F, T>(&self, f: F) -> ScholarResult<T>
    where
        F: FnOnce(&Connection) -> ScholarResult<T>,
    {
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.connections.len();
        let guard = self.connections[idx].lock().map_err(|e| {
            scholar_core::errors::ScholarError::from(StorageError::PoolPoisoned {
                reason: e.to_string(),
            })
        })?;
        f(&guard)
    }

    pub fn size(&self) -> usize {
        self.connections.len()
    }
}
