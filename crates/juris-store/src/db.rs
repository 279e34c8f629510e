//! Process-wide database handle
//!
//! One connection is opened at startup and shared by every request; callers
//! take turns through an async mutex. Statements run on the blocking pool
//! while the owned guard travels with them.

use crate::StoreError;
use rusqlite::Connection;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};
use tracing::{info, warn};

/// Shared SQLite connection
///
/// Cloning is cheap and yields a handle to the same connection.
///
/// # Examples
///
/// ```no_run
/// use juris_store::Database;
///
/// let db = Database::open("sqlite://juris.db").unwrap();
/// ```
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database named by a connection string
    ///
    /// Accepts a bare path, `sqlite:<path>`, `sqlite://<path>` or `:memory:`.
    /// The schema is created if missing.
    pub fn open(url: &str) -> Result<Self, StoreError> {
        let path = strip_scheme(url);
        let conn = if path.is_empty() || path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };

        conn.execute_batch(include_str!("schema.sql"))?;
        info!("Opened database at {}", if path.is_empty() { ":memory:" } else { path });

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open a private in-memory database (tests, tooling)
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::open(":memory:")
    }

    /// Wait up to `max_wait` for exclusive use of the connection
    pub(crate) async fn acquire(
        &self,
        max_wait: Duration,
    ) -> Result<MutexGuard<'_, Connection>, StoreError> {
        tokio::time::timeout(max_wait, self.conn.lock())
            .await
            .map_err(|_| {
                StoreError::Timeout(format!(
                    "connection not available within {} ms",
                    max_wait.as_millis()
                ))
            })
    }

    /// Like [`acquire`](Self::acquire), but the guard can move to another task
    pub(crate) async fn acquire_owned(
        &self,
        max_wait: Duration,
    ) -> Result<OwnedMutexGuard<Connection>, StoreError> {
        tokio::time::timeout(max_wait, Arc::clone(&self.conn).lock_owned())
            .await
            .map_err(|_| {
                StoreError::Timeout(format!(
                    "connection not available within {} ms",
                    max_wait.as_millis()
                ))
            })
    }

    /// Check that the database answers a trivial query
    pub async fn ping(&self) -> Result<(), StoreError> {
        let conn = self.acquire(Duration::from_secs(5)).await?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    /// Close the connection
    ///
    /// Only the last handle actually closes; earlier calls just drop their
    /// reference.
    pub fn close(self) -> Result<(), StoreError> {
        match Arc::try_unwrap(self.conn) {
            Ok(mutex) => {
                mutex.into_inner().close().map_err(|(_, e)| StoreError::from(e))?;
                info!("Database connection closed");
                Ok(())
            }
            Err(_) => {
                warn!("Database still in use elsewhere; leaving connection open");
                Ok(())
            }
        }
    }
}

fn strip_scheme(url: &str) -> &str {
    let url = url.trim();
    url.strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url)
}
