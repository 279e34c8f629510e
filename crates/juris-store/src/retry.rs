//! Transactional execution with bounded retry
//!
//! `RetryingStore::run_in_transaction` runs a unit of work inside one SQLite
//! transaction. An attempt either commits in full or rolls back in full.
//! Transient failures re-run the whole unit after an exponential backoff;
//! fatal failures surface at once.
//!
//! SQLite calls block, so each attempt runs on tokio's blocking pool. The
//! connection guard and the unit of work move into that task and the work
//! comes back out for the next attempt.

use crate::{Database, StoreError};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Isolation requested for a transaction
///
/// SQLite transactions are always serializable; the level decides how early
/// the write lock is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsolationLevel {
    /// Lock lazily on first access (`BEGIN DEFERRED`)
    ReadCommitted,
    /// Take the write lock up front (`BEGIN IMMEDIATE`)
    RepeatableRead,
    /// Exclusive access for the whole transaction (`BEGIN EXCLUSIVE`)
    #[default]
    Serializable,
}

impl IsolationLevel {
    fn behavior(self) -> TransactionBehavior {
        match self {
            IsolationLevel::ReadCommitted => TransactionBehavior::Deferred,
            IsolationLevel::RepeatableRead => TransactionBehavior::Immediate,
            IsolationLevel::Serializable => TransactionBehavior::Exclusive,
        }
    }
}

/// Knobs for one `run_in_transaction` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionOptions {
    /// Longest wait for the connection and the database lock
    pub max_wait: Duration,
    /// Longest a unit of work may run before it is rolled back
    pub timeout: Duration,
    /// Isolation level
    pub isolation: IsolationLevel,
    /// Additional attempts after the first
    pub max_retries: u32,
    /// Backoff before retry `n` is `base_delay * 2^n`
    pub base_delay: Duration,
}

impl Default for TransactionOptions {
    fn default() -> Self {
        Self {
            max_wait: Duration::from_millis(5000),
            timeout: Duration::from_millis(10000),
            isolation: IsolationLevel::Serializable,
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl TransactionOptions {
    /// Backoff before the retry following attempt `attempt` (counted from zero)
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

/// Runs units of work in retried transactions against the shared database
#[derive(Clone)]
pub struct RetryingStore {
    db: Database,
    defaults: TransactionOptions,
}

impl RetryingStore {
    /// Wrap a database with default options
    pub fn new(db: Database) -> Self {
        Self::with_defaults(db, TransactionOptions::default())
    }

    /// Wrap a database with custom default options
    pub fn with_defaults(db: Database, defaults: TransactionOptions) -> Self {
        Self { db, defaults }
    }

    /// The underlying database
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Options applied when a caller passes none
    pub fn defaults(&self) -> TransactionOptions {
        self.defaults
    }

    /// Run `work` in a transaction, retrying transient failures
    ///
    /// `work` may run several times and must not have effects outside the
    /// transaction. Returns the value of the first committed attempt, the
    /// first fatal error, or the last retryable error once `max_retries`
    /// retries are spent.
    pub async fn run_in_transaction<T, F>(
        &self,
        mut work: F,
        options: Option<TransactionOptions>,
    ) -> Result<T, StoreError>
    where
        F: FnMut(&Transaction<'_>) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let options = options.unwrap_or(self.defaults);
        let mut attempt = 0;

        loop {
            let (returned, outcome) = self.attempt(work, options).await?;
            work = returned;

            match outcome {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < options.max_retries => {
                    let delay = options.backoff_delay(attempt);
                    warn!(
                        "Transaction attempt {}/{} failed ({}); retrying in {} ms",
                        attempt + 1,
                        options.max_retries + 1,
                        err,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    if err.is_retryable() {
                        error!(
                            "Transaction failed after {} attempts: {}",
                            attempt + 1,
                            err
                        );
                    }
                    return Err(err);
                }
            }
        }
    }

    /// Run read-only `work` with the store's retry policy
    pub async fn read<T, F>(&self, work: F) -> Result<T, StoreError>
    where
        F: FnMut(&Transaction<'_>) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let options = TransactionOptions {
            isolation: IsolationLevel::ReadCommitted,
            ..self.defaults
        };
        self.run_in_transaction(work, Some(options)).await
    }

    /// One attempt on the blocking pool
    ///
    /// The outer error is fatal (the worker died); the inner result is the
    /// attempt's own outcome.
    async fn attempt<T, F>(
        &self,
        mut work: F,
        options: TransactionOptions,
    ) -> Result<(F, Result<T, StoreError>), StoreError>
    where
        F: FnMut(&Transaction<'_>) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let mut conn = match self.db.acquire_owned(options.max_wait).await {
            Ok(conn) => conn,
            Err(e) => return Ok((work, Err(e))),
        };

        tokio::task::spawn_blocking(move || {
            let outcome = execute_once(&mut conn, &mut work, &options);
            (work, outcome)
        })
        .await
        .map_err(|e| StoreError::Worker(e.to_string()))
    }
}

fn execute_once<T, F>(
    conn: &mut Connection,
    work: &mut F,
    options: &TransactionOptions,
) -> Result<T, StoreError>
where
    F: FnMut(&Transaction<'_>) -> Result<T, StoreError>,
{
    conn.busy_timeout(options.max_wait)?;

    let started = Instant::now();
    let tx = conn.transaction_with_behavior(options.isolation.behavior())?;

    // An error drops `tx`, which rolls back
    let value = work(&tx)?;

    let elapsed = started.elapsed();
    if elapsed > options.timeout {
        tx.rollback()?;
        return Err(StoreError::Timeout(format!(
            "transaction ran {} ms, limit is {} ms",
            elapsed.as_millis(),
            options.timeout.as_millis()
        )));
    }

    tx.commit()?;
    debug!("Transaction committed in {} ms", elapsed.as_millis());
    Ok(value)
}
