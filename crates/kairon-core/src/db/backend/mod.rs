//! Backend contract for the record store.
//!
//! A backend owns documents grouped by collection name, assigns write
//! timestamps, and provides scoped transactions. Any implementation that
//! honours these traits can sit behind [`Db`](crate::db::Db).
//!
//! Transaction bodies are re-runnable: when a commit loses to a concurrent
//! write, the backend runs the body again on fresh reads, up to
//! [`Backend::max_attempts`] times.

mod memory;

#[cfg(test)]
mod tests;

pub use memory::{MemoryBackend, MemoryTransaction};

use crate::{
    config::DatabaseConfig,
    db::{Document, Record, Transaction, UpdatePatch, WriteResult, query::QueryPlan},
    error::{Error, ErrorOrigin},
};
use async_trait::async_trait;
use std::{fmt, future::Future, pin::Pin, str::FromStr, sync::Arc};
use tracing::{debug, warn};

/// Attempts a transaction gets when the backend is not told otherwise.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Type-erased transaction body. Called once per attempt with a fresh
/// transaction handle.
pub type TransactionBody<'a> =
    Box<dyn FnMut(Transaction) -> BoxFuture<'a, Result<(), Error>> + Send + 'a>;

///
/// Backend
///
/// Non-transactional document operations plus the transaction entry point.
/// Reads return raw documents; soft-delete visibility is decided above
/// this layer.
///

#[async_trait]
pub trait Backend: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, Error>;

    /// Positional batch read: one slot per requested id.
    async fn get_all(
        &self,
        collection: &str,
        ids: &[String],
    ) -> Result<Vec<Option<Document>>, Error>;

    async fn create(&self, collection: &str, data: Record) -> Result<WriteResult, Error>;

    /// Fails with `Conflict` when a document already exists at `id`.
    async fn create_with_id(
        &self,
        collection: &str,
        id: &str,
        data: Record,
    ) -> Result<WriteResult, Error>;

    /// Fails with `NotFound` when no document exists at `id`.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: &UpdatePatch,
    ) -> Result<WriteResult, Error>;

    /// Physical delete. Deleting an absent document succeeds.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), Error>;

    async fn query(&self, collection: &str, plan: &QueryPlan) -> Result<Vec<Document>, Error>;

    async fn begin(&self) -> Result<Box<dyn BackendTransaction>, Error>;

    /// How many times [`run_transaction`](Self::run_transaction) may run a
    /// body whose commit keeps conflicting.
    fn max_attempts(&self) -> u32 {
        DEFAULT_MAX_ATTEMPTS
    }

    /// Run `body` in a transaction and commit it. A version conflict at
    /// commit re-runs the body; once attempts run out the call fails with
    /// `Aborted`. Any error from the body rolls back and is returned as is.
    async fn run_transaction(&self, body: TransactionBody<'_>) -> Result<(), Error> {
        run_with_retry(self, body).await
    }
}

///
/// BackendTransaction
///
/// One open transaction. Reads observe the transaction's own staged writes;
/// nothing staged is visible elsewhere until `commit` succeeds.
///

#[async_trait]
pub trait BackendTransaction: Send {
    async fn get(&mut self, collection: &str, id: &str) -> Result<Option<Document>, Error>;

    async fn get_all(
        &mut self,
        collection: &str,
        ids: &[String],
    ) -> Result<Vec<Option<Document>>, Error>;

    async fn create(&mut self, collection: &str, data: Record) -> Result<WriteResult, Error>;

    async fn create_with_id(
        &mut self,
        collection: &str,
        id: &str,
        data: Record,
    ) -> Result<WriteResult, Error>;

    async fn update(
        &mut self,
        collection: &str,
        id: &str,
        patch: &UpdatePatch,
    ) -> Result<WriteResult, Error>;

    async fn query(&mut self, collection: &str, plan: &QueryPlan)
    -> Result<Vec<Document>, Error>;

    /// Apply every staged write atomically, or none of them.
    async fn commit(self: Box<Self>) -> Result<(), Error>;

    /// Discard every staged write.
    async fn rollback(self: Box<Self>);
}

///
/// BackendKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BackendKind {
    Memory,
}

impl BackendKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "" => Err(Error::unavailable(
                ErrorOrigin::Config,
                "no backend configured",
            )),
            other => Err(Error::unavailable(
                ErrorOrigin::Config,
                format!("unknown backend kind '{other}'"),
            )),
        }
    }
}

/// Construct the backend named by `config`.
pub fn open_backend(config: &DatabaseConfig) -> Result<Arc<dyn Backend>, Error> {
    let kind: BackendKind = config.backend.parse()?;
    tracing::info!(
        backend = %kind,
        database = %config.name,
        max_attempts = config.max_attempts,
        "opening backend"
    );

    match kind {
        BackendKind::Memory => Ok(Arc::new(
            MemoryBackend::new().with_max_attempts(config.max_attempts),
        )),
    }
}

// Optimistic retry loop over `begin`/`commit`.
async fn run_with_retry<B: Backend + ?Sized>(
    backend: &B,
    mut body: TransactionBody<'_>,
) -> Result<(), Error> {
    let attempts = backend.max_attempts().max(1);
    let mut attempt = 1;

    loop {
        let tx = Transaction::new(backend.begin().await?);

        if let Err(err) = body(tx.clone()).await {
            debug!(
                attempt,
                error = %err.display_with_class(),
                "transaction body failed, rolling back"
            );
            tx.rollback().await;
            return Err(err);
        }

        match tx.commit().await {
            Ok(()) => return Ok(()),
            Err(err) if err.is_version_mismatch() && attempt < attempts => {
                debug!(attempt, error = %err, "commit conflicted, retrying");
                attempt += 1;
            }
            Err(err) if err.is_version_mismatch() => {
                warn!(attempts, error = %err, "transaction retries exhausted");
                return Err(Error::transaction_aborted(attempts, err));
            }
            Err(err) => {
                warn!(error = %err.display_with_class(), "transaction commit failed");
                return Err(err);
            }
        }
    }
}
