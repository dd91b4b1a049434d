#![allow(dead_code)]

use async_trait::async_trait;
use kairon::{
    Error,
    db::{
        Document, Record, UpdatePatch, WriteResult,
        backend::{Backend, BackendTransaction, MemoryBackend},
        query::QueryPlan,
    },
};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use tokio::sync::Barrier;

///
/// GatedBackend
///
/// Memory backend whose next `racers` commits wait for each other, so
/// every racer has finished its reads before any of them commits.
///

#[derive(Clone)]
pub struct GatedBackend {
    inner: MemoryBackend,
    gate: Arc<Barrier>,
    tickets: Arc<AtomicUsize>,
    racers: usize,
}

impl GatedBackend {
    pub fn new(racers: usize) -> Self {
        Self {
            inner: MemoryBackend::new(),
            gate: Arc::new(Barrier::new(racers)),
            tickets: Arc::new(AtomicUsize::new(0)),
            racers,
        }
    }

    /// Hold the next `racers` commits at the gate.
    pub fn arm(&self) {
        self.tickets.store(self.racers, Ordering::SeqCst);
    }
}

#[async_trait]
impl Backend for GatedBackend {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, Error> {
        self.inner.get(collection, id).await
    }

    async fn get_all(
        &self,
        collection: &str,
        ids: &[String],
    ) -> Result<Vec<Option<Document>>, Error> {
        self.inner.get_all(collection, ids).await
    }

    async fn create(&self, collection: &str, data: Record) -> Result<WriteResult, Error> {
        self.inner.create(collection, data).await
    }

    async fn create_with_id(
        &self,
        collection: &str,
        id: &str,
        data: Record,
    ) -> Result<WriteResult, Error> {
        self.inner.create_with_id(collection, id, data).await
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: &UpdatePatch,
    ) -> Result<WriteResult, Error> {
        self.inner.update(collection, id, patch).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), Error> {
        self.inner.delete(collection, id).await
    }

    async fn query(&self, collection: &str, plan: &QueryPlan) -> Result<Vec<Document>, Error> {
        self.inner.query(collection, plan).await
    }

    async fn begin(&self) -> Result<Box<dyn BackendTransaction>, Error> {
        Ok(Box::new(GatedTransaction {
            inner: self.inner.begin().await?,
            gate: Arc::clone(&self.gate),
            tickets: Arc::clone(&self.tickets),
        }))
    }

    fn max_attempts(&self) -> u32 {
        self.inner.max_attempts()
    }
}

struct GatedTransaction {
    inner: Box<dyn BackendTransaction>,
    gate: Arc<Barrier>,
    tickets: Arc<AtomicUsize>,
}

#[async_trait]
impl BackendTransaction for GatedTransaction {
    async fn get(&mut self, collection: &str, id: &str) -> Result<Option<Document>, Error> {
        self.inner.get(collection, id).await
    }

    async fn get_all(
        &mut self,
        collection: &str,
        ids: &[String],
    ) -> Result<Vec<Option<Document>>, Error> {
        self.inner.get_all(collection, ids).await
    }

    async fn create(&mut self, collection: &str, data: Record) -> Result<WriteResult, Error> {
        self.inner.create(collection, data).await
    }

    async fn create_with_id(
        &mut self,
        collection: &str,
        id: &str,
        data: Record,
    ) -> Result<WriteResult, Error> {
        self.inner.create_with_id(collection, id, data).await
    }

    async fn update(
        &mut self,
        collection: &str,
        id: &str,
        patch: &UpdatePatch,
    ) -> Result<WriteResult, Error> {
        self.inner.update(collection, id, patch).await
    }

    async fn query(
        &mut self,
        collection: &str,
        plan: &QueryPlan,
    ) -> Result<Vec<Document>, Error> {
        self.inner.query(collection, plan).await
    }

    async fn commit(self: Box<Self>) -> Result<(), Error> {
        let ticket = self
            .tickets
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if ticket {
            self.gate.wait().await;
        }

        self.inner.commit().await
    }

    async fn rollback(self: Box<Self>) {
        self.inner.rollback().await;
    }
}
