use crate::{
    db::{
        Document, Record, UpdatePatch, WriteResult,
        backend::{Backend, BackendTransaction, DEFAULT_MAX_ATTEMPTS},
        query::QueryPlan,
    },
    error::Error,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};
use tokio::sync::RwLock;
use tracing::debug;
use ulid::Ulid;

type DocKey = (String, String);

///
/// StoredDoc
/// One committed document and its write metadata.
///

#[derive(Clone, Debug)]
struct StoredDoc {
    data: Record,
    version: u64,
    create_time: DateTime<Utc>,
    update_time: DateTime<Utc>,
}

impl StoredDoc {
    fn to_document(&self, id: &str) -> Document {
        Document {
            id: id.to_string(),
            data: self.data.clone(),
            create_time: self.create_time,
            update_time: self.update_time,
        }
    }
}

///
/// MemoryState
///

#[derive(Debug, Default)]
struct MemoryState {
    collections: HashMap<String, BTreeMap<String, StoredDoc>>,
    last_version: u64,
}

impl MemoryState {
    fn doc(&self, collection: &str, id: &str) -> Option<&StoredDoc> {
        self.collections.get(collection)?.get(id)
    }

    fn version_of(&self, collection: &str, id: &str) -> Option<u64> {
        self.doc(collection, id).map(|doc| doc.version)
    }

    fn put(&mut self, collection: &str, id: String, mut doc: StoredDoc) {
        self.last_version += 1;
        doc.version = self.last_version;

        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id, doc);
    }
}

///
/// MemoryBackend
///
/// In-process document backend. Collections are ordered maps keyed by id;
/// every committed write bumps a global version counter that transactions
/// validate against at commit time.
///

#[derive(Clone, Debug)]
pub struct MemoryBackend {
    data: Arc<RwLock<MemoryState>>,
    max_attempts: u32,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self {
            data: Arc::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound on how often a conflicting transaction body is re-run.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Number of documents stored in `collection`, soft-deleted ones included.
    pub async fn document_count(&self, collection: &str) -> usize {
        self.data
            .read()
            .await
            .collections
            .get(collection)
            .map_or(0, BTreeMap::len)
    }
}

fn new_id() -> String {
    Ulid::new().to_string()
}

fn fresh_doc(data: Record, now: DateTime<Utc>) -> StoredDoc {
    StoredDoc {
        data,
        version: 0,
        create_time: now,
        update_time: now,
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, Error> {
        let state = self.data.read().await;

        Ok(state.doc(collection, id).map(|doc| doc.to_document(id)))
    }

    async fn get_all(
        &self,
        collection: &str,
        ids: &[String],
    ) -> Result<Vec<Option<Document>>, Error> {
        let state = self.data.read().await;

        Ok(ids
            .iter()
            .map(|id| state.doc(collection, id).map(|doc| doc.to_document(id)))
            .collect())
    }

    async fn create(&self, collection: &str, data: Record) -> Result<WriteResult, Error> {
        let mut state = self.data.write().await;
        let id = new_id();
        let now = Utc::now();

        state.put(collection, id.clone(), fresh_doc(data, now));

        Ok(WriteResult {
            id,
            update_time: now,
        })
    }

    async fn create_with_id(
        &self,
        collection: &str,
        id: &str,
        data: Record,
    ) -> Result<WriteResult, Error> {
        let mut state = self.data.write().await;
        if state.doc(collection, id).is_some() {
            return Err(Error::already_exists(collection, id));
        }

        let now = Utc::now();
        state.put(collection, id.to_string(), fresh_doc(data, now));

        Ok(WriteResult {
            id: id.to_string(),
            update_time: now,
        })
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: &UpdatePatch,
    ) -> Result<WriteResult, Error> {
        let mut state = self.data.write().await;
        let mut doc = state
            .doc(collection, id)
            .cloned()
            .ok_or_else(|| Error::not_found(collection, id))?;

        // patch a copy so a bad path leaves the stored document untouched
        patch.apply_to(&mut doc.data)?;
        doc.update_time = Utc::now();
        let update_time = doc.update_time;
        state.put(collection, id.to_string(), doc);

        Ok(WriteResult {
            id: id.to_string(),
            update_time,
        })
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), Error> {
        let mut state = self.data.write().await;
        let removed = state
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .is_some();
        debug!(collection, id, removed, "memory delete");

        Ok(())
    }

    async fn query(&self, collection: &str, plan: &QueryPlan) -> Result<Vec<Document>, Error> {
        let state = self.data.read().await;
        let Some(docs) = state.collections.get(collection) else {
            return Ok(Vec::new());
        };

        let hits = plan.execute(docs.iter().map(|(id, doc)| (id.as_str(), &doc.data)));

        Ok(hits
            .into_iter()
            .filter_map(|(id, _)| docs.get(id).map(|doc| doc.to_document(id)))
            .collect())
    }

    async fn begin(&self) -> Result<Box<dyn BackendTransaction>, Error> {
        Ok(Box::new(MemoryTransaction::new(Arc::clone(&self.data))))
    }

    fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

///
/// Staged
/// A write held by an open transaction until commit.
///

#[derive(Clone, Debug)]
struct Staged {
    doc: StoredDoc,
    create_only: bool,
}

///
/// MemoryTransaction
///
/// Optimistic transaction over a [`MemoryBackend`].
///
/// Every committed document read records the version it observed (`None`
/// for "absent"). Writes are staged locally. `commit` takes the write lock,
/// re-checks every observed version, and applies all staged writes only if
/// none changed; otherwise nothing is applied and commit reports a version
/// mismatch, which [`Backend::run_transaction`] answers with a retry.
///

#[derive(Debug)]
pub struct MemoryTransaction {
    data: Arc<RwLock<MemoryState>>,
    reads: HashMap<DocKey, Option<u64>>,
    writes: BTreeMap<DocKey, Staged>,
}

impl MemoryTransaction {
    fn new(data: Arc<RwLock<MemoryState>>) -> Self {
        Self {
            data,
            reads: HashMap::new(),
            writes: BTreeMap::new(),
        }
    }

    fn key(collection: &str, id: &str) -> DocKey {
        (collection.to_string(), id.to_string())
    }

    // first observation wins; commit rejects any change made after it
    fn observe(&mut self, collection: &str, id: &str, version: Option<u64>) {
        self.reads
            .entry(Self::key(collection, id))
            .or_insert(version);
    }

    async fn read_doc(&mut self, collection: &str, id: &str) -> Option<StoredDoc> {
        if let Some(staged) = self.writes.get(&Self::key(collection, id)) {
            return Some(staged.doc.clone());
        }

        let doc = self.data.read().await.doc(collection, id).cloned();
        self.observe(collection, id, doc.as_ref().map(|doc| doc.version));

        doc
    }

    fn stage(&mut self, collection: &str, id: &str, doc: StoredDoc, create_only: bool) {
        self.writes
            .insert(Self::key(collection, id), Staged { doc, create_only });
    }
}

#[async_trait]
impl BackendTransaction for MemoryTransaction {
    async fn get(&mut self, collection: &str, id: &str) -> Result<Option<Document>, Error> {
        Ok(self
            .read_doc(collection, id)
            .await
            .map(|doc| doc.to_document(id)))
    }

    async fn get_all(
        &mut self,
        collection: &str,
        ids: &[String],
    ) -> Result<Vec<Option<Document>>, Error> {
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            out.push(self.read_doc(collection, id).await.map(|doc| doc.to_document(id)));
        }

        Ok(out)
    }

    async fn create(&mut self, collection: &str, data: Record) -> Result<WriteResult, Error> {
        let id = new_id();
        let now = Utc::now();
        self.stage(collection, &id, fresh_doc(data, now), true);

        Ok(WriteResult {
            id,
            update_time: now,
        })
    }

    async fn create_with_id(
        &mut self,
        collection: &str,
        id: &str,
        data: Record,
    ) -> Result<WriteResult, Error> {
        if self.read_doc(collection, id).await.is_some() {
            return Err(Error::already_exists(collection, id));
        }

        let now = Utc::now();
        self.stage(collection, id, fresh_doc(data, now), true);

        Ok(WriteResult {
            id: id.to_string(),
            update_time: now,
        })
    }

    async fn update(
        &mut self,
        collection: &str,
        id: &str,
        patch: &UpdatePatch,
    ) -> Result<WriteResult, Error> {
        let mut doc = self
            .read_doc(collection, id)
            .await
            .ok_or_else(|| Error::not_found(collection, id))?;

        patch.apply_to(&mut doc.data)?;
        doc.update_time = Utc::now();
        let update_time = doc.update_time;

        let create_only = self
            .writes
            .get(&Self::key(collection, id))
            .is_some_and(|staged| staged.create_only);
        self.stage(collection, id, doc, create_only);

        Ok(WriteResult {
            id: id.to_string(),
            update_time,
        })
    }

    async fn query(
        &mut self,
        collection: &str,
        plan: &QueryPlan,
    ) -> Result<Vec<Document>, Error> {
        let (docs, observed) = {
            let state = self.data.read().await;

            // committed documents overlaid with this transaction's staged ones
            let mut view: BTreeMap<&str, (&StoredDoc, bool)> = state
                .collections
                .get(collection)
                .map(|docs| {
                    docs.iter()
                        .map(|(id, doc)| (id.as_str(), (doc, false)))
                        .collect()
                })
                .unwrap_or_default();
            for ((staged_collection, id), staged) in &self.writes {
                if staged_collection == collection {
                    view.insert(id.as_str(), (&staged.doc, true));
                }
            }

            let hits = plan.execute(view.iter().map(|(id, (doc, _))| (*id, &doc.data)));

            let mut docs = Vec::with_capacity(hits.len());
            let mut observed = Vec::new();
            for (id, _) in hits {
                if let Some((doc, staged)) = view.get(id) {
                    docs.push(doc.to_document(id));
                    if !staged {
                        observed.push((id.to_string(), doc.version));
                    }
                }
            }

            (docs, observed)
        };

        for (id, version) in observed {
            self.observe(collection, &id, Some(version));
        }

        Ok(docs)
    }

    async fn commit(self: Box<Self>) -> Result<(), Error> {
        let Self {
            data,
            reads,
            writes,
        } = *self;
        let mut state = data.write().await;

        for ((collection, id), observed) in &reads {
            if state.version_of(collection, id) != *observed {
                return Err(Error::transaction_conflict(collection, id));
            }
        }
        for ((collection, id), staged) in &writes {
            if staged.create_only && state.doc(collection, id).is_some() {
                return Err(Error::already_exists(collection, id));
            }
        }

        debug!(reads = reads.len(), writes = writes.len(), "memory commit");
        for ((collection, id), staged) in writes {
            state.put(&collection, id, staged.doc);
        }

        Ok(())
    }

    async fn rollback(self: Box<Self>) {
        debug!(discarded = self.writes.len(), "memory rollback");
    }
}
