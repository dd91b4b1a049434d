pub mod backend;
pub mod query;

mod patch;
mod record;
mod tx;


pub use patch::UpdatePatch;
pub use record::{
    CREATION_DATE_FIELD, Document, ID_FIELD, MODIFICATION_DATE_FIELD, Record, WriteResult,
};
pub use tx::Transaction;

use crate::{
    config::DatabaseConfig,
    db::{
        backend::{Backend, BoxFuture, TransactionBody, open_backend},
        query::{QueryOptions, translate},
    },
    error::Error,
    model::entity::EntityModel,
    traits::{EntityKind, EntityShape},
};
use std::{future::Future, sync::Arc};
use tokio::sync::Mutex;
use tracing::debug;

///
/// Db
///
/// Generic record store over one explicitly constructed backend.
///
/// Every operation is scoped by the entity shape `E`: its model names the
/// collection and decides whether deletes are soft and whether reads hide
/// soft-deleted records. `Db` holds no state beyond the backend handle and
/// is cheap to clone.
///

#[derive(Clone)]
pub struct Db {
    backend: Arc<dyn Backend>,
}

impl Db {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Build the configured backend and wrap it.
    pub fn from_config(config: &DatabaseConfig) -> Result<Self, Error> {
        Ok(Self::new(open_backend(config)?))
    }

    #[must_use]
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Point read. Absent and soft-deleted records are both `NotFound`.
    pub async fn get<E: EntityShape + ?Sized>(&self, id: &str) -> Result<Record, Error> {
        let model = E::MODEL;
        debug!(collection = model.collection, id, "get");

        let doc = self
            .backend
            .get(model.collection, id)
            .await
            .map_err(|err| err.with_context(format!("get {}/{id}", model.collection)))?;

        visible(model, doc).ok_or_else(|| Error::not_found(model.collection, id))
    }

    /// Batch point read. Ids that are absent (or soft-deleted) come back in
    /// the second list instead of failing the call.
    pub async fn get_all<E: EntityShape + ?Sized>(
        &self,
        ids: &[String],
    ) -> Result<(Vec<Record>, Vec<String>), Error> {
        let model = E::MODEL;
        debug!(collection = model.collection, count = ids.len(), "get_all");

        let docs = self
            .backend
            .get_all(model.collection, ids)
            .await
            .map_err(|err| err.with_context(format!("get_all {}", model.collection)))?;

        Ok(split_found(model, ids, docs))
    }

    /// Create with a backend-generated id.
    pub async fn create<E: EntityKind>(&self, entity: &E) -> Result<Record, Error> {
        let model = E::MODEL;
        let data = payload(entity)?;

        let written = self
            .backend
            .create(model.collection, data.clone())
            .await
            .map_err(|err| err.with_context(format!("create {}", model.collection)))?;
        debug!(collection = model.collection, id = %written.id, "created");

        Ok(written_record(data, written))
    }

    /// Create at a caller-chosen id; fails with `Conflict` if the id is taken.
    pub async fn create_with_id<E: EntityKind>(&self, id: &str, entity: &E) -> Result<Record, Error> {
        let model = E::MODEL;
        let data = payload(entity)?;

        let written = self
            .backend
            .create_with_id(model.collection, id, data.clone())
            .await
            .map_err(|err| err.with_context(format!("create {}/{id}", model.collection)))?;
        debug!(collection = model.collection, id, "created");

        Ok(written_record(data, written))
    }

    /// Apply field-level replacements, then re-read the full record.
    ///
    /// For shapes with a soft-delete flag the visibility check and the
    /// write share one transaction, so a soft-deleted record is reported
    /// `NotFound` and left as it was.
    pub async fn update<E: EntityShape + ?Sized>(
        &self,
        id: &str,
        patch: &UpdatePatch,
    ) -> Result<Record, Error> {
        let model = E::MODEL;
        debug!(collection = model.collection, id, fields = patch.len(), "update");

        if model.deleted_field.is_some() {
            return self
                .run_transaction(move |tx| async move { tx.update_in(model, id, patch).await })
                .await
                .map_err(|err| err.with_context(format!("update {}/{id}", model.collection)));
        }

        self.backend
            .update(model.collection, id, patch)
            .await
            .map_err(|err| err.with_context(format!("update {}/{id}", model.collection)))?;

        self.get::<E>(id).await
    }

    /// Soft delete when the shape declares a deletion flag, physical
    /// delete otherwise. Deleting an absent or already deleted id is a
    /// no-op either way.
    pub async fn delete<E: EntityShape + ?Sized>(&self, id: &str) -> Result<(), Error> {
        let model = E::MODEL;

        let result = match model.deleted_field {
            Some(flag) => {
                debug!(collection = model.collection, id, "soft delete");
                self.run_transaction(move |tx| async move {
                    tx.soft_delete_in(model, id, flag).await
                })
                .await
            }
            None => {
                debug!(collection = model.collection, id, "delete");
                self.backend.delete(model.collection, id).await
            }
        };

        result.map_err(|err| err.with_context(format!("delete {}/{id}", model.collection)))
    }

    /// Translate `opts` for `E` and run the resulting plan.
    pub async fn list<E: EntityShape + ?Sized>(
        &self,
        opts: &QueryOptions,
    ) -> Result<Vec<Record>, Error> {
        let model = E::MODEL;
        let plan = translate(opts, model)
            .map_err(|err| Error::from(err).with_context(format!("list {}", model.collection)))?;

        let docs = self
            .backend
            .query(model.collection, &plan)
            .await
            .map_err(|err| err.with_context(format!("list {}", model.collection)))?;
        debug!(collection = model.collection, hits = docs.len(), "list");

        Ok(docs.into_iter().map(Document::into_record).collect())
    }

    /// Run `body` inside one backend transaction.
    ///
    /// `Ok` commits every write staged through the [`Transaction`] handle;
    /// `Err` rolls them all back. The backend owns the retry policy: when
    /// the commit loses to a concurrent write it runs `body` again with a
    /// fresh handle, so `body` must be safe to repeat. Dropping the
    /// returned future before it completes never commits.
    pub async fn run_transaction<'a, T, F, Fut>(&self, mut body: F) -> Result<T, Error>
    where
        T: Send + 'a,
        F: FnMut(Transaction) -> Fut + Send + 'a,
        Fut: Future<Output = Result<T, Error>> + Send + 'a,
    {
        let output = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&output);

        let erased: TransactionBody<'a> = Box::new(move |tx| -> BoxFuture<'a, Result<(), Error>> {
            let attempt = body(tx);
            let slot = Arc::clone(&slot);

            Box::pin(async move {
                let value = attempt.await?;
                *slot.lock().await = Some(value);

                Ok(())
            })
        });
        self.backend.run_transaction(erased).await?;

        let value = output.lock().await.take();
        value.ok_or_else(|| Error::transaction_internal("transaction committed without a result"))
    }
}

///
/// HELPERS
/// Shared by the plain store and the transaction view.
///

// Entity payload as written: the id lives in the key, never in the data.
fn payload<E: EntityKind>(entity: &E) -> Result<Record, Error> {
    let mut data = entity.to_record()?;
    data.remove(ID_FIELD);

    Ok(data)
}

fn written_record(data: Record, written: WriteResult) -> Record {
    Document {
        id: written.id,
        data,
        create_time: written.update_time,
        update_time: written.update_time,
    }
    .into_record()
}

fn visible(model: &EntityModel, doc: Option<Document>) -> Option<Record> {
    doc.filter(|doc| !doc.is_soft_deleted(model.deleted_field))
        .map(Document::into_record)
}

fn split_found(
    model: &EntityModel,
    ids: &[String],
    docs: Vec<Option<Document>>,
) -> (Vec<Record>, Vec<String>) {
    let mut found = Vec::with_capacity(ids.len());
    let mut missing = Vec::new();

    for (id, doc) in ids.iter().zip(docs) {
        match visible(model, doc) {
            Some(record) => found.push(record),
            None => missing.push(id.clone()),
        }
    }

    (found, missing)
}
