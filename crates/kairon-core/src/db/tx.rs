use crate::{
    db::{
        Document, Record, UpdatePatch,
        backend::BackendTransaction,
        payload,
        query::{QueryOptions, translate},
        split_found, visible, written_record,
    },
    error::Error,
    model::entity::EntityModel,
    traits::{EntityKind, EntityShape},
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

///
/// Transaction
///
/// Handle passed to a [`Db::run_transaction`](crate::db::Db::run_transaction)
/// body. Operations mirror the plain store but are bound to one backend
/// transaction: reads see this transaction's own writes, and nothing is
/// visible elsewhere until the body returns `Ok`.
///
/// Clones share the same backend transaction. Using a handle after its
/// scope has finished fails with an internal error.
///

#[derive(Clone)]
pub struct Transaction {
    inner: Arc<Mutex<Option<Box<dyn BackendTransaction>>>>,
}

impl Transaction {
    pub(crate) fn new(handle: Box<dyn BackendTransaction>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(handle))),
        }
    }

    pub async fn get<E: EntityShape + ?Sized>(&self, id: &str) -> Result<Record, Error> {
        self.get_in(E::MODEL, id).await
    }

    pub async fn get_all<E: EntityShape + ?Sized>(
        &self,
        ids: &[String],
    ) -> Result<(Vec<Record>, Vec<String>), Error> {
        let model = E::MODEL;
        debug!(collection = model.collection, count = ids.len(), "tx get_all");

        let docs = open(&mut *self.inner.lock().await)?
            .get_all(model.collection, ids)
            .await
            .map_err(|err| err.with_context(format!("tx get_all {}", model.collection)))?;

        Ok(split_found(model, ids, docs))
    }

    pub async fn create<E: EntityKind>(&self, entity: &E) -> Result<Record, Error> {
        let model = E::MODEL;
        let data = payload(entity)?;

        let written = open(&mut *self.inner.lock().await)?
            .create(model.collection, data.clone())
            .await
            .map_err(|err| err.with_context(format!("tx create {}", model.collection)))?;
        debug!(collection = model.collection, id = %written.id, "tx created");

        Ok(written_record(data, written))
    }

    pub async fn create_with_id<E: EntityKind>(&self, id: &str, entity: &E) -> Result<Record, Error> {
        let model = E::MODEL;
        let data = payload(entity)?;

        let written = open(&mut *self.inner.lock().await)?
            .create_with_id(model.collection, id, data.clone())
            .await
            .map_err(|err| err.with_context(format!("tx create {}/{id}", model.collection)))?;
        debug!(collection = model.collection, id, "tx created");

        Ok(written_record(data, written))
    }

    /// Stage field-level replacements and return the record as this
    /// transaction now sees it. A soft-deleted record is `NotFound` and is
    /// not written.
    pub async fn update<E: EntityShape + ?Sized>(
        &self,
        id: &str,
        patch: &UpdatePatch,
    ) -> Result<Record, Error> {
        self.update_in(E::MODEL, id, patch).await
    }

    pub(crate) async fn get_in(&self, model: &'static EntityModel, id: &str) -> Result<Record, Error> {
        debug!(collection = model.collection, id, "tx get");

        let doc = open(&mut *self.inner.lock().await)?
            .get(model.collection, id)
            .await
            .map_err(|err| err.with_context(format!("tx get {}/{id}", model.collection)))?;

        visible(model, doc).ok_or_else(|| Error::not_found(model.collection, id))
    }

    pub(crate) async fn update_in(
        &self,
        model: &'static EntityModel,
        id: &str,
        patch: &UpdatePatch,
    ) -> Result<Record, Error> {
        debug!(collection = model.collection, id, fields = patch.len(), "tx update");

        if model.deleted_field.is_some() {
            self.get_in(model, id).await?;
        }

        open(&mut *self.inner.lock().await)?
            .update(model.collection, id, patch)
            .await
            .map_err(|err| err.with_context(format!("tx update {}/{id}", model.collection)))?;

        self.get_in(model, id).await
    }

    /// Set the shape's deletion flag. Absent and already deleted records
    /// are left alone.
    pub(crate) async fn soft_delete_in(
        &self,
        model: &'static EntityModel,
        id: &str,
        flag: &'static str,
    ) -> Result<(), Error> {
        match self.get_in(model, id).await {
            Ok(_) => {}
            Err(err) if err.is_not_found() => {
                debug!(collection = model.collection, id, "tx soft delete of missing record");
                return Ok(());
            }
            Err(err) => return Err(err),
        }

        open(&mut *self.inner.lock().await)?
            .update(model.collection, id, &UpdatePatch::new().set(flag, true))
            .await
            .map_err(|err| err.with_context(format!("tx delete {}/{id}", model.collection)))?;
        debug!(collection = model.collection, id, "tx soft deleted");

        Ok(())
    }

    pub async fn list<E: EntityShape + ?Sized>(
        &self,
        opts: &QueryOptions,
    ) -> Result<Vec<Record>, Error> {
        let model = E::MODEL;
        let plan = translate(opts, model).map_err(|err| {
            Error::from(err).with_context(format!("tx list {}", model.collection))
        })?;

        let docs = open(&mut *self.inner.lock().await)?
            .query(model.collection, &plan)
            .await
            .map_err(|err| err.with_context(format!("tx list {}", model.collection)))?;
        debug!(collection = model.collection, hits = docs.len(), "tx list");

        Ok(docs.into_iter().map(Document::into_record).collect())
    }

    pub(crate) async fn commit(&self) -> Result<(), Error> {
        let handle = self.take().await?;
        handle.commit().await
    }

    pub(crate) async fn rollback(&self) {
        if let Ok(handle) = self.take().await {
            handle.rollback().await;
        }
    }

    async fn take(&self) -> Result<Box<dyn BackendTransaction>, Error> {
        self.inner
            .lock()
            .await
            .take()
            .ok_or_else(|| Error::transaction_internal("transaction already finished"))
    }
}

fn open(
    slot: &mut Option<Box<dyn BackendTransaction>>,
) -> Result<&mut (dyn BackendTransaction + 'static), Error> {
    slot.as_deref_mut()
        .ok_or_else(|| Error::transaction_internal("transaction already finished"))
}
