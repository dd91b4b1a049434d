use crate::{
    db::{Db, Record, Transaction, UpdatePatch, query::QueryOptions},
    error::Error,
    traits::EntityKind,
};
use std::marker::PhantomData;

///
/// Repository
///
/// Typed view of one entity's collection: the plain record store with every
/// result decoded into `E`.
///

pub struct Repository<E> {
    db: Db,
    _marker: PhantomData<fn() -> E>,
}

impl<E> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self::new(self.db.clone())
    }
}

impl<E> Repository<E> {
    #[must_use]
    pub const fn new(db: Db) -> Self {
        Self {
            db,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub const fn db(&self) -> &Db {
        &self.db
    }
}

impl<E: EntityKind> Repository<E> {
    pub async fn read(&self, id: &str) -> Result<E, Error> {
        decode(self.db.get::<E>(id).await?)
    }

    /// Decode the found records; missing ids are returned alongside.
    pub async fn read_many(&self, ids: &[String]) -> Result<(Vec<E>, Vec<String>), Error> {
        let (found, missing) = self.db.get_all::<E>(ids).await?;

        Ok((decode_all(found)?, missing))
    }

    pub async fn create(&self, entity: &E) -> Result<E, Error> {
        decode(self.db.create(entity).await?)
    }

    pub async fn create_with_id(&self, id: &str, entity: &E) -> Result<E, Error> {
        decode(self.db.create_with_id(id, entity).await?)
    }

    pub async fn update(&self, id: &str, patch: &UpdatePatch) -> Result<E, Error> {
        decode(self.db.update::<E>(id, patch).await?)
    }

    pub async fn delete(&self, id: &str) -> Result<(), Error> {
        self.db.delete::<E>(id).await
    }

    pub async fn list(&self, opts: &QueryOptions) -> Result<Vec<E>, Error> {
        decode_all(self.db.list::<E>(opts).await?)
    }

    /// Transactional point read, decoded.
    pub async fn read_in(&self, tx: &Transaction, id: &str) -> Result<E, Error> {
        decode(tx.get::<E>(id).await?)
    }
}

pub(crate) fn decode<E: EntityKind>(record: Record) -> Result<E, Error> {
    E::from_record(record)
}

fn decode_all<E: EntityKind>(records: Vec<Record>) -> Result<Vec<E>, Error> {
    records.into_iter().map(decode).collect()
}
