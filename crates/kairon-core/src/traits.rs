use crate::{db::Record, error::Error, model::entity::EntityModel, value::Value};
use serde::{Serialize, de::DeserializeOwned};

///
/// EntityShape
///
/// Anything that can report an entity descriptor.
/// Implemented by `#[derive(Entity)]`; references and boxes forward to
/// their target so a shape and a pointer to it describe the same entity.
///

pub trait EntityShape {
    const MODEL: &'static EntityModel;
}

impl<T: EntityShape + ?Sized> EntityShape for &T {
    const MODEL: &'static EntityModel = T::MODEL;
}

impl<T: EntityShape + ?Sized> EntityShape for Box<T> {
    const MODEL: &'static EntityModel = T::MODEL;
}

///
/// EntityKind
///
/// Fully storable entity: a shape with a serde representation.
/// Conversion to and from [`Record`] goes through that representation.
///

pub trait EntityKind: EntityShape + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Project the entity onto an untyped record.
    fn to_record(&self) -> Result<Record, Error> {
        let json = serde_json::to_value(self).map_err(|err| {
            Error::serialize_internal(format!("{}: encode failed: {err}", Self::MODEL.path))
        })?;

        match Value::from(json) {
            Value::Map(map) => Ok(Record::from(map)),
            other => Err(Error::serialize_internal(format!(
                "{}: entity must encode as a map, got {}",
                Self::MODEL.path,
                other.kind_label()
            ))),
        }
    }

    /// Decode a stored record into the entity.
    fn from_record(record: Record) -> Result<Self, Error> {
        let id = record.id().unwrap_or_default().to_string();

        serde_json::from_value(record.to_json()).map_err(|err| {
            Error::serialize_corruption(format!(
                "{}/{id}: record does not decode into {}: {err}",
                Self::MODEL.collection,
                Self::MODEL.path
            ))
        })
    }
}

impl<T> EntityKind for T where T: EntityShape + Serialize + DeserializeOwned + Send + Sync + 'static
{}
