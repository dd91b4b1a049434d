use crate::{model::field::EntityFieldModel, traits::EntityShape};

///
/// EntityModel
/// Macro-generated runtime descriptor for one entity shape.
///

#[derive(Debug)]
pub struct EntityModel {
    /// Fully-qualified Rust type path (for diagnostics).
    pub path: &'static str,
    /// Collection the entity is stored in.
    pub collection: &'static str,
    /// Persisted fields, in declaration order. Skipped fields are absent.
    pub fields: &'static [EntityFieldModel],
    /// Storage name of the soft-delete flag, when the shape declares one.
    pub deleted_field: Option<&'static str>,
}

impl EntityModel {
    /// Descriptor for a shape; references and boxes resolve to their target.
    #[must_use]
    pub const fn of<E: EntityShape + ?Sized>() -> &'static Self {
        E::MODEL
    }

    /// Descriptor for the shape of a value.
    #[must_use]
    pub const fn of_val<E: EntityShape + ?Sized>(_value: &E) -> &'static Self {
        E::MODEL
    }

    #[must_use]
    pub const fn supports_soft_delete(&self) -> bool {
        self.deleted_field.is_some()
    }

    /// Look up a field by its storage name.
    #[must_use]
    pub fn field(&self, store_name: &str) -> Option<&EntityFieldModel> {
        self.fields.iter().find(|f| f.store_name == store_name)
    }
}
