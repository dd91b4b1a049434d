use proc_macro::TokenStream;

mod entity;

/// Derive `EntityShape`: a static entity descriptor built from the struct's
/// named fields.
///
/// Container: `#[entity(collection = "Member")]` (defaults to the type name).
/// Fields: `#[entity(skip)]` (or `name = "-"`), `#[entity(name = "stored_name")]`,
/// `#[entity(kind = "text" | "bool" | "numeric" | "collection" | "other")]`.
/// A persisted field named `deleted` marks the entity as soft-deletable;
/// skipping it is a compile error.
#[proc_macro_derive(Entity, attributes(entity))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    entity::derive_entity(input.into()).into()
}
