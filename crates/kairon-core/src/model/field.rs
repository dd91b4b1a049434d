///
/// EntityFieldModel
/// Runtime field metadata used by query translation.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EntityFieldModel {
    /// Field name as declared on the Rust type.
    pub name: &'static str,
    /// Field name as persisted and referenced by query clauses.
    pub store_name: &'static str,
    /// Primitive kind the stored value takes.
    pub kind: EntityFieldKind,
}

///
/// EntityFieldKind
///
/// Lossy projection of a field's declared type onto the kinds the
/// query translator distinguishes.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EntityFieldKind {
    Text,
    Bool,
    Numeric,
    /// Sequence of primitives; matched by membership.
    Collection,
    /// Anything else (nested records, timestamps, enums without a text override).
    Other,
}

impl EntityFieldKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Bool => "bool",
            Self::Numeric => "numeric",
            Self::Collection => "collection",
            Self::Other => "other",
        }
    }
}
