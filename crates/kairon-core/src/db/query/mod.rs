//! Query options, the textual filter grammar, and translation into a
//! backend-neutral [`QueryPlan`].
//!
//! Grammar (caller-facing):
//! - clauses are joined by a whitespace-delimited `AND`;
//! - `field:value` targets a storage field, `field:"two words"` keeps spaces;
//! - any other clause is free text matched against `name`;
//! - clauses naming fields the entity does not declare are ignored.

mod parse;
mod plan;
mod translate;


use crate::value::Value;
use thiserror::Error as ThisError;

pub use plan::{FilterOp, PageSpec, Predicate, QueryPlan, SortSpec};
pub use translate::translate;

///
/// CONSTANTS
///

/// Page size applied when the caller does not choose one.
pub const DEFAULT_LIMIT: usize = 20;

/// Field free-text clauses are matched against.
pub const DEFAULT_SEARCH_FIELD: &str = "name";

/// Keyword field whose values are stored upper-case.
pub const UPPERCASE_FIELD: &str = "terms";

///
/// QueryError
///
/// Translation failures. Surfaced as `ErrorClass::Translation`.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum QueryError {
    #[error("field '{field}' has kind {kind}, which query values cannot target")]
    UnsupportedFieldKind { field: String, kind: &'static str },

    #[error("field '{field}' expects a boolean, got '{value}'")]
    InvalidBool { field: String, value: String },

    #[error("limit must be greater than zero")]
    InvalidLimit,

    #[error("malformed range on '{field}': {reason}")]
    MalformedRange { field: String, reason: String },
}

///
/// SortDirection
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// Parse a caller label; only `ASC` (any case) sorts ascending.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        if label.eq_ignore_ascii_case("asc") {
            Self::Asc
        } else {
            Self::Desc
        }
    }
}

///
/// RangeSpec
///
/// Range on one field. One bound means `>= low`; two bounds mean the
/// half-open interval `[low, high)`.
///

#[derive(Clone, Debug, PartialEq)]
pub struct RangeSpec {
    pub field: String,
    pub bounds: Vec<Value>,
}

///
/// QueryOptions
///
/// Everything a caller can say about a list request.
///

#[derive(Clone, Debug, PartialEq)]
pub struct QueryOptions {
    pub filter: String,
    pub offset: usize,
    pub limit: usize,
    pub order_by: Option<String>,
    pub direction: Option<SortDirection>,
    pub range: Option<RangeSpec>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            filter: String::new(),
            offset: 0,
            limit: DEFAULT_LIMIT,
            order_by: None,
            direction: None,
            range: None,
        }
    }
}

impl QueryOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter(mut self, expr: impl Into<String>) -> Self {
        self.filter = expr.into();
        self
    }

    #[must_use]
    pub const fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, direction: Option<SortDirection>) -> Self {
        self.order_by = Some(field.into());
        self.direction = direction;
        self
    }

    #[must_use]
    pub fn range(mut self, field: impl Into<String>, bounds: Vec<Value>) -> Self {
        self.range = Some(RangeSpec {
            field: field.into(),
            bounds,
        });
        self
    }
}
