use crate::db::query::QueryError;
use std::fmt;
use thiserror::Error as ThisError;

///
/// Error
///
/// Structured runtime error with a stable classification.
/// `class` is what callers branch on; `origin` and `detail` are diagnostics.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct Error {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,

    /// Optional structured error detail.
    pub detail: Option<ErrorDetail>,
}

impl Error {
    /// Construct an error without structured detail.
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            detail: None,
        }
    }

    /// Read of an absent or soft-deleted record.
    pub fn not_found(collection: &str, id: &str) -> Self {
        Self {
            class: ErrorClass::NotFound,
            origin: ErrorOrigin::Store,
            message: format!("record not found: {collection}/{id}"),
            detail: Some(ErrorDetail::Store(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })),
        }
    }

    /// Create-with-id collision.
    pub fn already_exists(collection: &str, id: &str) -> Self {
        Self {
            class: ErrorClass::Conflict,
            origin: ErrorOrigin::Store,
            message: format!("record already exists: {collection}/{id}"),
            detail: Some(ErrorDetail::Store(StoreError::AlreadyExists {
                collection: collection.to_string(),
                id: id.to_string(),
            })),
        }
    }

    /// Transaction aborted because a document it read changed before commit.
    pub fn transaction_conflict(collection: &str, id: &str) -> Self {
        Self {
            class: ErrorClass::Conflict,
            origin: ErrorOrigin::Transaction,
            message: format!("transaction aborted: concurrent modification of {collection}/{id}"),
            detail: Some(ErrorDetail::Store(StoreError::VersionMismatch {
                collection: collection.to_string(),
                id: id.to_string(),
            })),
        }
    }

    /// Transaction that kept losing its commit to concurrent writers.
    /// Keeps the detail of the last conflict.
    pub fn transaction_aborted(attempts: u32, last: Self) -> Self {
        Self {
            class: ErrorClass::Aborted,
            origin: ErrorOrigin::Transaction,
            message: format!(
                "transaction aborted after {attempts} attempts: {}",
                last.message
            ),
            detail: last.detail,
        }
    }

    pub fn conflict(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Conflict, origin, message)
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvalidState, ErrorOrigin::Domain, message)
    }

    pub fn insufficient_resource(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InsufficientResource, ErrorOrigin::Domain, message)
    }

    /// Caller input the domain rejects before touching storage.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvalidInput, ErrorOrigin::Domain, message)
    }

    /// No usable backend client (unconfigured, closed, or unreachable).
    pub fn unavailable(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unavailable, origin, message)
    }

    /// Construct a serialize-origin corruption error.
    pub(crate) fn serialize_corruption(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Corruption, ErrorOrigin::Serialize, message)
    }

    /// Construct a serialize-origin internal error.
    pub(crate) fn serialize_internal(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, ErrorOrigin::Serialize, message)
    }

    /// Construct a transaction-origin internal error.
    pub(crate) fn transaction_internal(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, ErrorOrigin::Transaction, message)
    }

    /// Prefix the message with operation context; class and detail are kept.
    #[must_use]
    pub fn with_context(mut self, context: impl fmt::Display) -> Self {
        self.message = format!("{context}: {}", self.message);
        self
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.class, ErrorClass::NotFound)
    }

    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self.class, ErrorClass::Conflict)
    }

    /// Whether this is a commit lost to a concurrent write, the one
    /// failure a transaction retry can cure.
    #[must_use]
    pub const fn is_version_mismatch(&self) -> bool {
        matches!(
            &self.detail,
            Some(ErrorDetail::Store(StoreError::VersionMismatch { .. }))
        )
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        Self {
            class: ErrorClass::Translation,
            origin: ErrorOrigin::Query,
            message: err.to_string(),
            detail: Some(ErrorDetail::Query(err)),
        }
    }
}

///
/// ErrorDetail
///
/// Structured, origin-specific error detail carried by [`Error`].
///

#[derive(Debug, ThisError)]
pub enum ErrorDetail {
    #[error("{0}")]
    Store(StoreError),
    #[error("{0}")]
    Query(QueryError),
}

///
/// StoreError
///
/// Store-specific structured error detail.
/// Never returned directly; always wrapped in [`ErrorDetail::Store`].
///

#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("record not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("record already exists: {collection}/{id}")]
    AlreadyExists { collection: String, id: String },

    #[error("version mismatch on {collection}/{id}")]
    VersionMismatch { collection: String, id: String },
}

///
/// ErrorClass
/// Error taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    NotFound,
    Conflict,
    InvalidState,
    InsufficientResource,
    InvalidInput,
    /// Transaction retries exhausted.
    Aborted,
    Translation,
    Unavailable,
    Corruption,
    Internal,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::InvalidState => "invalid_state",
            Self::InsufficientResource => "insufficient_resource",
            Self::InvalidInput => "invalid_input",
            Self::Aborted => "aborted",
            Self::Translation => "translation",
            Self::Unavailable => "unavailable",
            Self::Corruption => "corruption",
            Self::Internal => "internal",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Origin taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Query,
    Store,
    Backend,
    Transaction,
    Serialize,
    Domain,
    Config,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Query => "query",
            Self::Store => "store",
            Self::Backend => "backend",
            Self::Transaction => "transaction",
            Self::Serialize => "serialize",
            Self::Domain => "domain",
            Self::Config => "config",
        };
        write!(f, "{label}")
    }
}
