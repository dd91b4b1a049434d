//! Core runtime for Kairon: values and records, entity models, query
//! translation, the backend contract, the record store, and transactions.
#![warn(unreachable_pub)]

extern crate self as kairon;

// public exports are one module level down
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod obs;
pub mod traits;
pub mod value;

///
/// Prelude
///
/// Domain vocabulary only: shapes, records, values, and query options.
///

pub mod prelude {
    pub use crate::{
        db::{Db, Record, Transaction, UpdatePatch, query::QueryOptions, query::SortDirection},
        error::{Error, ErrorClass},
        model::entity::EntityModel,
        traits::{EntityKind, EntityShape},
        value::Value,
    };
}
