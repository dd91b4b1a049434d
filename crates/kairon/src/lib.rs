//! Kairon: membership and commerce back office.
//!
//! This is the public meta-crate. It re-exports the runtime from
//! `kairon-core` and the `Entity` derive from `kairon-derive`, and adds the
//! gym domain on top: entity shapes, typed repositories, and the services
//! that keep stock and capacity counters consistent.

extern crate self as kairon;

pub mod domain;
pub mod repo;
pub mod service;

pub use kairon_core::{config, db, error, model, obs, traits, value};
pub use kairon_derive::Entity;

pub use error::Error;

//
// Prelude
//

pub mod prelude {
    pub use crate::{
        Entity,
        domain::{
            Activity, FinancialReport, Member, MemberStatus, Membership, Order, OrderStatus,
            Product, Role, SelectedProduct, User,
        },
        repo::Repository,
        service::{ActivityService, MemberService, OrderService, ReportService},
    };
    pub use kairon_core::prelude::*;
}
