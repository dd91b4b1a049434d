//! Entity shapes persisted by the back office.
//!
//! Every shape keeps its id outside the stored payload (`#[entity(skip)]`,
//! filled in on read) and carries the `deleted` soft-delete flag.

mod activity;
mod member;
mod membership;
mod order;
mod product;
mod report;
mod user;

#[cfg(test)]
mod tests;

pub use activity::Activity;
pub use member::{Member, MemberStatus};
pub use membership::Membership;
pub use order::{Order, OrderStatus, SelectedProduct};
pub use product::Product;
pub use report::FinancialReport;
pub use user::{Role, User};
