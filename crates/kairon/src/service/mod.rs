//! Domain services.
//!
//! Anything that reads a counter and writes it back (stock, capacity,
//! order status) runs inside one store transaction; the plain repository
//! paths are only used where no invariant is at stake.

mod activity;
mod member;
mod order;
mod report;

pub use activity::ActivityService;
pub use member::MemberService;
pub use order::OrderService;
pub use report::{REPORT_PAGE_SIZE, ReportService, parse_report_date};
