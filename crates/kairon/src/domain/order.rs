use crate::Entity;
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// OrderStatus
///
/// `pending -> paid` and `pending -> cancelled`; both targets are terminal.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Cancelled,
}

impl OrderStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
        }
    }

    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Paid | Self::Cancelled)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// SelectedProduct
/// One order line.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct SelectedProduct {
    pub id: String,
    pub quantity: i64,
    #[serde(default)]
    pub price: f64,
}

///
/// Order
///
/// A purchase by a member. `created` is a unix timestamp in seconds set
/// by the server when the order is placed.
///

#[derive(Clone, Debug, Default, Deserialize, Entity, PartialEq, Serialize)]
#[entity(collection = "Order")]
pub struct Order {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[entity(skip)]
    pub id: Option<String>,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    #[entity(kind = "other")]
    pub products: Vec<SelectedProduct>,
    #[serde(default)]
    #[entity(kind = "text")]
    pub status: OrderStatus,
    pub member_id: String,
    #[serde(default)]
    pub deleted: bool,
}

impl Order {
    pub const CREATED: &'static str = "created";
    pub const STATUS: &'static str = "status";
}
