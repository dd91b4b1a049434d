use crate::Entity;
use serde::{Deserialize, Serialize};

///
/// Product
///
/// Sellable item. `stock` is decremented by order placement and never goes
/// negative; `infinite_stock` exempts the product from the check entirely.
///

#[derive(Clone, Debug, Default, Deserialize, Entity, PartialEq, Serialize)]
#[entity(collection = "Product")]
pub struct Product {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[entity(skip)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub infinite_stock: bool,
    #[serde(default)]
    pub deleted: bool,
}

impl Product {
    /// Storage name of the stock counter.
    pub const STOCK: &'static str = "stock";

    /// Whether `quantity` units can be taken right now.
    #[must_use]
    pub const fn can_supply(&self, quantity: i64) -> bool {
        self.infinite_stock || self.stock >= quantity
    }
}
