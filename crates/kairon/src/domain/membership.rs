use crate::Entity;
use serde::{Deserialize, Serialize};

///
/// Membership
/// A plan members subscribe to.
///

#[derive(Clone, Debug, Default, Deserialize, Entity, PartialEq, Serialize)]
#[entity(collection = "Membership")]
pub struct Membership {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[entity(skip)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub deleted: bool,
}
