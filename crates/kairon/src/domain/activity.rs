use crate::Entity;
use serde::{Deserialize, Serialize};

///
/// Activity
///
/// A bookable class. `max_capacity` is the number of places still open:
/// reservations take one, releases give one back.
///

#[derive(Clone, Debug, Default, Deserialize, Entity, PartialEq, Serialize)]
#[entity(collection = "Activity")]
pub struct Activity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[entity(skip)]
    pub id: Option<String>,
    pub name: String,
    /// Minutes.
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub max_capacity: i64,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub deleted: bool,
}

impl Activity {
    pub const CAPACITY: &'static str = "max_capacity";

    #[must_use]
    pub const fn has_room(&self) -> bool {
        self.max_capacity > 0
    }
}
