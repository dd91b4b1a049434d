use crate::{Entity, value::Value};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

///
/// Role
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Worker,
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Worker => "worker",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// User
/// Back-office staff account.
///

#[derive(Clone, Debug, Default, Deserialize, Entity, PartialEq, Serialize)]
#[entity(collection = "User")]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[entity(skip)]
    pub id: Option<String>,
    pub name: String,
    pub email: String,
    #[serde(default)]
    #[entity(kind = "text")]
    pub role: Role,
    #[serde(default)]
    pub deleted: bool,
}

impl User {
    /// Custom claims attached to the user's auth token.
    #[must_use]
    pub fn claims(&self) -> BTreeMap<String, Value> {
        BTreeMap::from([("role".to_string(), Value::from(self.role.as_str()))])
    }
}
