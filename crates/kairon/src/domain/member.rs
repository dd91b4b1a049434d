use crate::Entity;
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// MemberStatus
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    #[default]
    Active,
    Inactive,
}

impl MemberStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// Member
///
/// A gym member. `activity_list` holds the ids of the activities the member
/// has reserved; it only changes through the reservation service so that
/// it always agrees with each activity's remaining capacity.
///

#[derive(Clone, Debug, Default, Deserialize, Entity, PartialEq, Serialize)]
#[entity(collection = "Member")]
pub struct Member {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[entity(skip)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    #[entity(kind = "text")]
    pub status: MemberStatus,
    pub membership_id: String,
    #[serde(default)]
    pub activity_list: Vec<String>,
    #[serde(default)]
    pub deleted: bool,
}

impl Member {
    pub const MEMBERSHIP_ID: &'static str = "membership_id";
    pub const ACTIVITY_LIST: &'static str = "activity_list";

    #[must_use]
    pub fn holds(&self, activity_id: &str) -> bool {
        self.activity_list.iter().any(|id| id == activity_id)
    }
}
