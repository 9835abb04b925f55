//! Users of the marketplace

use chrono::naive::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Rating every new user starts with
pub const DEFAULT_RATING: i16 = 5;

/// User roles
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Reads notes of subscribed courses
    #[default]
    Subscriber,
    /// Publishes courses and notes
    Provider,
}

#[derive(Clone, Debug)]
pub struct User {
    pub id: Uuid,
    pub session_id: Uuid,
    pub username: String,
    pub hashed_password: String,
    pub name: String,
    pub role: Role,
    /// Used for mobile money payments
    pub phone_number: Option<String>,
    pub university: Option<String>,
    pub school: Option<String>,
    pub student_id: Option<String>,
    pub bio: Option<String>,
    /// 1 to 5 stars
    pub rating: i16,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub deleted_at: Option<NaiveDateTime>,
}

impl User {
    /// Is the user soft-disabled?
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Can the user publish courses and notes?
    pub fn is_provider(&self) -> bool {
        self.role == Role::Provider
    }
}
