use chrono::naive::NaiveDateTime;
use uuid::Uuid;

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Course {
    pub id: Uuid,
    /// Human readable code, like "MATH 1110"
    pub code: String,
    pub title: String,
    pub description: Option<String>,
    /// Whole currency units, always positive
    pub price: i64,
    /// The provider owning the course
    pub provider_id: Uuid,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Course {
    /// Is the course owned by the given user?
    pub fn is_owned_by(&self, user_id: &Uuid) -> bool {
        &self.provider_id == user_id
    }
}
