//! All things related to the storage of users, courses, notes and subscriptions

use thiserror::Error;
use uuid::Uuid;

use crate::courses::Course;
use crate::notes::Note;
use crate::notes::NoteKind;
use crate::subscriptions::Subscribed;
use crate::subscriptions::Subscription;
use crate::users::Role;
use crate::users::User;

pub use memory::Memory;
pub use postgres::Postgres;

mod memory;
mod postgres;

/// Storage errors
#[derive(Debug, Error)]
pub enum Error {
    /// A connection error with the storage
    #[error("Connection error: {0}")]
    Connection(String),

    /// A unique value is already taken
    #[error("Conflict: {0}")]
    Conflict(&'static str),
}

/// The unique value of a payment, a payment pays for one subscription
pub const PAYMENT_REFERENCE: &str = "payment reference";

/// Result type for all storage interactions
pub type Result<T> = core::result::Result<T, Error>;

/// Values to create a User
pub struct CreateUserValues<'a> {
    /// The initial session ID for the user
    pub session_id: &'a Uuid,

    /// The role of the user
    pub role: Role,

    /// The username
    pub username: &'a str,

    /// The hashed password
    pub hashed_password: &'a str,

    /// Display name
    pub name: &'a str,

    /// Mobile money number
    pub phone_number: Option<&'a str>,

    /// University the user attends
    pub university: Option<&'a str>,

    /// School or faculty within the university
    pub school: Option<&'a str>,

    /// Student number
    pub student_id: Option<&'a str>,
}

/// Values to update the profile of a user
///
/// Fields left `None` keep their current value
#[derive(Default)]
pub struct UpdateUserValues<'a> {
    pub name: Option<&'a str>,
    pub phone_number: Option<&'a str>,
    pub university: Option<&'a str>,
    pub school: Option<&'a str>,
    pub student_id: Option<&'a str>,
    pub bio: Option<&'a str>,
}

/// Values to create a Course
pub struct CreateCourseValues<'a> {
    /// The provider owning the course
    pub provider: &'a User,

    /// Unique course code
    pub code: &'a str,

    /// Title of the course
    pub title: &'a str,

    /// Optional description
    pub description: Option<&'a str>,

    /// Price in whole units
    pub price: i64,
}

/// Values to update a Course
#[derive(Default)]
pub struct UpdateCourseValues<'a> {
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub price: Option<i64>,
}

/// Values to create a Note
pub struct CreateNoteValues<'a> {
    /// Provider publishing the note
    pub provider: &'a User,

    /// Title of the note
    pub title: &'a str,

    /// Kind of content
    pub kind: NoteKind,

    /// Locator of the asset
    pub url: &'a str,
}

/// Values to create a Subscription
pub struct CreateSubscriptionValues<'a> {
    /// The subscribing user
    pub user: &'a User,

    /// The course subscribed to
    pub course: &'a Course,

    /// Reference of the confirmed payment, if any
    pub payment_reference: Option<&'a str>,
}

/// Storage with all supported operations
#[async_trait::async_trait]
pub trait Storage: Clone + Send + Sync + 'static {
    /// Finds a single user by its ID
    ///
    /// Respects the soft-delete
    async fn find_single_user_by_id(&self, id: &Uuid) -> Result<Option<User>>;

    /// Finds a single user by its username
    ///
    /// DOES NOT respect the soft-delete, usernames stay taken
    async fn find_single_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Create a single user
    async fn create_user(&self, values: &CreateUserValues<'_>) -> Result<User>;

    /// Update the profile of a user
    async fn update_user(&self, user: &User, values: &UpdateUserValues<'_>) -> Result<User>;

    /// Soft-delete a user
    async fn delete_user(&self, user: &User) -> Result<()>;

    /// Find all courses, ordered by code
    async fn find_all_courses(&self) -> Result<Vec<Course>>;

    /// Find a single course by ID
    async fn find_single_course_by_id(&self, id: &Uuid) -> Result<Option<Course>>;

    /// Find a single course by its code
    async fn find_single_course_by_code(&self, code: &str) -> Result<Option<Course>>;

    /// Create a course
    async fn create_course(&self, values: &CreateCourseValues<'_>) -> Result<Course>;

    /// Update a course
    async fn update_course(
        &self,
        course: &Course,
        values: &UpdateCourseValues<'_>,
    ) -> Result<Course>;

    /// Find all notes of a course, in no particular order
    async fn find_all_notes_by_course(&self, course_id: &Uuid) -> Result<Vec<Note>>;

    /// Create a note for an existing course
    async fn create_note(&self, course: &Course, values: &CreateNoteValues<'_>) -> Result<Note>;

    /// Find all subscriptions of a user, active or not
    async fn find_all_subscriptions_by_user(&self, user_id: &Uuid) -> Result<Vec<Subscription>>;

    /// Find a single subscription by ID
    async fn find_single_subscription_by_id(&self, id: &Uuid) -> Result<Option<Subscription>>;

    /// Create an active subscription, unless the user already has one for the course
    ///
    /// Checking and inserting is a single atomic step
    async fn create_subscription(
        &self,
        values: &CreateSubscriptionValues<'_>,
    ) -> Result<Subscribed>;

    /// Mark a subscription as no longer active
    async fn deactivate_subscription(&self, subscription: &Subscription) -> Result<Subscription>;
}
