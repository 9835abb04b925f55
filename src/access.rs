//! Who may read the notes of which course
//!
//! Access is always computed from the current state of the storage. Subscriptions change right
//! after a payment or a cancellation, so nothing here is cached.

use thiserror::Error;
use uuid::Uuid;

use crate::notes::Note;
use crate::storage;
use crate::storage::Storage;

/// Reasons notes are not handed out
#[derive(Debug, Error)]
pub enum AccessError {
    /// The course does not exist
    #[error("Course not found")]
    CourseNotFound,

    /// The user is known, but has no active subscription for the course
    #[error("Subscription required to view notes")]
    SubscriptionRequired,

    /// Storage failed
    #[error(transparent)]
    Storage(#[from] storage::Error),
}

/// Can the user read the notes of the course?
///
/// True when at least one active subscription links the user to the course, any number of active
/// subscriptions for the same pair count as one.
pub async fn can_access_notes<S: Storage>(
    storage: &S,
    user_id: &Uuid,
    course_id: &Uuid,
) -> storage::Result<bool> {
    let subscriptions = storage.find_all_subscriptions_by_user(user_id).await?;

    Ok(subscriptions
        .iter()
        .any(|subscription| subscription.grants_access_to(user_id, course_id)))
}

/// Fetch all notes of a course on behalf of a user
///
/// The list is complete, it is not filtered or truncated
pub async fn fetch_course_notes<S: Storage>(
    storage: &S,
    user_id: &Uuid,
    course_id: &Uuid,
) -> Result<Vec<Note>, AccessError> {
    let course = storage
        .find_single_course_by_id(course_id)
        .await?
        .ok_or(AccessError::CourseNotFound)?;

    if !can_access_notes(storage, user_id, &course.id).await? {
        tracing::debug!("User {user_id} has no subscription for {}", course.code);

        return Err(AccessError::SubscriptionRequired);
    }

    Ok(storage.find_all_notes_by_course(&course.id).await?)
}
