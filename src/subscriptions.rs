//! Subscriptions and their lifecycle
//!
//! A subscription is created once a payment is confirmed and stays active until it is cancelled.
//! Payment verification happens before [`subscribe`] is called, never inside it.

use chrono::naive::NaiveDateTime;
use thiserror::Error;
use uuid::Uuid;

use crate::storage;
use crate::storage::CreateSubscriptionValues;
use crate::storage::Storage;
use crate::users::User;

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub active: bool,
    pub start_date: NaiveDateTime,
    /// Reference of the payment that paid for it
    pub payment_reference: Option<String>,
    pub updated_at: NaiveDateTime,
}

impl Subscription {
    /// Only the `active` flag counts, the start date never does
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Does this subscription let its user read the notes of the course?
    pub fn grants_access_to(&self, user_id: &Uuid, course_id: &Uuid) -> bool {
        self.is_active() && &self.user_id == user_id && &self.course_id == course_id
    }
}

/// Outcome of subscribing a user to a course
#[derive(Clone, Debug)]
pub enum Subscribed {
    /// A new active subscription was created
    Created(Subscription),

    /// The user already had an active subscription, it is returned as is
    AlreadyActive(Subscription),
}

impl Subscribed {
    /// Was a new subscription created?
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }

    /// The subscription, new or existing
    pub fn into_subscription(self) -> Subscription {
        match self {
            Self::Created(subscription) | Self::AlreadyActive(subscription) => subscription,
        }
    }
}

/// Subscription lifecycle errors
#[derive(Debug, Error)]
pub enum SubscribeError {
    /// The course does not exist
    #[error("Course not found")]
    CourseNotFound,

    /// The subscription does not exist or belongs to someone else
    #[error("Subscription not found")]
    SubscriptionNotFound,

    /// The payment already paid for another subscription
    #[error("Payment was already used")]
    PaymentAlreadyUsed,

    /// Storage failed
    #[error(transparent)]
    Storage(#[from] storage::Error),
}

/// Subscribe a user to a course
///
/// A second call for a pair with an active subscription returns that subscription instead of
/// creating another one.
pub async fn subscribe<S: Storage>(
    storage: &S,
    user: &User,
    course_id: &Uuid,
    payment_reference: Option<&str>,
) -> Result<Subscribed, SubscribeError> {
    let course = storage
        .find_single_course_by_id(course_id)
        .await?
        .ok_or(SubscribeError::CourseNotFound)?;

    let values = CreateSubscriptionValues {
        user,
        course: &course,
        payment_reference,
    };

    let subscribed = match storage.create_subscription(&values).await {
        Err(storage::Error::Conflict(storage::PAYMENT_REFERENCE)) => {
            return Err(SubscribeError::PaymentAlreadyUsed);
        }
        result => result?,
    };

    match &subscribed {
        Subscribed::Created(subscription) => tracing::info!(
            "User {} subscribed to {} ({})",
            user.id,
            course.code,
            subscription.id
        ),
        Subscribed::AlreadyActive(subscription) => tracing::debug!(
            "User {} already subscribed to {} ({})",
            user.id,
            course.code,
            subscription.id
        ),
    }

    Ok(subscribed)
}

/// All active subscriptions of a user
pub async fn active_subscriptions<S: Storage>(
    storage: &S,
    user_id: &Uuid,
) -> storage::Result<Vec<Subscription>> {
    let mut subscriptions = storage.find_all_subscriptions_by_user(user_id).await?;

    subscriptions.retain(Subscription::is_active);

    Ok(subscriptions)
}

/// Cancel a subscription of a user, access is revoked right away
///
/// Cancelling an inactive subscription is a no-op
pub async fn cancel<S: Storage>(
    storage: &S,
    user: &User,
    subscription_id: &Uuid,
) -> Result<Subscription, SubscribeError> {
    let subscription = storage
        .find_single_subscription_by_id(subscription_id)
        .await?
        .filter(|subscription| subscription.user_id == user.id)
        .ok_or(SubscribeError::SubscriptionNotFound)?;

    if !subscription.is_active() {
        return Ok(subscription);
    }

    let subscription = storage.deactivate_subscription(&subscription).await?;

    tracing::info!("User {} cancelled subscription {}", user.id, subscription.id);

    Ok(subscription)
}
