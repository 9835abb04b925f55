//! Subscription API management

use axum::Extension;
use chrono::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

use crate::payments::PaymentConfirmation;
use crate::payments::PaymentVerifier;
use crate::storage::Storage;
use crate::subscriptions;
use crate::subscriptions::Subscription;

use super::CurrentUser;
use super::Error;
use super::OptionalForm;
use super::PathParameters;
use super::Success;
use super::courses::fetch_course;

/// The subscription response information
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    id: Uuid,
    user_id: Uuid,
    course_id: Uuid,
    active: bool,
    start_date: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    payment_reference: Option<String>,
    updated_at: NaiveDateTime,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(subscription: Subscription) -> Self {
        Self {
            id: subscription.id,
            user_id: subscription.user_id,
            course_id: subscription.course_id,
            active: subscription.active,
            start_date: subscription.start_date,
            payment_reference: subscription.payment_reference,
            updated_at: subscription.updated_at,
        }
    }
}

/// Subscribe the current user to a course
///
/// The body holds the payment confirmation, it can be left out when payments are not verified.
/// Responds with `201 Created` for a new subscription and `200 OK` with the existing one when
/// the user is already subscribed.
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "reference": "MM-1234", "amount": 50, "signature": "abcdef..." }' \
///     http://localhost:6000/api/courses/<uuid>/subscribe
/// ```
pub async fn subscribe<S: Storage>(
    Extension(storage): Extension<S>,
    Extension(payment_verifier): Extension<PaymentVerifier>,
    current_user: CurrentUser<S>,
    PathParameters(course_id): PathParameters<Uuid>,
    OptionalForm(confirmation): OptionalForm<PaymentConfirmation>,
) -> Result<Success<SubscriptionResponse>, Error> {
    let course = fetch_course(&storage, &course_id).await?;

    let payment_reference = payment_verifier
        .verify(confirmation.as_ref(), &current_user, &course)
        .inspect_err(|err| {
            tracing::warn!("Payment of user {} rejected: {err}", current_user.id);
        })?;

    let subscribed = subscriptions::subscribe(
        &storage,
        &current_user,
        &course.id,
        payment_reference.as_deref(),
    )
    .await?;

    if subscribed.is_created() {
        Ok(Success::created(subscribed.into_subscription().into()))
    } else {
        Ok(Success::ok(subscribed.into_subscription().into()))
    }
}

/// List the active subscriptions of the current user
pub async fn list<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
) -> Result<Success<Vec<SubscriptionResponse>>, Error> {
    let subscriptions = subscriptions::active_subscriptions(&storage, &current_user.id).await?;

    Ok(Success::ok(subscriptions.into_iter().map(Into::into).collect()))
}

/// Cancel a subscription of the current user
///
/// The subscription is kept, but no longer active
pub async fn cancel<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
    PathParameters(subscription_id): PathParameters<Uuid>,
) -> Result<Success<SubscriptionResponse>, Error> {
    let subscription = subscriptions::cancel(&storage, &current_user, &subscription_id).await?;

    Ok(Success::ok(subscription.into()))
}
