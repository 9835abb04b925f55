//! API response helpers

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use serde::Serialize;

use crate::access::AccessError;
use crate::payments::PaymentError;
use crate::storage;
use crate::subscriptions::SubscribeError;
use crate::users::User;

/// Hold data for a successful API interaction
pub struct Success<V>
where
    V: Serialize,
{
    status_code: StatusCode,
    data: Option<V>,
}

impl<V> Success<V>
where
    V: Serialize,
{
    pub fn ok(data: V) -> Self {
        Self {
            status_code: StatusCode::OK,
            data: Some(data),
        }
    }

    pub fn created(data: V) -> Self {
        Self {
            status_code: StatusCode::CREATED,
            data: Some(data),
        }
    }

    pub fn no_content() -> Self {
        Self {
            status_code: StatusCode::NO_CONTENT,
            data: None,
        }
    }
}

#[derive(Serialize)]
struct DataWrapper<D>
where
    D: Serialize,
{
    data: D,
}

impl<V> IntoResponse for Success<V>
where
    V: Serialize,
{
    fn into_response(self) -> Response {
        if let Some(data) = self.data {
            (self.status_code, Json(DataWrapper { data })).into_response()
        } else {
            self.status_code.into_response()
        }
    }
}

/// Hold data for a failed API interaction
#[derive(Debug)]
pub struct Error {
    status_code: StatusCode,
    message: String,
    description: Option<String>,
}

impl Error {
    fn new<M>(status_code: StatusCode, message: M) -> Self
    where
        M: ToString,
    {
        Self {
            status_code,
            message: message.to_string(),
            description: None,
        }
    }

    pub fn bad_request<M>(message: M) -> Self
    where
        M: ToString,
    {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// The caller could not be identified, the client should log in
    pub fn unauthorized<M>(message: M) -> Self
    where
        M: ToString,
    {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// The payment did not go through, the client should retry checkout
    pub fn payment_required<M>(message: M) -> Self
    where
        M: ToString,
    {
        Self::new(StatusCode::PAYMENT_REQUIRED, message)
    }

    pub fn forbidden<M>(message: M) -> Self
    where
        M: ToString,
    {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found<M>(message: M) -> Self
    where
        M: ToString,
    {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal_server_error<M>(message: M) -> Self
    where
        M: ToString,
    {
        let message = message.to_string();

        tracing::error!("Internal server error: {message}");

        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    #[must_use]
    pub fn with_description<M>(self, description: M) -> Self
    where
        M: ToString,
    {
        Self {
            description: Some(description.to_string()),
            ..self
        }
    }
}

#[derive(Serialize)]
struct ErrorWrapper<D>
where
    D: Serialize,
{
    error: D,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<D>,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (
            self.status_code,
            Json(ErrorWrapper {
                error: self.message,
                description: self.description,
            }),
        )
            .into_response()
    }
}

impl From<storage::Error> for Error {
    fn from(err: storage::Error) -> Self {
        match err {
            storage::Error::Conflict(what) => Error::bad_request(format!("The {what} is taken")),
            storage::Error::Connection(_) => Error::internal_server_error(err),
        }
    }
}

impl From<AccessError> for Error {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::CourseNotFound => Error::not_found(err),
            AccessError::SubscriptionRequired => Error::forbidden(err),
            AccessError::Storage(err) => err.into(),
        }
    }
}

impl From<SubscribeError> for Error {
    fn from(err: SubscribeError) -> Self {
        match err {
            SubscribeError::CourseNotFound | SubscribeError::SubscriptionNotFound => {
                Error::not_found(err)
            }
            SubscribeError::PaymentAlreadyUsed => Error::payment_required(err),
            SubscribeError::Storage(err) => err.into(),
        }
    }
}

impl From<PaymentError> for Error {
    fn from(err: PaymentError) -> Self {
        Error::payment_required(err)
    }
}

/// Only providers publish
pub fn require_provider(user: &User) -> Result<(), Error> {
    if user.is_provider() {
        Ok(())
    } else {
        Err(Error::forbidden("Not allowed to access"))
    }
}
