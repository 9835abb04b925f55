//! All API endpoint setup

use axum::Router;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::post;

pub use current_user::CurrentUser;
pub use current_user::JwtKeys;
pub use request::Form;
pub use request::OptionalForm;
pub use request::PathParameters;
pub use request::parse_course_code;
pub use request::parse_price;
pub use request::parse_required;
pub use request::parse_url;
pub use response::Error;
pub use response::Success;
pub use response::require_provider;

use crate::storage::Storage;

mod courses;
mod current_user;
mod notes;
mod request;
mod response;
mod subscriptions;
mod users;

/// Get the Axum router for all API routes
pub fn router<S: Storage>() -> Router {
    let users = Router::new()
        .route("/", post(users::create::<S>))
        .route("/token", post(users::token::<S>))
        .route(
            "/me",
            get(users::me::<S>)
                .patch(users::update_me::<S>)
                .delete(users::delete_me::<S>),
        );

    let courses = Router::new()
        .route("/", get(courses::list::<S>).post(courses::create::<S>))
        .route(
            "/{course}",
            get(courses::single::<S>).patch(courses::update::<S>),
        )
        .route("/{course}/subscribe", post(subscriptions::subscribe::<S>))
        .route(
            "/{course}/notes",
            get(notes::list::<S>).post(notes::create::<S>),
        );

    let subscriptions = Router::new()
        .route("/", get(subscriptions::list::<S>))
        .route("/{subscription}", delete(subscriptions::cancel::<S>));

    Router::new()
        .nest("/users", users)
        .nest("/courses", courses)
        .nest("/subscriptions", subscriptions)
}
