//! User API management

use axum::Extension;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::password::MIN_PASSWORD_LENGTH;
use crate::password::hash;
use crate::password::verify;
use crate::storage::CreateUserValues;
use crate::storage::Storage;
use crate::storage::UpdateUserValues;
use crate::users::Role;
use crate::users::User;

use super::CurrentUser;
use super::Error;
use super::Form;
use super::JwtKeys;
use super::Success;
use super::current_user::Token;
use super::current_user::generate_token;
use super::request::parse_required;

/// The user response information
///
/// A subset of all the information, ready to be serialized for the outside world
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// The user ID
    pub id: Uuid,

    /// The username
    pub username: String,

    /// Display name
    pub name: String,

    /// The role of the user
    pub role: Role,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub university: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,

    /// 1 to 5 stars
    pub rating: i16,

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl UserResponse {
    /// Create a user response from a [`User`](User)
    fn from_user(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            name: user.name,
            role: user.role,
            phone_number: user.phone_number,
            university: user.university,
            school: user.school,
            student_id: user.student_id,
            bio: user.bio,
            rating: user.rating,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Login form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginForm {
    /// Username of the user
    username: String,
    /// Password of the user
    password: String,
}

/// Get a token for a user "session"
///
/// The token can then be used to access the rest of the API routes by using it in the
/// `Authorization` header
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -d '{ "username": "alice", "password": "verysecret" }' \
///     http://localhost:6000/api/users/token
/// ```
///
/// Response
/// ```json
/// { "data": { "token_type": "Bearer", "expires_in": 3600, "access_token": "some token" } }
/// ```
pub async fn token<S: Storage>(
    Extension(jwt_keys): Extension<JwtKeys>,
    Extension(storage): Extension<S>,
    Form(form): Form<LoginForm>,
) -> Result<Success<Token>, Error> {
    let user = storage
        .find_single_user_by_username(&form.username)
        .await?
        .filter(|user| !user.is_deleted());

    match user {
        Some(user) if verify(&user.hashed_password, &form.password) => {
            tracing::debug!("Issuing token for user {}", user.id);

            Ok(Success::ok(generate_token(&jwt_keys, &user)?))
        }
        _ => Err(Error::bad_request("Invalid user")),
    }
}

/// Registration form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserForm {
    /// Username of the new user
    username: String,
    /// Password of the new user
    password: String,
    /// Display name
    name: String,
    /// Role of the new user, a subscriber when left out
    role: Option<Role>,
    /// Mobile money number
    phone_number: Option<String>,
    /// University the user attends
    university: Option<String>,
    /// School or faculty
    school: Option<String>,
    /// Student number
    student_id: Option<String>,
}

/// Register a new user
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -d '{ "username": "alice", "password": "verysecret", "name": "Alice" }' \
///     http://localhost:6000/api/users
/// ```
///
/// Response
/// ```json
/// { "data": { "id": "<uuid>", "username": "alice", "role": "subscriber", "rating": 5 ... } }
/// ```
pub async fn create<S: Storage>(
    Extension(storage): Extension<S>,
    Form(form): Form<CreateUserForm>,
) -> Result<Success<UserResponse>, Error> {
    let username = parse_required("username", &form.username)?;
    let name = parse_required("name", &form.name)?;

    if form.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(Error::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    let existing = storage.find_single_user_by_username(&username).await?;

    if let Some(user) = existing {
        return if user.is_deleted() {
            Err(Error::bad_request("User already exists and is deleted"))
        } else {
            Err(Error::bad_request("User already exists"))
        };
    }

    let hashed_password = hash(&form.password).map_err(Error::internal_server_error)?;

    let values = CreateUserValues {
        session_id: &Uuid::new_v4(),
        role: form.role.unwrap_or_default(),
        username: &username,
        hashed_password: &hashed_password,
        name: &name,
        phone_number: non_empty(form.phone_number.as_deref()),
        university: non_empty(form.university.as_deref()),
        school: non_empty(form.school.as_deref()),
        student_id: non_empty(form.student_id.as_deref()),
    };

    let user = storage.create_user(&values).await?;

    tracing::info!("Registered {:?} {}", user.role, user.id);

    Ok(Success::created(UserResponse::from_user(user)))
}

/// Get the current user
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/users/me
/// ```
pub async fn me<S: Storage>(current_user: CurrentUser<S>) -> Success<UserResponse> {
    Success::ok(UserResponse::from_user(current_user.clone()))
}

/// Profile form, fields left out are not changed
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserForm {
    name: Option<String>,
    phone_number: Option<String>,
    university: Option<String>,
    school: Option<String>,
    student_id: Option<String>,
    bio: Option<String>,
}

/// Update the profile of the current user
///
/// Request:
/// ```sh
/// curl -v -XPATCH -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "bio": "A+ Student in Math & Physics" }' \
///     http://localhost:6000/api/users/me
/// ```
pub async fn update_me<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
    Form(form): Form<UpdateUserForm>,
) -> Result<Success<UserResponse>, Error> {
    let name = form
        .name
        .as_deref()
        .map(|name| parse_required("name", name))
        .transpose()?;

    let values = UpdateUserValues {
        name: name.as_deref(),
        phone_number: non_empty(form.phone_number.as_deref()),
        university: non_empty(form.university.as_deref()),
        school: non_empty(form.school.as_deref()),
        student_id: non_empty(form.student_id.as_deref()),
        bio: non_empty(form.bio.as_deref()),
    };

    let user = storage.update_user(&current_user, &values).await?;

    Ok(Success::ok(UserResponse::from_user(user)))
}

/// Disable the account of the current user
///
/// The user is soft-deleted, its tokens stop working right away
pub async fn delete_me<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
) -> Result<Success<&'static str>, Error> {
    storage.delete_user(&current_user).await?;

    tracing::info!("Disabled user {}", current_user.id);

    Ok(Success::<&'static str>::no_content())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
