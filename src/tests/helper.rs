use axum::Router;
use axum::body::Body;
use axum::body::Bytes;
use axum::http::Method;
use axum::http::Request;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::header::CONTENT_TYPE;
use chrono::NaiveDateTime;
use http_body_util::BodyExt;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use tower::Service;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::config::StorageConfig;
use crate::setup_app;

/// Password of every user the tests register
pub const PASSWORD: &str = "verysecret";

/// Test helper version of User struct
#[derive(Debug)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub role: String,
    pub bio: Option<String>,
    pub rating: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Test helper version of Course struct
#[derive(Debug)]
pub struct Course {
    pub id: Uuid,
    pub code: String,
    pub title: String,
    pub price: i64,
    pub provider_id: Uuid,
}

/// Test helper version of Note struct
#[derive(Debug, PartialEq, Eq)]
pub struct Note {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub kind: String,
    pub url: String,
    pub created_at: NaiveDateTime,
}

/// Test helper version of Subscription struct
#[derive(Debug)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub active: bool,
    pub payment_reference: Option<String>,
}

/// Error response
#[derive(Debug, PartialEq, Eq)]
pub struct Error {
    pub error: String,
    pub description: Option<String>,
}

/// Setup the Phunzi app with memory storage and mock payments
pub async fn setup_test_app() -> Router {
    setup_app(test_config(None)).await.unwrap()
}

/// Setup the Phunzi app with memory storage and verified payments
pub async fn setup_test_app_with_payment_secret(payment_secret: &str) -> Router {
    setup_app(test_config(Some(payment_secret))).await.unwrap()
}

fn test_config(payment_secret: Option<&str>) -> AppConfig {
    AppConfig {
        storage: StorageConfig::Memory,
        jwt_secret: "verysecret".to_string(),
        payment_secret: payment_secret.map(ToString::to_string),
    }
}

/// Send a request to the app, an empty access token sends none
pub async fn call(
    app: &mut Router,
    method: Method,
    uri: &str,
    access_token: &str,
    body: Option<Vec<u8>>,
) -> (StatusCode, Bytes) {
    let mut builder = Request::builder().method(method).uri(uri);

    if !access_token.is_empty() {
        builder = builder.header(AUTHORIZATION, access_token);
    }

    let request = if let Some(body) = body {
        builder
            .header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
            .body(Body::from(body))
            .unwrap()
    } else {
        builder.body(Body::empty()).unwrap()
    };

    let response = app.call(request).await.unwrap();
    let status_code = response.status();

    let body = response.into_body().collect().await.unwrap().to_bytes();

    (status_code, body)
}

async fn call_json(
    app: &mut Router,
    method: Method,
    uri: &str,
    access_token: &str,
    payload: &Value,
) -> (StatusCode, Bytes) {
    let body = serde_json::to_vec(payload).unwrap();

    call(app, method, uri, access_token, Some(body)).await
}

pub async fn maybe_register(
    app: &mut Router,
    username: &str,
    password: &str,
    role: &str,
) -> (StatusCode, Option<User>, Option<String>) {
    let payload = json!({
        "username": username,
        "password": password,
        "name": username.to_uppercase(),
        "role": role,
        "phoneNumber": "0977000001",
    });

    let (status_code, body) = call_json(app, Method::POST, "/api/users", "", &payload).await;

    (
        status_code,
        if status_code == StatusCode::CREATED {
            Some(get_user(&body))
        } else {
            None
        },
        error_message_for(status_code, &body),
    )
}

pub async fn maybe_login(
    app: &mut Router,
    username: &str,
    password: &str,
) -> (StatusCode, Option<String>, Option<String>) {
    let payload = json!({ "username": username, "password": password });

    let (status_code, body) =
        call_json(app, Method::POST, "/api/users/token", "", &payload).await;

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(get_access_token(&body))
        } else {
            None
        },
        error_message_for(status_code, &body),
    )
}

pub async fn login(app: &mut Router, username: &str) -> String {
    let (status_code, access_token, _) = maybe_login(app, username, PASSWORD).await;

    assert_eq!(StatusCode::OK, status_code);

    access_token.unwrap()
}

/// Register a user with a given role and get an access token for it
pub async fn register_and_login(app: &mut Router, username: &str, role: &str) -> (User, String) {
    let (status_code, user, _) = maybe_register(app, username, PASSWORD, role).await;

    assert_eq!(StatusCode::CREATED, status_code);

    let access_token = login(app, username).await;

    (user.unwrap(), access_token)
}

pub async fn current_user(app: &mut Router, access_token: &str) -> (StatusCode, Option<User>) {
    let (status_code, body) = call(app, Method::GET, "/api/users/me", access_token, None).await;

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(get_user(&body))
        } else {
            None
        },
    )
}

pub async fn maybe_update_current_user(
    app: &mut Router,
    access_token: &str,
    payload: &Value,
) -> (StatusCode, Option<User>, Option<String>) {
    let (status_code, body) =
        call_json(app, Method::PATCH, "/api/users/me", access_token, payload).await;

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(get_user(&body))
        } else {
            None
        },
        error_message_for(status_code, &body),
    )
}

pub async fn delete_current_user(app: &mut Router, access_token: &str) -> StatusCode {
    let (status_code, _) = call(app, Method::DELETE, "/api/users/me", access_token, None).await;

    status_code
}

pub async fn maybe_create_course(
    app: &mut Router,
    access_token: &str,
    code: &str,
    price: i64,
) -> (StatusCode, Option<Course>, Option<String>) {
    let payload = json!({
        "code": code,
        "title": format!("Course {code}"),
        "price": price,
    });

    let (status_code, body) =
        call_json(app, Method::POST, "/api/courses", access_token, &payload).await;

    (
        status_code,
        if status_code == StatusCode::CREATED {
            Some(get_course(&body))
        } else {
            None
        },
        error_message_for(status_code, &body),
    )
}

pub async fn create_course(app: &mut Router, access_token: &str, code: &str, price: i64) -> Course {
    let (status_code, course, _) = maybe_create_course(app, access_token, code, price).await;

    assert_eq!(StatusCode::CREATED, status_code);

    course.unwrap()
}

pub async fn maybe_create_course_with_raw_body(
    app: &mut Router,
    access_token: &str,
    body: &'static str,
    include_content_type: bool,
) -> (StatusCode, Option<Course>, Option<Error>) {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/api/courses");

    if include_content_type {
        builder = builder.header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref());
    }

    let request = builder
        .header(AUTHORIZATION, access_token)
        .body(Body::from(body.as_bytes()))
        .unwrap();

    let response = app.call(request).await.unwrap();
    let status_code = response.status();

    let body = response.into_body().collect().await.unwrap().to_bytes();

    (
        status_code,
        if status_code == StatusCode::CREATED {
            Some(get_course(&body))
        } else {
            None
        },
        if status_code == StatusCode::BAD_REQUEST {
            Some(get_error(&body))
        } else {
            None
        },
    )
}

pub async fn list_courses(app: &mut Router) -> (StatusCode, Option<Vec<Course>>) {
    let (status_code, body) = call(app, Method::GET, "/api/courses", "", None).await;

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(get_courses(&body))
        } else {
            None
        },
    )
}

pub async fn single_course(app: &mut Router, id: &str) -> (StatusCode, Option<Course>) {
    let (status_code, body) = call(app, Method::GET, &format!("/api/courses/{id}"), "", None).await;

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(get_course(&body))
        } else {
            None
        },
    )
}

pub async fn maybe_update_course(
    app: &mut Router,
    access_token: &str,
    id: &Uuid,
    payload: &Value,
) -> (StatusCode, Option<Course>, Option<String>) {
    let (status_code, body) = call_json(
        app,
        Method::PATCH,
        &format!("/api/courses/{id}"),
        access_token,
        payload,
    )
    .await;

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(get_course(&body))
        } else {
            None
        },
        error_message_for(status_code, &body),
    )
}

pub async fn maybe_create_note(
    app: &mut Router,
    access_token: &str,
    course_id: &Uuid,
    title: &str,
    kind: &str,
    url: &str,
) -> (StatusCode, Option<Note>, Option<String>) {
    let payload = json!({ "title": title, "type": kind, "url": url });

    let (status_code, body) = call_json(
        app,
        Method::POST,
        &format!("/api/courses/{course_id}/notes"),
        access_token,
        &payload,
    )
    .await;

    (
        status_code,
        if status_code == StatusCode::CREATED {
            Some(get_note(&body))
        } else {
            None
        },
        error_message_for(status_code, &body),
    )
}

pub async fn create_note(
    app: &mut Router,
    access_token: &str,
    course_id: &Uuid,
    title: &str,
) -> Note {
    let url = format!("https://example.com/{}.pdf", title.replace(' ', "-"));

    let (status_code, note, _) =
        maybe_create_note(app, access_token, course_id, title, "pdf", &url).await;

    assert_eq!(StatusCode::CREATED, status_code);

    note.unwrap()
}

pub async fn list_notes(
    app: &mut Router,
    access_token: &str,
    course_id: &Uuid,
) -> (StatusCode, Option<Vec<Note>>, Option<String>) {
    let (status_code, body) = call(
        app,
        Method::GET,
        &format!("/api/courses/{course_id}/notes"),
        access_token,
        None,
    )
    .await;

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(get_notes(&body))
        } else {
            None
        },
        error_message_for(status_code, &body),
    )
}

pub async fn maybe_subscribe(
    app: &mut Router,
    access_token: &str,
    course_id: &Uuid,
    payment: Option<&Value>,
) -> (StatusCode, Option<Subscription>, Option<String>) {
    let body = payment.map(|payment| serde_json::to_vec(payment).unwrap());

    let (status_code, body) = call(
        app,
        Method::POST,
        &format!("/api/courses/{course_id}/subscribe"),
        access_token,
        body,
    )
    .await;

    (
        status_code,
        if status_code.is_success() {
            Some(get_subscription(&body))
        } else {
            None
        },
        error_message_for(status_code, &body),
    )
}

pub async fn subscribe(app: &mut Router, access_token: &str, course_id: &Uuid) -> Subscription {
    let (status_code, subscription, _) = maybe_subscribe(app, access_token, course_id, None).await;

    assert_eq!(StatusCode::CREATED, status_code);

    subscription.unwrap()
}

pub async fn list_subscriptions(
    app: &mut Router,
    access_token: &str,
) -> (StatusCode, Option<Vec<Subscription>>) {
    let (status_code, body) = call(app, Method::GET, "/api/subscriptions", access_token, None).await;

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(get_subscriptions(&body))
        } else {
            None
        },
    )
}

pub async fn maybe_cancel_subscription(
    app: &mut Router,
    access_token: &str,
    id: &Uuid,
) -> (StatusCode, Option<Subscription>, Option<String>) {
    let (status_code, body) = call(
        app,
        Method::DELETE,
        &format!("/api/subscriptions/{id}"),
        access_token,
        None,
    )
    .await;

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(get_subscription(&body))
        } else {
            None
        },
        error_message_for(status_code, &body),
    )
}

fn value_to_user(user: &Map<String, Value>) -> User {
    User {
        id: user["id"].as_str().map(Uuid::parse_str).unwrap().unwrap(),
        username: user["username"].as_str().map(ToString::to_string).unwrap(),
        name: user["name"].as_str().map(ToString::to_string).unwrap(),
        role: user["role"].as_str().map(ToString::to_string).unwrap(),
        bio: user.get("bio").and_then(Value::as_str).map(ToString::to_string),
        rating: user["rating"].as_i64().unwrap(),
        created_at: serde_json::from_value(user["createdAt"].clone()).unwrap(),
        updated_at: serde_json::from_value(user["updatedAt"].clone()).unwrap(),
    }
}

fn get_user(body: &Bytes) -> User {
    serde_json::from_slice::<Value>(&body[..]).unwrap()["data"]
        .as_object()
        .map(value_to_user)
        .unwrap()
}

fn value_to_course(course: &Map<String, Value>) -> Course {
    Course {
        id: course["id"].as_str().map(Uuid::parse_str).unwrap().unwrap(),
        code: course["code"].as_str().map(ToString::to_string).unwrap(),
        title: course["title"].as_str().map(ToString::to_string).unwrap(),
        price: course["price"].as_i64().unwrap(),
        provider_id: course["providerId"]
            .as_str()
            .map(Uuid::parse_str)
            .unwrap()
            .unwrap(),
    }
}

fn get_course(body: &Bytes) -> Course {
    serde_json::from_slice::<Value>(&body[..]).unwrap()["data"]
        .as_object()
        .map(value_to_course)
        .unwrap()
}

fn get_courses(body: &Bytes) -> Vec<Course> {
    serde_json::from_slice::<Value>(&body[..]).unwrap()["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f.as_object().unwrap())
        .map(value_to_course)
        .collect()
}

fn value_to_note(note: &Map<String, Value>) -> Note {
    Note {
        id: note["id"].as_str().map(Uuid::parse_str).unwrap().unwrap(),
        course_id: note["courseId"]
            .as_str()
            .map(Uuid::parse_str)
            .unwrap()
            .unwrap(),
        title: note["title"].as_str().map(ToString::to_string).unwrap(),
        kind: note["type"].as_str().map(ToString::to_string).unwrap(),
        url: note["url"].as_str().map(ToString::to_string).unwrap(),
        created_at: serde_json::from_value(note["createdAt"].clone()).unwrap(),
    }
}

fn get_note(body: &Bytes) -> Note {
    serde_json::from_slice::<Value>(&body[..]).unwrap()["data"]
        .as_object()
        .map(value_to_note)
        .unwrap()
}

fn get_notes(body: &Bytes) -> Vec<Note> {
    serde_json::from_slice::<Value>(&body[..]).unwrap()["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f.as_object().unwrap())
        .map(value_to_note)
        .collect()
}

fn value_to_subscription(subscription: &Map<String, Value>) -> Subscription {
    Subscription {
        id: subscription["id"]
            .as_str()
            .map(Uuid::parse_str)
            .unwrap()
            .unwrap(),
        user_id: subscription["userId"]
            .as_str()
            .map(Uuid::parse_str)
            .unwrap()
            .unwrap(),
        course_id: subscription["courseId"]
            .as_str()
            .map(Uuid::parse_str)
            .unwrap()
            .unwrap(),
        active: subscription["active"].as_bool().unwrap(),
        payment_reference: subscription
            .get("paymentReference")
            .and_then(Value::as_str)
            .map(ToString::to_string),
    }
}

fn get_subscription(body: &Bytes) -> Subscription {
    serde_json::from_slice::<Value>(&body[..]).unwrap()["data"]
        .as_object()
        .map(value_to_subscription)
        .unwrap()
}

fn get_subscriptions(body: &Bytes) -> Vec<Subscription> {
    serde_json::from_slice::<Value>(&body[..]).unwrap()["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f.as_object().unwrap())
        .map(value_to_subscription)
        .collect()
}

fn value_to_error(error: &Map<String, Value>) -> Error {
    Error {
        error: error["error"].as_str().map(ToString::to_string).unwrap(),
        description: error
            .get("description")
            .and_then(Value::as_str)
            .map(ToString::to_string),
    }
}

pub fn get_error(body: &Bytes) -> Error {
    serde_json::from_slice::<Value>(&body[..])
        .unwrap()
        .as_object()
        .map(value_to_error)
        .unwrap()
}

fn get_error_message(body: &Bytes) -> String {
    serde_json::from_slice::<Value>(&body[..]).unwrap()["error"]
        .as_str()
        .map(ToString::to_string)
        .unwrap()
}

/// Error message of any failed request
fn error_message_for(status_code: StatusCode, body: &Bytes) -> Option<String> {
    if status_code.is_client_error() || status_code.is_server_error() {
        Some(get_error_message(body))
    } else {
        None
    }
}

fn get_access_token(body: &Bytes) -> String {
    serde_json::from_slice::<Value>(&body[..]).unwrap()["data"]["access_token"]
        .as_str()
        .map(|access_token| format!("Bearer {access_token}"))
        .unwrap()
}
