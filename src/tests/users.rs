use axum::http::StatusCode;
use serde_json::json;

use crate::tests::helper;

#[tokio::test]
async fn test_register() {
    let mut app = helper::setup_test_app().await;

    let (status_code, user, _) =
        helper::maybe_register(&mut app, "alice", helper::PASSWORD, "subscriber").await;
    assert_eq!(StatusCode::CREATED, status_code);
    let user = user.unwrap();
    assert_eq!("alice".to_string(), user.username);
    assert_eq!("ALICE".to_string(), user.name);
    assert_eq!("subscriber".to_string(), user.role);
    assert_eq!(5, user.rating);

    // same username again
    let (status_code, _, error) =
        helper::maybe_register(&mut app, "alice", helper::PASSWORD, "provider").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(Some("User already exists".to_string()), error);

    // password too short
    let (status_code, _, error) =
        helper::maybe_register(&mut app, "bob", "short", "subscriber").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(
        Some("Password must be at least 6 characters".to_string()),
        error
    );

    // unknown role
    let (status_code, _, error) =
        helper::maybe_register(&mut app, "bob", helper::PASSWORD, "admin").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(Some("Data error".to_string()), error);

    // empty username
    let (status_code, _, error) =
        helper::maybe_register(&mut app, "   ", helper::PASSWORD, "subscriber").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(Some("Missing username".to_string()), error);

    // provider
    let (status_code, user, _) =
        helper::maybe_register(&mut app, "math_wizard", helper::PASSWORD, "provider").await;
    assert_eq!(StatusCode::CREATED, status_code);
    assert_eq!("provider".to_string(), user.unwrap().role);
}

#[tokio::test]
async fn test_current_user() {
    let mut app = helper::setup_test_app().await;

    let (user, access_token) = helper::register_and_login(&mut app, "alice", "subscriber").await;

    let (status_code, current_user) = helper::current_user(&mut app, &access_token).await;
    assert_eq!(StatusCode::OK, status_code);
    let current_user = current_user.unwrap();
    assert_eq!(user.id, current_user.id);
    assert_eq!(user.username, current_user.username);
    assert!(current_user.bio.is_none());
}

#[tokio::test]
async fn test_update_current_user() {
    let mut app = helper::setup_test_app().await;

    let (registered, access_token) =
        helper::register_and_login(&mut app, "alice", "subscriber").await;
    assert_eq!(registered.created_at, registered.updated_at);

    let payload = json!({ "bio": "A+ Student in Math & Physics", "university": "UNZA" });
    let (status_code, user, _) =
        helper::maybe_update_current_user(&mut app, &access_token, &payload).await;
    assert_eq!(StatusCode::OK, status_code);
    let user = user.unwrap();
    assert_eq!(Some("A+ Student in Math & Physics".to_string()), user.bio);
    assert_eq!("ALICE".to_string(), user.name);
    assert_eq!(registered.created_at, user.created_at);
    assert!(user.updated_at >= registered.updated_at);

    // left out fields are kept
    let payload = json!({ "name": "Alice Banda" });
    let (status_code, user, _) =
        helper::maybe_update_current_user(&mut app, &access_token, &payload).await;
    assert_eq!(StatusCode::OK, status_code);
    let user = user.unwrap();
    assert_eq!("Alice Banda".to_string(), user.name);
    assert_eq!(Some("A+ Student in Math & Physics".to_string()), user.bio);

    // blank profile fields are ignored
    let payload = json!({ "bio": "   ", "school": "" });
    let (status_code, user, _) =
        helper::maybe_update_current_user(&mut app, &access_token, &payload).await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!(
        Some("A+ Student in Math & Physics".to_string()),
        user.unwrap().bio
    );

    // name can not be emptied
    let payload = json!({ "name": "  " });
    let (status_code, _, error) =
        helper::maybe_update_current_user(&mut app, &access_token, &payload).await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(Some("Missing name".to_string()), error);

    // the rating is not for the user to set
    let payload = json!({ "rating": 1 });
    let (status_code, user, _) =
        helper::maybe_update_current_user(&mut app, &access_token, &payload).await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!(5, user.unwrap().rating);
}

#[tokio::test]
async fn test_delete_current_user() {
    let mut app = helper::setup_test_app().await;

    let (_, access_token) = helper::register_and_login(&mut app, "alice", "subscriber").await;

    let status_code = helper::delete_current_user(&mut app, &access_token).await;
    assert_eq!(StatusCode::NO_CONTENT, status_code);

    // the token is no longer any good
    let (status_code, _) = helper::current_user(&mut app, &access_token).await;
    assert_eq!(StatusCode::UNAUTHORIZED, status_code);

    // no new tokens either
    let (status_code, _, error) = helper::maybe_login(&mut app, "alice", helper::PASSWORD).await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(Some("Invalid user".to_string()), error);

    // the username stays taken
    let (status_code, _, error) =
        helper::maybe_register(&mut app, "alice", helper::PASSWORD, "subscriber").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(Some("User already exists and is deleted".to_string()), error);
}
