//! Course API management

use axum::Extension;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::courses::Course;
use crate::storage::CreateCourseValues;
use crate::storage::Storage;
use crate::storage::UpdateCourseValues;

use super::CurrentUser;
use super::Error;
use super::Form;
use super::PathParameters;
use super::Success;
use super::parse_course_code;
use super::parse_price;
use super::parse_required;
use super::require_provider;

/// The course response information
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseResponse {
    id: Uuid,
    code: String,
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    price: i64,
    provider_id: Uuid,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl From<Course> for CourseResponse {
    fn from(course: Course) -> Self {
        Self {
            id: course.id,
            code: course.code,
            title: course.title,
            description: course.description,
            price: course.price,
            provider_id: course.provider_id,
            created_at: course.created_at,
            updated_at: course.updated_at,
        }
    }
}

/// List all courses, ordered by code
///
/// The catalog is public, notes stay behind a subscription
///
/// Request:
/// ```sh
/// curl -v http://localhost:6000/api/courses
/// ```
pub async fn list<S: Storage>(
    Extension(storage): Extension<S>,
) -> Result<Success<Vec<CourseResponse>>, Error> {
    let courses = storage.find_all_courses().await?;

    Ok(Success::ok(courses.into_iter().map(Into::into).collect()))
}

/// Get a single course
pub async fn single<S: Storage>(
    Extension(storage): Extension<S>,
    PathParameters(course_id): PathParameters<Uuid>,
) -> Result<Success<CourseResponse>, Error> {
    let course = fetch_course(&storage, &course_id).await?;

    Ok(Success::ok(course.into()))
}

/// Create course form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseForm {
    code: String,
    title: String,
    description: Option<String>,
    price: i64,
}

/// Create a course, only providers can
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "code": "MATH 1110", "title": "Calculus I", "price": 50 }' \
///     http://localhost:6000/api/courses
/// ```
pub async fn create<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
    Form(form): Form<CreateCourseForm>,
) -> Result<Success<CourseResponse>, Error> {
    require_provider(&current_user)?;

    let code = parse_course_code(&form.code)?;
    let title = parse_required("title", &form.title)?;
    let price = parse_price(form.price)?;

    if storage.find_single_course_by_code(&code).await?.is_some() {
        return Err(Error::bad_request("Course already exists"));
    }

    let values = CreateCourseValues {
        provider: &current_user,
        code: &code,
        title: &title,
        description: form.description.as_deref().map(str::trim),
        price,
    };

    let course = storage.create_course(&values).await?;

    tracing::info!("Provider {} created course {}", current_user.id, course.code);

    Ok(Success::created(course.into()))
}

/// Update course form, fields left out are not changed
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseForm {
    title: Option<String>,
    description: Option<String>,
    price: Option<i64>,
}

/// Update a course, only its own provider can
pub async fn update<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
    PathParameters(course_id): PathParameters<Uuid>,
    Form(form): Form<UpdateCourseForm>,
) -> Result<Success<CourseResponse>, Error> {
    let course = fetch_course(&storage, &course_id).await?;

    if !course.is_owned_by(&current_user.id) {
        return Err(Error::forbidden("Not allowed to access"));
    }

    let title = form
        .title
        .as_deref()
        .map(|title| parse_required("title", title))
        .transpose()?;
    let price = form.price.map(parse_price).transpose()?;

    let values = UpdateCourseValues {
        title: title.as_deref(),
        description: form.description.as_deref().map(str::trim),
        price,
    };

    let course = storage.update_course(&course, &values).await?;

    Ok(Success::ok(course.into()))
}

/// Fetch a course or fail with `404 Not Found`
pub async fn fetch_course<S: Storage>(storage: &S, course_id: &Uuid) -> Result<Course, Error> {
    storage
        .find_single_course_by_id(course_id)
        .await?
        .ok_or_else(|| Error::not_found("Course not found"))
}
