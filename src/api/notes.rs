//! Note API management
//!
//! Reading notes goes through the access evaluator, publishing is for providers

use axum::Extension;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::access::fetch_course_notes;
use crate::notes::Note;
use crate::notes::NoteKind;
use crate::notes::newest_first;
use crate::storage::CreateNoteValues;
use crate::storage::Storage;

use super::CurrentUser;
use super::Error;
use super::Form;
use super::PathParameters;
use super::Success;
use super::courses::fetch_course;
use super::parse_required;
use super::parse_url;
use super::require_provider;

/// The note response information
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    id: Uuid,
    course_id: Uuid,
    provider_id: Uuid,
    title: String,
    #[serde(rename = "type")]
    kind: NoteKind,
    url: String,
    created_at: NaiveDateTime,
}

impl From<Note> for NoteResponse {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            course_id: note.course_id,
            provider_id: note.provider_id,
            title: note.title,
            kind: note.kind,
            url: note.url,
            created_at: note.created_at,
        }
    }
}

/// List all notes of a course, newest first
///
/// Only for users with an active subscription for the course
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/courses/<uuid>/notes
/// ```
pub async fn list<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
    PathParameters(course_id): PathParameters<Uuid>,
) -> Result<Success<Vec<NoteResponse>>, Error> {
    let mut notes = fetch_course_notes(&storage, &current_user.id, &course_id).await?;

    newest_first(&mut notes);

    Ok(Success::ok(notes.into_iter().map(Into::into).collect()))
}

/// Create note form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteForm {
    title: String,
    #[serde(rename = "type")]
    kind: NoteKind,
    url: String,
}

/// Publish a note in a course
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "title": "Lecture 1", "type": "pdf", "url": "https://example.com/note1.pdf" }' \
///     http://localhost:6000/api/courses/<uuid>/notes
/// ```
pub async fn create<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
    PathParameters(course_id): PathParameters<Uuid>,
    Form(form): Form<CreateNoteForm>,
) -> Result<Success<NoteResponse>, Error> {
    require_provider(&current_user)?;

    let course = fetch_course(&storage, &course_id).await?;

    let title = parse_required("title", &form.title)?;
    let url = parse_url(form.url.trim())?;

    let values = CreateNoteValues {
        provider: &current_user,
        title: &title,
        kind: form.kind,
        url: url.as_str(),
    };

    let note = storage.create_note(&course, &values).await?;

    tracing::debug!("Published note {} in {}", note.id, course.code);

    Ok(Success::created(note.into()))
}
