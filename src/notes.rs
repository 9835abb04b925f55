//! Notes, the published content of a course

use chrono::naive::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Kind of content behind the locator of a note
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum NoteKind {
    /// A document
    Pdf,
    /// A recording
    Audio,
}

#[derive(Clone, Debug)]
pub struct Note {
    pub id: Uuid,
    pub course_id: Uuid,
    /// The provider that published the note
    pub provider_id: Uuid,
    pub title: String,
    pub kind: NoteKind,
    /// Where the asset lives
    pub url: String,
    pub created_at: NaiveDateTime,
}

/// Sort notes the way a feed presents them: newest first
pub fn newest_first(notes: &mut [Note]) {
    notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
