//! Postgres storage

use std::time::Duration;

use chrono::NaiveDateTime;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::courses::Course;
use crate::notes::Note;
use crate::notes::NoteKind;
use crate::subscriptions::Subscribed;
use crate::subscriptions::Subscription;
use crate::users::Role;
use crate::users::User;

use super::CreateCourseValues;
use super::CreateNoteValues;
use super::CreateSubscriptionValues;
use super::CreateUserValues;
use super::Error;
use super::PAYMENT_REFERENCE;
use super::Result;
use super::Storage;
use super::UpdateCourseValues;
use super::UpdateUserValues;

/// Migrator to run migrations on startup
static MIGRATOR: Migrator = sqlx::migrate!();

/// How often subscribing retries when the active subscription changed in between
const SUBSCRIBE_ATTEMPTS: usize = 3;

/// Postgres type for user role
#[derive(PartialEq, Debug, sqlx::Type)]
#[sqlx(type_name = "user_role_type")]
#[sqlx(rename_all = "kebab-case")]
enum UserRoleType {
    /// Subscriber
    Subscriber,

    /// Provider
    Provider,
}

impl UserRoleType {
    /// Create user role type from role
    fn from_role(role: Role) -> Self {
        match role {
            Role::Subscriber => UserRoleType::Subscriber,
            Role::Provider => UserRoleType::Provider,
        }
    }

    /// Create role from user role type
    fn to_role(&self) -> Role {
        match self {
            UserRoleType::Subscriber => Role::Subscriber,
            UserRoleType::Provider => Role::Provider,
        }
    }
}

/// Postgres type for note kind
#[derive(PartialEq, Debug, sqlx::Type)]
#[sqlx(type_name = "note_kind_type")]
#[sqlx(rename_all = "kebab-case")]
enum NoteKindType {
    /// PDF document
    Pdf,

    /// Audio recording
    Audio,
}

impl NoteKindType {
    /// Create note kind type from note kind
    fn from_kind(kind: NoteKind) -> Self {
        match kind {
            NoteKind::Pdf => NoteKindType::Pdf,
            NoteKind::Audio => NoteKindType::Audio,
        }
    }

    /// Create note kind from note kind type
    fn to_kind(&self) -> NoteKind {
        match self {
            NoteKindType::Pdf => NoteKind::Pdf,
            NoteKindType::Audio => NoteKind::Audio,
        }
    }
}

/// Postgres version of user
#[derive(sqlx::FromRow)]
struct SqlxUser {
    id: Uuid,
    session_id: Uuid,
    username: String,
    hashed_password: String,
    name: String,
    role: UserRoleType,
    phone_number: Option<String>,
    university: Option<String>,
    school: Option<String>,
    student_id: Option<String>,
    bio: Option<String>,
    rating: i16,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    deleted_at: Option<NaiveDateTime>,
}

impl From<SqlxUser> for User {
    fn from(user: SqlxUser) -> Self {
        Self {
            id: user.id,
            session_id: user.session_id,
            username: user.username,
            hashed_password: user.hashed_password,
            name: user.name,
            role: user.role.to_role(),
            phone_number: user.phone_number,
            university: user.university,
            school: user.school,
            student_id: user.student_id,
            bio: user.bio,
            rating: user.rating,
            created_at: user.created_at,
            updated_at: user.updated_at,
            deleted_at: user.deleted_at,
        }
    }
}

/// Postgres version of note
#[derive(sqlx::FromRow)]
struct SqlxNote {
    id: Uuid,
    course_id: Uuid,
    provider_id: Uuid,
    title: String,
    kind: NoteKindType,
    url: String,
    created_at: NaiveDateTime,
}

impl From<SqlxNote> for Note {
    fn from(note: SqlxNote) -> Self {
        Self {
            id: note.id,
            course_id: note.course_id,
            provider_id: note.provider_id,
            title: note.title,
            kind: note.kind.to_kind(),
            url: note.url,
            created_at: note.created_at,
        }
    }
}

/// Postgres storage
#[derive(Clone, Debug)]
pub struct Postgres {
    /// Pool of connections
    connection_pool: PgPool,
}

impl Postgres {
    /// Connect to Postgres with the given connection string
    ///
    /// Migrations will be run
    pub async fn connect(database_url: &str) -> Result<Self> {
        let connection_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await
            .map_err(connection_error)?;

        Self::with_pool(connection_pool).await
    }

    /// Create Postgres storage with existing pool
    ///
    /// Migrations will be run
    pub async fn with_pool(connection_pool: PgPool) -> Result<Self> {
        MIGRATOR
            .run(&connection_pool)
            .await
            .map_err(|err| Error::Connection(format!("Migrations could not run: {err}")))?;

        Ok(Self { connection_pool })
    }
}

#[async_trait::async_trait]
impl Storage for Postgres {
    async fn find_single_user_by_id(&self, id: &Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, SqlxUser>(
            r"
            SELECT *
            FROM users
            WHERE deleted_at IS NULL
                AND id = $1
            LIMIT 1
            ",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(user.map(User::from))
    }

    async fn find_single_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, SqlxUser>(
            r"
            SELECT *
            FROM users
            WHERE username = $1
            LIMIT 1
            ",
        )
        .bind(username)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(user.map(User::from))
    }

    async fn create_user(&self, values: &CreateUserValues<'_>) -> Result<User> {
        let user = sqlx::query_as::<_, SqlxUser>(
            r"
            INSERT INTO users (
                id,
                session_id,
                username,
                hashed_password,
                name,
                role,
                phone_number,
                university,
                school,
                student_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            ",
        )
        .bind(Uuid::new_v4())
        .bind(values.session_id)
        .bind(values.username)
        .bind(values.hashed_password)
        .bind(values.name)
        .bind(UserRoleType::from_role(values.role))
        .bind(values.phone_number)
        .bind(values.university)
        .bind(values.school)
        .bind(values.student_id)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(insert_error("username"))?;

        Ok(user.into())
    }

    async fn update_user(&self, user: &User, values: &UpdateUserValues<'_>) -> Result<User> {
        let user = sqlx::query_as::<_, SqlxUser>(
            r"
            UPDATE users
            SET name = COALESCE($1, name),
                phone_number = COALESCE($2, phone_number),
                university = COALESCE($3, university),
                school = COALESCE($4, school),
                student_id = COALESCE($5, student_id),
                bio = COALESCE($6, bio),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $7
            RETURNING *
            ",
        )
        .bind(values.name)
        .bind(values.phone_number)
        .bind(values.university)
        .bind(values.school)
        .bind(values.student_id)
        .bind(values.bio)
        .bind(user.id)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(user.into())
    }

    async fn delete_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r"
            UPDATE users
            SET deleted_at = CURRENT_TIMESTAMP
            WHERE id = $1
            ",
        )
        .bind(user.id)
        .execute(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(())
    }

    async fn find_all_courses(&self) -> Result<Vec<Course>> {
        sqlx::query_as::<_, Course>(
            r"
            SELECT *
            FROM courses
            ORDER BY code
            ",
        )
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)
    }

    async fn find_single_course_by_id(&self, id: &Uuid) -> Result<Option<Course>> {
        sqlx::query_as::<_, Course>(
            r"
            SELECT *
            FROM courses
            WHERE id = $1
            LIMIT 1
            ",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)
    }

    async fn find_single_course_by_code(&self, code: &str) -> Result<Option<Course>> {
        sqlx::query_as::<_, Course>(
            r"
            SELECT *
            FROM courses
            WHERE code = $1
            LIMIT 1
            ",
        )
        .bind(code)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)
    }

    async fn create_course(&self, values: &CreateCourseValues<'_>) -> Result<Course> {
        sqlx::query_as::<_, Course>(
            r"
            INSERT INTO courses (id, code, title, description, price, provider_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            ",
        )
        .bind(Uuid::new_v4())
        .bind(values.code)
        .bind(values.title)
        .bind(values.description)
        .bind(values.price)
        .bind(values.provider.id)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(insert_error("course code"))
    }

    async fn update_course(
        &self,
        course: &Course,
        values: &UpdateCourseValues<'_>,
    ) -> Result<Course> {
        sqlx::query_as::<_, Course>(
            r"
            UPDATE courses
            SET title = COALESCE($1, title),
                description = COALESCE($2, description),
                price = COALESCE($3, price),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $4
            RETURNING *
            ",
        )
        .bind(values.title)
        .bind(values.description)
        .bind(values.price)
        .bind(course.id)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(connection_error)
    }

    async fn find_all_notes_by_course(&self, course_id: &Uuid) -> Result<Vec<Note>> {
        let notes = sqlx::query_as::<_, SqlxNote>(
            r"
            SELECT *
            FROM notes
            WHERE course_id = $1
            ",
        )
        .bind(course_id)
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(notes.into_iter().map(Note::from).collect())
    }

    async fn create_note(&self, course: &Course, values: &CreateNoteValues<'_>) -> Result<Note> {
        let note = sqlx::query_as::<_, SqlxNote>(
            r"
            INSERT INTO notes (id, course_id, provider_id, title, kind, url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            ",
        )
        .bind(Uuid::new_v4())
        .bind(course.id)
        .bind(values.provider.id)
        .bind(values.title)
        .bind(NoteKindType::from_kind(values.kind))
        .bind(values.url)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(note.into())
    }

    async fn find_all_subscriptions_by_user(&self, user_id: &Uuid) -> Result<Vec<Subscription>> {
        sqlx::query_as::<_, Subscription>(
            r"
            SELECT *
            FROM subscriptions
            WHERE user_id = $1
            ORDER BY start_date DESC
            ",
        )
        .bind(user_id)
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)
    }

    async fn find_single_subscription_by_id(&self, id: &Uuid) -> Result<Option<Subscription>> {
        sqlx::query_as::<_, Subscription>(
            r"
            SELECT *
            FROM subscriptions
            WHERE id = $1
            LIMIT 1
            ",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)
    }

    async fn create_subscription(
        &self,
        values: &CreateSubscriptionValues<'_>,
    ) -> Result<Subscribed> {
        // the partial unique index on active subscriptions makes the insert a no-op when one
        // exists; it can be cancelled before it is read back, hence the retry
        for _ in 0..SUBSCRIBE_ATTEMPTS {
            let created = sqlx::query_as::<_, Subscription>(
                r"
                INSERT INTO subscriptions (id, user_id, course_id, active, payment_reference)
                VALUES ($1, $2, $3, TRUE, $4)
                ON CONFLICT (user_id, course_id) WHERE active DO NOTHING
                RETURNING *
                ",
            )
            .bind(Uuid::new_v4())
            .bind(values.user.id)
            .bind(values.course.id)
            .bind(values.payment_reference)
            .fetch_optional(&self.connection_pool)
            .await
            .map_err(insert_error(PAYMENT_REFERENCE))?;

            if let Some(subscription) = created {
                return Ok(Subscribed::Created(subscription));
            }

            let existing = sqlx::query_as::<_, Subscription>(
                r"
                SELECT *
                FROM subscriptions
                WHERE user_id = $1
                    AND course_id = $2
                    AND active
                LIMIT 1
                ",
            )
            .bind(values.user.id)
            .bind(values.course.id)
            .fetch_optional(&self.connection_pool)
            .await
            .map_err(connection_error)?;

            if let Some(subscription) = existing {
                return Ok(Subscribed::AlreadyActive(subscription));
            }
        }

        Err(Error::Connection(
            "Active subscription kept changing while subscribing".to_string(),
        ))
    }

    async fn deactivate_subscription(&self, subscription: &Subscription) -> Result<Subscription> {
        sqlx::query_as::<_, Subscription>(
            r"
            UPDATE subscriptions
            SET active = FALSE, updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(subscription.id)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(connection_error)
    }
}

fn connection_error<E>(err: E) -> Error
where
    E: std::error::Error,
{
    Error::Connection(err.to_string())
}

/// Map unique violations to conflicts, anything else is a connection error
fn insert_error(unique_value: &'static str) -> impl Fn(sqlx::Error) -> Error {
    move |err| {
        let is_unique_violation = err
            .as_database_error()
            .is_some_and(|database_error| database_error.is_unique_violation());

        if is_unique_violation {
            Error::Conflict(unique_value)
        } else {
            connection_error(err)
        }
    }
}
