//! Memory storage
//!
//! Will be destroyed on system shutdown

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::courses::Course;
use crate::notes::Note;
use crate::subscriptions::Subscribed;
use crate::subscriptions::Subscription;
use crate::users::DEFAULT_RATING;
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

/// An in-memory storage
///
/// Will be destroyed on system shutdown
///
/// Records are built completely before they are inserted, while the lock of their collection is
/// held, so readers never see half of a record.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// All users in storage
    users: Arc<Mutex<HashMap<Uuid, User>>>,

    /// All courses in storage
    courses: Arc<Mutex<HashMap<Uuid, Course>>>,

    /// All notes in storage
    notes: Arc<Mutex<HashMap<Uuid, Note>>>,

    /// All subscriptions in storage
    subscriptions: Arc<Mutex<HashMap<Uuid, Subscription>>>,
}

impl Memory {
    /// Create a new empty Memory storage
    pub fn new() -> Self {
        Self::default()
    }
}

/// Generate an ID that is not a key of the map yet
fn unused_id<V>(map: &HashMap<Uuid, V>) -> Uuid {
    loop {
        let id = Uuid::new_v4();

        if !map.contains_key(&id) {
            return id;
        }
    }
}

fn to_owned_option(value: Option<&str>) -> Option<String> {
    value.map(ToString::to_string)
}

#[async_trait::async_trait]
impl Storage for Memory {
    async fn find_single_user_by_id(&self, id: &Uuid) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .await
            .get(id)
            .filter(|user| !user.is_deleted())
            .cloned())
    }

    async fn find_single_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .await
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn create_user(&self, values: &CreateUserValues<'_>) -> Result<User> {
        let mut users = self.users.lock().await;

        if users.values().any(|user| user.username == values.username) {
            return Err(Error::Conflict("username"));
        }

        let now = Utc::now().naive_utc();
        let user = User {
            id: unused_id(&users),
            session_id: *values.session_id,
            username: values.username.to_string(),
            hashed_password: values.hashed_password.to_string(),
            name: values.name.to_string(),
            role: values.role,
            phone_number: to_owned_option(values.phone_number),
            university: to_owned_option(values.university),
            school: to_owned_option(values.school),
            student_id: to_owned_option(values.student_id),
            bio: None,
            rating: DEFAULT_RATING,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn update_user(&self, user: &User, values: &UpdateUserValues<'_>) -> Result<User> {
        Ok(self
            .users
            .lock()
            .await
            .get_mut(&user.id)
            .map(|user| {
                if let Some(name) = values.name {
                    user.name = name.to_string();
                }

                if let Some(phone_number) = values.phone_number {
                    user.phone_number = Some(phone_number.to_string());
                }

                if let Some(university) = values.university {
                    user.university = Some(university.to_string());
                }

                if let Some(school) = values.school {
                    user.school = Some(school.to_string());
                }

                if let Some(student_id) = values.student_id {
                    user.student_id = Some(student_id.to_string());
                }

                if let Some(bio) = values.bio {
                    user.bio = Some(bio.to_string());
                }

                user.updated_at = Utc::now().naive_utc();

                user.clone()
            })
            .expect("HashMap is the source of the user"))
    }

    async fn delete_user(&self, user: &User) -> Result<()> {
        if let Some(user) = self.users.lock().await.get_mut(&user.id) {
            user.deleted_at = Some(Utc::now().naive_utc());
        }

        Ok(())
    }

    async fn find_all_courses(&self) -> Result<Vec<Course>> {
        let mut courses: Vec<Course> = self.courses.lock().await.values().cloned().collect();

        courses.sort_by(|a, b| a.code.cmp(&b.code));

        Ok(courses)
    }

    async fn find_single_course_by_id(&self, id: &Uuid) -> Result<Option<Course>> {
        Ok(self.courses.lock().await.get(id).cloned())
    }

    async fn find_single_course_by_code(&self, code: &str) -> Result<Option<Course>> {
        Ok(self
            .courses
            .lock()
            .await
            .values()
            .find(|course| course.code == code)
            .cloned())
    }

    async fn create_course(&self, values: &CreateCourseValues<'_>) -> Result<Course> {
        let mut courses = self.courses.lock().await;

        if courses.values().any(|course| course.code == values.code) {
            return Err(Error::Conflict("course code"));
        }

        let now = Utc::now().naive_utc();
        let course = Course {
            id: unused_id(&courses),
            code: values.code.to_string(),
            title: values.title.to_string(),
            description: to_owned_option(values.description),
            price: values.price,
            provider_id: values.provider.id,
            created_at: now,
            updated_at: now,
        };

        courses.insert(course.id, course.clone());

        Ok(course)
    }

    async fn update_course(
        &self,
        course: &Course,
        values: &UpdateCourseValues<'_>,
    ) -> Result<Course> {
        Ok(self
            .courses
            .lock()
            .await
            .get_mut(&course.id)
            .map(|course| {
                if let Some(title) = values.title {
                    course.title = title.to_string();
                }

                if let Some(description) = values.description {
                    course.description = Some(description.to_string());
                }

                if let Some(price) = values.price {
                    course.price = price;
                }

                course.updated_at = Utc::now().naive_utc();

                course.clone()
            })
            .expect("HashMap is the source of the course"))
    }

    async fn find_all_notes_by_course(&self, course_id: &Uuid) -> Result<Vec<Note>> {
        Ok(self
            .notes
            .lock()
            .await
            .values()
            .filter(|note| &note.course_id == course_id)
            .cloned()
            .collect())
    }

    async fn create_note(&self, course: &Course, values: &CreateNoteValues<'_>) -> Result<Note> {
        let mut notes = self.notes.lock().await;

        let note = Note {
            id: unused_id(&notes),
            course_id: course.id,
            provider_id: values.provider.id,
            title: values.title.to_string(),
            kind: values.kind,
            url: values.url.to_string(),
            created_at: Utc::now().naive_utc(),
        };

        notes.insert(note.id, note.clone());

        Ok(note)
    }

    async fn find_all_subscriptions_by_user(&self, user_id: &Uuid) -> Result<Vec<Subscription>> {
        Ok(self
            .subscriptions
            .lock()
            .await
            .values()
            .filter(|subscription| &subscription.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_single_subscription_by_id(&self, id: &Uuid) -> Result<Option<Subscription>> {
        Ok(self.subscriptions.lock().await.get(id).cloned())
    }

    async fn create_subscription(
        &self,
        values: &CreateSubscriptionValues<'_>,
    ) -> Result<Subscribed> {
        // the lock is held from the lookup until the insert
        let mut subscriptions = self.subscriptions.lock().await;

        let existing = subscriptions.values().find(|subscription| {
            subscription.grants_access_to(&values.user.id, &values.course.id)
        });

        if let Some(existing) = existing {
            return Ok(Subscribed::AlreadyActive(existing.clone()));
        }

        let paid_before = values.payment_reference.is_some_and(|payment_reference| {
            subscriptions.values().any(|subscription| {
                subscription.payment_reference.as_deref() == Some(payment_reference)
            })
        });
        if paid_before {
            return Err(Error::Conflict(PAYMENT_REFERENCE));
        }

        let now = Utc::now().naive_utc();
        let subscription = Subscription {
            id: unused_id(&subscriptions),
            user_id: values.user.id,
            course_id: values.course.id,
            active: true,
            start_date: now,
            payment_reference: to_owned_option(values.payment_reference),
            updated_at: now,
        };

        subscriptions.insert(subscription.id, subscription.clone());

        Ok(Subscribed::Created(subscription))
    }

    async fn deactivate_subscription(&self, subscription: &Subscription) -> Result<Subscription> {
        Ok(self
            .subscriptions
            .lock()
            .await
            .get_mut(&subscription.id)
            .map(|subscription| {
                subscription.active = false;
                subscription.updated_at = Utc::now().naive_utc();

                subscription.clone()
            })
            .expect("HashMap is the source of the subscription"))
    }
}
