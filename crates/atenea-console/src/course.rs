//! Persisted course data model and identity types.
//!
//! These structs mirror the document-store layout exactly (camelCase
//! fields, lessons embedded in the course document) so the console can
//! read and write them without a mapping layer.

use serde::{Deserialize, Serialize};

use crate::lesson::Lesson;

/// Collection holding course documents.
pub const COURSES_COLLECTION: &str = "courses";
/// Collection holding enrollment documents.
pub const ENROLLMENTS_COLLECTION: &str = "enrollments";
/// Collection holding user profile documents.
pub const USERS_COLLECTION: &str = "users";

/// A course document as stored, keyed by course id.
///
/// Lessons are embedded as one array; every lesson write replaces the
/// whole array atomically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    /// Course title.
    pub title: String,

    /// Course description.
    #[serde(default)]
    pub description: String,

    /// Cover image reference, if one has been uploaded.
    #[serde(default)]
    pub image_url: Option<String>,

    /// User id of the owning instructor.
    pub teacher_id: String,

    /// Ordered lesson list.
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

impl Course {
    /// Looks up a lesson by id.
    #[must_use]
    pub fn lesson(&self, lesson_id: &str) -> Option<&Lesson> {
        self.lessons.iter().find(|lesson| lesson.id == lesson_id)
    }
}

/// An enrollment document linking a student to a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    /// The course the student is enrolled in.
    pub course_id: String,

    /// The enrolled student's user id.
    pub user_id: String,

    /// Grade on the 0..=10 scale, absent until first graded.
    #[serde(default)]
    pub grade: Option<f64>,
}

/// A user profile document, keyed by user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Display name, may be absent or blank.
    #[serde(default)]
    pub name: Option<String>,

    /// Contact email.
    #[serde(default)]
    pub email: Option<String>,
}

/// One row of the roster view: an enrollment joined with its profile.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrolledStudent {
    /// The student's user id.
    pub user_id: String,

    /// Id of the backing enrollment document.
    pub enrollment_id: String,

    /// Display name, falling back to email, then a placeholder.
    pub name: String,

    /// Contact email, if the profile carries one.
    pub email: Option<String>,

    /// Current grade, absent until first graded.
    pub grade: Option<f64>,
}

impl EnrolledStudent {
    /// Joins an enrollment row with the matching user profile.
    #[must_use]
    pub fn from_parts(enrollment_id: String, enrollment: &Enrollment, profile: &UserProfile) -> Self {
        let name = profile
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(ToString::to_string)
            .or_else(|| profile.email.clone())
            .unwrap_or_else(|| format!("student {}", enrollment.user_id));
        Self {
            user_id: enrollment.user_id.clone(),
            enrollment_id,
            name,
            email: profile.email.clone(),
            grade: enrollment.grade,
        }
    }
}

/// The authenticated identity driving a console session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Stable user id from the auth provider.
    pub user_id: String,

    /// Display name, if the provider exposes one.
    pub display_name: Option<String>,

    /// Email address, if the provider exposes one.
    pub email: Option<String>,
}

impl Identity {
    /// Creates an identity with just a user id.
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: None,
            email: None,
        }
    }

    /// Best available human-readable label: display name, then email,
    /// then the raw user id.
    #[must_use]
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .or(self.email.as_deref())
            .unwrap_or(&self.user_id)
    }
}
