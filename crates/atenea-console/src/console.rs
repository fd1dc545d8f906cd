//! Course console coordinator.
//!
//! One [`CourseConsole`] is one instructor session on one course. It owns
//! the loaded course state, the roster with its grade ledger, and the
//! three independent sub-machines (lesson editor, live session, cover
//! upload), and it is the only place that talks to the collaborators.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, warn};

use crate::collab::{AssetStore, AuthService, CredentialService, DocumentStore, FieldFilter};
use crate::config::ConsoleConfig;
use crate::course::{
    Course, EnrolledStudent, Enrollment, Identity, UserProfile, COURSES_COLLECTION,
    ENROLLMENTS_COLLECTION, USERS_COLLECTION,
};
use crate::editor::LessonEditor;
use crate::error::{ConsoleError, ResourceKind, Result};
use crate::grades::GradeLedger;
use crate::lesson::{Lesson, LessonDraft};
use crate::live::{LiveSession, LiveState, LiveView, SessionRole};

/// An instructor's session on one course.
pub struct CourseConsole {
    store: Arc<dyn DocumentStore>,
    assets: Arc<dyn AssetStore>,
    credentials: Arc<dyn CredentialService>,
    config: ConsoleConfig,
    user: Identity,
    course_id: String,
    course: Course,
    students: Vec<EnrolledStudent>,
    ledger: GradeLedger,
    editor: LessonEditor,
    live: LiveSession,
    cover_uploading: bool,
}

impl std::fmt::Debug for CourseConsole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CourseConsole")
            .field("course_id", &self.course_id)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl CourseConsole {
    /// Opens a console session on a course.
    ///
    /// Resolves the identity, loads the course, checks ownership, then
    /// hydrates the roster. Order matters: no enrollment or profile load
    /// happens before the permission gate passes.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` when nobody is signed in, `NotFound` when the
    /// course does not exist, `PermissionDenied` when the signed-in user
    /// is not the course's instructor.
    pub async fn open(
        store: Arc<dyn DocumentStore>,
        assets: Arc<dyn AssetStore>,
        credentials: Arc<dyn CredentialService>,
        auth: Arc<dyn AuthService>,
        config: ConsoleConfig,
        course_id: impl Into<String>,
    ) -> Result<Self> {
        let course_id = course_id.into();

        let Some(user) = auth.current_user().await? else {
            return Err(ConsoleError::Unauthenticated);
        };
        debug!(user_id = %user.user_id, course_id = %course_id, "opening console");

        let Some(raw) = store.get(COURSES_COLLECTION, &course_id).await? else {
            return Err(ConsoleError::not_found(ResourceKind::Course, &course_id));
        };
        let course: Course = serde_json::from_value(raw)
            .map_err(|e| ConsoleError::decode("course", e))?;

        if course.teacher_id != user.user_id {
            return Err(ConsoleError::permission_denied(&user.user_id, &course_id));
        }

        let (students, ledger) = load_roster(store.as_ref(), &course_id).await?;
        info!(
            course_id = %course_id,
            lessons = course.lessons.len(),
            students = students.len(),
            "console opened"
        );

        Ok(Self {
            store,
            assets,
            credentials,
            config,
            user,
            course_id,
            course,
            students,
            ledger,
            editor: LessonEditor::new(),
            live: LiveSession::new(),
            cover_uploading: false,
        })
    }

    // ========================================================================
    // Read accessors
    // ========================================================================

    /// The loaded course.
    #[must_use]
    pub const fn course(&self) -> &Course {
        &self.course
    }

    /// The course id this session is bound to.
    #[must_use]
    pub fn course_id(&self) -> &str {
        &self.course_id
    }

    /// The signed-in instructor.
    #[must_use]
    pub const fn user(&self) -> &Identity {
        &self.user
    }

    /// The hydrated roster rows, in load order.
    #[must_use]
    pub fn students(&self) -> &[EnrolledStudent] {
        &self.students
    }

    /// The lesson editor, for state and draft inspection.
    #[must_use]
    pub const fn editor(&self) -> &LessonEditor {
        &self.editor
    }

    /// The session configuration.
    #[must_use]
    pub const fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    // ========================================================================
    // Lesson editing
    // ========================================================================

    /// Opens a blank lesson form.
    pub fn begin_create(&mut self) -> Result<()> {
        self.editor.begin_create()
    }

    /// Opens the form pre-filled from an existing lesson.
    ///
    /// # Errors
    ///
    /// `NotFound` when the lesson is not in this course.
    pub fn begin_edit(&mut self, lesson_id: &str) -> Result<()> {
        let Some(lesson) = self.course.lesson(lesson_id) else {
            return Err(ConsoleError::not_found(ResourceKind::Lesson, lesson_id));
        };
        let lesson = lesson.clone();
        self.editor.begin_edit(&lesson, &self.course_id)
    }

    /// Discards the open draft.
    pub fn cancel_edit(&mut self) -> Result<()> {
        self.editor.cancel()
    }

    /// Mutable access to the open draft.
    pub fn draft_mut(&mut self) -> Option<&mut LessonDraft> {
        self.editor.draft_mut()
    }

    /// Validates the draft and persists the lesson.
    ///
    /// The course document's lesson array is replaced atomically. Local
    /// course state changes only after the write succeeds; a failed write
    /// returns the editor to `Editing` with the draft preserved.
    ///
    /// # Errors
    ///
    /// Validation, re-entrancy, and store errors, per the editor contract.
    pub async fn submit_lesson(&mut self) -> Result<Lesson> {
        let save = self.editor.prepare_submit(&self.course_id, &self.course.lessons)?;

        let lessons_value = match serde_json::to_value(&save.lessons) {
            Ok(value) => value,
            Err(e) => {
                let failure = ConsoleError::decode("lesson", e);
                self.editor.complete(Err(failure.clone()))?;
                return Err(failure);
            }
        };

        let outcome = self
            .store
            .update(
                COURSES_COLLECTION,
                &self.course_id,
                json!({ "lessons": lessons_value }),
            )
            .await;

        match outcome {
            Ok(()) => {
                self.course.lessons = save.lessons;
                self.editor.complete(Ok(()))?;
                info!(lesson_id = %save.lesson.id, "lesson saved");
                Ok(save.lesson)
            }
            Err(failure) => {
                warn!(error = %failure, "lesson save failed");
                self.editor.complete(Err(failure.clone()))?;
                Err(failure)
            }
        }
    }

    // ========================================================================
    // Grading
    // ========================================================================

    /// Updates a student's draft grade; invalid input is silently dropped.
    pub fn set_grade_draft(&mut self, user_id: &str, value: &str) {
        self.ledger.set_draft(user_id, value);
    }

    /// The current draft grade text for a student.
    #[must_use]
    pub fn grade_draft(&self, user_id: &str) -> &str {
        self.ledger.draft(user_id)
    }

    /// Commits a student's draft grade to their enrollment record.
    ///
    /// An empty draft is a no-op (`Ok(None)`). The enrollment is resolved
    /// by `(userId, courseId)` equality and only its `grade` field is
    /// patched; the cached roster row updates after the write.
    ///
    /// # Errors
    ///
    /// `NotFound` when the student has no enrollment in this course,
    /// `Network` on store failure.
    pub async fn commit_grade(&mut self, user_id: &str) -> Result<Option<f64>> {
        let Some(grade) = self.ledger.parsed(user_id) else {
            return Ok(None);
        };

        let filters = [
            FieldFilter::equals("userId", user_id),
            FieldFilter::equals("courseId", self.course_id.as_str()),
        ];
        let matches = self.store.query(ENROLLMENTS_COLLECTION, &filters).await?;
        let Some(enrollment) = matches.first() else {
            return Err(ConsoleError::not_found(ResourceKind::Enrollment, user_id));
        };

        self.store
            .update(
                ENROLLMENTS_COLLECTION,
                &enrollment.id,
                json!({ "grade": grade }),
            )
            .await?;

        if let Some(row) = self.students.iter_mut().find(|s| s.user_id == user_id) {
            row.grade = Some(grade);
        }
        info!(user_id = %user_id, grade, "grade committed");
        Ok(Some(grade))
    }

    // ========================================================================
    // Live sessions
    // ========================================================================

    /// Starts a live session for a lesson, minting a moderator credential.
    ///
    /// Ownership is re-checked locally before the moderator role is
    /// requested; the endpoint is expected to validate it again. Exactly
    /// one credential request is made per attempt, and a failed mint
    /// returns the orchestrator to `Closed`.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown lesson, `NotLive` for a non-live one,
    /// `Busy` while a session is requesting or active, `Network` when the
    /// mint fails.
    pub async fn start_live(&mut self, lesson_id: &str) -> Result<&LiveView> {
        let Some(lesson) = self.course.lesson(lesson_id) else {
            return Err(ConsoleError::not_found(ResourceKind::Lesson, lesson_id));
        };
        let lesson = lesson.clone();

        if self.course.teacher_id != self.user.user_id {
            return Err(ConsoleError::permission_denied(
                &self.user.user_id,
                &self.course_id,
            ));
        }

        let request = self
            .live
            .begin(&lesson, &self.user, SessionRole::Moderator)?;
        debug!(room = %request.room_name, "requesting session credential");

        match self.credentials.mint(&request).await {
            Ok(credential) => {
                let view = self.live.activate(credential)?;
                info!(lesson_id = %view.lesson_id, room = %view.room_name, "live session started");
                Ok(view)
            }
            Err(failure) => {
                warn!(error = %failure, "credential request failed");
                self.live.abort()?;
                Err(failure)
            }
        }
    }

    /// Ends the live session, dropping the credential. Idempotent.
    pub fn close_live(&mut self) {
        if self.live.is_active() {
            info!("live session closed");
        }
        self.live.close();
    }

    /// The live orchestrator's observable state.
    #[must_use]
    pub const fn live_state(&self) -> LiveState {
        self.live.state()
    }

    /// The active session view, if a session is live.
    #[must_use]
    pub const fn live_view(&self) -> Option<&LiveView> {
        self.live.view()
    }

    /// The configured video application id for presenting sessions.
    #[must_use]
    pub fn video_app_id(&self) -> &str {
        &self.config.video_app_id
    }

    // ========================================================================
    // Cover image
    // ========================================================================

    /// Replaces the course cover image.
    ///
    /// Uploads the bytes to the course-keyed asset path, then points the
    /// course document's `imageUrl` at the stored reference. Local state
    /// updates only after both writes succeed.
    ///
    /// # Errors
    ///
    /// `Busy` while an upload is already in flight, `Network` on store
    /// failure.
    pub async fn replace_cover(&mut self, bytes: Vec<u8>) -> Result<String> {
        if self.cover_uploading {
            return Err(ConsoleError::busy("cover upload"));
        }
        self.cover_uploading = true;

        let path = self.config.cover_path(&self.course_id);
        let outcome = self.upload_cover(&path, bytes).await;
        self.cover_uploading = false;

        match &outcome {
            Ok(url) => info!(url = %url, "cover image replaced"),
            Err(failure) => warn!(error = %failure, "cover upload failed"),
        }
        outcome
    }

    async fn upload_cover(&mut self, path: &str, bytes: Vec<u8>) -> Result<String> {
        let url = self.assets.put(path, bytes).await?;
        self.store
            .update(
                COURSES_COLLECTION,
                &self.course_id,
                json!({ "imageUrl": url }),
            )
            .await?;
        self.course.image_url = Some(url.clone());
        Ok(url)
    }
}

/// Loads and joins the roster for a course.
///
/// Enrollments with a blank user id, a missing profile document, or an
/// undecodable record are skipped with a warning, never an error.
async fn load_roster(
    store: &dyn DocumentStore,
    course_id: &str,
) -> Result<(Vec<EnrolledStudent>, GradeLedger)> {
    let filters = [FieldFilter::equals("courseId", course_id)];
    let enrollment_docs = store.query(ENROLLMENTS_COLLECTION, &filters).await?;

    let mut students = Vec::with_capacity(enrollment_docs.len());
    let mut ledger = GradeLedger::new();
    for doc in enrollment_docs {
        let enrollment: Enrollment = match serde_json::from_value(doc.fields) {
            Ok(enrollment) => enrollment,
            Err(e) => {
                warn!(enrollment_id = %doc.id, error = %e, "skipping undecodable enrollment");
                continue;
            }
        };
        if enrollment.user_id.trim().is_empty() {
            warn!(enrollment_id = %doc.id, "skipping enrollment with blank user id");
            continue;
        }

        let Some(raw_profile) = store.get(USERS_COLLECTION, &enrollment.user_id).await? else {
            warn!(user_id = %enrollment.user_id, "skipping enrollment with missing profile");
            continue;
        };
        let profile: UserProfile = match serde_json::from_value(raw_profile) {
            Ok(profile) => profile,
            Err(e) => {
                warn!(user_id = %enrollment.user_id, error = %e, "skipping undecodable profile");
                continue;
            }
        };

        ledger.seed(enrollment.user_id.clone(), enrollment.grade);
        students.push(EnrolledStudent::from_parts(doc.id, &enrollment, &profile));
    }
    Ok((students, ledger))
}
