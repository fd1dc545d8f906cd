//! End-to-end tests for the instructor console.
//!
//! These drive a full [`CourseConsole`] session against the in-memory
//! store and a scripted credential service, covering the whole lesson
//! lifecycle, grading, live sessions, and the permission gates.

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use atenea_client::{MemoryStore, StaticAuth};
use atenea_console::collab::{CredentialService, DocumentStore};
use atenea_console::error::{ConsoleError, ResourceKind, Result};
use atenea_console::live::{LiveSessionRequest, SessionCredential};
use atenea_console::{
    ConsoleConfig, CourseConsole, Identity, LessonContent, LessonKind, LiveState, Question,
};

// ============================================================================
// Fixtures
// ============================================================================

const COURSE_ID: &str = "c1";
const TEACHER_ID: &str = "t1";

/// A credential service that records every request it sees.
#[derive(Default)]
struct ScriptedCredentials {
    requests: Mutex<Vec<LiveSessionRequest>>,
    mints: AtomicUsize,
    fail: AtomicBool,
}

#[async_trait]
impl CredentialService for ScriptedCredentials {
    async fn mint(&self, request: &LiveSessionRequest) -> Result<SessionCredential> {
        self.mints.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(ConsoleError::network("credential mint", "endpoint down"));
        }
        Ok(SessionCredential::new("header.payload.signature"))
    }
}

fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store
        .insert(
            "courses",
            COURSE_ID,
            json!({
                "title": "Algebra I",
                "description": "first-year algebra",
                "teacherId": TEACHER_ID,
                "lessons": [
                    {
                        "id": "les_text",
                        "title": "Welcome",
                        "type": "text",
                        "content": "read the syllabus",
                        "order": 0,
                        "createdAt": "2026-02-01T09:00:00Z"
                    },
                    {
                        "id": "les_quiz",
                        "title": "Checkpoint",
                        "type": "quiz",
                        "content": [
                            {"question": "1+1?", "options": ["1", "2", "3", "4"], "correct": 1},
                            {"question": "2+2?", "options": ["2", "3", "4", "5"], "correct": 2},
                            {"question": "3+3?", "options": ["6", "7", "8", "9"], "correct": 0}
                        ],
                        "order": 1,
                        "createdAt": "2026-02-02T09:00:00Z"
                    }
                ]
            }),
        )
        .unwrap();
    store
        .insert(
            "enrollments",
            "e1",
            json!({"courseId": COURSE_ID, "userId": "u1", "grade": 6.0, "joinedAt": "2026-01-15"}),
        )
        .unwrap();
    store
        .insert(
            "enrollments",
            "e2",
            json!({"courseId": COURSE_ID, "userId": "u2"}),
        )
        .unwrap();
    store
        .insert("users", "u1", json!({"name": "Ada", "email": "ada@example.com"}))
        .unwrap();
    store
        .insert("users", "u2", json!({"email": "grace@example.com"}))
        .unwrap();
    store
}

fn teacher() -> Identity {
    Identity {
        user_id: TEACHER_ID.to_string(),
        display_name: None,
        email: Some("teacher@example.com".to_string()),
    }
}

async fn open_as(
    store: Arc<MemoryStore>,
    credentials: Arc<ScriptedCredentials>,
    identity: Identity,
) -> Result<CourseConsole> {
    CourseConsole::open(
        store.clone(),
        store,
        credentials,
        Arc::new(StaticAuth::signed_in(identity)),
        ConsoleConfig::default(),
        COURSE_ID,
    )
    .await
}

async fn open_console(store: Arc<MemoryStore>) -> (CourseConsole, Arc<ScriptedCredentials>) {
    let credentials = Arc::new(ScriptedCredentials::default());
    let console = open_as(store, credentials.clone(), teacher()).await.unwrap();
    (console, credentials)
}

// ============================================================================
// Session bootstrap
// ============================================================================

#[tokio::test]
async fn test_open_hydrates_course_and_roster() {
    let (console, _) = open_console(seeded_store()).await;

    assert_eq!(console.course().title, "Algebra I");
    assert_eq!(console.course().lessons.len(), 2);

    let students = console.students();
    assert_eq!(students.len(), 2);
    assert_eq!(students[0].name, "Ada");
    assert_eq!(students[0].grade, Some(6.0));
    // No name on the profile: the email stands in.
    assert_eq!(students[1].name, "grace@example.com");
    assert_eq!(students[1].grade, None);

    assert_eq!(console.grade_draft("u1"), "6");
    assert_eq!(console.grade_draft("u2"), "");
}

#[tokio::test]
async fn test_open_requires_sign_in() {
    let store = seeded_store();
    let err = CourseConsole::open(
        store.clone(),
        store,
        Arc::new(ScriptedCredentials::default()),
        Arc::new(StaticAuth::signed_out()),
        ConsoleConfig::default(),
        COURSE_ID,
    )
    .await
    .unwrap_err();
    assert_eq!(err, ConsoleError::Unauthenticated);
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_open_requires_ownership() {
    let err = open_as(
        seeded_store(),
        Arc::new(ScriptedCredentials::default()),
        Identity::new("u1"),
    )
    .await
    .unwrap_err();
    assert_eq!(err, ConsoleError::permission_denied("u1", COURSE_ID));
}

#[tokio::test]
async fn test_open_missing_course() {
    let store = Arc::new(MemoryStore::new());
    let err = CourseConsole::open(
        store.clone(),
        store,
        Arc::new(ScriptedCredentials::default()),
        Arc::new(StaticAuth::signed_in(teacher())),
        ConsoleConfig::default(),
        COURSE_ID,
    )
    .await
    .unwrap_err();
    assert_eq!(err, ConsoleError::not_found(ResourceKind::Course, COURSE_ID));
}

// ============================================================================
// Lesson lifecycle
// ============================================================================

#[tokio::test]
async fn test_create_live_lesson_composes_room_id() {
    let store = seeded_store();
    let (mut console, _) = open_console(store.clone()).await;

    console.begin_create().unwrap();
    let draft = console.draft_mut().unwrap();
    draft.title = "Live review".to_string();
    draft.kind = LessonKind::Live;
    draft.room_name = "algebra1".to_string();

    let lesson = console.submit_lesson().await.unwrap();
    assert_eq!(lesson.content, LessonContent::Live("c1_algebra1".to_string()));
    assert_eq!(lesson.order, 2);
    assert_eq!(lesson.recording_url, None);

    // The stored document carries the composite identifier.
    let stored = store.get("courses", COURSE_ID).await.unwrap().unwrap();
    let lessons = stored["lessons"].as_array().unwrap();
    assert_eq!(lessons.len(), 3);
    assert_eq!(lessons[2]["type"], "live");
    assert_eq!(lessons[2]["content"], "c1_algebra1");
}

#[tokio::test]
async fn test_edit_round_trip_preserves_identity() {
    let store = seeded_store();
    let (mut console, _) = open_console(store.clone()).await;

    // Create a live lesson, then reopen it for editing.
    console.begin_create().unwrap();
    let draft = console.draft_mut().unwrap();
    draft.title = "Live review".to_string();
    draft.kind = LessonKind::Live;
    draft.room_name = "algebra1".to_string();
    let created = console.submit_lesson().await.unwrap();

    console.begin_edit(&created.id).unwrap();
    // The stored prefix is stripped back to the editable room name.
    assert_eq!(console.editor().draft().unwrap().room_name, "algebra1");

    // Submitting without changes keeps id, order, and creation time.
    let saved = console.submit_lesson().await.unwrap();
    assert_eq!(saved.id, created.id);
    assert_eq!(saved.order, created.order);
    assert_eq!(saved.created_at, created.created_at);
    assert_eq!(saved.content, created.content);
    assert_eq!(console.course().lessons.len(), 3);
}

#[tokio::test]
async fn test_quiz_edit_persists_answer_change() {
    let store = seeded_store();
    let (mut console, _) = open_console(store.clone()).await;

    console.begin_edit("les_quiz").unwrap();
    {
        let draft = console.draft_mut().unwrap();
        assert_eq!(draft.kind, LessonKind::Quiz);
        assert_eq!(draft.questions.len(), 3);
        draft.questions[2].correct = 2;
    }
    console.submit_lesson().await.unwrap();

    // Reload the course from the store: the change survived persistence.
    let (reloaded, _) = open_console(store).await;
    let lesson = reloaded.course().lesson("les_quiz").unwrap();
    match &lesson.content {
        LessonContent::Quiz(questions) => {
            assert_eq!(questions[2].correct, 2);
            assert_eq!(questions[0].correct, 1);
        }
        other => panic!("expected quiz content, got {other:?}"),
    }
}

#[tokio::test]
async fn test_validation_blocks_write_and_keeps_draft() {
    let store = seeded_store();
    let (mut console, _) = open_console(store.clone()).await;

    console.begin_create().unwrap();
    let draft = console.draft_mut().unwrap();
    draft.title = "Broken quiz".to_string();
    draft.kind = LessonKind::Quiz;
    draft.questions = vec![Question {
        prompt: "pick one".to_string(),
        options: vec!["a".to_string(), "b".to_string()],
        correct: 0,
    }];

    let err = console.submit_lesson().await.unwrap_err();
    assert!(matches!(err, ConsoleError::Validation(_)));
    assert!(err.is_recoverable());

    // Nothing was written and the form is still open with the bad draft.
    let stored = store.get("courses", COURSE_ID).await.unwrap().unwrap();
    assert_eq!(stored["lessons"].as_array().unwrap().len(), 2);
    assert_eq!(console.editor().draft().unwrap().title, "Broken quiz");

    // Fixing the draft makes the same submission go through.
    console.draft_mut().unwrap().questions = vec![Question::default()];
    console.submit_lesson().await.unwrap();
    assert_eq!(console.course().lessons.len(), 3);
}

#[tokio::test]
async fn test_cancel_edit_is_idempotent() {
    let (mut console, _) = open_console(seeded_store()).await;

    console.begin_edit("les_text").unwrap();
    console.cancel_edit().unwrap();
    console.cancel_edit().unwrap();
    assert!(console.editor().draft().is_none());
    // The course is untouched.
    assert_eq!(console.course().lessons.len(), 2);
}

// ============================================================================
// Grading
// ============================================================================

#[tokio::test]
async fn test_grade_commit_patches_only_grade_field() {
    let store = seeded_store();
    let (mut console, _) = open_console(store.clone()).await;

    console.set_grade_draft("u1", "7.5");
    assert_eq!(console.commit_grade("u1").await.unwrap(), Some(7.5));

    let stored = store.get("enrollments", "e1").await.unwrap().unwrap();
    assert_eq!(stored["grade"], 7.5);
    // Unrelated enrollment fields survive the patch.
    assert_eq!(stored["joinedAt"], "2026-01-15");
    assert_eq!(stored["userId"], "u1");

    // The cached roster row follows the write.
    assert_eq!(console.students()[0].grade, Some(7.5));
}

#[tokio::test]
async fn test_grade_draft_filtering() {
    let (mut console, _) = open_console(seeded_store()).await;

    for rejected in ["-1", "11", "10.01", "abc", "NaN"] {
        console.set_grade_draft("u1", rejected);
        assert_eq!(console.grade_draft("u1"), "6", "{rejected} must be rejected");
    }

    console.set_grade_draft("u1", "0");
    assert_eq!(console.grade_draft("u1"), "0");
    console.set_grade_draft("u1", "10");
    assert_eq!(console.grade_draft("u1"), "10");
    console.set_grade_draft("u1", "");
    assert_eq!(console.grade_draft("u1"), "");
}

#[tokio::test]
async fn test_grade_empty_draft_commit_is_noop() {
    let store = seeded_store();
    let (mut console, _) = open_console(store.clone()).await;

    console.set_grade_draft("u1", "");
    assert_eq!(console.commit_grade("u1").await.unwrap(), None);

    let stored = store.get("enrollments", "e1").await.unwrap().unwrap();
    assert_eq!(stored["grade"], 6.0);
}

#[tokio::test]
async fn test_grade_drafts_are_per_student() {
    let store = seeded_store();
    let (mut console, _) = open_console(store.clone()).await;

    console.set_grade_draft("u1", "9");
    console.set_grade_draft("u2", "4");
    console.commit_grade("u2").await.unwrap();

    // Committing u2 never touched u1's record or draft.
    let stored = store.get("enrollments", "e1").await.unwrap().unwrap();
    assert_eq!(stored["grade"], 6.0);
    assert_eq!(console.grade_draft("u1"), "9");
    let stored = store.get("enrollments", "e2").await.unwrap().unwrap();
    assert_eq!(stored["grade"], 4.0);
}

// ============================================================================
// Live sessions
// ============================================================================

async fn console_with_live_lesson() -> (CourseConsole, Arc<ScriptedCredentials>, String) {
    let (mut console, credentials) = open_console(seeded_store()).await;
    console.begin_create().unwrap();
    let draft = console.draft_mut().unwrap();
    draft.title = "Live review".to_string();
    draft.kind = LessonKind::Live;
    draft.room_name = "algebra1".to_string();
    let lesson = console.submit_lesson().await.unwrap();
    (console, credentials, lesson.id)
}

#[tokio::test]
async fn test_start_live_requests_moderator_for_full_room() {
    let (mut console, credentials, lesson_id) = console_with_live_lesson().await;

    let view = console.start_live(&lesson_id).await.unwrap();
    assert_eq!(view.room_name, "c1_algebra1");
    assert_eq!(view.credential.secret(), "header.payload.signature");
    assert_eq!(console.live_state(), LiveState::Active);

    let requests = credentials.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].room_name, "c1_algebra1");
    assert_eq!(requests[0].role.to_string(), "moderator");
    // No display name on the identity: the email stands in for both fields.
    assert_eq!(requests[0].requester.display_name, "teacher@example.com");
    assert_eq!(requests[0].requester.email, "teacher@example.com");
}

#[tokio::test]
async fn test_one_credential_request_per_session() {
    let (mut console, credentials, lesson_id) = console_with_live_lesson().await;

    console.start_live(&lesson_id).await.unwrap();
    let err = console.start_live(&lesson_id).await.unwrap_err();
    assert_eq!(err, ConsoleError::busy("live session"));
    assert_eq!(credentials.mints.load(Ordering::SeqCst), 1);

    // After closing, a new attempt makes exactly one more request.
    console.close_live();
    console.start_live(&lesson_id).await.unwrap();
    assert_eq!(credentials.mints.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_failed_mint_leaves_session_closed() {
    let (mut console, credentials, lesson_id) = console_with_live_lesson().await;
    credentials.fail.store(true, Ordering::SeqCst);

    let err = console.start_live(&lesson_id).await.unwrap_err();
    assert!(matches!(err, ConsoleError::Network { .. }));
    assert_eq!(console.live_state(), LiveState::Closed);
    assert!(console.live_view().is_none());
}

#[tokio::test]
async fn test_start_live_rejects_non_live_lesson() {
    let (mut console, credentials) = open_console(seeded_store()).await;

    let err = console.start_live("les_text").await.unwrap_err();
    assert!(matches!(err, ConsoleError::Validation(_)));
    // Validation happens before any credential traffic.
    assert_eq!(credentials.mints.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_close_live_is_idempotent() {
    let (mut console, _, lesson_id) = console_with_live_lesson().await;

    console.start_live(&lesson_id).await.unwrap();
    console.close_live();
    console.close_live();
    assert_eq!(console.live_state(), LiveState::Closed);
}

// ============================================================================
// Cover image
// ============================================================================

#[tokio::test]
async fn test_replace_cover_end_to_end() {
    let store = seeded_store();
    let (mut console, _) = open_console(store.clone()).await;

    let url = console.replace_cover(vec![0xff, 0xd8, 0xff]).await.unwrap();
    assert_eq!(url, "memstore://courses/c1/cover.jpg");
    assert_eq!(console.course().image_url.as_deref(), Some(url.as_str()));

    let stored = store.get("courses", COURSE_ID).await.unwrap().unwrap();
    assert_eq!(stored["imageUrl"], url);
    assert_eq!(
        store.asset("courses/c1/cover.jpg").unwrap(),
        Some(vec![0xff, 0xd8, 0xff])
    );
}

// ============================================================================
// Independent machines
// ============================================================================

#[tokio::test]
async fn test_editor_live_and_grades_do_not_block_each_other() {
    let (mut console, _, lesson_id) = console_with_live_lesson().await;

    // With a session active, editing and grading proceed normally.
    console.start_live(&lesson_id).await.unwrap();
    console.begin_edit("les_text").unwrap();
    console.draft_mut().unwrap().title = "Welcome (v2)".to_string();
    console.submit_lesson().await.unwrap();
    console.set_grade_draft("u1", "8");
    console.commit_grade("u1").await.unwrap();

    assert_eq!(console.live_state(), LiveState::Active);
    assert_eq!(console.course().lesson("les_text").unwrap().title, "Welcome (v2)");
    assert_eq!(console.students()[0].grade, Some(8.0));
}
