//! Core engine of the Atenea instructor console.
//!
//! This crate implements the session-scoped logic behind an instructor's
//! course page: the lesson content model with its validation rules, the
//! lesson editor and live session state machines, the grade ledger, and
//! the [`CourseConsole`] coordinator that wires them to the external
//! collaborators (document store, asset store, credential endpoint, auth
//! provider).
//!
//! All I/O goes through the traits in [`collab`]; the engine itself never
//! opens a socket, which is what keeps every state transition unit
//! testable.

pub mod collab;
pub mod config;
pub mod console;
pub mod course;
pub mod editor;
pub mod error;
pub mod grades;
pub mod lesson;
pub mod live;

pub use collab::{AssetStore, AuthService, CredentialService, Document, DocumentStore, FieldFilter};
pub use config::ConsoleConfig;
pub use console::CourseConsole;
pub use course::{Course, EnrolledStudent, Enrollment, Identity, UserProfile};
pub use editor::{EditorState, LessonEditor, PendingSave};
pub use error::{ConsoleError, QuestionFault, ResourceKind, Result, ValidationError};
pub use grades::GradeLedger;
pub use lesson::{Lesson, LessonContent, LessonDraft, LessonKind, Question};
pub use live::{
    LiveSession, LiveSessionRequest, LiveState, LiveView, RequesterInfo, SessionCredential,
    SessionRole,
};
