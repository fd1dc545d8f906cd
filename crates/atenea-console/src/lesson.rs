//! Lesson content model for the Atenea instructor console.
//!
//! This module defines the five lesson content variants as one tagged
//! union, the quiz question invariants, and the pure validation that turns
//! raw draft fields into a normalized lesson payload. Nothing here touches
//! the store: validation failures never leave the client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{QuestionFault, ValidationError, QUESTION_OPTION_COUNT};

/// The lesson type selector, as shown in the editor form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LessonKind {
    /// Plain text body (default for new drafts).
    #[default]
    Text,
    /// External video URL.
    Video,
    /// External PDF URL.
    Pdf,
    /// Live video session room.
    Live,
    /// Multiple-choice quiz.
    Quiz,
}

impl LessonKind {
    /// Parses a string into a `LessonKind`, case-insensitively.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(Self::Text),
            "video" => Some(Self::Video),
            "pdf" => Some(Self::Pdf),
            "live" => Some(Self::Live),
            "quiz" => Some(Self::Quiz),
            _ => None,
        }
    }
}

impl std::str::FromStr for LessonKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_str_case_insensitive(s).ok_or_else(|| {
            format!("invalid lesson type '{s}': expected one of 'text', 'video', 'pdf', 'live', 'quiz'")
        })
    }
}

impl std::fmt::Display for LessonKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Video => write!(f, "video"),
            Self::Pdf => write!(f, "pdf"),
            Self::Live => write!(f, "live"),
            Self::Quiz => write!(f, "quiz"),
        }
    }
}

/// One multiple-choice quiz question.
///
/// Invariant: exactly [`QUESTION_OPTION_COUNT`] options, with `correct`
/// addressing one of them. Stored documents may violate this (they are
/// validated on submission, not on load), so [`Question::validate`] is
/// re-run every time a quiz draft is normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// The question text shown to students.
    #[serde(rename = "question")]
    pub prompt: String,

    /// The answer options, in display order.
    pub options: Vec<String>,

    /// Zero-based index of the correct option.
    pub correct: usize,
}

impl Default for Question {
    /// A blank question template: empty prompt, four empty options.
    fn default() -> Self {
        Self {
            prompt: String::new(),
            options: vec![String::new(); QUESTION_OPTION_COUNT],
            correct: 0,
        }
    }
}

impl Question {
    /// Checks the option-count and answer-index invariants.
    pub fn validate(&self) -> std::result::Result<(), QuestionFault> {
        if self.options.len() != QUESTION_OPTION_COUNT {
            return Err(QuestionFault::WrongOptionCount(self.options.len()));
        }
        if self.correct >= QUESTION_OPTION_COUNT {
            return Err(QuestionFault::CorrectOutOfRange(self.correct));
        }
        Ok(())
    }
}

/// The content payload of a lesson, discriminated by the persisted `type`
/// field.
///
/// All five shapes share a single `content` document field, so the enum is
/// adjacently tagged to match the stored layout exactly:
/// `{"type": "quiz", "content": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum LessonContent {
    /// Plain text body.
    Text(String),
    /// Video URL (scheme + authority required).
    Video(String),
    /// PDF URL (scheme + authority required).
    Pdf(String),
    /// Composite live room identifier, `{courseId}_{roomName}`.
    Live(String),
    /// Ordered quiz questions.
    Quiz(Vec<Question>),
}

impl LessonContent {
    /// Returns the kind tag for this content variant.
    #[must_use]
    pub const fn kind(&self) -> LessonKind {
        match self {
            Self::Text(_) => LessonKind::Text,
            Self::Video(_) => LessonKind::Video,
            Self::Pdf(_) => LessonKind::Pdf,
            Self::Live(_) => LessonKind::Live,
            Self::Quiz(_) => LessonKind::Quiz,
        }
    }
}

/// Builds the composite room identifier stored for a live lesson.
#[must_use]
pub fn live_room_id(course_id: &str, room_name: &str) -> String {
    format!("{course_id}_{room_name}")
}

/// One unit of course content.
///
/// The identifier, order, and creation timestamp are stable across edits;
/// only title, content, and the recording reference are replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    /// Stable identifier, unique within the course.
    pub id: String,

    /// Display title (non-empty, trimmed).
    pub title: String,

    /// Variant-typed content payload.
    #[serde(flatten)]
    pub content: LessonContent,

    /// Insertion rank; preserved on edit, not necessarily contiguous.
    pub order: u32,

    /// When the lesson was first created.
    pub created_at: DateTime<Utc>,

    /// Recording reference; only meaningful for live lessons.
    #[serde(default)]
    pub recording_url: Option<String>,
}

impl Lesson {
    /// Returns the kind tag of this lesson's content.
    #[must_use]
    pub const fn kind(&self) -> LessonKind {
        self.content.kind()
    }

    /// Returns the full room identifier if this is a live lesson.
    #[must_use]
    pub fn room_id(&self) -> Option<&str> {
        match &self.content {
            LessonContent::Live(room) => Some(room),
            _ => None,
        }
    }

    /// Returns the editable room name of a live lesson, with the course
    /// prefix stripped.
    #[must_use]
    pub fn room_name(&self, course_id: &str) -> Option<&str> {
        self.room_id()
            .map(|room| room.strip_prefix(&format!("{course_id}_")).unwrap_or(room))
    }
}

/// Generates a fresh lesson identifier.
#[must_use]
pub fn new_lesson_id() -> String {
    format!("les_{}", Uuid::new_v4().simple())
}

/// The normalized output of draft validation: everything the editor needs
/// to build or replace a [`Lesson`].
#[derive(Debug, Clone, PartialEq)]
pub struct LessonPayload {
    /// Trimmed, non-empty title.
    pub title: String,
    /// Normalized content variant.
    pub content: LessonContent,
    /// Recording reference; `None` unless a live lesson carries one.
    pub recording_url: Option<String>,
}

/// The editable draft behind the lesson form.
///
/// Each content variant keeps its own field so switching the kind selector
/// never clears the others; only the selected variant's fields are
/// validated on submission.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonDraft {
    /// Lesson title.
    pub title: String,
    /// Selected content variant.
    pub kind: LessonKind,
    /// Body for text lessons.
    pub text: String,
    /// URL for video lessons.
    pub video_url: String,
    /// URL for PDF lessons.
    pub pdf_url: String,
    /// Editable room name for live lessons (without the course prefix).
    pub room_name: String,
    /// Optional recording reference for live lessons.
    pub recording_url: String,
    /// Questions for quiz lessons.
    pub questions: Vec<Question>,
}

impl Default for LessonDraft {
    /// An empty draft: text kind, one blank question template.
    fn default() -> Self {
        Self {
            title: String::new(),
            kind: LessonKind::default(),
            text: String::new(),
            video_url: String::new(),
            pdf_url: String::new(),
            room_name: String::new(),
            recording_url: String::new(),
            questions: vec![Question::default()],
        }
    }
}

impl LessonDraft {
    /// Destructures an existing lesson into editable draft fields.
    ///
    /// Live content is split back into the bare room name; quiz questions
    /// are cloned so the stored lesson is untouched until commit.
    #[must_use]
    pub fn from_lesson(lesson: &Lesson, course_id: &str) -> Self {
        let mut draft = Self {
            title: lesson.title.clone(),
            kind: lesson.kind(),
            ..Self::default()
        };
        match &lesson.content {
            LessonContent::Text(body) => draft.text.clone_from(body),
            LessonContent::Video(url) => draft.video_url.clone_from(url),
            LessonContent::Pdf(url) => draft.pdf_url.clone_from(url),
            LessonContent::Live(_) => {
                draft.room_name = lesson.room_name(course_id).unwrap_or_default().to_string();
                draft.recording_url = lesson.recording_url.clone().unwrap_or_default();
            }
            LessonContent::Quiz(questions) => draft.questions.clone_from(questions),
        }
        draft
    }

    /// Validates the draft and produces a normalized lesson payload.
    ///
    /// This is the whole content-model contract: string fields are trimmed,
    /// URL fields must carry a scheme and authority, live rooms are
    /// composed as `{courseId}_{roomName}`, and quizzes must hold at least
    /// one well-formed question.
    ///
    /// # Errors
    ///
    /// Returns the matching [`ValidationError`] for the first violated
    /// rule. No side effects either way.
    pub fn normalize(
        &self,
        course_id: &str,
    ) -> std::result::Result<LessonPayload, ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }

        let content = match self.kind {
            LessonKind::Text => LessonContent::Text(self.text.trim().to_string()),
            LessonKind::Video => {
                let url = self.video_url.trim();
                if !is_valid_url(url) {
                    return Err(ValidationError::InvalidUrl {
                        field: "video",
                        value: url.to_string(),
                    });
                }
                LessonContent::Video(url.to_string())
            }
            LessonKind::Pdf => {
                let url = self.pdf_url.trim();
                if !is_valid_url(url) {
                    return Err(ValidationError::InvalidUrl {
                        field: "pdf",
                        value: url.to_string(),
                    });
                }
                LessonContent::Pdf(url.to_string())
            }
            LessonKind::Live => {
                let room = self.room_name.trim();
                if room.is_empty() {
                    return Err(ValidationError::EmptyRoomName);
                }
                LessonContent::Live(live_room_id(course_id, room))
            }
            LessonKind::Quiz => {
                if self.questions.is_empty() {
                    return Err(ValidationError::EmptyQuiz);
                }
                for (index, question) in self.questions.iter().enumerate() {
                    question
                        .validate()
                        .map_err(|fault| ValidationError::MalformedQuestion { index, fault })?;
                }
                LessonContent::Quiz(self.questions.clone())
            }
        };

        // Recordings only make sense for live lessons; a blank field means none.
        let recording_url = if self.kind == LessonKind::Live {
            let recording = self.recording_url.trim();
            if recording.is_empty() {
                None
            } else {
                Some(recording.to_string())
            }
        } else {
            None
        };

        Ok(LessonPayload {
            title: title.to_string(),
            content,
            recording_url,
        })
    }
}

/// Checks whether a string is a syntactically plausible URL.
///
/// Requires a scheme followed by `://` and a non-empty authority; path and
/// query are unconstrained. This intentionally stops at syntax — the
/// console never fetches these URLs itself.
#[must_use]
pub fn is_valid_url(value: &str) -> bool {
    use regex::Regex;

    // Pattern explanation:
    // - `^[A-Za-z][A-Za-z0-9+.-]*` - scheme (letter, then letters/digits/+.-)
    // - `://` - literal separator
    // - `[^/\s]+` - non-empty authority (no slashes or whitespace)
    let Ok(re) = Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://[^/\s]+") else {
        return false;
    };
    re.is_match(value)
}
