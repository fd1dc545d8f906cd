//! Lesson editor state machine.
//!
//! One editor per console session, driving `Idle -> Editing -> Submitting`
//! for both lesson creation and edits. The save itself is I/O and happens
//! outside this module: `prepare_submit` validates the draft and computes
//! the replacement lesson sequence, `complete` records how the write went.
//! A failed save always lands back in `Editing` with the draft intact.

use chrono::Utc;

use crate::error::{ConsoleError, Result};
use crate::lesson::{new_lesson_id, Lesson, LessonDraft};

/// Observable state of the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    /// No form open.
    Idle,
    /// A draft is being edited.
    Editing,
    /// A save is in flight.
    Submitting,
}

impl std::fmt::Display for EditorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Editing => write!(f, "editing"),
            Self::Submitting => write!(f, "submitting"),
        }
    }
}

/// Identity-preserving metadata of the lesson being edited.
///
/// Carried through the whole edit so the saved lesson keeps its id, rank,
/// and creation timestamp no matter what the draft was changed to.
#[derive(Debug, Clone, PartialEq)]
struct EditTarget {
    id: String,
    order: u32,
    created_at: chrono::DateTime<Utc>,
}

/// A validated save, ready for the store write.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSave {
    /// The lesson as it will be persisted.
    pub lesson: Lesson,
    /// The full replacement lesson sequence for the course document.
    pub lessons: Vec<Lesson>,
}

enum Phase {
    Idle,
    Editing {
        draft: LessonDraft,
        target: Option<EditTarget>,
        error: Option<ConsoleError>,
    },
    Submitting {
        draft: LessonDraft,
        target: Option<EditTarget>,
    },
}

/// The lesson editor state machine.
pub struct LessonEditor {
    phase: Phase,
}

impl Default for LessonEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl LessonEditor {
    /// Creates an idle editor.
    #[must_use]
    pub const fn new() -> Self {
        Self { phase: Phase::Idle }
    }

    /// The current observable state.
    #[must_use]
    pub const fn state(&self) -> EditorState {
        match self.phase {
            Phase::Idle => EditorState::Idle,
            Phase::Editing { .. } => EditorState::Editing,
            Phase::Submitting { .. } => EditorState::Submitting,
        }
    }

    /// Returns `true` if a form is open (editing or submitting).
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !matches!(self.phase, Phase::Idle)
    }

    /// The current draft, if a form is open.
    #[must_use]
    pub const fn draft(&self) -> Option<&LessonDraft> {
        match &self.phase {
            Phase::Editing { draft, .. } | Phase::Submitting { draft, .. } => Some(draft),
            Phase::Idle => None,
        }
    }

    /// Mutable access to the draft while editing. `None` during a save,
    /// so an in-flight draft cannot change under the write.
    pub fn draft_mut(&mut self) -> Option<&mut LessonDraft> {
        match &mut self.phase {
            Phase::Editing { draft, .. } => Some(draft),
            _ => None,
        }
    }

    /// Id of the lesson being edited, `None` when creating a new one.
    #[must_use]
    pub fn editing_lesson_id(&self) -> Option<&str> {
        match &self.phase {
            Phase::Editing { target, .. } | Phase::Submitting { target, .. } => {
                target.as_ref().map(|t| t.id.as_str())
            }
            Phase::Idle => None,
        }
    }

    /// The error from the last failed validation or save, if the editor
    /// is still sitting on it.
    #[must_use]
    pub const fn last_error(&self) -> Option<&ConsoleError> {
        match &self.phase {
            Phase::Editing { error, .. } => error.as_ref(),
            _ => None,
        }
    }

    /// Opens a blank form for a new lesson.
    ///
    /// # Errors
    ///
    /// `Busy` while a save is in flight.
    pub fn begin_create(&mut self) -> Result<()> {
        self.ensure_not_submitting()?;
        self.phase = Phase::Editing {
            draft: LessonDraft::default(),
            target: None,
            error: None,
        };
        Ok(())
    }

    /// Opens the form pre-filled from an existing lesson.
    ///
    /// # Errors
    ///
    /// `Busy` while a save is in flight.
    pub fn begin_edit(&mut self, lesson: &Lesson, course_id: &str) -> Result<()> {
        self.ensure_not_submitting()?;
        self.phase = Phase::Editing {
            draft: LessonDraft::from_lesson(lesson, course_id),
            target: Some(EditTarget {
                id: lesson.id.clone(),
                order: lesson.order,
                created_at: lesson.created_at,
            }),
            error: None,
        };
        Ok(())
    }

    /// Discards the draft and closes the form. Idempotent when idle.
    ///
    /// # Errors
    ///
    /// `Busy` while a save is in flight.
    pub fn cancel(&mut self) -> Result<()> {
        self.ensure_not_submitting()?;
        self.phase = Phase::Idle;
        Ok(())
    }

    /// Validates the draft and moves `Editing -> Submitting`.
    ///
    /// On success the returned [`PendingSave`] carries the persisted
    /// lesson and the full replacement sequence for the course document.
    /// An edited lesson keeps its id, order, and creation timestamp; a new
    /// lesson gets a fresh id and the next rank. On validation failure the
    /// editor stays in `Editing` with the error recorded and the draft
    /// untouched.
    ///
    /// # Errors
    ///
    /// `Busy` while a save is already in flight, `InvalidTransition` when
    /// no form is open, `Validation` for a malformed draft.
    pub fn prepare_submit(&mut self, course_id: &str, lessons: &[Lesson]) -> Result<PendingSave> {
        match self.state() {
            EditorState::Submitting => return Err(ConsoleError::busy("lesson save")),
            EditorState::Idle => {
                return Err(ConsoleError::invalid_transition(
                    EditorState::Idle,
                    EditorState::Submitting,
                ))
            }
            EditorState::Editing => {}
        }
        let Phase::Editing { draft, target, .. } =
            std::mem::replace(&mut self.phase, Phase::Idle)
        else {
            // Unreachable: the state was just checked.
            return Err(ConsoleError::invalid_transition(
                self.state(),
                EditorState::Submitting,
            ));
        };

        let payload = match draft.normalize(course_id) {
            Ok(payload) => payload,
            Err(validation) => {
                let failure: ConsoleError = validation.into();
                self.phase = Phase::Editing {
                    draft,
                    target,
                    error: Some(failure.clone()),
                };
                return Err(failure);
            }
        };

        let lesson = match &target {
            Some(existing) => Lesson {
                id: existing.id.clone(),
                title: payload.title,
                content: payload.content,
                order: existing.order,
                created_at: existing.created_at,
                recording_url: payload.recording_url,
            },
            None => Lesson {
                id: new_lesson_id(),
                title: payload.title,
                content: payload.content,
                order: next_order(lessons),
                created_at: Utc::now(),
                recording_url: payload.recording_url,
            },
        };

        let mut replacement = lessons.to_vec();
        match replacement.iter_mut().find(|l| l.id == lesson.id) {
            Some(slot) => *slot = lesson.clone(),
            None => replacement.push(lesson.clone()),
        }

        self.phase = Phase::Submitting { draft, target };
        Ok(PendingSave {
            lesson,
            lessons: replacement,
        })
    }

    /// Records the outcome of the store write.
    ///
    /// Success closes the form and resets the draft; failure returns to
    /// `Editing` with the draft preserved and the error available through
    /// [`Self::last_error`].
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless a save is in flight.
    pub fn complete(&mut self, outcome: std::result::Result<(), ConsoleError>) -> Result<()> {
        if !matches!(self.phase, Phase::Submitting { .. }) {
            return Err(ConsoleError::invalid_transition(
                self.state(),
                EditorState::Idle,
            ));
        }
        if let Phase::Submitting { draft, target } =
            std::mem::replace(&mut self.phase, Phase::Idle)
        {
            match outcome {
                Ok(()) => self.phase = Phase::Idle,
                Err(failure) => {
                    self.phase = Phase::Editing {
                        draft,
                        target,
                        error: Some(failure),
                    };
                }
            }
        }
        Ok(())
    }

    const fn ensure_not_submitting(&self) -> Result<()> {
        if matches!(self.phase, Phase::Submitting { .. }) {
            return Err(ConsoleError::busy("lesson save"));
        }
        Ok(())
    }
}

/// Insertion rank for a new lesson: the current lesson count.
#[allow(clippy::cast_possible_truncation)]
fn next_order(lessons: &[Lesson]) -> u32 {
    lessons.len() as u32
}
