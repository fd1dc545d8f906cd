//! Error types for the Atenea instructor console.
//!
//! This module defines the error taxonomy for all console operations:
//! local input validation, permission gating, missing records, network
//! failures at the collaborator boundaries, and state machine misuse.

/// A specialized `Result` type for console operations.
pub type Result<T> = std::result::Result<T, ConsoleError>;

/// Number of answer options every quiz question must carry.
pub const QUESTION_OPTION_COUNT: usize = 4;

/// Malformed-input failures raised by the lesson content model.
///
/// Validation errors are recoverable: they block submission and are shown
/// inline, but the draft that produced them is always preserved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Lesson title is empty after trimming.
    #[error("lesson title must not be empty")]
    EmptyTitle,

    /// A URL field does not carry a scheme and authority.
    #[error("invalid {field} URL '{value}': expected a scheme and authority (e.g. https://example.com/doc)")]
    InvalidUrl {
        /// Which draft field held the rejected value.
        field: &'static str,
        /// The rejected value, as entered.
        value: String,
    },

    /// Live lesson room name is empty after trimming.
    #[error("room name must not be empty")]
    EmptyRoomName,

    /// Quiz lesson with no questions at all.
    #[error("a quiz needs at least one question")]
    EmptyQuiz,

    /// A quiz question violates the option-count or answer-index invariant.
    #[error("question {index} is malformed: {fault}")]
    MalformedQuestion {
        /// Zero-based index of the offending question.
        index: usize,
        /// What exactly is wrong with it.
        fault: QuestionFault,
    },

    /// A non-live lesson was handed to the live session orchestrator.
    #[error("lesson '{id}' is not a live lesson")]
    NotLive {
        /// Identifier of the offending lesson.
        id: String,
    },
}

/// The specific invariant a quiz question violates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QuestionFault {
    /// The question does not have exactly four options.
    #[error("expected exactly {QUESTION_OPTION_COUNT} options, found {0}")]
    WrongOptionCount(usize),

    /// The correct-answer index does not address any option.
    #[error("correct-answer index {0} is out of range 0..{QUESTION_OPTION_COUNT}")]
    CorrectOutOfRange(usize),
}

/// Kinds of records the console resolves through the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// A course document.
    Course,
    /// A lesson inside the loaded course.
    Lesson,
    /// An enrollment record linking a student to a course.
    Enrollment,
    /// A student profile document.
    Student,
    /// Any other store document.
    Document,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Course => write!(f, "course"),
            Self::Lesson => write!(f, "lesson"),
            Self::Enrollment => write!(f, "enrollment"),
            Self::Student => write!(f, "student"),
            Self::Document => write!(f, "document"),
        }
    }
}

/// Errors that can occur during a console session.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConsoleError {
    /// Malformed input; never reaches the store.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No authenticated identity; the console performs no loads at all.
    #[error("not signed in\n\nSuggestion: sign in and reopen the console")]
    Unauthenticated,

    /// The requester does not own the course; fatal for the session.
    #[error("user '{user_id}' is not the instructor of course '{course_id}'")]
    PermissionDenied {
        /// The authenticated user id.
        user_id: String,
        /// The course that rejected them.
        course_id: String,
    },

    /// A referenced record does not exist; surfaced, never retried.
    #[error("{kind} '{id}' not found")]
    NotFound {
        /// What kind of record was missing.
        kind: ResourceKind,
        /// Identifier used in the failed lookup.
        id: String,
    },

    /// An I/O rejection at a collaborator boundary; retry by resubmission.
    #[error("network failure during {operation}: {message}")]
    Network {
        /// The operation that was in flight.
        operation: String,
        /// Description of the rejection.
        message: String,
    },

    /// The same async action was requested while still in flight.
    #[error("{operation} is already in flight")]
    Busy {
        /// Name of the guarded operation.
        operation: &'static str,
    },

    /// A state machine was driven out of order.
    #[error("invalid state transition: cannot go from {from} to {to}")]
    InvalidTransition {
        /// The current state.
        from: String,
        /// The attempted target state.
        to: String,
    },

    /// A stored document does not match the expected shape.
    #[error("malformed {context} document: {message}")]
    Decode {
        /// What was being decoded.
        context: &'static str,
        /// The decoder's complaint.
        message: String,
    },

    /// Unusable configuration; the console cannot start with it.
    #[error("configuration error: {message}")]
    Config {
        /// What is wrong with the configuration.
        message: String,
    },
}

impl ConsoleError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Creates a new `Network` error for the named operation.
    #[must_use]
    pub fn network(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Creates a new `Busy` rejection for the named operation.
    #[must_use]
    pub const fn busy(operation: &'static str) -> Self {
        Self::Busy { operation }
    }

    /// Creates a new `PermissionDenied` error.
    #[must_use]
    pub fn permission_denied(user_id: impl Into<String>, course_id: impl Into<String>) -> Self {
        Self::PermissionDenied {
            user_id: user_id.into(),
            course_id: course_id.into(),
        }
    }

    /// Creates a new `Decode` error for the named document shape.
    #[must_use]
    pub fn decode(context: &'static str, message: impl std::fmt::Display) -> Self {
        Self::Decode {
            context,
            message: message.to_string(),
        }
    }

    /// Creates a new `Config` error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidTransition` error.
    #[must_use]
    pub fn invalid_transition(from: impl std::fmt::Display, to: impl std::fmt::Display) -> Self {
        Self::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Returns `true` if the operation can be retried by resubmitting.
    ///
    /// Validation failures are fixed by editing the draft, `Network` by
    /// resubmitting, and `Busy` by waiting for the in-flight action.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Network { .. } | Self::Busy { .. }
        )
    }

    /// Returns `true` if this error ends the console session.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Unauthenticated | Self::PermissionDenied { .. } | Self::Config { .. }
        )
    }
}
