//! Live session orchestrator.
//!
//! Drives one video session at a time through `Closed -> Requesting ->
//! Active`, holding the minted credential only while the session is
//! active. The credential request itself is I/O and happens outside this
//! module; the orchestrator hands out a [`LiveSessionRequest`], then gets
//! either `activate` or `abort` depending on how the mint went.

use serde::Serialize;

use crate::course::Identity;
use crate::error::{ConsoleError, Result, ValidationError};
use crate::lesson::{Lesson, LessonContent};

/// The role requested for a live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionRole {
    /// Session host with room controls.
    Moderator,
    /// Regular attendee.
    Participant,
}

impl std::fmt::Display for SessionRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Moderator => write!(f, "moderator"),
            Self::Participant => write!(f, "participant"),
        }
    }
}

/// Who is asking for the session, as sent to the credential endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequesterInfo {
    /// Name to show in the session UI.
    pub display_name: String,
    /// Requester's email address.
    pub email: String,
}

impl RequesterInfo {
    /// Builds requester info from an identity, falling back through
    /// display name, email, and user id so the fields are never empty.
    #[must_use]
    pub fn from_identity(identity: &Identity) -> Self {
        let email = identity
            .email
            .clone()
            .unwrap_or_else(|| identity.user_id.clone());
        Self {
            display_name: identity.label().to_string(),
            email,
        }
    }
}

/// A credential request for one live session attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSessionRequest {
    /// Full room identifier, `{courseId}_{roomName}`.
    pub room_name: String,
    /// Role being requested (validated again server-side).
    pub role: SessionRole,
    /// Who is asking.
    #[serde(rename = "userInfo")]
    pub requester: RequesterInfo,
}

/// A short-lived session credential.
///
/// Held only inside the orchestrator's `Active` state; never serialized,
/// and redacted in debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredential {
    token: String,
}

impl SessionCredential {
    /// Wraps a raw credential token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// The raw token, for handing to the video service.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionCredential(<redacted>)")
    }
}

/// Everything the video service needs to present an active session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveView {
    /// The live lesson being presented.
    pub lesson_id: String,
    /// Full room identifier.
    pub room_name: String,
    /// The minted credential.
    pub credential: SessionCredential,
}

/// Observable state of the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveState {
    /// No session; ready to start one.
    Closed,
    /// A credential request is in flight.
    Requesting,
    /// A session is live.
    Active,
}

impl std::fmt::Display for LiveState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Requesting => write!(f, "requesting"),
            Self::Active => write!(f, "active"),
        }
    }
}

enum Phase {
    Closed,
    Requesting { lesson_id: String, room_name: String },
    Active { view: LiveView },
}

/// The live session state machine. One session at a time.
pub struct LiveSession {
    phase: Phase,
}

impl Default for LiveSession {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveSession {
    /// Creates a closed orchestrator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: Phase::Closed,
        }
    }

    /// The current observable state.
    #[must_use]
    pub const fn state(&self) -> LiveState {
        match self.phase {
            Phase::Closed => LiveState::Closed,
            Phase::Requesting { .. } => LiveState::Requesting,
            Phase::Active { .. } => LiveState::Active,
        }
    }

    /// Returns `true` if a session is live.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.phase, Phase::Active { .. })
    }

    /// The active session view, if any.
    #[must_use]
    pub const fn view(&self) -> Option<&LiveView> {
        match &self.phase {
            Phase::Active { view } => Some(view),
            _ => None,
        }
    }

    /// Starts a session attempt for a live lesson.
    ///
    /// Moves `Closed -> Requesting` and yields the credential request to
    /// send. Exactly one request per attempt: a second `begin` while
    /// requesting or active is rejected with `Busy`.
    ///
    /// # Errors
    ///
    /// `Busy` unless the orchestrator is closed; `NotLive` if the lesson
    /// carries non-live content.
    pub fn begin(
        &mut self,
        lesson: &Lesson,
        identity: &Identity,
        role: SessionRole,
    ) -> Result<LiveSessionRequest> {
        if !matches!(self.phase, Phase::Closed) {
            return Err(ConsoleError::busy("live session"));
        }
        let LessonContent::Live(room_name) = &lesson.content else {
            return Err(ValidationError::NotLive {
                id: lesson.id.clone(),
            }
            .into());
        };

        self.phase = Phase::Requesting {
            lesson_id: lesson.id.clone(),
            room_name: room_name.clone(),
        };
        Ok(LiveSessionRequest {
            room_name: room_name.clone(),
            role,
            requester: RequesterInfo::from_identity(identity),
        })
    }

    /// Completes the attempt with a minted credential.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless a request is in flight.
    pub fn activate(&mut self, credential: SessionCredential) -> Result<&LiveView> {
        if !matches!(self.phase, Phase::Requesting { .. }) {
            return Err(ConsoleError::invalid_transition(self.state(), LiveState::Active));
        }
        if let Phase::Requesting {
            lesson_id,
            room_name,
        } = std::mem::replace(&mut self.phase, Phase::Closed)
        {
            self.phase = Phase::Active {
                view: LiveView {
                    lesson_id,
                    room_name,
                    credential,
                },
            };
        }
        match &self.phase {
            Phase::Active { view } => Ok(view),
            // Unreachable: the phase was just set above.
            _ => Err(ConsoleError::invalid_transition(self.state(), LiveState::Active)),
        }
    }

    /// Abandons a failed attempt, returning to `Closed`.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless a request is in flight.
    pub fn abort(&mut self) -> Result<()> {
        if !matches!(self.phase, Phase::Requesting { .. }) {
            return Err(ConsoleError::invalid_transition(self.state(), LiveState::Closed));
        }
        self.phase = Phase::Closed;
        Ok(())
    }

    /// Ends the session. Idempotent: closing a closed orchestrator is a
    /// no-op. The held credential is dropped here.
    pub fn close(&mut self) {
        self.phase = Phase::Closed;
    }
}
