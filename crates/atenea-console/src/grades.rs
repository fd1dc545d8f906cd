//! Grade ledger: per-student draft grade inputs.
//!
//! The ledger holds the raw text of every grade field, keyed by student
//! user id. Input is filtered on the way in (only blank or a number in
//! 0..=10 is accepted) so a draft can always be committed without a
//! second validation pass.

use std::collections::HashMap;

/// Inclusive upper bound of the grading scale.
pub const MAX_GRADE: f64 = 10.0;

/// Draft grade inputs for the loaded roster.
///
/// Commit is per student: editing one draft never affects another, and
/// drafts survive any failed or unrelated commit untouched.
#[derive(Debug, Clone, Default)]
pub struct GradeLedger {
    drafts: HashMap<String, String>,
}

impl GradeLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a student's draft from their stored grade.
    ///
    /// An ungraded student gets an empty draft; a stored grade is rendered
    /// at the precision it carries.
    pub fn seed(&mut self, user_id: impl Into<String>, grade: Option<f64>) {
        let rendered = grade.map(|g| g.to_string()).unwrap_or_default();
        self.drafts.insert(user_id.into(), rendered);
    }

    /// Updates a student's draft, silently rejecting invalid input.
    ///
    /// Accepted values are the empty string (clearing the field) and any
    /// finite number in `0..=`[`MAX_GRADE`]. Anything else leaves the
    /// existing draft unchanged.
    pub fn set_draft(&mut self, user_id: &str, value: &str) {
        if Self::accepts(value) {
            self.drafts.insert(user_id.to_string(), value.to_string());
        }
    }

    /// Returns the current draft text for a student.
    #[must_use]
    pub fn draft(&self, user_id: &str) -> &str {
        self.drafts.get(user_id).map_or("", String::as_str)
    }

    /// Returns the draft parsed as a grade, `None` when the field is empty.
    #[must_use]
    pub fn parsed(&self, user_id: &str) -> Option<f64> {
        let draft = self.draft(user_id);
        if draft.is_empty() {
            None
        } else {
            draft.parse().ok()
        }
    }

    fn accepts(value: &str) -> bool {
        if value.is_empty() {
            return true;
        }
        value
            .parse::<f64>()
            .is_ok_and(|g| g.is_finite() && (0.0..=MAX_GRADE).contains(&g))
    }
}
