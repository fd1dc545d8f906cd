//! External collaborator seams.
//!
//! The console core talks to the outside world only through these traits:
//! the document store holding courses/enrollments/profiles, the binary
//! asset store, the session credential endpoint, and the auth provider.
//! Implementations live in the client crate; tests script their own.

use async_trait::async_trait;
use serde_json::Value;

use crate::course::Identity;
use crate::error::Result;
use crate::live::{LiveSessionRequest, SessionCredential};

/// A document returned from a store query, id alongside its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// The document's id within its collection.
    pub id: String,
    /// The document's fields as a JSON object.
    pub fields: Value,
}

/// An equality constraint on one document field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    /// The field to compare.
    pub field: &'static str,
    /// The value it must equal.
    pub value: Value,
}

impl FieldFilter {
    /// Creates an equality filter on the given field.
    #[must_use]
    pub fn equals(field: &'static str, value: impl Into<Value>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

/// Keyed document storage with equality queries and partial updates.
///
/// `update` merges the given top-level fields into the existing document;
/// fields not named are left untouched.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetches a document by id, `None` if it does not exist.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>>;

    /// Merges `fields` (a JSON object) into an existing document.
    ///
    /// # Errors
    ///
    /// `NotFound` if the document does not exist, `Network` on I/O failure.
    async fn update(&self, collection: &str, id: &str, fields: Value) -> Result<()>;

    /// Returns all documents matching every filter.
    async fn query(&self, collection: &str, filters: &[FieldFilter]) -> Result<Vec<Document>>;
}

/// Binary asset storage addressed by path.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Stores the bytes at `path` and returns a durable reference to them.
    async fn put(&self, path: &str, bytes: Vec<u8>) -> Result<String>;
}

/// Mints short-lived credentials for live video sessions.
///
/// The requested role is client-asserted: implementations are expected to
/// re-validate the requester's entitlement server-side before minting a
/// moderator credential. The console never treats a held credential as
/// proof of role.
#[async_trait]
pub trait CredentialService: Send + Sync {
    /// Exchanges a session request for a credential.
    async fn mint(&self, request: &LiveSessionRequest) -> Result<SessionCredential>;
}

/// Resolves the identity driving the session.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Returns the signed-in identity, `None` when nobody is signed in.
    async fn current_user(&self) -> Result<Option<Identity>>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_field_filter_equals() {
        let filter = FieldFilter::equals("courseId", "c1");
        assert_eq!(filter.field, "courseId");
        assert_eq!(filter.value, Value::String("c1".to_string()));
    }
}
