//! Collaborator implementations for the Atenea instructor console.
//!
//! Provides the concrete ends of the `atenea-console` collaborator
//! traits: an in-memory document/asset store with JSON snapshots, an
//! HTTP client for the credential endpoint, and a fixed-identity auth
//! provider.

pub mod auth;
pub mod credentials;
pub mod memory;

pub use auth::StaticAuth;
pub use credentials::HttpCredentialService;
pub use memory::MemoryStore;
