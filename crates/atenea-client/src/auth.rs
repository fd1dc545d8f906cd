//! Fixed-identity auth provider.
//!
//! The console core resolves identity once at open; for the CLI and the
//! tests that identity comes from flags or fixtures rather than a real
//! sign-in flow, so this provider just hands back whatever it was built
//! with.

use async_trait::async_trait;

use atenea_console::collab::AuthService;
use atenea_console::course::Identity;
use atenea_console::error::Result;

/// An [`AuthService`] with a fixed answer.
pub struct StaticAuth {
    identity: Option<Identity>,
}

impl StaticAuth {
    /// A provider that reports the given identity as signed in.
    #[must_use]
    pub const fn signed_in(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
        }
    }

    /// A provider that reports nobody signed in.
    #[must_use]
    pub const fn signed_out() -> Self {
        Self { identity: None }
    }
}

#[async_trait]
impl AuthService for StaticAuth {
    async fn current_user(&self) -> Result<Option<Identity>> {
        Ok(self.identity.clone())
    }
}
