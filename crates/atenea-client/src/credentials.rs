//! HTTP client for the session credential endpoint.
//!
//! Posts the session request as JSON and reads back `{"jwt": "..."}`.
//! The endpoint owns role validation; this client just carries the
//! request and never inspects the token.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use atenea_console::collab::CredentialService;
use atenea_console::error::{ConsoleError, Result};
use atenea_console::live::{LiveSessionRequest, SessionCredential};

#[derive(Debug, Deserialize)]
struct CredentialResponse {
    jwt: String,
}

/// A [`CredentialService`] backed by an HTTP endpoint.
pub struct HttpCredentialService {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpCredentialService {
    /// Creates a client for the given endpoint URL.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CredentialService for HttpCredentialService {
    async fn mint(&self, request: &LiveSessionRequest) -> Result<SessionCredential> {
        debug!(endpoint = %self.endpoint, room = %request.room_name, "requesting credential");

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| ConsoleError::network("credential mint", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConsoleError::network(
                "credential mint",
                format!("endpoint returned {status}"),
            ));
        }

        let body: CredentialResponse = response
            .json()
            .await
            .map_err(|e| ConsoleError::network("credential mint", e.to_string()))?;
        Ok(SessionCredential::new(body.jwt))
    }
}
