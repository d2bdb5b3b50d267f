//! Typed client for the Kebun REST API.
//!
//! One `ApiClient` is the single source of truth for authenticated
//! requests: it attaches the bearer token when a session exists, reacts to
//! 401 by clearing the session store, and unwraps the common
//! `{status, data, message}` envelope so the typed operations in the
//! sibling modules only ever see `Result<_, ApiFailure>`.

pub mod auth;
pub mod detection;
pub mod disease;
pub mod error;
pub mod planting;
pub mod validation;
pub mod weather;

pub use error::ApiFailure;

use anyhow::{Context, Result};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ApiConfig;
use crate::session::SessionStore;

/// Response envelope shared by every endpoint.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub status: u16,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
    session: Arc<SessionStore>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, session: Arc<SessionStore>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Build a request with the bearer token attached iff a session exists.
    /// Without a session the request goes out bare and the server decides.
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut req = self.client.request(method, self.url(path));
        if let Some(session) = self.session.current() {
            req = req.bearer_auth(&session.token);
        }
        req
    }

    /// Send a request and unwrap the response envelope, expecting the given
    /// envelope status (200 for most endpoints, 201 for planting start).
    pub(crate) async fn execute<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        expect: u16,
    ) -> Result<(T, String), ApiFailure> {
        let response = req.send().await?;
        let status = response.status();
        let url = response.url().clone();

        self.enforce_auth(status)?;
        if status.is_server_error() {
            tracing::warn!("Server returned {} for {}", status, url);
        }

        let bytes = response.bytes().await?;
        if !status.is_success() {
            return Err(failure_from_body(&bytes, status));
        }

        let envelope: Envelope<T> = serde_json::from_slice(&bytes)
            .map_err(|e| ApiFailure::network(format!("invalid response body: {}", e)))?;
        unwrap_envelope(envelope, expect)
    }

    /// Clear the session on any 401, regardless of which operation hit it.
    /// Feature modules never handle auth failure themselves.
    pub(crate) fn enforce_auth(&self, status: StatusCode) -> Result<(), ApiFailure> {
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("Received 401, clearing session");
            self.session.clear();
            return Err(ApiFailure::Unauthorized);
        }
        Ok(())
    }
}

/// Extract the server's message from a non-2xx body, if it sent one.
fn failure_from_body(bytes: &[u8], status: StatusCode) -> ApiFailure {
    #[derive(Deserialize)]
    struct ErrorBody {
        #[serde(default)]
        message: Option<String>,
    }

    let message = serde_json::from_slice::<ErrorBody>(bytes)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("Server mengembalikan status {}", status.as_u16()));
    ApiFailure::server(message)
}

fn unwrap_envelope<T>(envelope: Envelope<T>, expect: u16) -> Result<(T, String), ApiFailure> {
    let message = envelope.message.unwrap_or_default();
    if envelope.status != expect {
        return Err(ApiFailure::server(message));
    }
    match envelope.data {
        Some(data) => Ok((data, message)),
        None => Err(ApiFailure::server(message)),
    }
}
