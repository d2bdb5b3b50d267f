//! Normalized failures for the API gateway.
//!
//! Every typed operation converts transport- and server-level failures into
//! one `ApiFailure` at the call boundary, so callers branch on the kind and
//! never on raw transport errors.

use thiserror::Error;

/// Generic user-facing fallback for transport-level failures. The raw cause
/// is logged, never shown.
pub const NETWORK_ERROR_MESSAGE: &str = "Terjadi kesalahan jaringan atau server";

#[derive(Debug, Error)]
pub enum ApiFailure {
    /// The input failed a client-side check before any network call.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The server rejected the request with 401. The session has already
    /// been cleared by the gateway.
    #[error("unauthorized")]
    Unauthorized,

    /// The server reported a failure, either as a non-2xx HTTP status or a
    /// rejected response envelope. Carries the server's own message when it
    /// provided one.
    #[error("server error: {message}")]
    Server { message: String },

    /// Timeout, connect, DNS, or body-decode failure. `context` is for the
    /// log only.
    #[error("network error: {context}")]
    Network { context: String },
}

impl ApiFailure {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::Server {
            message: message.into(),
        }
    }

    pub fn network(context: impl Into<String>) -> Self {
        Self::Network {
            context: context.into(),
        }
    }

    /// Substitute an operation-specific message when the server provided a
    /// blank one. Transport failures keep their generic message.
    pub fn or_message(self, fallback: &str) -> Self {
        match self {
            Self::Server { message } if message.trim().is_empty() => Self::Server {
                message: fallback.to_string(),
            },
            other => other,
        }
    }

    /// The message shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message } => message.clone(),
            Self::Unauthorized => "Sesi Anda telah berakhir. Silakan login kembali.".to_string(),
            Self::Server { message } => message.clone(),
            Self::Network { .. } => NETWORK_ERROR_MESSAGE.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiFailure {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            context: err.to_string(),
        }
    }
}
