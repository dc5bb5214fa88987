// SPDX-License-Identifier: MIT

//! Error taxonomy and the user-facing alert surface.
//!
//! Transport/HTTP failures are normalized into a small closed set of kinds at
//! the HTTP adapter boundary. Managers convert a failure into an
//! [`ErrorReport`], publish it through [`Alerts`], then re-raise the
//! [`ApiError`] so callers can keep form state intact. Nothing outside this
//! module formats error text.

use serde::Deserialize;
use tokio::sync::broadcast;

/// Normalized outcome of a failed operation.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// HTTP 400/422 or client-side field validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// HTTP 401.
    #[error("authentication required")]
    Unauthorized,

    /// HTTP 403.
    #[error("operation not permitted")]
    Forbidden,

    /// HTTP 404.
    #[error("resource not found")]
    NotFound,

    /// HTTP 429. No automatic retry is scheduled anywhere in this crate.
    #[error("rate limited by server")]
    RateLimited,

    /// HTTP 5xx.
    #[error("server error (HTTP {0})")]
    Server(u16),

    /// No response received (DNS, connect, timeout, ...).
    #[error("network error: {0}")]
    Network(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),

    /// Anything that fits no other kind (unexpected status, bad JSON, ...).
    #[error("unexpected failure: {0}")]
    Unknown(String),
}

/// Error body shape the API uses for validation failures.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Option<std::collections::BTreeMap<String, Vec<String>>>,
}

impl ApiError {
    /// Classify a non-2xx response by status code, extracting server field
    /// errors from the body where present.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            400 | 422 => ApiError::InvalidInput(extract_validation_message(body)),
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden,
            404 => ApiError::NotFound,
            429 => ApiError::RateLimited,
            500..=599 => ApiError::Server(status),
            _ => ApiError::Unknown(format!("HTTP {}: {}", status, body)),
        }
    }

    /// Stable kind name, used in reports and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "invalid_input",
            ApiError::Unauthorized => "unauthorized",
            ApiError::Forbidden => "forbidden",
            ApiError::NotFound => "not_found",
            ApiError::RateLimited => "rate_limited",
            ApiError::Server(_) => "server_error",
            ApiError::Network(_) => "network_error",
            ApiError::Internal(_) => "internal_error",
            ApiError::Unknown(_) => "unknown",
        }
    }

    /// Fixed user-facing message for this kind.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::InvalidInput(msg) if !msg.is_empty() => msg.clone(),
            ApiError::InvalidInput(_) => "The submitted data is invalid.".to_string(),
            ApiError::Unauthorized => "Your session has expired. Please sign in again.".to_string(),
            ApiError::Forbidden => "You are not permitted to perform this action.".to_string(),
            ApiError::NotFound => "The requested resource was not found.".to_string(),
            ApiError::RateLimited => "Too many requests. Please try again later.".to_string(),
            ApiError::Server(_) => "The server encountered an internal error.".to_string(),
            ApiError::Network(_) => "Cannot reach the server. Check your connection.".to_string(),
            ApiError::Internal(_) | ApiError::Unknown(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }

    /// Build the report handed to the alert surface.
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            user_message: self.user_message(),
            raw_cause: self.to_string(),
        }
    }
}

/// Join server field errors into one message, falling back to the top-level
/// message or empty (caller substitutes the generic text).
fn extract_validation_message(body: &str) -> String {
    let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) else {
        return String::new();
    };

    if let Some(errors) = parsed.errors {
        let joined: Vec<String> = errors.into_values().flatten().collect();
        if !joined.is_empty() {
            return joined.join(" ");
        }
    }

    parsed.message.unwrap_or_default()
}

/// Normalized failure handed to the UI layer. Not persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorReport {
    pub kind: &'static str,
    pub user_message: String,
    pub raw_cause: String,
}

/// A user-visible alert published by a manager.
#[derive(Debug, Clone)]
pub enum Alert {
    Success(String),
    Error(ErrorReport),
}

/// The single notification surface for user-facing messages.
///
/// Cheap to clone; every manager holds one and publishes through it. UI
/// layers subscribe and render toasts/banners. Publishing with no subscriber
/// is fine (the message is dropped).
#[derive(Clone)]
pub struct Alerts {
    tx: broadcast::Sender<Alert>,
}

impl Alerts {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Alert> {
        self.tx.subscribe()
    }

    pub fn success(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(message = %message, "success alert");
        let _ = self.tx.send(Alert::Success(message));
    }

    /// Publish an error report for the given failure.
    pub fn error(&self, err: &ApiError) {
        let report = err.report();
        tracing::warn!(kind = report.kind, cause = %report.raw_cause, "error alert");
        let _ = self.tx.send(Alert::Error(report));
    }
}

impl Default for Alerts {
    fn default() -> Self {
        Self::new()
    }
}

/// Result type alias for manager operations.
pub type Result<T> = std::result::Result<T, ApiError>;
