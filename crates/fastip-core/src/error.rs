//! Error types for fastip-sync
//!
//! This module defines all error types used throughout the workspace.

use crate::reconciler::Stage;
use thiserror::Error;

/// Result type alias for fastip operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for fastip-sync
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (missing credentials, bad domains)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source domain resolution errors
    #[error("Resolution error: {0}")]
    Resolution(String),

    /// Target zone could not be located at the provider
    #[error("Zone not found: {0}")]
    ZoneNotFound(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport-level HTTP errors (connect, TLS, body read)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors
    #[error("Authentication failed ({status}): {body}")]
    Authentication {
        /// HTTP status returned by the provider
        status: u16,
        /// Raw provider response body
        body: String,
    },

    /// Rate limiting errors
    #[error("Rate limited ({status}): {body}")]
    RateLimited {
        /// HTTP status returned by the provider
        status: u16,
        /// Raw provider response body
        body: String,
    },

    /// The provider answered 404 (e.g. a record set deleted since it was listed)
    #[error("Not found ({status}): {body}")]
    NotFound {
        /// HTTP status returned by the provider
        status: u16,
        /// Raw provider response body
        body: String,
    },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Non-success API response
    #[error("Provider error ({provider}, status {status}): {body}")]
    Api {
        /// Provider name
        provider: String,
        /// HTTP status
        status: u16,
        /// Raw provider response body
        body: String,
    },

    /// A reconciliation step failed; `stage` is where the pipeline stood
    #[error("{step} failed (stage {stage}): {source}", step = .stage.next_step())]
    Reconcile {
        /// Last stage reached before the failing step
        stage: Stage,
        /// What went wrong in that step
        source: Box<Error>,
    },

    /// The run exceeded its deadline
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a resolution error
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    /// Create a "zone not found" error
    pub fn zone_not_found(msg: impl Into<String>) -> Self {
        Self::ZoneNotFound(msg.into())
    }

    /// Create an HTTP transport error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an error from a provider 404
    pub fn not_found(status: u16, body: impl Into<String>) -> Self {
        Self::NotFound {
            status,
            body: body.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an error from a non-success API response
    pub fn api(provider: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Api {
            provider: provider.into(),
            status,
            body: body.into(),
        }
    }

    /// Attach the pipeline stage to an error raised by a reconciliation step
    pub fn at_stage(self, stage: Stage) -> Self {
        Self::Reconcile {
            stage,
            source: Box::new(self),
        }
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Taxonomy bucket of this error, used for run reports and log fields
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "configuration",
            Self::Resolution(_) => "resolution",
            Self::ZoneNotFound(_) | Self::InvalidInput(_) => "discovery",
            Self::Authentication { .. }
            | Self::RateLimited { .. }
            | Self::NotFound { .. }
            | Self::Api { .. }
            | Self::Json(_) => "provider",
            Self::Reconcile { source, .. } => source.category(),
            Self::Http(_) => "transport",
            Self::Timeout(_) => "timeout",
            Self::Other(_) => "other",
        }
    }

    /// Provider response body attached to this error, if any
    pub fn response_body(&self) -> Option<&str> {
        match self {
            Self::Authentication { body, .. }
            | Self::RateLimited { body, .. }
            | Self::NotFound { body, .. }
            | Self::Api { body, .. } => Some(body),
            Self::Reconcile { source, .. } => source.response_body(),
            _ => None,
        }
    }

    /// HTTP status of a provider response, if this error came from one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { status, .. }
            | Self::RateLimited { status, .. }
            | Self::NotFound { status, .. }
            | Self::Api { status, .. } => Some(*status),
            Self::Reconcile { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Pipeline stage a reconciliation failure happened in
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Reconcile { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The error without its stage wrapper
    pub fn root(&self) -> &Error {
        match self {
            Self::Reconcile { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
