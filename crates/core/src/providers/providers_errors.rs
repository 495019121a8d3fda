//! Error types and retry classification for upstream providers.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur while talking to an upstream provider.
///
/// Each variant is classified into a [`RetryClass`] via the
/// [`retry_class`](Self::retry_class) method, which determines how the
/// fetch loop should handle the error.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The provider requires a credential that is not configured.
    /// This is a terminal error - retrying won't help.
    #[error("Missing credential for provider: {provider}")]
    MissingCredential {
        /// The provider that is missing a credential
        provider: String,
    },

    /// The provider rate limited the request (HTTP 429).
    ///
    /// When the provider announced a reset instant, `reset_at` carries it
    /// and the caller should suspend until then. Without one, the caller
    /// falls back to exponential backoff.
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
        /// Server-announced instant at which the limit window resets
        reset_at: Option<DateTime<Utc>>,
    },

    /// The request to the provider timed out.
    /// Should retry with exponential backoff.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// A network error occurred while communicating with a provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The provider answered, but with an error status or a body that
    /// could not be interpreted.
    #[error("Upstream error: {provider} - {message}")]
    Upstream {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },
}

impl ProviderError {
    /// Returns the retry classification for this error.
    ///
    /// - [`RetryClass::Never`]: Don't retry, the error is terminal
    /// - [`RetryClass::AfterReset`]: Suspend until the announced reset instant
    /// - [`RetryClass::WithBackoff`]: Retry with exponential backoff
    pub fn retry_class(&self) -> RetryClass {
        match self {
            // Terminal errors - never retry
            Self::MissingCredential { .. } => RetryClass::Never,

            // Server told us exactly when to come back
            Self::RateLimited {
                reset_at: Some(_), ..
            } => RetryClass::AfterReset,

            // Transient errors - retry with backoff
            Self::RateLimited { reset_at: None, .. }
            | Self::Timeout { .. }
            | Self::Network(_)
            | Self::Upstream { .. } => RetryClass::WithBackoff,
        }
    }

    /// Whether this error indicates the machine may be offline rather
    /// than the provider misbehaving.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout { .. })
    }
}

/// Classification for retry policy.
///
/// Used to determine how a fetch loop should respond to errors from providers.
///
/// # Behavior Summary
///
/// | Class | Retry? | Wait |
/// |-------|--------|------|
/// | `Never` | No | - |
/// | `WithBackoff` | Yes, bounded | Exponential backoff with jitter |
/// | `AfterReset` | Yes | Until the server-announced reset instant |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry - missing configuration or a terminal failure.
    /// The request is fundamentally invalid and retrying won't help.
    Never,

    /// Retry after an exponential backoff delay, up to an attempt cap.
    ///
    /// Used for transient errors like timeouts, connection failures, or
    /// a 429 that did not announce a reset instant.
    WithBackoff,

    /// Suspend all requests to the provider until the instant it announced,
    /// then resume with a fresh rate-limit window.
    AfterReset,
}
