//! Error types for the session gate.
//!
//! None of these reach page rendering: the resolver and guards turn every
//! outcome into a well-formed `Session` or `AccessDecision`, and these values
//! exist for diagnostics and for callers that want to know why an event was
//! ignored.

use crate::model::{AttemptId, SessionState, UserId};

/// Failure reported by the identity provider for a sign-in attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("sign-in rejected: {0}")]
    Rejected(String),
    #[error("network failure: {0}")]
    Network(String),
    #[error("sign-in cancelled")]
    Cancelled,
}

/// Why the resolver declined to apply an event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// A resolution arrived for an attempt that was superseded, abandoned, or
    /// already resolved.
    #[error("stale sign-in attempt {attempt} discarded")]
    StaleAttempt { attempt: AttemptId, in_flight: Option<AttemptId> },
    #[error("sign-in attempt {attempt} was never issued")]
    UnknownAttempt { attempt: AttemptId },
    #[error("cannot apply {event} while {from}")]
    InvalidTransition { from: SessionState, event: &'static str },
    #[error("profile completion for {got} does not match signed-in user {expected}")]
    UserMismatch { expected: UserId, got: UserId },
    #[error("sign-in requested while already {state}")]
    AlreadyAuthenticated { state: SessionState },
}

impl ResolveError {
    /// True for the silent stale-callback discard.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::StaleAttempt { .. })
    }
}

/// Invalid gate configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a route starting with '/', got {value:?}")]
    InvalidRoute { var: &'static str, value: String },
}
