//! Session snapshot model shared by the store, resolver, and guards.
//!
//! INVARIANTS
//! ==========
//! A `Session` is only built through the per-state constructors below, so a
//! `Complete` session always carries a completed profile and an `Anonymous`
//! session never carries a user or a token.

use std::fmt;

use serde::Serialize;
use time::OffsetDateTime;

// =============================================================================
// SESSION STATE
// =============================================================================

/// Canonical authentication status of the visitor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No identity; the initial state.
    Anonymous,
    /// A sign-in attempt is outstanding at the identity provider.
    Pending,
    /// Signed in, but the profile-completion workflow has not finished.
    IncompleteProfile,
    /// Signed in with a completed profile.
    Complete,
}

impl SessionState {
    #[must_use]
    pub fn is_authenticated(self) -> bool {
        matches!(self, Self::IncompleteProfile | Self::Complete)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Pending => "pending",
            Self::IncompleteProfile => "incomplete_profile",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Identity-provider user id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sequence number of a sign-in attempt. Issued by the resolver, strictly
/// increasing for the life of the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct AttemptId(u64);

impl AttemptId {
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    pub(crate) const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// TOKEN
// =============================================================================

/// Provider credential held while authenticated. The secret is opaque here:
/// it is never formatted, logged, or serialized.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken {
    secret: String,
    expires_at: OffsetDateTime,
}

impl AuthToken {
    #[must_use]
    pub fn new(secret: impl Into<String>, expires_at: OffsetDateTime) -> Self {
        Self { secret: secret.into(), expires_at }
    }

    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }

    #[must_use]
    pub fn expires_at(&self) -> OffsetDateTime {
        self.expires_at
    }

    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("secret", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

// =============================================================================
// NOTICE
// =============================================================================

/// Recoverable, user-visible outcome attached to the `Anonymous` snapshot a
/// failure transition produces. Cleared by the next transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuthNotice {
    SignInFailed { cause: String },
    SessionExpired,
}

impl fmt::Display for AuthNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SignInFailed { cause } => write!(f, "sign-in failed: {cause}"),
            Self::SessionExpired => f.write_str("session expired; sign in again"),
        }
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// Immutable snapshot of the visitor's session. Replaced wholesale on every
/// transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Session {
    state: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<UserId>,
    profile_complete: bool,
    #[serde(skip)]
    token: Option<AuthToken>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attempt: Option<AttemptId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<AuthNotice>,
}

impl Session {
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            state: SessionState::Anonymous,
            user_id: None,
            profile_complete: false,
            token: None,
            attempt: None,
            notice: None,
        }
    }

    #[must_use]
    pub fn anonymous_with_notice(notice: AuthNotice) -> Self {
        Self { notice: Some(notice), ..Self::anonymous() }
    }

    /// Optimistic placeholder while `attempt` is outstanding.
    #[must_use]
    pub fn pending(attempt: AttemptId) -> Self {
        Self { state: SessionState::Pending, attempt: Some(attempt), ..Self::anonymous() }
    }

    #[must_use]
    pub fn incomplete_profile(user_id: UserId, token: AuthToken) -> Self {
        Self {
            state: SessionState::IncompleteProfile,
            user_id: Some(user_id),
            profile_complete: false,
            token: Some(token),
            attempt: None,
            notice: None,
        }
    }

    #[must_use]
    pub fn complete(user_id: UserId, token: AuthToken) -> Self {
        Self {
            state: SessionState::Complete,
            user_id: Some(user_id),
            profile_complete: true,
            token: Some(token),
            attempt: None,
            notice: None,
        }
    }

    /// Build the authenticated snapshot a successful sign-in resolves to.
    #[must_use]
    pub fn authenticated(user_id: UserId, profile_complete: bool, token: AuthToken) -> Self {
        if profile_complete {
            Self::complete(user_id, token)
        } else {
            Self::incomplete_profile(user_id, token)
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    /// Only meaningful when the state is not `Pending`.
    #[must_use]
    pub fn profile_complete(&self) -> bool {
        self.profile_complete
    }

    #[must_use]
    pub fn token(&self) -> Option<&AuthToken> {
        self.token.as_ref()
    }

    #[must_use]
    pub fn expires_at(&self) -> Option<OffsetDateTime> {
        self.token.as_ref().map(AuthToken::expires_at)
    }

    #[must_use]
    pub fn attempt(&self) -> Option<AttemptId> {
        self.attempt
    }

    #[must_use]
    pub fn notice(&self) -> Option<&AuthNotice> {
        self.notice.as_ref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.token.as_ref().is_some_and(|token| token.is_expired_at(now))
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::anonymous()
    }
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
