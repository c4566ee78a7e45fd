//! Identity events to canonical session transitions.
//!
//! ARCHITECTURE
//! ============
//! The resolver is the only writer of the [`SessionStore`]. Events are applied
//! one at a time under a mutex that is held across compute, replace, and
//! listener notification, so no subscriber can see a partially applied event.
//!
//! RACES
//! =====
//! Every sign-in attempt gets a fresh [`AttemptId`]. Starting a new attempt
//! while one is pending supersedes it; the superseded attempt is not
//! cancelled at the provider, its eventual callback simply fails the attempt
//! check and is discarded. `SignedOut` abandons an in-flight attempt the same
//! way.

use std::sync::{Arc, Mutex, PoisonError};

use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::error::{ProviderError, ResolveError};
use crate::model::{AttemptId, AuthNotice, AuthToken, Session, SessionState, UserId};
use crate::store::SessionStore;

/// Event delivered by the identity provider or the profile-completion
/// workflow.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    SignInSucceeded { attempt: AttemptId, user_id: UserId, profile_complete: bool, token: AuthToken },
    SignInFailed { attempt: AttemptId, cause: ProviderError },
    SignedOut,
    ProfileCompleted { user_id: UserId },
    TokenExpired,
    TokenRefreshed { token: AuthToken },
}

impl AuthEvent {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SignInSucceeded { .. } => "sign_in_succeeded",
            Self::SignInFailed { .. } => "sign_in_failed",
            Self::SignedOut => "signed_out",
            Self::ProfileCompleted { .. } => "profile_completed",
            Self::TokenExpired => "token_expired",
            Self::TokenRefreshed { .. } => "token_refreshed",
        }
    }
}

/// Result of applying one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// A new snapshot was written.
    Changed { from: SessionState, to: SessionState },
    /// The event was a no-op in this state; nothing was written.
    Unchanged(SessionState),
}

impl Transition {
    #[must_use]
    pub fn state(self) -> SessionState {
        match self {
            Self::Changed { to, .. } => to,
            Self::Unchanged(state) => state,
        }
    }
}

#[derive(Default)]
struct AttemptCounter {
    /// Last attempt handed out. Zero means none yet.
    issued: u64,
    /// Attempt the current `Pending` snapshot belongs to.
    in_flight: Option<AttemptId>,
}

/// Sole writer of the session store.
pub struct AuthStateResolver {
    store: Arc<SessionStore>,
    attempts: Mutex<AttemptCounter>,
}

impl AuthStateResolver {
    #[must_use]
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store, attempts: Mutex::new(AttemptCounter::default()) }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    #[must_use]
    pub fn in_flight(&self) -> Option<AttemptId> {
        self.lock().in_flight
    }

    /// Start a sign-in attempt and move to `Pending`.
    ///
    /// # Errors
    ///
    /// `AlreadyAuthenticated` when a user is signed in; sign out first.
    pub fn begin_sign_in(&self) -> Result<AttemptId, ResolveError> {
        let mut attempts = self.lock();
        let current = self.store.current();
        let from = current.state();
        if from.is_authenticated() {
            return Err(ResolveError::AlreadyAuthenticated { state: from });
        }

        let attempt = AttemptId::new(attempts.issued).next();
        attempts.issued = attempt.get();
        if let Some(superseded) = attempts.in_flight.replace(attempt) {
            debug!(%superseded, %attempt, "sign-in attempt superseded");
        }
        self.store.replace(Session::pending(attempt));
        info!(%attempt, %from, "sign-in attempt started");
        Ok(attempt)
    }

    /// Apply one event.
    ///
    /// # Errors
    ///
    /// Returns why the event was ignored; the session is left untouched in
    /// every error case.
    pub fn apply(&self, event: AuthEvent) -> Result<Transition, ResolveError> {
        let mut attempts = self.lock();
        self.apply_locked(&mut attempts, event)
    }

    /// Expire the held session if its token is past due at `now`.
    pub fn check_expiry(&self, now: OffsetDateTime) -> Transition {
        let mut attempts = self.lock();
        let current = self.store.current();
        let unchanged = Transition::Unchanged(current.state());
        if !current.is_expired_at(now) {
            return unchanged;
        }
        // Only authenticated sessions hold a token, and expiry always applies there.
        self.apply_locked(&mut attempts, AuthEvent::TokenExpired)
            .unwrap_or(unchanged)
    }

    fn apply_locked(&self, attempts: &mut AttemptCounter, event: AuthEvent) -> Result<Transition, ResolveError> {
        let current = self.store.current();
        let from = current.state();
        let kind = event.kind();

        let next = match next_session(attempts, &current, event) {
            Ok(next) => next,
            Err(err) if err.is_stale() => {
                debug!(event = kind, error = %err, "discarding stale identity event");
                return Err(err);
            }
            Err(err) => {
                warn!(event = kind, %from, error = %err, "identity event ignored");
                return Err(err);
            }
        };

        let Some(next) = next else {
            debug!(event = kind, state = %from, "identity event had no effect");
            return Ok(Transition::Unchanged(from));
        };

        if let Some(notice) = next.notice() {
            warn!(event = kind, %notice, "session reset to anonymous");
        }
        let to = next.state();
        self.store.replace(next);
        info!(event = kind, %from, %to, "session transition");
        Ok(Transition::Changed { from, to })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, AttemptCounter> {
        self.attempts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Compute the snapshot `event` leads to, or `None` for a no-op.
fn next_session(
    attempts: &mut AttemptCounter,
    current: &Session,
    event: AuthEvent,
) -> Result<Option<Session>, ResolveError> {
    let from = current.state();
    match event {
        AuthEvent::SignInSucceeded { attempt, user_id, profile_complete, token } => {
            claim_attempt(attempts, attempt)?;
            Ok(Some(Session::authenticated(user_id, profile_complete, token)))
        }
        AuthEvent::SignInFailed { attempt, cause } => {
            claim_attempt(attempts, attempt)?;
            Ok(Some(Session::anonymous_with_notice(AuthNotice::SignInFailed { cause: cause.to_string() })))
        }
        AuthEvent::SignedOut => {
            if let Some(abandoned) = attempts.in_flight.take() {
                debug!(%abandoned, "sign-in attempt abandoned by sign-out");
            }
            if from == SessionState::Anonymous && current.notice().is_none() {
                Ok(None)
            } else {
                Ok(Some(Session::anonymous()))
            }
        }
        AuthEvent::ProfileCompleted { user_id } => {
            let expected = current
                .user_id()
                .ok_or(ResolveError::InvalidTransition { from, event: "profile_completed" })?;
            if *expected != user_id {
                return Err(ResolveError::UserMismatch { expected: expected.clone(), got: user_id });
            }
            match (from, current.token()) {
                (SessionState::IncompleteProfile, Some(token)) => Ok(Some(Session::complete(user_id, token.clone()))),
                // Completion is one-way; repeating it is a no-op.
                (SessionState::Complete, _) => Ok(None),
                _ => Err(ResolveError::InvalidTransition { from, event: "profile_completed" }),
            }
        }
        AuthEvent::TokenExpired => {
            if from.is_authenticated() {
                Ok(Some(Session::anonymous_with_notice(AuthNotice::SessionExpired)))
            } else {
                Ok(None)
            }
        }
        AuthEvent::TokenRefreshed { token } => match (from, current.user_id()) {
            (SessionState::IncompleteProfile, Some(user_id)) => {
                Ok(Some(Session::incomplete_profile(user_id.clone(), token)))
            }
            (SessionState::Complete, Some(user_id)) => Ok(Some(Session::complete(user_id.clone(), token))),
            _ => Err(ResolveError::InvalidTransition { from, event: "token_refreshed" }),
        },
    }
}

/// Accept a resolution only for the attempt currently in flight.
fn claim_attempt(attempts: &mut AttemptCounter, attempt: AttemptId) -> Result<(), ResolveError> {
    if attempts.in_flight == Some(attempt) {
        attempts.in_flight = None;
        return Ok(());
    }
    if attempt.get() > attempts.issued {
        return Err(ResolveError::UnknownAttempt { attempt });
    }
    Err(ResolveError::StaleAttempt { attempt, in_flight: attempts.in_flight })
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod tests;
