//! Access to the profile-completion destination.
//!
//! Visitors who signed in without a completed profile must still reach the
//! completion page, so this gate admits `IncompleteProfile` where the general
//! guard would send them back to it. Completion is terminal: once the profile
//! is complete the destination forwards to the landing route.

use crate::error::ResolveError;
use crate::guard::{AccessDecision, RedirectReason, RouteGuard, RouteRequirement};
use crate::model::{Session, SessionState, UserId};
use crate::resolver::{AuthEvent, AuthStateResolver, Transition};

#[derive(Debug, Clone)]
pub struct ProfileCompletionGate {
    guard: RouteGuard,
}

impl ProfileCompletionGate {
    #[must_use]
    pub fn new(guard: RouteGuard) -> Self {
        Self { guard }
    }

    /// Allow any signed-in visitor; otherwise the guard's `AnyAuthenticated`
    /// answer.
    #[must_use]
    pub fn evaluate(&self, session: &Session) -> AccessDecision {
        match session.state() {
            SessionState::IncompleteProfile | SessionState::Complete => AccessDecision::Allow,
            SessionState::Anonymous | SessionState::Pending => {
                self.guard.evaluate(RouteRequirement::AnyAuthenticated, session)
            }
        }
    }

    /// Navigation to the completion page itself.
    #[must_use]
    pub fn evaluate_destination(&self, session: &Session) -> AccessDecision {
        if session.state() == SessionState::Complete {
            return AccessDecision::redirect(&self.guard.routes().landing, RedirectReason::ProfileComplete);
        }
        self.evaluate(session)
    }

    /// `evaluate_destination` once the caller stopped waiting on a pending
    /// sign-in.
    #[must_use]
    pub fn evaluate_destination_after_wait(&self, session: &Session) -> AccessDecision {
        if session.state() == SessionState::Pending {
            return self
                .guard
                .evaluate_after_wait(RouteRequirement::AnyAuthenticated, session);
        }
        self.evaluate_destination(session)
    }

    /// Record the completion workflow's success. Repeating it is a no-op.
    ///
    /// # Errors
    ///
    /// `UserMismatch` when `user_id` is not the signed-in user and
    /// `InvalidTransition` when nobody is signed in.
    pub fn complete(&self, resolver: &AuthStateResolver, user_id: UserId) -> Result<Transition, ResolveError> {
        resolver.apply(AuthEvent::ProfileCompleted { user_id })
    }
}

#[cfg(test)]
#[path = "profile_gate_test.rs"]
mod tests;
