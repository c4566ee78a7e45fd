//! Route access evaluation.
//!
//! The guard is a pure function of a route's requirement and a session
//! snapshot. It never blocks: while a sign-in is pending it answers with the
//! loading placeholder, and the caller decides how long to keep asking (see
//! `evaluate_after_wait`).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{GateConfig, GateRoutes};
use crate::model::{Session, SessionState};

/// Static access declaration of a route.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteRequirement {
    Public,
    AnyAuthenticated,
    CompleteProfileRequired,
    /// The profile-completion page itself; see `ProfileCompletionGate`.
    ProfileCompletion,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RedirectReason {
    Unauthenticated,
    ProfileIncomplete,
    Resolving,
    ProfileComplete,
}

impl RedirectReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::ProfileIncomplete => "profile-incomplete",
            Self::Resolving => "resolving",
            Self::ProfileComplete => "profile-complete",
        }
    }
}

impl fmt::Display for RedirectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict for one navigation attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AccessDecision {
    Allow,
    RedirectTo { route: String, reason: RedirectReason },
}

impl AccessDecision {
    #[must_use]
    pub fn redirect(route: &str, reason: RedirectReason) -> Self {
        Self::RedirectTo { route: route.to_owned(), reason }
    }

    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// True while the decision is waiting on a pending sign-in.
    #[must_use]
    pub fn is_resolving(&self) -> bool {
        matches!(self, Self::RedirectTo { reason: RedirectReason::Resolving, .. })
    }
}

#[derive(Debug, Clone)]
pub struct RouteGuard {
    routes: GateRoutes,
}

impl RouteGuard {
    #[must_use]
    pub fn new(routes: GateRoutes) -> Self {
        Self { routes }
    }

    #[must_use]
    pub fn from_config(config: &GateConfig) -> Self {
        Self::new(config.routes.clone())
    }

    #[must_use]
    pub fn routes(&self) -> &GateRoutes {
        &self.routes
    }

    #[must_use]
    pub fn evaluate(&self, requirement: RouteRequirement, session: &Session) -> AccessDecision {
        self.evaluate_state(requirement, session.state())
    }

    /// Decision once the caller's wait budget is spent: a still-pending
    /// session counts as anonymous. The session itself is not touched.
    #[must_use]
    pub fn evaluate_after_wait(&self, requirement: RouteRequirement, session: &Session) -> AccessDecision {
        let state = match session.state() {
            SessionState::Pending => SessionState::Anonymous,
            other => other,
        };
        self.evaluate_state(requirement, state)
    }

    fn evaluate_state(&self, requirement: RouteRequirement, state: SessionState) -> AccessDecision {
        match requirement {
            RouteRequirement::Public => AccessDecision::Allow,
            _ if state == SessionState::Pending => {
                AccessDecision::redirect(&self.routes.loading, RedirectReason::Resolving)
            }
            RouteRequirement::AnyAuthenticated | RouteRequirement::ProfileCompletion => {
                if state.is_authenticated() {
                    AccessDecision::Allow
                } else {
                    self.to_sign_in()
                }
            }
            RouteRequirement::CompleteProfileRequired => match state {
                SessionState::Complete => AccessDecision::Allow,
                SessionState::IncompleteProfile => {
                    AccessDecision::redirect(&self.routes.complete_profile, RedirectReason::ProfileIncomplete)
                }
                SessionState::Anonymous | SessionState::Pending => self.to_sign_in(),
            },
        }
    }

    fn to_sign_in(&self) -> AccessDecision {
        AccessDecision::redirect(&self.routes.sign_in, RedirectReason::Unauthenticated)
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
