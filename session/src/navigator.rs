//! Navigation-layer entry point: path in, access decision out.
//!
//! DESIGN
//! ======
//! `decide` answers immediately. `navigate` additionally waits out a pending
//! sign-in for at most the configured timeout, woken by a store subscription,
//! and then treats the visitor as anonymous for this one decision. The wait
//! is read-side only; a late resolution still lands in the store and the next
//! navigation sees it.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::config::GateConfig;
use crate::guard::{AccessDecision, RouteGuard, RouteRequirement};
use crate::model::{Session, SessionState};
use crate::profile_gate::ProfileCompletionGate;
use crate::routes::{RouteTable, normalize_path};
use crate::store::{SessionStore, Subscription};

/// Outcome of one navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Navigation {
    pub path: String,
    pub requirement: RouteRequirement,
    #[serde(flatten)]
    pub decision: AccessDecision,
    /// The pending-resolution wait ran out before the sign-in resolved.
    pub timed_out: bool,
}

pub struct Navigator {
    store: Arc<SessionStore>,
    table: RouteTable,
    guard: RouteGuard,
    gate: ProfileCompletionGate,
    pending_timeout: Duration,
    changed: Arc<Notify>,
    _subscription: Subscription,
}

impl Navigator {
    #[must_use]
    pub fn new(store: Arc<SessionStore>, table: RouteTable, config: &GateConfig) -> Self {
        let changed = Arc::new(Notify::new());
        let wake = Arc::clone(&changed);
        let subscription = store.subscribe(move |_| wake.notify_waiters());
        let guard = RouteGuard::from_config(config);
        Self {
            store,
            table,
            gate: ProfileCompletionGate::new(guard.clone()),
            guard,
            pending_timeout: config.pending_timeout,
            changed,
            _subscription: subscription,
        }
    }

    #[must_use]
    pub fn gate(&self) -> &ProfileCompletionGate {
        &self.gate
    }

    #[must_use]
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Decide against the current snapshot without waiting.
    #[must_use]
    pub fn decide(&self, path: &str) -> Navigation {
        let requirement = self.table.requirement_for(path);
        let session = self.store.current();
        self.navigation(path, requirement, self.evaluate(requirement, &session), false)
    }

    /// Decide, waiting up to the pending timeout for a sign-in to resolve.
    pub async fn navigate(&self, path: &str) -> Navigation {
        let requirement = self.table.requirement_for(path);
        let deadline = tokio::time::Instant::now() + self.pending_timeout;

        loop {
            // Register for the next change before reading the snapshot so a
            // resolution landing in between is not missed.
            let changed = self.changed.notified();
            tokio::pin!(changed);
            changed.as_mut().enable();

            let session = self.store.current();
            let decision = self.evaluate(requirement, &session);
            if !decision.is_resolving() {
                return self.navigation(path, requirement, decision, false);
            }

            debug!(path, attempt = ?session.attempt(), "waiting on pending sign-in");
            if tokio::time::timeout_at(deadline, changed).await.is_err() {
                let session = self.store.current();
                let timed_out = session.state() == SessionState::Pending;
                if timed_out {
                    warn!(
                        path,
                        timeout_ms = u64::try_from(self.pending_timeout.as_millis()).unwrap_or(u64::MAX),
                        "session resolution timed out; treating visitor as anonymous"
                    );
                }
                let decision = self.evaluate_after_wait(requirement, &session);
                return self.navigation(path, requirement, decision, timed_out);
            }
        }
    }

    fn evaluate(&self, requirement: RouteRequirement, session: &Session) -> AccessDecision {
        match requirement {
            RouteRequirement::ProfileCompletion => self.gate.evaluate_destination(session),
            other => self.guard.evaluate(other, session),
        }
    }

    fn evaluate_after_wait(&self, requirement: RouteRequirement, session: &Session) -> AccessDecision {
        match requirement {
            RouteRequirement::ProfileCompletion => self.gate.evaluate_destination_after_wait(session),
            other => self.guard.evaluate_after_wait(other, session),
        }
    }

    fn navigation(
        &self,
        path: &str,
        requirement: RouteRequirement,
        decision: AccessDecision,
        timed_out: bool,
    ) -> Navigation {
        debug!(path, ?requirement, ?decision, "navigation evaluated");
        Navigation { path: normalize_path(path).to_owned(), requirement, decision, timed_out }
    }
}

#[cfg(test)]
#[path = "navigator_test.rs"]
mod tests;
