use super::*;
use crate::config::GateRoutes;
use crate::model::{AttemptId, AuthToken};
use crate::store::SessionStore;
use time::OffsetDateTime;

fn gate() -> ProfileCompletionGate {
    ProfileCompletionGate::new(RouteGuard::new(GateRoutes::default()))
}

fn token() -> AuthToken {
    AuthToken::new("tok", OffsetDateTime::now_utc() + time::Duration::hours(1))
}

fn signed_in(profile_complete: bool) -> AuthStateResolver {
    let resolver = AuthStateResolver::new(SessionStore::new());
    let attempt = resolver.begin_sign_in().unwrap();
    resolver
        .apply(AuthEvent::SignInSucceeded { attempt, user_id: "u1".into(), profile_complete, token: token() })
        .unwrap();
    resolver
}

// =============================================================================
// evaluate
// =============================================================================

#[test]
fn admits_incomplete_and_complete_profiles() {
    let gate = gate();
    assert_eq!(gate.evaluate(&Session::incomplete_profile("u1".into(), token())), AccessDecision::Allow);
    assert_eq!(gate.evaluate(&Session::complete("u1".into(), token())), AccessDecision::Allow);
}

#[test]
fn defers_to_guard_for_visitors_without_session() {
    let gate = gate();
    assert_eq!(
        gate.evaluate(&Session::anonymous()),
        AccessDecision::redirect("/auth", RedirectReason::Unauthenticated)
    );
    assert_eq!(
        gate.evaluate(&Session::pending(AttemptId::new(1))),
        AccessDecision::redirect("/loading", RedirectReason::Resolving)
    );
}

// =============================================================================
// evaluate_destination
// =============================================================================

#[test]
fn destination_open_until_profile_completes() {
    let gate = gate();
    assert_eq!(
        gate.evaluate_destination(&Session::incomplete_profile("u1".into(), token())),
        AccessDecision::Allow
    );
    assert_eq!(
        gate.evaluate_destination(&Session::complete("u1".into(), token())),
        AccessDecision::redirect("/", RedirectReason::ProfileComplete)
    );
}

#[test]
fn destination_after_wait_sends_pending_to_sign_in() {
    let gate = gate();
    assert_eq!(
        gate.evaluate_destination_after_wait(&Session::pending(AttemptId::new(1))),
        AccessDecision::redirect("/auth", RedirectReason::Unauthenticated)
    );
    assert_eq!(
        gate.evaluate_destination_after_wait(&Session::complete("u1".into(), token())),
        AccessDecision::redirect("/", RedirectReason::ProfileComplete)
    );
}

// =============================================================================
// complete
// =============================================================================

#[test]
fn complete_unlocks_full_access_and_closes_destination() {
    let gate = gate();
    let resolver = signed_in(false);

    let transition = gate.complete(&resolver, "u1".into()).unwrap();

    assert_eq!(transition.state(), SessionState::Complete);
    let session = resolver.store().current();
    assert_eq!(
        gate.evaluate_destination(&session),
        AccessDecision::redirect("/", RedirectReason::ProfileComplete)
    );
}

#[test]
fn completing_twice_is_idempotent() {
    let gate = gate();
    let resolver = signed_in(false);
    gate.complete(&resolver, "u1".into()).unwrap();

    let again = gate.complete(&resolver, "u1".into()).unwrap();

    assert_eq!(again, Transition::Unchanged(SessionState::Complete));
}

#[test]
fn complete_without_session_is_rejected() {
    let gate = gate();
    let resolver = AuthStateResolver::new(SessionStore::new());
    let err = gate.complete(&resolver, "u1".into()).unwrap_err();
    assert!(matches!(err, ResolveError::InvalidTransition { .. }));
}
