use super::*;
use crate::guard::RedirectReason;
use crate::model::AuthToken;
use crate::resolver::{AuthEvent, AuthStateResolver};
use time::OffsetDateTime;

const TIMEOUT: Duration = Duration::from_millis(3000);

fn setup() -> (AuthStateResolver, Navigator) {
    let store = SessionStore::new();
    let table = RouteTable::portal_default()
        .with_route("/feed", RouteRequirement::CompleteProfileRequired)
        .with_route("/upload", RouteRequirement::AnyAuthenticated);
    let config = GateConfig::default().with_pending_timeout(TIMEOUT);
    let navigator = Navigator::new(Arc::clone(&store), table, &config);
    (AuthStateResolver::new(store), navigator)
}

fn sign_in_event(attempt: crate::model::AttemptId, profile_complete: bool) -> AuthEvent {
    AuthEvent::SignInSucceeded {
        attempt,
        user_id: "u1".into(),
        profile_complete,
        token: AuthToken::new("tok", OffsetDateTime::now_utc() + time::Duration::hours(1)),
    }
}

// =============================================================================
// decide
// =============================================================================

#[test]
fn decide_reports_normalized_path_and_requirement() {
    let (_resolver, navigator) = setup();
    let nav = navigator.decide("/feed/?tab=new");
    assert_eq!(nav.path, "/feed");
    assert_eq!(nav.requirement, RouteRequirement::CompleteProfileRequired);
    assert_eq!(nav.decision, AccessDecision::redirect("/auth", RedirectReason::Unauthenticated));
    assert!(!nav.timed_out);
}

#[test]
fn scenario_incomplete_profile_is_sent_to_completion() {
    let (resolver, navigator) = setup();
    let attempt = resolver.begin_sign_in().unwrap();
    resolver.apply(sign_in_event(attempt, false)).unwrap();

    assert_eq!(
        navigator.decide("/feed").decision,
        AccessDecision::redirect("/complete-profile", RedirectReason::ProfileIncomplete)
    );
    assert_eq!(navigator.decide("/complete-profile").decision, AccessDecision::Allow);
    assert_eq!(navigator.decide("/upload").decision, AccessDecision::Allow);
}

#[test]
fn scenario_completion_unlocks_feed_and_closes_completion_page() {
    let (resolver, navigator) = setup();
    let attempt = resolver.begin_sign_in().unwrap();
    resolver.apply(sign_in_event(attempt, false)).unwrap();

    navigator.gate().complete(&resolver, "u1".into()).unwrap();

    assert_eq!(navigator.decide("/feed").decision, AccessDecision::Allow);
    assert_eq!(
        navigator.decide("/complete-profile").decision,
        AccessDecision::redirect("/", RedirectReason::ProfileComplete)
    );
}

#[test]
fn scenario_expired_token_redirects_to_sign_in() {
    let (resolver, navigator) = setup();
    let attempt = resolver.begin_sign_in().unwrap();
    resolver.apply(sign_in_event(attempt, true)).unwrap();
    resolver.apply(AuthEvent::TokenExpired).unwrap();

    assert_eq!(
        navigator.decide("/upload").decision,
        AccessDecision::redirect("/auth", RedirectReason::Unauthenticated)
    );
}

// =============================================================================
// navigate while pending
// =============================================================================

#[tokio::test(start_paused = true)]
async fn public_route_never_waits_on_pending() {
    let (resolver, navigator) = setup();
    resolver.begin_sign_in().unwrap();
    let started = tokio::time::Instant::now();

    let nav = navigator.navigate("/about").await;

    assert_eq!(nav.decision, AccessDecision::Allow);
    assert!(!nav.timed_out);
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn pending_past_timeout_is_treated_as_anonymous() {
    let (resolver, navigator) = setup();
    resolver.begin_sign_in().unwrap();
    let started = tokio::time::Instant::now();

    let nav = navigator.navigate("/upload").await;

    assert!(nav.timed_out);
    assert_eq!(nav.decision, AccessDecision::redirect("/auth", RedirectReason::Unauthenticated));
    assert!(started.elapsed() >= TIMEOUT);
    // The session itself is still pending.
    assert_eq!(resolver.store().current().state(), SessionState::Pending);
}

#[tokio::test(start_paused = true)]
async fn resolution_within_timeout_is_honored() {
    let (resolver, navigator) = setup();
    let attempt = resolver.begin_sign_in().unwrap();

    let resolve = async {
        tokio::time::sleep(Duration::from_millis(500)).await;
        resolver.apply(sign_in_event(attempt, true)).unwrap();
    };
    let (nav, ()) = tokio::join!(navigator.navigate("/feed"), resolve);

    assert_eq!(nav.decision, AccessDecision::Allow);
    assert!(!nav.timed_out);
}

#[tokio::test(start_paused = true)]
async fn late_resolution_still_applies_after_timeout() {
    let (resolver, navigator) = setup();
    let attempt = resolver.begin_sign_in().unwrap();

    let first = navigator.navigate("/upload").await;
    assert!(first.timed_out);

    resolver.apply(sign_in_event(attempt, false)).unwrap();
    let second = navigator.navigate("/upload").await;
    assert_eq!(second.decision, AccessDecision::Allow);
    assert!(!second.timed_out);
}

#[tokio::test(start_paused = true)]
async fn failed_sign_in_while_waiting_redirects_to_sign_in() {
    let (resolver, navigator) = setup();
    let attempt = resolver.begin_sign_in().unwrap();

    let fail = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        resolver
            .apply(AuthEvent::SignInFailed { attempt, cause: crate::error::ProviderError::Cancelled })
            .unwrap();
    };
    let (nav, ()) = tokio::join!(navigator.navigate("/complete-profile"), fail);

    assert_eq!(nav.decision, AccessDecision::redirect("/auth", RedirectReason::Unauthenticated));
    assert!(!nav.timed_out);
}

#[test]
fn navigation_serializes_flat() {
    let (_resolver, navigator) = setup();
    let json = serde_json::to_value(navigator.decide("/upload")).unwrap();
    assert_eq!(json["path"], "/upload");
    assert_eq!(json["requirement"], "any_authenticated");
    assert_eq!(json["decision"], "redirect_to");
    assert_eq!(json["reason"], "unauthenticated");
    assert_eq!(json["timed_out"], false);
}
