use super::*;

#[test]
fn normalize_path_strips_query_fragment_and_trailing_slash() {
    assert_eq!(normalize_path("/about/"), "/about");
    assert_eq!(normalize_path("/contact?ref=nav"), "/contact");
    assert_eq!(normalize_path("/donate#top"), "/donate");
    assert_eq!(normalize_path("/"), "/");
    assert_eq!(normalize_path(""), "/");
    assert_eq!(normalize_path("/?q=1"), "/");
}

#[test]
fn portal_default_gates_only_profile_completion() {
    let table = RouteTable::portal_default();
    assert_eq!(table.requirement_for("/complete-profile"), RouteRequirement::ProfileCompletion);
    for path in ["/", "/auth", "/about", "/contact", "/donate", "/privacy-policy", "/terms-of-service", "/disclaimer"] {
        assert_eq!(table.requirement_for(path), RouteRequirement::Public, "{path}");
    }
    assert_eq!(table.iter().count(), 9);
}

#[test]
fn unknown_paths_use_fallback() {
    assert_eq!(RouteTable::portal_default().requirement_for("/nope"), RouteRequirement::Public);
    let locked = RouteTable::new(RouteRequirement::AnyAuthenticated);
    assert_eq!(locked.requirement_for("/anything"), RouteRequirement::AnyAuthenticated);
}

#[test]
fn lookup_normalizes_request_path() {
    let table = RouteTable::portal_default().with_route("/feed/", RouteRequirement::CompleteProfileRequired);
    assert_eq!(table.requirement_for("/feed"), RouteRequirement::CompleteProfileRequired);
    assert_eq!(table.requirement_for("/feed/?page=2"), RouteRequirement::CompleteProfileRequired);
    assert_eq!(table.requirement_for("/complete-profile/"), RouteRequirement::ProfileCompletion);
}
