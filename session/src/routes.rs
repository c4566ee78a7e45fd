//! Static path to requirement declarations for the portal's pages.

use std::collections::BTreeMap;

use crate::guard::RouteRequirement;

/// Path lookup table. Unknown paths resolve to `fallback`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    entries: BTreeMap<String, RouteRequirement>,
    fallback: RouteRequirement,
}

impl RouteTable {
    /// Empty table; every path resolves to `fallback`.
    #[must_use]
    pub fn new(fallback: RouteRequirement) -> Self {
        Self { entries: BTreeMap::new(), fallback }
    }

    /// The portal's page set. Only the profile-completion page is gated;
    /// the not-found page renders for anyone.
    #[must_use]
    pub fn portal_default() -> Self {
        [
            ("/", RouteRequirement::Public),
            ("/auth", RouteRequirement::Public),
            ("/complete-profile", RouteRequirement::ProfileCompletion),
            ("/about", RouteRequirement::Public),
            ("/contact", RouteRequirement::Public),
            ("/donate", RouteRequirement::Public),
            ("/privacy-policy", RouteRequirement::Public),
            ("/terms-of-service", RouteRequirement::Public),
            ("/disclaimer", RouteRequirement::Public),
        ]
        .into_iter()
        .fold(Self::new(RouteRequirement::Public), |table, (path, requirement)| {
            table.with_route(path, requirement)
        })
    }

    #[must_use]
    pub fn with_route(mut self, path: &str, requirement: RouteRequirement) -> Self {
        self.entries.insert(normalize_path(path).to_owned(), requirement);
        self
    }

    #[must_use]
    pub fn requirement_for(&self, path: &str) -> RouteRequirement {
        self.entries
            .get(normalize_path(path))
            .copied()
            .unwrap_or(self.fallback)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, RouteRequirement)> {
        self.entries.iter().map(|(path, requirement)| (path.as_str(), *requirement))
    }
}

/// Strip query, fragment, and trailing slashes. The root stays `/`.
#[must_use]
pub fn normalize_path(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let trimmed = path[..end].trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;
