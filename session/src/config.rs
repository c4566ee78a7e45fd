//! Gate configuration parsed from environment variables.

use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_SIGN_IN_ROUTE: &str = "/auth";
pub const DEFAULT_COMPLETE_PROFILE_ROUTE: &str = "/complete-profile";
pub const DEFAULT_LOADING_ROUTE: &str = "/loading";
pub const DEFAULT_LANDING_ROUTE: &str = "/";
pub const DEFAULT_PENDING_TIMEOUT_MS: u64 = 3000;

/// Redirect targets used by the guards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateRoutes {
    pub sign_in: String,
    pub complete_profile: String,
    /// Placeholder rendered while a sign-in is resolving.
    pub loading: String,
    /// Default authenticated landing route.
    pub landing: String,
}

impl Default for GateRoutes {
    fn default() -> Self {
        Self {
            sign_in: DEFAULT_SIGN_IN_ROUTE.to_owned(),
            complete_profile: DEFAULT_COMPLETE_PROFILE_ROUTE.to_owned(),
            loading: DEFAULT_LOADING_ROUTE.to_owned(),
            landing: DEFAULT_LANDING_ROUTE.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    pub routes: GateRoutes,
    /// How long a navigation may wait on a pending sign-in before the visitor
    /// is treated as anonymous.
    pub pending_timeout: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self { routes: GateRoutes::default(), pending_timeout: Duration::from_millis(DEFAULT_PENDING_TIMEOUT_MS) }
    }
}

impl GateConfig {
    /// Build typed gate config from environment variables.
    ///
    /// Optional:
    /// - `PORTAL_SIGN_IN_ROUTE`: default `/auth`
    /// - `PORTAL_COMPLETE_PROFILE_ROUTE`: default `/complete-profile`
    /// - `PORTAL_LOADING_ROUTE`: default `/loading`
    /// - `PORTAL_LANDING_ROUTE`: default `/`
    /// - `PORTAL_PENDING_TIMEOUT_MS`: default 3000
    ///
    /// # Errors
    ///
    /// `InvalidRoute` when a route variable does not start with `/`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let routes = GateRoutes {
            sign_in: route_var(&lookup, "PORTAL_SIGN_IN_ROUTE", DEFAULT_SIGN_IN_ROUTE)?,
            complete_profile: route_var(&lookup, "PORTAL_COMPLETE_PROFILE_ROUTE", DEFAULT_COMPLETE_PROFILE_ROUTE)?,
            loading: route_var(&lookup, "PORTAL_LOADING_ROUTE", DEFAULT_LOADING_ROUTE)?,
            landing: route_var(&lookup, "PORTAL_LANDING_ROUTE", DEFAULT_LANDING_ROUTE)?,
        };
        let timeout_ms = lookup("PORTAL_PENDING_TIMEOUT_MS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_PENDING_TIMEOUT_MS);

        Ok(Self { routes, pending_timeout: Duration::from_millis(timeout_ms) })
    }

    #[must_use]
    pub fn with_pending_timeout(mut self, timeout: Duration) -> Self {
        self.pending_timeout = timeout;
        self
    }
}

fn route_var<F>(lookup: &F, var: &'static str, default: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(var) else {
        return Ok(default.to_owned());
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(default.to_owned());
    }
    if !trimmed.starts_with('/') {
        return Err(ConfigError::InvalidRoute { var, value: raw });
    }
    Ok(trimmed.to_owned())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
