//! Identity-provider seam and the controller that drives sign-in attempts.
//!
//! The provider call is the only suspension point in the subsystem. The
//! controller tags the provider's answer with the attempt it started, so an
//! answer that arrives after a newer attempt began is dropped by the
//! resolver instead of overwriting the newer outcome. There is no automatic
//! retry after a provider failure; the visitor starts a new attempt.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::{ProviderError, ResolveError};
use crate::model::{AuthToken, UserId};
use crate::resolver::{AuthEvent, AuthStateResolver, Transition};

/// Identity established by a successful provider sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderIdentity {
    pub user_id: UserId,
    pub profile_complete: bool,
    pub token: AuthToken,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Run one interactive sign-in.
    async fn sign_in(&self) -> Result<ProviderIdentity, ProviderError>;
}

pub struct SessionController<P> {
    resolver: Arc<AuthStateResolver>,
    provider: P,
}

impl<P: IdentityProvider> SessionController<P> {
    #[must_use]
    pub fn new(resolver: Arc<AuthStateResolver>, provider: P) -> Self {
        Self { resolver, provider }
    }

    #[must_use]
    pub fn resolver(&self) -> &Arc<AuthStateResolver> {
        &self.resolver
    }

    /// Start an attempt, await the provider, and apply its answer.
    ///
    /// # Errors
    ///
    /// `AlreadyAuthenticated` if a user is signed in, or `StaleAttempt` when
    /// this attempt was superseded or abandoned while the provider ran. A
    /// provider failure is not an error here: it resolves the session to
    /// `Anonymous` with a notice.
    pub async fn sign_in(&self) -> Result<Transition, ResolveError> {
        let attempt = self.resolver.begin_sign_in()?;
        let event = match self.provider.sign_in().await {
            Ok(identity) => {
                info!(%attempt, user_id = %identity.user_id, "identity provider accepted sign-in");
                AuthEvent::SignInSucceeded {
                    attempt,
                    user_id: identity.user_id,
                    profile_complete: identity.profile_complete,
                    token: identity.token,
                }
            }
            Err(cause) => {
                warn!(%attempt, error = %cause, "identity provider rejected sign-in");
                AuthEvent::SignInFailed { attempt, cause }
            }
        };
        self.resolver.apply(event)
    }

    /// # Errors
    ///
    /// Never fails; shares the resolver's signature.
    pub fn sign_out(&self) -> Result<Transition, ResolveError> {
        self.resolver.apply(AuthEvent::SignedOut)
    }
}

#[cfg(test)]
#[path = "provider_test.rs"]
mod tests;
