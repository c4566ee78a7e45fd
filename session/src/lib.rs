//! Session state machine and route-access gating for the portal front-end.
//!
//! Flow: identity provider → [`AuthStateResolver`] → [`SessionStore`] →
//! {[`RouteGuard`], [`ProfileCompletionGate`]} → [`Navigator`]. The store is
//! passed explicitly to every component that needs it; there is no ambient
//! session lookup.
//!
//! This crate is UI-framework agnostic. Page rendering, the contact form, and
//! the identity-provider SDK live outside it.

pub mod config;
pub mod error;
pub mod guard;
pub mod model;
pub mod navigator;
pub mod profile_gate;
pub mod provider;
pub mod resolver;
pub mod routes;
pub mod store;

pub use config::{GateConfig, GateRoutes};
pub use error::{ConfigError, ProviderError, ResolveError};
pub use guard::{AccessDecision, RedirectReason, RouteGuard, RouteRequirement};
pub use model::{AttemptId, AuthNotice, AuthToken, Session, SessionState, UserId};
pub use navigator::{Navigation, Navigator};
pub use profile_gate::ProfileCompletionGate;
pub use provider::{IdentityProvider, ProviderIdentity, SessionController};
pub use resolver::{AuthEvent, AuthStateResolver, Transition};
pub use routes::RouteTable;
pub use store::{SessionStore, Subscription};
