//! Script replay: identity events and navigations fed through the session gate.
//!
//! SCRIPT FORMAT
//! =============
//! One JSON object per line, tagged by `step`. Blank lines and lines starting
//! with `#` are skipped. Every step produces one output record: the session
//! snapshot after an identity event, the reason an event was ignored, or the
//! decision for a navigation.
//!
//! Steps run in order on one task, so a `navigate` issued while a sign-in is
//! pending waits out the full pending timeout.

use std::fmt::Write;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use session::{
    AttemptId, AuthEvent, AuthStateResolver, AuthToken, GateConfig, Navigation, Navigator, ProviderError, RouteTable,
    Session, SessionStore,
};
use time::OffsetDateTime;
use tracing::debug;

const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

fn default_expires_in() -> i64 {
    DEFAULT_EXPIRES_IN_SECS
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    SignInStarted,
    SignInSucceeded {
        attempt: u64,
        user_id: String,
        #[serde(default)]
        profile_complete: bool,
        #[serde(default = "default_expires_in")]
        expires_in_secs: i64,
    },
    SignInFailed {
        attempt: u64,
        cause: String,
    },
    SignedOut,
    ProfileCompleted {
        user_id: String,
    },
    TokenExpired,
    TokenRefreshed {
        #[serde(default = "default_expires_in")]
        expires_in_secs: i64,
    },
    Navigate {
        path: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("line {line}: invalid step: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to read script: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Config(#[from] session::ConfigError),
    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Output of one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Session {
        line: usize,
        session: Session,
    },
    Ignored {
        line: usize,
        error: String,
    },
    Navigation {
        line: usize,
        #[serde(flatten)]
        navigation: Navigation,
    },
}

/// Parse a script into `(line number, step)` pairs.
///
/// # Errors
///
/// `Parse` with the 1-based line number of the first malformed step.
pub fn parse_script(input: &str) -> Result<Vec<(usize, Step)>, ReplayError> {
    input
        .lines()
        .enumerate()
        .filter(|(_, raw)| {
            let trimmed = raw.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .map(|(idx, raw)| {
            let line = idx + 1;
            serde_json::from_str(raw)
                .map(|step| (line, step))
                .map_err(|source| ReplayError::Parse { line, source })
        })
        .collect()
}

pub struct Replay {
    resolver: Arc<AuthStateResolver>,
    navigator: Navigator,
}

impl Replay {
    #[must_use]
    pub fn new(config: &GateConfig) -> Self {
        Self::with_table(config, RouteTable::portal_default())
    }

    #[must_use]
    pub fn with_table(config: &GateConfig, table: RouteTable) -> Self {
        let store = SessionStore::new();
        let navigator = Navigator::new(Arc::clone(&store), table, config);
        Self { resolver: Arc::new(AuthStateResolver::new(store)), navigator }
    }

    #[must_use]
    pub fn table(&self) -> &RouteTable {
        self.navigator.table()
    }

    #[must_use]
    pub fn resolver(&self) -> &Arc<AuthStateResolver> {
        &self.resolver
    }

    pub async fn run(&self, steps: Vec<(usize, Step)>) -> Vec<Record> {
        let mut records = Vec::with_capacity(steps.len());
        for (line, step) in steps {
            records.push(self.step(line, step).await);
        }
        records
    }

    async fn step(&self, line: usize, step: Step) -> Record {
        debug!(line, ?step, "replaying step");
        match self.apply(step).await {
            Applied::Navigation(navigation) => Record::Navigation { line, navigation },
            Applied::Session => Record::Session { line, session: self.resolver.store().current().as_ref().clone() },
            Applied::Ignored(error) => Record::Ignored { line, error },
        }
    }

    async fn apply(&self, step: Step) -> Applied {
        let outcome = match step {
            Step::Navigate { path } => return Applied::Navigation(self.navigator.navigate(&path).await),
            Step::SignInStarted => self.resolver.begin_sign_in().map(|_| ()),
            Step::SignInSucceeded { attempt, user_id, profile_complete, expires_in_secs } => {
                let token = match synthetic_token(expires_in_secs) {
                    Ok(token) => token,
                    Err(error) => return Applied::Ignored(error),
                };
                self.resolver
                    .apply(AuthEvent::SignInSucceeded {
                        attempt: AttemptId::new(attempt),
                        user_id: user_id.into(),
                        profile_complete,
                        token,
                    })
                    .map(|_| ())
            }
            Step::SignInFailed { attempt, cause } => self
                .resolver
                .apply(AuthEvent::SignInFailed {
                    attempt: AttemptId::new(attempt),
                    cause: ProviderError::Rejected(cause),
                })
                .map(|_| ()),
            Step::SignedOut => self.resolver.apply(AuthEvent::SignedOut).map(|_| ()),
            Step::ProfileCompleted { user_id } => self
                .navigator
                .gate()
                .complete(&self.resolver, user_id.into())
                .map(|_| ()),
            Step::TokenExpired => self.resolver.apply(AuthEvent::TokenExpired).map(|_| ()),
            Step::TokenRefreshed { expires_in_secs } => match synthetic_token(expires_in_secs) {
                Ok(token) => self.resolver.apply(AuthEvent::TokenRefreshed { token }).map(|_| ()),
                Err(error) => return Applied::Ignored(error),
            },
        };

        match outcome {
            Ok(()) => Applied::Session,
            Err(err) => Applied::Ignored(err.to_string()),
        }
    }
}

enum Applied {
    Session,
    Navigation(Navigation),
    Ignored(String),
}

/// Random stand-in for a provider token. Fails when the expiry falls outside
/// the representable date range.
fn synthetic_token(expires_in_secs: i64) -> Result<AuthToken, String> {
    let expires_at = OffsetDateTime::now_utc()
        .checked_add(time::Duration::seconds(expires_in_secs))
        .ok_or_else(|| format!("expires_in_secs {expires_in_secs} is out of range"))?;
    let bytes: [u8; 32] = rand::rng().random();
    let mut secret = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(secret, "{b:02x}");
    }
    Ok(AuthToken::new(secret, expires_at))
}

#[cfg(test)]
#[path = "replay_test.rs"]
mod tests;
