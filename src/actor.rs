//! Actor identity management.
//!
//! Actor resolution order:
//! 1) Explicit id (CLI --actor)
//! 2) TASKDECK_ACTOR environment variable
//! 3) Config default (actor.default)
//! 4) The unknown actor

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::PersonId;

/// Environment variable consulted for the acting person id
pub const ACTOR_ENV: &str = "TASKDECK_ACTOR";

/// Person id recorded when nobody could be resolved
pub const UNKNOWN_ACTOR_ID: PersonId = -1;

/// The person on whose behalf activity entries are written.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub id: PersonId,
}

impl Actor {
    pub fn new(id: PersonId) -> Self {
        Self { id }
    }

    pub fn unknown() -> Self {
        Self::new(UNKNOWN_ACTOR_ID)
    }

    pub fn is_known(&self) -> bool {
        self.id != UNKNOWN_ACTOR_ID
    }
}

/// Supplies the current actor; the host's logged-in user in production.
pub trait IdentityProvider: Send + Sync {
    fn current_actor(&self) -> Actor;
}

/// Identity fixed at construction time.
#[derive(Debug, Clone, Copy)]
pub struct StaticIdentity(Actor);

impl StaticIdentity {
    pub fn new(id: PersonId) -> Self {
        Self(Actor::new(id))
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_actor(&self) -> Actor {
        self.0
    }
}

/// Resolve the current actor using the explicit value, environment and config.
pub fn resolve_actor(explicit: Option<&str>, config: &Config) -> Result<Actor> {
    if let Some(raw) = non_empty(explicit) {
        return parse_actor(raw);
    }

    if let Ok(env_actor) = std::env::var(ACTOR_ENV) {
        if let Some(raw) = non_empty(Some(env_actor.as_str())) {
            return parse_actor(raw);
        }
    }

    Ok(config
        .actor
        .default
        .map(Actor::new)
        .unwrap_or_else(Actor::unknown))
}

fn parse_actor(raw: &str) -> Result<Actor> {
    raw.parse::<PersonId>()
        .map(Actor::new)
        .map_err(|_| Error::InvalidArgument(format!("actor must be a person id, got '{raw}'")))
}

fn non_empty(input: Option<&str>) -> Option<&str> {
    input.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_actor_wins() {
        let mut config = Config::default();
        config.actor.default = Some(5);
        let actor = resolve_actor(Some(" 42 "), &config).expect("actor");
        assert_eq!(actor, Actor::new(42));
    }

    #[test]
    fn rejects_non_numeric_actor() {
        let err = resolve_actor(Some("alice"), &Config::default()).expect_err("invalid");
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
