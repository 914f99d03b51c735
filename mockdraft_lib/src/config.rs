//! Database configuration, read from the environment or built in code.

use std::time::Duration;

use crate::db::{CommandOptions, Database, DbTarget, IsolationLevel, DEFAULT_BUSY_TIMEOUT};
use crate::error::MockDraftError;
use crate::repository::ProspectKey;

pub const ENV_DB: &str = "MOCKDRAFT_DB";
pub const ENV_COMMAND_TIMEOUT_SECS: &str = "MOCKDRAFT_COMMAND_TIMEOUT_SECS";
pub const ENV_BUSY_TIMEOUT_MS: &str = "MOCKDRAFT_BUSY_TIMEOUT_MS";
pub const ENV_PROSPECT_KEY: &str = "MOCKDRAFT_PROSPECT_KEY";

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub target: DbTarget,
    pub command_timeout: Option<Duration>,
    pub busy_timeout: Duration,
    pub isolation: Option<IsolationLevel>,
    pub prospect_key: ProspectKey,
}

impl DbConfig {
    pub fn new(target: DbTarget) -> Self {
        Self {
            target,
            command_timeout: None,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            isolation: None,
            prospect_key: ProspectKey::default(),
        }
    }

    /// Read `MOCKDRAFT_*` variables. `MOCKDRAFT_DB` is required.
    pub fn from_env() -> Result<Self, MockDraftError> {
        Self::from_lookup(None, |key| std::env::var(key).ok())
    }

    /// Like `from_env`, with an explicit target taking precedence over `MOCKDRAFT_DB`.
    pub fn from_env_with_target(target: Option<&str>) -> Result<Self, MockDraftError> {
        Self::from_lookup(target, |key| std::env::var(key).ok())
    }

    fn from_lookup<F>(target: Option<&str>, lookup: F) -> Result<Self, MockDraftError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_target = match target {
            Some(t) => t.to_string(),
            None => lookup(ENV_DB).ok_or_else(|| {
                MockDraftError::InvalidInput(format!(
                    "no database configured; pass --db or set {}",
                    ENV_DB
                ))
            })?,
        };
        let mut config = Self::new(DbTarget::from_path(&raw_target)?);

        if let Some(secs) = lookup(ENV_COMMAND_TIMEOUT_SECS) {
            let secs = parse_number(ENV_COMMAND_TIMEOUT_SECS, &secs)?;
            // 0 means no command timeout.
            config.command_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(ms) = lookup(ENV_BUSY_TIMEOUT_MS) {
            config.busy_timeout = Duration::from_millis(parse_number(ENV_BUSY_TIMEOUT_MS, &ms)?);
        }
        if let Some(key) = lookup(ENV_PROSPECT_KEY) {
            config.prospect_key = key.parse()?;
        }

        Ok(config)
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn with_isolation(mut self, level: IsolationLevel) -> Self {
        self.isolation = Some(level);
        self
    }

    pub fn with_prospect_key(mut self, key: ProspectKey) -> Self {
        self.prospect_key = key;
        self
    }

    pub fn command_options(&self) -> CommandOptions {
        CommandOptions {
            command_timeout: self.command_timeout,
            busy_timeout: self.busy_timeout,
        }
    }

    /// Database handle for this configuration. Does not touch the file.
    pub fn database(&self) -> Database {
        let db = Database::new(self.target.clone(), self.command_options());
        match self.isolation {
            Some(level) => db.with_isolation(level),
            None => db,
        }
    }
}

fn parse_number(var: &str, value: &str) -> Result<u64, MockDraftError> {
    value.trim().parse().map_err(|_| {
        MockDraftError::InvalidInput(format!(
            "{} must be a non-negative integer, got '{}'",
            var, value
        ))
    })
}
