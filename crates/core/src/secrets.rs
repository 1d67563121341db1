//! Named secret lookup for API credentials.

use std::collections::HashMap;

use thiserror::Error;

/// Environment variable prefix for [`EnvSecretStore`].
pub const SECRET_ENV_PREFIX: &str = "REELFORGE_SECRET_";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecretError {
    #[error("Secret not found: {0}")]
    NotFound(String),
}

/// Resolves secret values by name (e.g. `openai_api_key`).
pub trait SecretStore: Send + Sync {
    fn get(&self, name: &str) -> Result<String, SecretError>;
}

/// Reads `REELFORGE_SECRET_<NAME>` environment variables, with the name
/// upper-cased. Empty values count as missing.
#[derive(Debug, Clone, Default)]
pub struct EnvSecretStore;

impl EnvSecretStore {
    pub fn new() -> Self {
        Self
    }

    pub fn variable_name(name: &str) -> String {
        format!("{}{}", SECRET_ENV_PREFIX, name.to_ascii_uppercase())
    }
}

impl SecretStore for EnvSecretStore {
    fn get(&self, name: &str) -> Result<String, SecretError> {
        std::env::var(Self::variable_name(name))
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| SecretError::NotFound(name.to_string()))
    }
}

/// Fixed in-memory secrets.
#[derive(Debug, Clone, Default)]
pub struct StaticSecretStore {
    values: HashMap<String, String>,
}

impl StaticSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl SecretStore for StaticSecretStore {
    fn get(&self, name: &str) -> Result<String, SecretError> {
        self.values
            .get(name)
            .cloned()
            .ok_or_else(|| SecretError::NotFound(name.to_string()))
    }
}
