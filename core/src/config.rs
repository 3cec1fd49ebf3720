//! Client configuration: base address and authentication table.

use url::Url;

use crate::error::ConfigError;
use crate::route::AuthTable;

/// Production backend.
pub const DEFAULT_BASE_URL: &str = "https://project-pets.herokuapp.com";

/// Environment variable that overrides the base address.
pub const BASE_URL_ENV: &str = "MIAUJUDA_BASE_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: Url,
    pub auth: AuthTable,
}

impl ClientConfig {
    /// Parse `base_url` and pair it with the default `AuthTable`.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let parsed = Url::parse(base_url.trim()).map_err(|source| ConfigError::Parse {
            url: base_url.to_string(),
            source,
        })?;
        if parsed.cannot_be_a_base() {
            return Err(ConfigError::NotABase(base_url.to_string()));
        }
        Ok(Self {
            base_url: parsed,
            auth: AuthTable::default(),
        })
    }

    /// Read the base address from `MIAUJUDA_BASE_URL`, falling back to the
    /// production backend.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(BASE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::new(&url),
            _ => Self::new(DEFAULT_BASE_URL),
        }
    }

    pub fn with_auth(mut self, auth: AuthTable) -> Self {
        self.auth = auth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::Operation;

    #[test]
    fn default_base_parses() {
        let config = ClientConfig::new(DEFAULT_BASE_URL).unwrap();
        assert_eq!(config.base_url.host_str(), Some("project-pets.herokuapp.com"));
        assert!(config.auth.requires(Operation::GenericGet));
    }

    #[test]
    fn garbage_is_rejected() {
        let err = ClientConfig::new("not a url").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn non_base_scheme_is_rejected() {
        let err = ClientConfig::new("data:text/plain,hello").unwrap_err();
        assert!(matches!(err, ConfigError::NotABase(_)));
    }

    #[test]
    fn auth_table_can_be_replaced() {
        let config = ClientConfig::new("http://localhost:3000")
            .unwrap()
            .with_auth(AuthTable::none());
        assert!(!config.auth.requires(Operation::GenericGet));
    }
}
