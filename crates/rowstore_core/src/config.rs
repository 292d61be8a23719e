//! Database configuration.

use crate::cache::{DatabaseRoot, LEGACY_SHARED_NAME};
use crate::error::{CoreError, CoreResult};

/// Configuration for opening a database.
#[derive(Debug, Clone)]
pub struct Config {
    /// Name of the store to bind to.
    pub store_name: String,

    /// Shared container that keeps stores alive between databases.
    ///
    /// Without one, [`Database::open_standalone`](crate::Database::open_standalone)
    /// uses a private cache and the store lives as long as the database.
    pub database_root: Option<DatabaseRoot>,

    /// Whether key values may appear in error messages and logs.
    pub sensitive_data_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_name: LEGACY_SHARED_NAME.to_string(),
            database_root: None,
            sensitive_data_logging: false,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the store name.
    #[must_use]
    pub fn store_name(mut self, name: impl Into<String>) -> Self {
        self.store_name = name.into();
        self
    }

    /// Sets the shared database root.
    #[must_use]
    pub fn database_root(mut self, root: DatabaseRoot) -> Self {
        self.database_root = Some(root);
        self
    }

    /// Sets whether key values may be logged.
    #[must_use]
    pub fn sensitive_data_logging(mut self, value: bool) -> Self {
        self.sensitive_data_logging = value;
        self
    }

    /// Checks the configuration is usable.
    pub fn validate(&self) -> CoreResult<()> {
        if self.store_name.is_empty() {
            return Err(CoreError::invalid_operation("store name must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.store_name, LEGACY_SHARED_NAME);
        assert!(config.database_root.is_none());
        assert!(!config.sensitive_data_logging);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .store_name("orders")
            .database_root(DatabaseRoot::new())
            .sensitive_data_logging(true);
        assert_eq!(config.store_name, "orders");
        assert!(config.database_root.is_some());
        assert!(config.sensitive_data_logging);
    }

    #[test]
    fn empty_name_is_rejected() {
        let config = Config::new().store_name("");
        assert!(matches!(
            config.validate(),
            Err(CoreError::InvalidOperation { .. })
        ));
    }
}
