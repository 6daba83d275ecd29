use config::{Config, Environment, File};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use crate::definition::{validate_identifier, DEFAULT_CONTAINER};
use crate::error::{DocattrError, Result};
use crate::persist::PersistenceMode;

/// Runtime settings, read from defaults, then an optional `docattr.toml`
/// (or any format the config crate knows), then `DOCATTR_*` environment
/// variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Container for attributes declared without one.
    pub default_container: String,
    /// `memory` or `file`.
    pub persistence: String,
    /// Required when `persistence` is `file`.
    #[serde(default)]
    pub database_path: Option<String>,
    pub log_filter: String,
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }
    /// Reads `path` instead of the optional `docattr` file; it must exist.
    pub fn load_from(path: Option<&str>) -> Result<Self> {
        let file = match path {
            Some(path) => File::with_name(path).required(true),
            None => File::with_name("docattr").required(false),
        };
        let settings: Settings = Config::builder()
            .set_default("default_container", DEFAULT_CONTAINER)?
            .set_default("persistence", "memory")?
            .set_default("log_filter", "info")?
            .add_source(file)
            .add_source(Environment::with_prefix("DOCATTR"))
            .build()?
            .try_deserialize()?;
        validate_identifier("default container", &settings.default_container)?;
        Ok(settings)
    }
    pub fn persistence_mode(&self) -> Result<PersistenceMode> {
        match (self.persistence.as_str(), &self.database_path) {
            ("memory", _) => Ok(PersistenceMode::InMemory),
            ("file", Some(path)) => Ok(PersistenceMode::File(path.clone())),
            ("file", None) => Err(DocattrError::Config("file persistence needs a database_path".into())),
            (other, _) => Err(DocattrError::Config(format!("unknown persistence '{}'", other))),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_container: DEFAULT_CONTAINER.to_string(),
            persistence: "memory".to_string(),
            database_path: None,
            log_filter: "info".to_string(),
        }
    }
}

/// Installs a fmt subscriber filtered by `log_filter`. Does nothing if a
/// global subscriber is already set.
pub fn init_logging(settings: &Settings) -> Result<()> {
    let filter = EnvFilter::try_new(&settings.log_filter)
        .map_err(|e| DocattrError::Config(format!("log filter '{}': {}", settings.log_filter, e)))?;
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_modes() {
        let mut settings = Settings::default();
        assert_eq!(settings.persistence_mode().unwrap(), PersistenceMode::InMemory);
        settings.persistence = "file".into();
        assert!(settings.persistence_mode().is_err());
        settings.database_path = Some("records.db".into());
        assert_eq!(
            settings.persistence_mode().unwrap(),
            PersistenceMode::File("records.db".into())
        );
        settings.persistence = "cloud".into();
        assert!(matches!(settings.persistence_mode(), Err(DocattrError::Config(_))));
    }

    #[test]
    fn bad_log_filter_is_a_config_error() {
        let settings = Settings {
            log_filter: "docattr=verbose".into(),
            ..Settings::default()
        };
        assert!(matches!(init_logging(&settings), Err(DocattrError::Config(_))));
    }

    #[test]
    fn missing_explicit_file_fails() {
        assert!(matches!(
            Settings::load_from(Some("does/not/exist.toml")),
            Err(DocattrError::Config(_))
        ));
    }
}
