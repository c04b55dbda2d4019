use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

const ENV_PREFIX: &str = "CLINIC";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicConfig {
    /// Base URL of the clinic backend, e.g. "http://localhost:8080"
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Per-request timeout in seconds; 0 disables it.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ClinicConfig {
    pub fn config_path() -> Result<PathBuf> {
        Ok(crate::storage::root_path()?.join("config.toml"))
    }

    /// Load config from the default location, layered with `CLINIC_*`
    /// environment variables. A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?, ENV_PREFIX)
    }

    pub fn load_from(path: &Path, env_prefix: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix(env_prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read config at {}", path.display()))?;

        settings
            .try_deserialize::<Self>()
            .with_context(|| format!("Failed to parse config at {}", path.display()))
    }

    /// Write the default config if nothing exists at `path` yet.
    /// Returns true when a file was created.
    pub fn write_default_if_missing(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(&Self::default())?;
        std::fs::write(path, raw)
            .with_context(|| format!("Failed to write config at {}", path.display()))?;
        Ok(true)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config =
            ClinicConfig::load_from(&dir.path().join("config.toml"), "CLINIC_TEST_MISSING")
                .unwrap();

        assert_eq!(config.api_url, "http://localhost:8080");
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn file_values_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "api_url = \"https://clinic.example\"\nrequest_timeout_secs = 0\n",
        )
        .unwrap();

        let config = ClinicConfig::load_from(&path, "CLINIC_TEST_FILE").unwrap();
        assert_eq!(config.api_url, "https://clinic.example");
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_url = \"https://from-file\"\n").unwrap();

        std::env::set_var("CLINIC_TEST_ENV_API_URL", "https://from-env");
        std::env::set_var("CLINIC_TEST_ENV_REQUEST_TIMEOUT_SECS", "5");
        let config = ClinicConfig::load_from(&path, "CLINIC_TEST_ENV").unwrap();
        std::env::remove_var("CLINIC_TEST_ENV_API_URL");
        std::env::remove_var("CLINIC_TEST_ENV_REQUEST_TIMEOUT_SECS");

        assert_eq!(config.api_url, "https://from-env");
        assert_eq!(config.request_timeout_secs, 5);
    }

    #[test]
    fn default_file_is_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clinic-admin").join("config.toml");

        assert!(ClinicConfig::write_default_if_missing(&path).unwrap());
        assert!(!ClinicConfig::write_default_if_missing(&path).unwrap());

        let config = ClinicConfig::load_from(&path, "CLINIC_TEST_WRITTEN").unwrap();
        assert_eq!(config.api_url, "http://localhost:8080");
    }
}
