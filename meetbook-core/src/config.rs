//! Client configuration.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{MeetbookError, MeetbookResult};

static DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8080/api";

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

/// Configuration at ~/.config/meetbook/config.toml, overridable with
/// `MEETBOOK_*` environment variables (e.g. `MEETBOOK_API_BASE_URL`).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MeetbookConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Where drafts are cached. Defaults to the platform data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft_store_path: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    /// Request timeout; unset leaves the transport default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl Default for MeetbookConfig {
    fn default() -> Self {
        MeetbookConfig {
            api_base_url: default_api_base_url(),
            draft_store_path: None,
            auth_token: None,
            request_timeout_secs: None,
        }
    }
}

impl MeetbookConfig {
    /// Load from the default location, creating a commented-out file on
    /// first run.
    pub fn load() -> MeetbookResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> MeetbookResult<Self> {
        Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(Environment::with_prefix("MEETBOOK").try_parsing(true))
            .build()
            .map_err(|e| MeetbookError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| MeetbookError::Config(e.to_string()))
    }

    pub fn config_path() -> MeetbookResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| MeetbookError::Config("Could not determine config directory".into()))?
            .join("meetbook");

        Ok(config_dir.join("config.toml"))
    }

    /// Resolved draft store location, with `~` expanded.
    pub fn draft_store_path(&self) -> MeetbookResult<PathBuf> {
        match &self.draft_store_path {
            Some(path) => {
                let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
                Ok(PathBuf::from(expanded))
            }
            None => {
                let data_dir = dirs::data_dir().ok_or_else(|| {
                    MeetbookError::Config("Could not determine data directory".into())
                })?;
                Ok(data_dir.join("meetbook").join("drafts.json"))
            }
        }
    }

    pub fn save(&self) -> MeetbookResult<()> {
        let config_path = Self::config_path()?;

        let content =
            toml::to_string_pretty(self).map_err(|e| MeetbookError::Config(e.to_string()))?;

        std::fs::write(&config_path, content)
            .map_err(|e| MeetbookError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> MeetbookResult<()> {
        let contents = format!(
            "\
# meetbook configuration

# Meeting API base URL:
# api_base_url = \"{}\"

# Where unsaved drafts are cached:
# draft_store_path = \"~/.local/share/meetbook/drafts.json\"

# Bearer token sent with every request:
# auth_token = \"...\"

# Request timeout in seconds (transport default when unset):
# request_timeout_secs = 30
",
            DEFAULT_API_BASE_URL
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                MeetbookError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| MeetbookError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commented_default_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meetbook").join("config.toml");

        MeetbookConfig::create_default_config(&path).unwrap();
        let config = MeetbookConfig::load_from(&path).unwrap();

        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert!(config.auth_token.is_none());
        assert!(config.request_timeout_secs.is_none());
    }

    #[test]
    fn file_values_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "api_base_url = \"https://meet.example.com/api\"\nrequest_timeout_secs = 5\ndraft_store_path = \"/tmp/drafts.json\"\n",
        )
        .unwrap();

        let config = MeetbookConfig::load_from(&path).unwrap();
        assert_eq!(config.api_base_url, "https://meet.example.com/api");
        assert_eq!(config.request_timeout_secs, Some(5));
        assert_eq!(
            config.draft_store_path().unwrap(),
            PathBuf::from("/tmp/drafts.json")
        );
    }
}
