use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::layout::InstallLayout;

/// Environment variable overriding the install root.
pub const INSTALL_ROOT_ENV: &str = "LLAMAUP_HOME";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Model hub settings
    #[serde(default)]
    pub hub: HubConfig,

    /// Model storage settings
    #[serde(default)]
    pub models: ModelsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    /// Base URL of the model hub
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Timeout for search and file listing requests
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Install root (default: ~/.llamaup)
    #[serde(default)]
    pub install_root: Option<PathBuf>,

    /// Number of repositories requested per search
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
}

fn default_endpoint() -> String {
    "https://huggingface.co".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_user_agent() -> String {
    concat!("llamaup/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_search_limit() -> usize {
    20
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            install_root: None,
            search_limit: default_search_limit(),
        }
    }
}

impl Config {
    /// Get the base directory: ~/.config/llamaup/
    pub fn base_dir() -> Result<PathBuf, ConfigError> {
        Ok(home_dir()?.join(".config").join("llamaup"))
    }

    /// Load config from default location
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load config from `path`, falling back to defaults if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save config to default location
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(io_err)?;
        Ok(())
    }

    /// Get the config file path: ~/.config/llamaup/config.toml
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::base_dir()?.join("config.toml"))
    }

    /// Resolve the install root.
    ///
    /// Precedence: explicit override, then `LLAMAUP_HOME`, then the config
    /// file, then `~/.llamaup`.
    pub fn install_layout(&self, root_override: Option<&Path>) -> Result<InstallLayout, ConfigError> {
        let env_root = std::env::var_os(INSTALL_ROOT_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        self.resolve_layout(root_override, env_root)
    }

    fn resolve_layout(
        &self,
        root_override: Option<&Path>,
        env_root: Option<PathBuf>,
    ) -> Result<InstallLayout, ConfigError> {
        let root = match root_override {
            Some(root) => root.to_path_buf(),
            None => match env_root.or_else(|| self.models.install_root.clone()) {
                Some(root) => root,
                None => home_dir()?.join(".llamaup"),
            },
        };
        Ok(InstallLayout::new(root))
    }
}

fn home_dir() -> Result<PathBuf, ConfigError> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .ok_or(ConfigError::NoHome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.hub.endpoint, "https://huggingface.co");
        assert_eq!(config.hub.timeout_secs, 15);
        assert_eq!(config.models.search_limit, 20);
        assert!(config.models.install_root.is_none());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[models]\nsearch_limit = 5\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.models.search_limit, 5);
        assert_eq!(config.hub.timeout_secs, 15);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.models.search_limit, 20);
    }

    #[test]
    fn test_invalid_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[hub\nendpoint = ").unwrap();

        let result = Config::load_from(&path);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.hub.endpoint = "http://localhost:8080".to_string();
        config.models.install_root = Some(PathBuf::from("/opt/llama"));
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.hub.endpoint, "http://localhost:8080");
        assert_eq!(loaded.models.install_root, Some(PathBuf::from("/opt/llama")));
    }

    #[test]
    fn test_layout_precedence() {
        let mut config = Config::default();
        config.models.install_root = Some(PathBuf::from("/from/config"));

        let layout = config
            .resolve_layout(Some(Path::new("/from/flag")), Some(PathBuf::from("/from/env")))
            .unwrap();
        assert_eq!(layout.root(), Path::new("/from/flag"));

        let layout = config
            .resolve_layout(None, Some(PathBuf::from("/from/env")))
            .unwrap();
        assert_eq!(layout.root(), Path::new("/from/env"));

        let layout = config.resolve_layout(None, None).unwrap();
        assert_eq!(layout.root(), Path::new("/from/config"));
    }
}
