//! Error types for the model manager.
//!
//! Each leaf component has its own error enum carrying the URL or path it was
//! working on. [`ManagerError`] is what the orchestrator hands to the CLI.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Transport-level failure talking to the model hub.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl HttpError {
    pub fn url(&self) -> &str {
        match self {
            Self::Request { url, .. } | Self::Status { url, .. } | Self::Decode { url, .. } => url,
        }
    }
}

/// Failure building the hub client.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("invalid hub endpoint '{0}'")]
    Endpoint(String),

    #[error("failed to create HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Remote index failures (search and file listing).
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("search for '{term}' failed: {source}")]
    Search {
        term: String,
        #[source]
        source: HttpError,
    },

    #[error("could not list files of {repo_id}: {source}")]
    ListFiles {
        repo_id: String,
        #[source]
        source: HttpError,
    },

    #[error("no .gguf files found in {repo_id}")]
    NoFiles { repo_id: String, url: String },
}

impl IndexError {
    /// URL of the request that failed, for a manual fallback.
    pub fn url(&self) -> &str {
        match self {
            Self::Search { source, .. } | Self::ListFiles { source, .. } => source.url(),
            Self::NoFiles { url, .. } => url,
        }
    }
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("download of {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("download of {url} failed with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("download of {url} was cut short after {written} of {expected} bytes")]
    Incomplete {
        url: String,
        written: u64,
        expected: u64,
    },

    #[error("could not write {}: {source}", path.display())]
    Io {
        url: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DownloadError {
    pub fn url(&self) -> &str {
        match self {
            Self::Request { url, .. }
            | Self::Status { url, .. }
            | Self::Incomplete { url, .. }
            | Self::Io { url, .. } => url,
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("model registry not found at {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to access registry {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("registry {} is not valid: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize registry: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid model name '{0}' (only a-z and 0-9 are allowed)")]
    InvalidName(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine home directory (HOME is not set)")]
    NoHome,

    #[error("failed to access config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("config {} is not valid TOML: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Errors surfaced by [`crate::ModelManager`] commands.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("unknown model '{name}'")]
    UnknownModel { name: String, known: Vec<String> },

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error("'{0}' is not a safe file name inside the models directory")]
    UnsafeFilename(String),

    #[error("failed to remove {}: {source}", path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to scan {}: {source}", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to read input: {0}")]
    Prompt(#[source] io::Error),
}

impl ManagerError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => 2,
            _ => 1,
        }
    }

    /// Follow-up advice printed under the error message.
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::Usage(_) => Some("Run `manage-models --help` for usage.".to_string()),
            Self::Registry(RegistryError::NotFound { .. }) => Some(
                "Run `manage-models browse` to find and download a model first.".to_string(),
            ),
            Self::UnknownModel { known, .. } if known.is_empty() => {
                Some("The registry is empty. Run `manage-models browse` to add a model.".to_string())
            }
            Self::UnknownModel { known, .. } => Some(format!("Known models: {}", known.join(", "))),
            Self::Index(IndexError::NoFiles { url, .. }) => {
                Some(format!("Check the repository contents at {url}"))
            }
            Self::Index(err) => Some(format!("The request was: {}", err.url())),
            Self::Download(err) => Some(format!("You can download it manually from {}", err.url())),
            _ => None,
        }
    }
}
