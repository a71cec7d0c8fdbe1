use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::RegistryError;

/// Registry key: non-empty, lowercase ASCII letters and digits only.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModelName(String);

impl ModelName {
    pub fn parse(name: impl Into<String>) -> Result<Self, RegistryError> {
        let name = name.into();
        let valid = !name.is_empty()
            && name
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit());
        if valid {
            Ok(Self(name))
        } else {
            Err(RegistryError::InvalidName(name))
        }
    }

    /// Base name for a repository: last path segment, lowercased, stripped
    /// to `[a-z0-9]`. Falls back to `model` when nothing is left.
    pub fn from_repo(repo_id: &str) -> Self {
        let last = repo_id.rsplit('/').next().unwrap_or(repo_id);
        let slug: String = last
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            .collect();
        if slug.is_empty() {
            Self("model".to_string())
        } else {
            Self(slug)
        }
    }

    /// `self` with a numeric suffix appended (`llama3` + 1 -> `llama31`).
    pub fn with_suffix(&self, n: u32) -> Self {
        Self(format!("{}{n}", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ModelName {
    type Error = RegistryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ModelName> for String {
    fn from(name: ModelName) -> Self {
        name.0
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// One registry entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    #[serde(rename = "hf_repo")]
    pub source_repo: String,
    /// Path of the artifact inside the repository, also its path under `files/`
    pub filename: String,
    pub size_gb: f64,
    #[serde(default = "default_chat_template")]
    pub chat_template: String,
    pub added_date: NaiveDate,
}

fn default_chat_template() -> String {
    "auto".to_string()
}

impl ModelRecord {
    /// Record for a file picked today from `source_repo`.
    pub fn new(source_repo: impl Into<String>, file: &CandidateFile) -> Self {
        Self {
            source_repo: source_repo.into(),
            filename: file.path.clone(),
            size_gb: file.size_gb,
            chat_template: default_chat_template(),
            added_date: chrono::Local::now().date_naive(),
        }
    }
}

/// A downloadable model file found in a repository.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFile {
    pub path: String,
    pub size_bytes: u64,
    pub size_gb: f64,
}

impl CandidateFile {
    pub fn new(path: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            path: path.into(),
            size_bytes,
            size_gb: bytes_to_gb(size_bytes),
        }
    }
}

/// Size in GiB rounded to two decimals.
pub fn bytes_to_gb(bytes: u64) -> f64 {
    let gb = bytes as f64 / 1_073_741_824.0;
    (gb * 100.0).round() / 100.0
}

/// Format bytes as human-readable string
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
