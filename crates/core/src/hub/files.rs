//! Repository tree filtering: keep `.gguf` files, collapse split archives to
//! their first shard.

use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

use crate::models::CandidateFile;

pub const MODEL_EXTENSION: &str = ".gguf";

static SHARD_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)-(\d+)-of-(\d+)\.gguf$").expect("shard pattern is valid"));

/// One entry of `GET /api/models/<repo>/tree/main?recursive=true`.
#[derive(Debug, Clone, Deserialize)]
pub struct TreeEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub path: String,
    #[serde(default)]
    pub size: u64,
}

impl TreeEntry {
    pub fn is_file(&self) -> bool {
        self.kind == "file"
    }

    pub fn is_model_file(&self) -> bool {
        self.is_file() && self.path.to_lowercase().ends_with(MODEL_EXTENSION)
    }
}

/// Where a file sits in a split (`-00002-of-00003.gguf`) archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShardPosition {
    NotSharded,
    First,
    Later { index: u32, total: u32 },
    /// Looks like a shard suffix but the numbers don't make sense.
    Ambiguous,
}

impl ShardPosition {
    pub fn of(path: &str) -> Self {
        let Some(caps) = SHARD_SUFFIX.captures(path) else {
            return Self::NotSharded;
        };
        let index = caps[1].parse::<u32>();
        let total = caps[2].parse::<u32>();
        match (index, total) {
            (Ok(1), Ok(total)) if total >= 1 => Self::First,
            (Ok(index), Ok(total)) if index > 1 && index <= total => Self::Later { index, total },
            _ => Self::Ambiguous,
        }
    }

    /// Later shards are dropped; everything else is offered.
    pub fn is_selectable(self) -> bool {
        !matches!(self, Self::Later { .. })
    }
}

/// Tree entries -> selectable model files, in listing order.
pub fn model_candidates(entries: impl IntoIterator<Item = TreeEntry>) -> Vec<CandidateFile> {
    entries
        .into_iter()
        .filter(TreeEntry::is_model_file)
        .filter(|entry| {
            let position = ShardPosition::of(&entry.path);
            if position == ShardPosition::Ambiguous {
                tracing::debug!(path = %entry.path, "unrecognised shard numbering, keeping file");
            }
            position.is_selectable()
        })
        .map(|entry| CandidateFile::new(entry.path, entry.size))
        .collect()
}
