//! Artifact download engine.

pub mod http;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::DownloadError;

pub use http::HttpDownloader;

/// Outcome of a successful [`Downloader::download`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadReport {
    pub bytes: u64,
    pub elapsed: Duration,
    /// The destination existed already and nothing was fetched.
    pub already_present: bool,
}

#[async_trait]
pub trait Downloader: Send + Sync {
    /// Fetch `url` into `dest`. On error `dest` does not exist and no
    /// temporary file is left behind.
    async fn download(&self, url: &str, dest: &Path) -> Result<DownloadReport, DownloadError>;
}

/// Temporary sibling used while a download is in flight.
pub fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(PART_SUFFIX);
    PathBuf::from(name)
}

pub const PART_SUFFIX: &str = ".part";
