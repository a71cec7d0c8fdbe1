pub mod browse;
pub mod clean;
pub mod config;
pub mod info;
pub mod list;
pub mod pull;
pub mod remove;
pub mod search;

use std::path::PathBuf;

use anyhow::Result;
use llamaup_core::{Config, HttpDownloader, HubClient, ModelManager};

/// Global options shared by every command.
pub struct Settings {
    pub config: Config,
    pub root: Option<PathBuf>,
    pub limit: Option<usize>,
}

impl Settings {
    pub fn manager(&self) -> Result<ModelManager> {
        let layout = self.config.install_layout(self.root.as_deref())?;
        tracing::debug!(root = %layout.root().display(), "install root");

        let index = HubClient::new(&self.config.hub)?;
        let downloader = HttpDownloader::new(&self.config.hub)?;
        let limit = self.limit.unwrap_or(self.config.models.search_limit);

        Ok(ModelManager::new(layout, index, downloader).with_search_limit(limit))
    }
}
