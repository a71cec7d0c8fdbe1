//! llamaup_core - model management for a local LLM install
//!
//! This crate provides:
//! - HuggingFace-compatible index client (search, file listing, shard filtering)
//! - Quantization preference policy
//! - Streaming downloads that never leave partial files behind
//! - The local model registry and install layout
//! - [`ModelManager`], which runs the `manage-models` commands

pub mod config;
pub mod downloaders;
pub mod error;
pub mod hub;
pub mod layout;
pub mod manager;
pub mod models;
pub mod quant;
pub mod registry;

pub use config::Config;
pub use downloaders::{DownloadReport, Downloader, HttpDownloader};
pub use error::{ConfigError, DownloadError, IndexError, ManagerError, RegistryError, SetupError};
pub use hub::{HubClient, ModelIndex};
pub use layout::InstallLayout;
pub use manager::{
    parse_selection, AbortReason, BrowseOutcome, Choice, CleanReport, Console, Inventory,
    ModelManager, ModelStatus, PullOutcome, RemoveOutcome,
};
pub use models::{format_size, CandidateFile, ModelName, ModelRecord};
pub use quant::{select_best, QuantPolicy, SelectionResult};
pub use registry::ModelRegistry;
