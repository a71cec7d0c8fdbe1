//! Model manager: the commands behind `manage-models`.
//!
//! Each method runs one command against the install layout, composing the
//! registry, the remote index, the quantization policy and the downloader.
//! Interactive steps go through [`Console`] so the flows can be scripted.

use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;

use walkdir::WalkDir;

use crate::downloaders::{DownloadReport, Downloader, PART_SUFFIX};
use crate::error::ManagerError;
use crate::hub::ModelIndex;
use crate::layout::InstallLayout;
use crate::models::{ModelName, ModelRecord};
use crate::quant::{QuantPolicy, SelectionResult};
use crate::registry::ModelRegistry;

pub const DEFAULT_SEARCH_LIMIT: usize = 20;

/// Words that end an interactive selection.
const ABORT_WORDS: &[&str] = &["q", "quit", "n", "no"];

/// Interactive terminal surface used by `browse` and `remove`.
pub trait Console {
    fn say(&mut self, line: &str);

    /// Read one line. An empty answer means "take the default".
    fn ask(&mut self, prompt: &str, default: Option<&str>) -> io::Result<String>;

    fn confirm(&mut self, prompt: &str, default: bool) -> io::Result<bool>;
}

/// Result of one selection step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice<T> {
    Selected(T),
    Aborted,
    Invalid(String),
}

/// Parse a 1-based menu answer into a 0-based index.
///
/// Blank input picks `default`; `q`, `quit`, `n` and `no` abort.
pub fn parse_selection(input: &str, len: usize, default: usize) -> Choice<usize> {
    let input = input.trim();
    if input.is_empty() {
        return Choice::Selected(default);
    }
    if ABORT_WORDS.contains(&input.to_lowercase().as_str()) {
        return Choice::Aborted;
    }
    match input.parse::<usize>() {
        Ok(n) if (1..=len).contains(&n) => Choice::Selected(n - 1),
        Ok(n) => Choice::Invalid(format!("{n} is out of range (choose 1-{len})")),
        Err(_) => Choice::Invalid(format!("'{input}' is not a number")),
    }
}

/// Registry entry joined with the state of its file on disk.
#[derive(Debug, Clone)]
pub struct ModelStatus {
    pub name: ModelName,
    pub record: ModelRecord,
    /// `None` when the recorded filename would escape the files directory.
    pub path: Option<PathBuf>,
    pub size_on_disk: Option<u64>,
    pub download_url: String,
}

impl ModelStatus {
    pub fn is_installed(&self) -> bool {
        self.size_on_disk.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Inventory {
    pub registry_path: PathBuf,
    pub models: Vec<ModelStatus>,
    pub total_bytes: u64,
}

#[derive(Debug, Clone)]
pub struct PullOutcome {
    pub name: ModelName,
    pub path: PathBuf,
    pub report: DownloadReport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    NotInstalled { path: PathBuf },
    Declined,
    Removed { path: PathBuf, bytes: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    EmptyTerm,
    NoResults { term: String },
    UserQuit,
    InvalidSelection(String),
    Declined,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTerm => f.write_str("no search term given"),
            Self::NoResults { term } => write!(f, "no models found for '{term}'"),
            Self::UserQuit => f.write_str("cancelled"),
            Self::InvalidSelection(message) => write!(f, "invalid selection: {message}"),
            Self::Declined => f.write_str("download declined"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum BrowseOutcome {
    Aborted(AbortReason),
    Installed {
        name: ModelName,
        record: ModelRecord,
        path: PathBuf,
        report: DownloadReport,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub removed: Vec<PathBuf>,
    pub bytes: u64,
}

pub struct ModelManager {
    layout: InstallLayout,
    index: Box<dyn ModelIndex>,
    downloader: Box<dyn Downloader>,
    policy: QuantPolicy,
    search_limit: usize,
}

impl ModelManager {
    pub fn new(
        layout: InstallLayout,
        index: impl ModelIndex + 'static,
        downloader: impl Downloader + 'static,
    ) -> Self {
        Self {
            layout,
            index: Box::new(index),
            downloader: Box::new(downloader),
            policy: QuantPolicy::default(),
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit.max(1);
        self
    }

    pub fn layout(&self) -> &InstallLayout {
        &self.layout
    }

    fn load_registry(&self) -> Result<ModelRegistry, ManagerError> {
        Ok(ModelRegistry::load_existing(&self.layout.registry_path())?)
    }

    fn find(registry: &ModelRegistry, name: &str) -> Result<(ModelName, ModelRecord), ManagerError> {
        let unknown = || ManagerError::UnknownModel {
            name: name.to_string(),
            known: registry.names(),
        };
        let key = ModelName::parse(name).map_err(|_| unknown())?;
        let record = registry.get(key.as_str()).ok_or_else(unknown)?;
        Ok((key, record.clone()))
    }

    fn local_path(&self, record: &ModelRecord) -> Result<PathBuf, ManagerError> {
        self.layout
            .model_path(&record.filename)
            .ok_or_else(|| ManagerError::UnsafeFilename(record.filename.clone()))
    }

    fn status(&self, name: ModelName, record: ModelRecord) -> ModelStatus {
        let path = self.layout.model_path(&record.filename);
        if path.is_none() {
            tracing::warn!(name = %name, filename = %record.filename, "registry filename escapes the files directory");
        }
        let size_on_disk = path
            .as_deref()
            .and_then(|p| fs::metadata(p).ok())
            .filter(|meta| meta.is_file())
            .map(|meta| meta.len());
        let download_url = self
            .index
            .download_url(&record.source_repo, &record.filename);
        ModelStatus {
            name,
            record,
            path,
            size_on_disk,
            download_url,
        }
    }

    /// Every registered model with its on-disk state.
    pub fn list(&self) -> Result<Inventory, ManagerError> {
        let registry = self.load_registry()?;
        let models: Vec<ModelStatus> = registry
            .iter()
            .map(|(name, record)| self.status(name.clone(), record.clone()))
            .collect();
        let total_bytes = models.iter().filter_map(|m| m.size_on_disk).sum();
        Ok(Inventory {
            registry_path: registry.path().to_path_buf(),
            models,
            total_bytes,
        })
    }

    pub fn info(&self, name: &str) -> Result<ModelStatus, ManagerError> {
        let registry = self.load_registry()?;
        let (name, record) = Self::find(&registry, name)?;
        Ok(self.status(name, record))
    }

    /// Repository ids matching `term`.
    pub async fn search(&self, term: &str) -> Result<Vec<String>, ManagerError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(ManagerError::Usage("search term must not be empty".to_string()));
        }
        Ok(self.index.search_models(term, self.search_limit).await?)
    }

    /// Download the file of a registered model to its canonical path.
    pub async fn pull(&self, name: &str) -> Result<PullOutcome, ManagerError> {
        let registry = self.load_registry()?;
        let (name, record) = Self::find(&registry, name)?;
        let path = self.local_path(&record)?;
        let url = self.index.download_url(&record.source_repo, &record.filename);

        let report = self.downloader.download(&url, &path).await?;
        Ok(PullOutcome { name, path, report })
    }

    /// Delete the downloaded file of a model. The registry entry is kept so
    /// the model can be pulled again.
    pub fn remove(
        &self,
        name: &str,
        console: &mut dyn Console,
        assume_yes: bool,
    ) -> Result<RemoveOutcome, ManagerError> {
        let registry = self.load_registry()?;
        let (_, record) = Self::find(&registry, name)?;
        let path = self.local_path(&record)?;

        let bytes = match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => return Ok(RemoveOutcome::NotInstalled { path }),
        };

        if !assume_yes {
            let prompt = format!("Delete {}?", path.display());
            if !console.confirm(&prompt, false).map_err(ManagerError::Prompt)? {
                return Ok(RemoveOutcome::Declined);
            }
        }

        fs::remove_file(&path).map_err(|source| ManagerError::Remove {
            path: path.clone(),
            source,
        })?;
        tracing::info!(path = %path.display(), bytes, "removed model file");
        Ok(RemoveOutcome::Removed { path, bytes })
    }

    /// Interactive search, pick, download and register.
    pub async fn browse(
        &self,
        term: Option<&str>,
        console: &mut dyn Console,
    ) -> Result<BrowseOutcome, ManagerError> {
        let term = match term.map(str::trim).filter(|t| !t.is_empty()) {
            Some(term) => term.to_string(),
            None => console
                .ask("Search term", None)
                .map_err(ManagerError::Prompt)?
                .trim()
                .to_string(),
        };
        if term.is_empty() {
            return Ok(BrowseOutcome::Aborted(AbortReason::EmptyTerm));
        }

        let repos = self.index.search_models(&term, self.search_limit).await?;
        if repos.is_empty() {
            console.say(&format!("No models found for '{term}'."));
            return Ok(BrowseOutcome::Aborted(AbortReason::NoResults { term }));
        }

        console.say(&format!("Found {} repositories:", repos.len()));
        for (i, repo) in repos.iter().enumerate() {
            console.say(&format!("  {:>2}. {}", i + 1, repo));
        }
        let answer = console
            .ask(&format!("Select a repository [1-{}, q to quit]", repos.len()), Some("1"))
            .map_err(ManagerError::Prompt)?;
        let repo = match parse_selection(&answer, repos.len(), 0) {
            Choice::Selected(i) => repos[i].clone(),
            Choice::Aborted => return Ok(BrowseOutcome::Aborted(AbortReason::UserQuit)),
            Choice::Invalid(message) => return Ok(invalid(console, message)),
        };

        let files = self.index.list_files(&repo).await?;
        let Some(selection) = SelectionResult::with_policy(&repo, files, self.policy) else {
            return Ok(BrowseOutcome::Aborted(AbortReason::NoResults { term }));
        };

        console.say(&format!("Files in {repo}:"));
        for (i, file) in selection.all_candidates.iter().enumerate() {
            let marker = if i == selection.recommended_index {
                "  (recommended)"
            } else {
                ""
            };
            console.say(&format!("  {:>2}. {:<60} {:>8.2} GB{}", i + 1, file.path, file.size_gb, marker));
        }
        console.say(&format!("Recommended: {}", selection.recommended().path));
        let default = (selection.recommended_index + 1).to_string();
        let answer = console
            .ask(
                &format!("Select a file [1-{}, q to quit]", selection.all_candidates.len()),
                Some(default.as_str()),
            )
            .map_err(ManagerError::Prompt)?;
        let file = match parse_selection(&answer, selection.all_candidates.len(), selection.recommended_index) {
            Choice::Selected(i) => selection.all_candidates[i].clone(),
            Choice::Aborted => return Ok(BrowseOutcome::Aborted(AbortReason::UserQuit)),
            Choice::Invalid(message) => return Ok(invalid(console, message)),
        };

        let record = ModelRecord::new(&selection.source_repo, &file);
        let path = self.local_path(&record)?;
        let prompt = format!("Download {} ({:.2} GB) from {}?", file.path, file.size_gb, repo);
        if !console.confirm(&prompt, false).map_err(ManagerError::Prompt)? {
            return Ok(BrowseOutcome::Aborted(AbortReason::Declined));
        }

        // Surface a broken registry before spending time on the download.
        let mut registry = ModelRegistry::load(&self.layout.registry_path())?;
        let url = self.index.download_url(&repo, &file.path);
        let report = self.downloader.download(&url, &path).await?;

        let name = registry.upsert(record.clone())?;
        tracing::info!(name = %name, repo = %repo, file = %file.path, "model registered");
        Ok(BrowseOutcome::Installed {
            name,
            record,
            path,
            report,
        })
    }

    /// Delete leftover `.part` files from interrupted downloads.
    pub fn clean(&self) -> Result<CleanReport, ManagerError> {
        let mut report = CleanReport::default();
        let files_dir = self.layout.files_dir();
        if !files_dir.is_dir() {
            return Ok(report);
        }

        let scan_err = |source| ManagerError::Scan {
            path: files_dir.clone(),
            source,
        };
        for entry in WalkDir::new(&files_dir) {
            let entry = entry.map_err(scan_err)?;
            let is_partial = entry.file_type().is_file()
                && entry.file_name().to_string_lossy().ends_with(PART_SUFFIX);
            if !is_partial {
                continue;
            }

            let bytes = entry.metadata().map_err(scan_err)?.len();
            let path = entry.into_path();
            fs::remove_file(&path).map_err(|source| ManagerError::Remove {
                path: path.clone(),
                source,
            })?;
            tracing::info!(path = %path.display(), bytes, "removed partial download");
            report.bytes += bytes;
            report.removed.push(path);
        }
        Ok(report)
    }
}

fn invalid(console: &mut dyn Console, message: String) -> BrowseOutcome {
    console.say(&format!("Invalid selection: {message}"));
    BrowseOutcome::Aborted(AbortReason::InvalidSelection(message))
}
