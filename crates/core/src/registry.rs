use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::RegistryError;
use crate::models::{ModelName, ModelRecord};

/// Friendly name -> record, persisted as one indented JSON object.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: BTreeMap<ModelName, ModelRecord>,
    registry_path: PathBuf,
}

impl ModelRegistry {
    /// Load the registry at `path`; a missing file yields an empty registry.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let models = if path.exists() {
            Self::read(path)?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            models,
            registry_path: path.to_path_buf(),
        })
    }

    /// Like [`load`](Self::load), but a missing file is an error.
    pub fn load_existing(path: &Path) -> Result<Self, RegistryError> {
        if !path.exists() {
            return Err(RegistryError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Self::load(path)
    }

    fn read(path: &Path) -> Result<BTreeMap<ModelName, ModelRecord>, RegistryError> {
        let content = fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| RegistryError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Rewrite the whole registry (tmp + rename).
    pub fn save(&self) -> Result<(), RegistryError> {
        let path = &self.registry_path;
        let io_err = |source| RegistryError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let content = serde_json::to_string_pretty(&self.models)?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, content + "\n").map_err(io_err)?;
        fs::rename(&tmp_path, path).map_err(io_err)?;
        Ok(())
    }

    /// Insert under a fresh name derived from the source repo and persist.
    pub fn upsert(&mut self, record: ModelRecord) -> Result<ModelName, RegistryError> {
        let name = self.unique_name(&record.source_repo);
        tracing::debug!(name = %name, repo = %record.source_repo, "registering model");
        self.models.insert(name.clone(), record);
        self.save()?;
        Ok(name)
    }

    /// First free name among `base`, `base1`, `base2`, ...
    pub fn unique_name(&self, source_repo: &str) -> ModelName {
        let base = ModelName::from_repo(source_repo);
        if !self.models.contains_key(&base) {
            return base;
        }
        let mut n = 1;
        loop {
            let candidate = base.with_suffix(n);
            if !self.models.contains_key(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    pub fn get(&self, name: &str) -> Option<&ModelRecord> {
        let name = ModelName::parse(name).ok()?;
        self.models.get(&name)
    }

    /// Entries sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&ModelName, &ModelRecord)> {
        self.models.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.models.keys().map(ToString::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.registry_path
    }
}
