//! On-disk layout under the install root.
//!
//! ```text
//! <root>/models/registry.json
//! <root>/models/files/<filename>
//! ```

use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    root: PathBuf,
}

impl InstallLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn models_dir(&self) -> PathBuf {
        self.root.join("models")
    }

    pub fn files_dir(&self) -> PathBuf {
        self.models_dir().join("files")
    }

    pub fn registry_path(&self) -> PathBuf {
        self.models_dir().join("registry.json")
    }

    /// Local path of a model file, or `None` if `filename` would escape
    /// `files/` (absolute, `..`, or empty).
    pub fn model_path(&self, filename: &str) -> Option<PathBuf> {
        let relative = Path::new(filename);
        let mut normal = 0;
        for component in relative.components() {
            match component {
                Component::Normal(_) => normal += 1,
                Component::CurDir => {}
                _ => return None,
            }
        }
        (normal > 0).then(|| self.files_dir().join(relative))
    }
}
