//! Export manifest.
//!
//! Records the source modification time of every exported session log under
//! `DEST/<prefix>.manifest.json`. A later export skips files whose mtime still
//! matches, even though redaction changed their size at the destination.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use logshelf_config::normalize_prefix;

use crate::discover::SessionFile;

pub const MANIFEST_VERSION: u32 = 1;
pub const MANIFEST_NAME: &str = ".manifest.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    /// Entries by object key
    #[serde(default)]
    pub files: BTreeMap<String, FileEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Source mtime, whole seconds since the Unix epoch
    pub mtime: u64,
    /// Source size, for reference only
    pub size: u64,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION,
            files: BTreeMap::new(),
        }
    }
}

impl Manifest {
    /// Where the manifest for `prefix` lives under `dest`.
    pub fn path(dest: &Path, prefix: &str) -> PathBuf {
        dest.join(format!("{}{}", normalize_prefix(prefix), MANIFEST_NAME))
    }

    /// Read a manifest. A missing file is an empty manifest.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read manifest {}", path.display()));
            }
        };

        let manifest: Manifest = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse manifest {}", path.display()))?;
        if manifest.version != MANIFEST_VERSION {
            bail!(
                "Unsupported manifest version {} in {}",
                manifest.version,
                path.display()
            );
        }
        Ok(manifest)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write manifest {}", path.display()))
    }

    /// True when `file` was exported before and its mtime has not moved.
    pub fn is_unchanged(&self, file: &SessionFile) -> bool {
        match (file.modified, self.files.get(&file.key)) {
            (Some(mtime), Some(entry)) => entry.mtime == mtime,
            _ => false,
        }
    }

    /// Note a successful export of `file`.
    pub fn record(&mut self, file: &SessionFile) {
        if let Some(mtime) = file.modified {
            self.files.insert(
                file.key.clone(),
                FileEntry {
                    mtime,
                    size: file.size,
                },
            );
        }
    }
}
