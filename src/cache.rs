use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const CACHE_FILE_NAME: &str = "resume_cache.json";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct CachedResolution {
    /// Resolved destination identifiers, in source playlist order
    pub ids: Vec<String>,

    /// Queries whose search kept failing, searched again on the next run
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_queries: Vec<String>,
}

impl CachedResolution {
    pub fn new(ids: Vec<String>) -> Self {
        Self {
            ids,
            failed_queries: Vec::new(),
        }
    }
}

/// Search results persisted per source playlist, so a migration whose write
/// phase failed can be retried without searching again.
#[derive(Debug)]
pub struct ResumeCache {
    path: PathBuf,
    entries: BTreeMap<String, CachedResolution>,
}

impl ResumeCache {
    /// Default location, next to the configuration file
    pub fn default_path() -> Result<PathBuf> {
        Ok(crate::config::config_dir()?.join(CACHE_FILE_NAME))
    }

    /// Load the cache from `path`. A missing file is an empty cache.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let entries = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|e| format!("Corrupt resume cache {}: {}", path.display(), e))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, source_id: &str) -> Option<&CachedResolution> {
        self.entries.get(source_id)
    }

    /// Store the search results for a source playlist and persist.
    pub fn insert(&mut self, source_id: &str, entry: CachedResolution) -> Result<()> {
        self.entries.insert(source_id.to_string(), entry);

        self.save()
    }

    /// Drop the entry for a source playlist and persist.
    pub fn remove(&mut self, source_id: &str) -> Result<()> {
        if self.entries.remove(source_id).is_some() {
            self.save()?;
        }

        Ok(())
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Replace the cache file in one rename
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, serde_json::to_vec_pretty(&self.entries)?)?;
        std::fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }
}
