// Streaming intent persisted as a small TOML document
use crate::application::intent_store::IntentStore;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Serialize, Deserialize)]
struct IntentFile {
    #[serde(default)]
    streaming: bool,
}

/// Survives restarts. A missing or unreadable file means "not streaming".
#[derive(Debug, Clone)]
pub struct FileIntentStore {
    path: PathBuf,
}

impl FileIntentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let file: IntentFile = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;
        Ok(file.streaming)
    }

    fn save(&self, streaming: bool) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let contents = toml::to_string(&IntentFile { streaming })?;
        let staging = staging_path(&self.path);
        fs::write(&staging, contents)
            .with_context(|| format!("Failed to write {}", staging.display()))?;
        fs::rename(&staging, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

impl IntentStore for FileIntentStore {
    fn read_intent(&self) -> bool {
        self.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Could not read streaming intent; assuming not streaming");
            false
        })
    }

    fn write_intent(&self, streaming: bool) {
        match self.save(streaming) {
            Ok(()) => tracing::debug!(streaming, path = %self.path.display(), "Streaming intent saved"),
            Err(e) => tracing::error!(error = %e, "Failed to persist streaming intent"),
        }
    }
}
