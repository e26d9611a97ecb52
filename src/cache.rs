//! Content-hash keyed cache of [`SandwichResult`]s, avoiding re-analysis of
//! unchanged files. `.sandwich-cache.json` at the project root, versioned,
//! invalidated wholesale on a version bump or per-entry on hash mismatch.

use crate::SandwichResult;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const CACHE_VERSION: u32 = 1;
const CACHE_FILENAME: &str = ".sandwich-cache.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    content_hash: String,
    result: SandwichResult,
    cached_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheData {
    version: u32,
    entries: HashMap<String, CacheEntry>,
}

impl Default for CacheData {
    fn default() -> Self {
        Self {
            version: CACHE_VERSION,
            entries: HashMap::new(),
        }
    }
}

pub struct AnalysisCache {
    cache_path: PathBuf,
    data: CacheData,
    dirty: bool,
    enabled: bool,
}

impl AnalysisCache {
    pub fn new(project_root: &Path) -> Self {
        let cache_path = project_root.join(CACHE_FILENAME);
        let data = Self::load_cache(&cache_path).unwrap_or_default();
        Self {
            cache_path,
            data,
            dirty: false,
            enabled: true,
        }
    }

    pub fn disabled() -> Self {
        Self {
            cache_path: PathBuf::new(),
            data: CacheData::default(),
            dirty: false,
            enabled: false,
        }
    }

    fn load_cache(path: &Path) -> Option<CacheData> {
        let content = fs::read_to_string(path).ok()?;
        let data: CacheData = match serde_json::from_str(&content) {
            Ok(data) => data,
            Err(e) => {
                log::warn!("ignoring malformed cache at {}: {e}", path.display());
                return None;
            }
        };
        if data.version != CACHE_VERSION {
            log::debug!("cache version mismatch at {}; discarding", path.display());
            return None;
        }
        Some(data)
    }

    pub fn save(&self) -> Result<()> {
        if !self.enabled || !self.dirty {
            return Ok(());
        }
        let content = serde_json::to_string_pretty(&self.data).context("Failed to serialize cache")?;
        fs::write(&self.cache_path, content)
            .with_context(|| format!("Failed to write cache to {}", self.cache_path.display()))?;
        Ok(())
    }

    fn hash_content(content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn get(&self, file_path: &Path, content: &str) -> Option<SandwichResult> {
        if !self.enabled {
            return None;
        }
        let key = file_path.to_string_lossy().to_string();
        let entry = self.data.entries.get(&key)?;
        if entry.content_hash != Self::hash_content(content) {
            return None;
        }
        Some(entry.result.clone())
    }

    pub fn set(&mut self, file_path: &Path, content: &str, result: SandwichResult) {
        if !self.enabled {
            return;
        }
        let key = file_path.to_string_lossy().to_string();
        let entry = CacheEntry {
            content_hash: Self::hash_content(content),
            result,
            cached_at: SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        };
        self.data.entries.insert(key, entry);
        self.dirty = true;
    }

    pub fn cleanup(&mut self, existing_files: &[PathBuf]) {
        if !self.enabled {
            return;
        }
        let existing: std::collections::HashSet<String> =
            existing_files.iter().map(|p| p.to_string_lossy().to_string()).collect();
        self.data.entries.retain(|k, _| existing.contains(k));
        self.dirty = true;
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.data.entries.len(),
            enabled: self.enabled,
        }
    }

    pub fn clear(&mut self) {
        self.data.entries.clear();
        self.dirty = true;
    }
}

#[derive(Debug)]
pub struct CacheStats {
    pub entries: usize,
    pub enabled: bool,
}
