use crate::app::ports::CachePort;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn new(value: &str, ttl: Duration) -> Result<Self, String> {
        let ttl = chrono::Duration::from_std(ttl).map_err(|e| e.to_string())?;
        Ok(Self {
            value: value.to_string(),
            expires_at: Utc::now() + ttl,
        })
    }

    fn is_fresh(&self) -> bool {
        self.expires_at > Utc::now()
    }
}

/// Cache persisted as one JSON file per key, so it survives across runs.
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.dir.join(format!("{}.json", hex::encode(digest)))
    }
}

#[async_trait]
impl CachePort for FileCache {
    async fn get(&self, key: &str) -> Result<Option<String>, String> {
        let path = self.path_for(key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.to_string()),
        };
        match serde_json::from_str::<CacheEntry>(&content) {
            Ok(entry) if entry.is_fresh() => {
                debug!("Cache hit for {}", key);
                Ok(Some(entry.value))
            }
            Ok(_) => {
                debug!("Cache entry for {} expired", key);
                Ok(None)
            }
            Err(e) => {
                warn!("Ignoring unreadable cache entry {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), String> {
        fs::create_dir_all(&self.dir).map_err(|e| e.to_string())?;
        let entry = CacheEntry::new(value, ttl)?;
        let json = serde_json::to_string(&entry).map_err(|e| e.to_string())?;
        fs::write(self.path_for(key), json).map_err(|e| e.to_string())
    }

    async fn forget(&self, key: &str) -> Result<(), String> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.to_string()),
        }
    }
}

#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CachePort for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, String> {
        let entries = self.entries.lock().map_err(|e| e.to_string())?;
        Ok(entries
            .get(key)
            .filter(|entry| entry.is_fresh())
            .map(|entry| entry.value.clone()))
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), String> {
        let entry = CacheEntry::new(value, ttl)?;
        let mut entries = self.entries.lock().map_err(|e| e.to_string())?;
        entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn forget(&self, key: &str) -> Result<(), String> {
        let mut entries = self.entries.lock().map_err(|e| e.to_string())?;
        entries.remove(key);
        Ok(())
    }
}
