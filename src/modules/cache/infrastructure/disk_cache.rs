use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::modules::cache::domain::{CacheEntry, CacheTier, EntryMetadata, TierStats};
use crate::shared::errors::{AppError, AppResult};

const INDEX_FILE: &str = "cache_index.json";

/// Usage target after size-bound eviction, as a fraction of the budget
const EVICTION_TARGET_RATIO: f64 = 0.8;

/// Content hash naming the entry file for `key`
pub fn key_hash(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

struct DiskState {
    /// Entry metadata by key hash
    index: HashMap<String, EntryMetadata>,
    stats: TierStats,
}

impl DiskState {
    fn total_bytes(&self) -> u64 {
        self.index.values().map(|meta| meta.size_bytes).sum()
    }
}

/// Persistent tier: one JSON file per key hash plus a JSON index
///
/// The index is rewritten on every mutation so aggregate stats and
/// eviction never need to scan the directory. Writes are not atomic
/// across files: a crash can leave the index and the entry files out of
/// step, which reads repair by dropping the affected entries.
pub struct DiskCache<V> {
    dir: PathBuf,
    max_bytes: u64,
    state: Mutex<DiskState>,
    _value: PhantomData<fn() -> V>,
}

impl<V> DiskCache<V> {
    /// Open (or create) a disk tier in `dir`
    ///
    /// A missing or corrupt index starts an empty cache.
    pub fn open(dir: impl Into<PathBuf>, max_bytes: u64) -> AppResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let index = Self::load_index(&dir.join(INDEX_FILE));
        info!(
            "disk tier: opened {} with {} entries",
            dir.display(),
            index.len()
        );

        Ok(Self {
            dir,
            max_bytes,
            state: Mutex::new(DiskState {
                index,
                stats: TierStats::default(),
            }),
            _value: PhantomData,
        })
    }

    fn load_index(path: &Path) -> HashMap<String, EntryMetadata> {
        let raw = match fs::read(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                warn!("disk tier: cannot read index {}: {}", path.display(), e);
                return HashMap::new();
            }
        };
        serde_json::from_slice(&raw).unwrap_or_else(|e| {
            warn!("disk tier: corrupt index {}, starting empty: {}", path.display(), e);
            HashMap::new()
        })
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, DiskState>> {
        self.state
            .lock()
            .map_err(|_| AppError::InternalError("disk cache lock poisoned".to_string()))
    }

    fn entry_path(&self, hash: &str) -> PathBuf {
        self.dir.join(format!("{}.json", hash))
    }

    fn save_index(&self, state: &DiskState) -> AppResult<()> {
        let bytes = serde_json::to_vec(&state.index)?;
        fs::write(self.dir.join(INDEX_FILE), bytes)?;
        Ok(())
    }

    fn remove_file(&self, hash: &str) -> AppResult<()> {
        match fs::remove_file(self.entry_path(hash)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Drop least-recently-accessed entries until usage is back under
    /// the eviction target
    fn enforce_budget(&self, state: &mut DiskState) -> AppResult<()> {
        let mut total = state.total_bytes();
        if total <= self.max_bytes {
            return Ok(());
        }

        let target = (self.max_bytes as f64 * EVICTION_TARGET_RATIO) as u64;
        let mut by_age: Vec<(String, chrono::DateTime<Utc>, u64)> = state
            .index
            .iter()
            .map(|(hash, meta)| (hash.clone(), meta.last_access, meta.size_bytes))
            .collect();
        by_age.sort_by_key(|(_, last_access, _)| *last_access);

        for (hash, _, size) in by_age {
            if total <= target {
                break;
            }
            self.remove_file(&hash)?;
            state.index.remove(&hash);
            state.stats.evictions += 1;
            total = total.saturating_sub(size);
        }

        debug!("disk tier: evicted down to {} of {} bytes", total, self.max_bytes);
        Ok(())
    }
}

impl<V> CacheTier<V> for DiskCache<V>
where
    V: Serialize + DeserializeOwned,
{
    fn name(&self) -> &'static str {
        "disk"
    }

    fn get_entry(&self, key: &str) -> AppResult<Option<CacheEntry<V>>> {
        let hash = key_hash(key);
        let mut guard = self.lock()?;
        let state = &mut *guard;

        let Some(meta) = state.index.get(&hash) else {
            state.stats.misses += 1;
            return Ok(None);
        };

        if meta.is_expired_at(Utc::now()) {
            state.index.remove(&hash);
            self.remove_file(&hash)?;
            state.stats.expirations += 1;
            state.stats.misses += 1;
            self.save_index(state)?;
            debug!("disk tier: expired {}", key);
            return Ok(None);
        }

        let stored = fs::read(self.entry_path(&hash))
            .map_err(AppError::from)
            .and_then(|raw| serde_json::from_slice::<CacheEntry<V>>(&raw).map_err(AppError::from));

        let mut entry = match stored {
            Ok(entry) if entry.metadata.key == key => entry,
            _ => {
                warn!("disk tier: dropping unreadable entry for {}", key);
                state.index.remove(&hash);
                self.remove_file(&hash)?;
                state.stats.misses += 1;
                self.save_index(state)?;
                return Ok(None);
            }
        };

        // The index holds the authoritative access metadata
        if let Some(meta) = state.index.get_mut(&hash) {
            meta.touch();
            entry.metadata = meta.clone();
        }
        state.stats.hits += 1;
        self.save_index(state)?;
        Ok(Some(entry))
    }

    fn put(&self, key: &str, value: V, ttl: Option<Duration>) -> AppResult<()> {
        let hash = key_hash(key);
        let mut entry = CacheEntry::new(key, value, ttl);
        let bytes = serde_json::to_vec(&entry)?;
        entry.metadata.size_bytes = bytes.len() as u64;

        let mut guard = self.lock()?;
        let state = &mut *guard;

        fs::write(self.entry_path(&hash), &bytes)?;
        state.index.insert(hash, entry.metadata);
        self.enforce_budget(state)?;
        self.save_index(state)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> AppResult<bool> {
        let hash = key_hash(key);
        let mut guard = self.lock()?;
        let state = &mut *guard;

        self.remove_file(&hash)?;
        let removed = state.index.remove(&hash).is_some();
        if removed {
            self.save_index(state)?;
        }
        Ok(removed)
    }

    fn clear(&self) -> AppResult<()> {
        let mut guard = self.lock()?;
        let state = &mut *guard;

        let hashes: Vec<String> = state.index.keys().cloned().collect();
        for hash in hashes {
            self.remove_file(&hash)?;
        }
        state.index.clear();

        match fs::remove_file(self.dir.join(INDEX_FILE)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn stats(&self) -> TierStats {
        match self.lock() {
            Ok(state) => TierStats {
                entries: state.index.len(),
                size_bytes: state.total_bytes(),
                ..state.stats.clone()
            },
            Err(_) => TierStats::default(),
        }
    }
}
