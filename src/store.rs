//! Ranked store: named sorted sets of string members keyed by a float score.
//!
//! Both the scraped news items (scored by popularity) and the generated
//! podcast names (scored by creation time) live here, one set per key.
//!
//! # Ordering
//!
//! Reverse-rank reads return members by descending score; members with equal
//! scores are ordered by descending member string, so reads are deterministic.
//!
//! # Persistence
//!
//! [`FileRankedStore`] keeps every set in memory and rewrites a JSON snapshot
//! after each mutation (write to a temp file, then rename). A missing snapshot
//! is an empty store.

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

/// Sorted-set operations the service relies on.
pub trait RankedStore: Send + Sync + 'static {
    /// Insert or re-score `member` in the set at `key`.
    fn add(
        &self,
        key: &str,
        member: &str,
        score: f64,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Replace the whole set at `key` with `entries`.
    fn replace(
        &self,
        key: &str,
        entries: Vec<(String, f64)>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Remove `member` from the set at `key`. Returns whether it was present.
    fn remove(
        &self,
        key: &str,
        member: &str,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Members ranked `start..=end` by descending score (inclusive, 0-based).
    fn rev_range(
        &self,
        key: &str,
        start: usize,
        end: usize,
    ) -> impl Future<Output = Result<Vec<String>, StoreError>> + Send;
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct Snapshot {
    sets: BTreeMap<String, HashMap<String, f64>>,
}

/// In-memory sorted sets persisted to a JSON snapshot file.
#[derive(Debug)]
pub struct FileRankedStore {
    path: PathBuf,
    state: Mutex<Snapshot>,
}

impl FileRankedStore {
    /// Open the store at `path`, loading the snapshot if one exists.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let snapshot = match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<Snapshot>(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Snapshot::default(),
            Err(e) => return Err(e.into()),
        };
        info!(sets = snapshot.sets.len(), "Opened ranked store");
        Ok(Self {
            path,
            state: Mutex::new(snapshot),
        })
    }

    async fn persist(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let json = serde_json::to_vec(snapshot)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), "Persisted ranked store");
        Ok(())
    }
}

fn ranked(set: &HashMap<String, f64>) -> Vec<(&String, f64)> {
    let mut entries: Vec<(&String, f64)> = set.iter().map(|(m, s)| (m, *s)).collect();
    entries.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| b.0.cmp(a.0)));
    entries
}

impl RankedStore for FileRankedStore {
    async fn add(&self, key: &str, member: &str, score: f64) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string(), score);
        self.persist(&state).await
    }

    async fn replace(&self, key: &str, entries: Vec<(String, f64)>) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if entries.is_empty() {
            state.sets.remove(key);
        } else {
            state
                .sets
                .insert(key.to_string(), entries.into_iter().collect());
        }
        self.persist(&state).await
    }

    async fn remove(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        let Some(set) = state.sets.get_mut(key) else {
            return Ok(false);
        };
        let removed = set.remove(member).is_some();
        if set.is_empty() {
            state.sets.remove(key);
        }
        if removed {
            self.persist(&state).await?;
        }
        Ok(removed)
    }

    async fn rev_range(&self, key: &str, start: usize, end: usize) -> Result<Vec<String>, StoreError> {
        let state = self.state.lock().await;
        let Some(set) = state.sets.get(key) else {
            return Ok(Vec::new());
        };
        if start > end {
            return Ok(Vec::new());
        }
        Ok(ranked(set)
            .into_iter()
            .skip(start)
            .take((end - start).saturating_add(1))
            .map(|(member, _)| member.clone())
            .collect())
    }
}

#[cfg(test)]
impl FileRankedStore {
    /// Score of `member`, if present.
    pub async fn score(&self, key: &str, member: &str) -> Result<Option<f64>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.sets.get(key).and_then(|set| set.get(member).copied()))
    }
}
