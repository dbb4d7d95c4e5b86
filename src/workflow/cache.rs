//! Per-project cache of normalized workflow items.
//!
//! The cache is the single source for every tab view. Reads reuse it while it
//! is non-empty and younger than the freshness window; a known mutation
//! clears it and refetches unconditionally.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeDelta, Utc};

use super::backend::ApprovalBackend;
use super::normalize::normalize_all;
use super::types::{ItemKey, WorkflowItem};

pub const DEFAULT_TTL_SECS: i64 = 300;

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, Clone, Default)]
struct Entry {
    items: Arc<Vec<WorkflowItem>>,
    fetched_at: Option<DateTime<Utc>>,
    /// Bumped by every invalidation; a fetch that started under an older
    /// generation is discarded instead of overwriting newer state.
    generation: u64,
}

pub struct WorkflowCache {
    entries: Mutex<HashMap<i64, Entry>>,
    ttl: TimeDelta,
    clock: Clock,
}

impl WorkflowCache {
    pub fn new(ttl: TimeDelta) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<i64, Entry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current items for a project; empty if never fetched.
    pub fn snapshot(&self, project_id: i64) -> Arc<Vec<WorkflowItem>> {
        self.lock()
            .get(&project_id)
            .map(|e| Arc::clone(&e.items))
            .unwrap_or_default()
    }

    pub fn last_fetched_at(&self, project_id: i64) -> Option<DateTime<Utc>> {
        self.lock().get(&project_id).and_then(|e| e.fetched_at)
    }

    /// Non-empty and within the freshness window.
    pub fn is_fresh(&self, project_id: i64) -> bool {
        let now = (self.clock)();
        self.lock().get(&project_id).is_some_and(|e| {
            !e.items.is_empty() && e.fetched_at.is_some_and(|at| now - at <= self.ttl)
        })
    }

    /// Reuse the cache when fresh, otherwise fetch.
    pub async fn get_or_fetch<B: ApprovalBackend>(&self, backend: &B, project_id: i64) -> Arc<Vec<WorkflowItem>> {
        if self.is_fresh(project_id) {
            return self.snapshot(project_id);
        }
        self.fetch_all(backend, project_id).await
    }

    /// One store call; replaces the project's items wholesale.
    ///
    /// On failure the error is logged and the cache is left empty. There is
    /// no retry.
    pub async fn fetch_all<B: ApprovalBackend>(&self, backend: &B, project_id: i64) -> Arc<Vec<WorkflowItem>> {
        let started_generation = self.lock().get(&project_id).map_or(0, |e| e.generation);

        let items = match backend.fetch_project_items(project_id).await {
            Ok(raw) => Arc::new(normalize_all(&raw)),
            Err(e) => {
                log::error!("Failed to fetch workflow items for project {project_id}: {e}");
                Arc::new(Vec::new())
            }
        };

        let mut entries = self.lock();
        let entry = entries.entry(project_id).or_default();
        if entry.generation != started_generation {
            log::debug!("Discarding stale workflow fetch for project {project_id}");
            return Arc::clone(&entry.items);
        }
        entry.items = Arc::clone(&items);
        entry.fetched_at = Some((self.clock)());
        log::debug!("Cached {} workflow items for project {project_id}", items.len());
        items
    }

    /// Clear the project's items. In-flight fetches started before this are dropped.
    pub fn invalidate(&self, project_id: i64) {
        let mut entries = self.lock();
        let entry = entries.entry(project_id).or_default();
        entry.items = Arc::new(Vec::new());
        entry.fetched_at = None;
        entry.generation += 1;
    }

    /// Invalidate then fetch, ignoring the freshness window.
    pub async fn invalidate_and_refetch<B: ApprovalBackend>(
        &self,
        backend: &B,
        project_id: i64,
    ) -> Arc<Vec<WorkflowItem>> {
        self.invalidate(project_id);
        self.fetch_all(backend, project_id).await
    }

    /// Patch one cached item in place. Returns false if it is not cached.
    ///
    /// A patch records a confirmed mutation, so it also supersedes any fetch
    /// that was already in flight.
    pub fn patch_item(&self, project_id: i64, key: &ItemKey, patch: impl FnOnce(&mut WorkflowItem)) -> bool {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(&project_id) else {
            return false;
        };
        let items = Arc::make_mut(&mut entry.items);
        match items.iter_mut().find(|item| item.key == *key) {
            Some(item) => {
                patch(item);
                entry.generation += 1;
                true
            }
            None => false,
        }
    }
}

impl Default for WorkflowCache {
    fn default() -> Self {
        Self::new(TimeDelta::seconds(DEFAULT_TTL_SECS))
    }
}
