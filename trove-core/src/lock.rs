//! Per-project repository lock registry.
//!
//! One mutex per project name, created on first reference and destroyed at
//! server shutdown. Two handlers on different projects never contend; two on
//! the same project are serialized in acquisition order. The registry's own
//! guard is held only for the create-if-absent map step, never for the
//! duration of repository work.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as ProjectMutex, OwnedMutexGuard};
use tracing::trace;

/// Registry of per-project mutual-exclusion locks.
pub struct LockRegistry {
    locks: Mutex<HashMap<String, Arc<ProjectMutex<()>>>>,
}

/// Exclusive hold on one project. Dropping the guard releases the lock, so
/// releasing a lock that is not held is unrepresentable.
pub struct ProjectGuard {
    project: String,
    _guard: OwnedMutexGuard<()>,
}

impl ProjectGuard {
    pub fn project(&self) -> &str {
        &self.project
    }
}

impl Drop for ProjectGuard {
    fn drop(&mut self) {
        trace!(project = %self.project, "released repository lock");
    }
}

impl LockRegistry {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Register locks for projects discovered at startup.
    pub fn preload<I>(&self, projects: I)
    where
        I: IntoIterator<Item = String>,
    {
        let mut locks = self.locks.lock().expect("lock registry poisoned");
        for project in projects {
            locks
                .entry(project)
                .or_insert_with(|| Arc::new(ProjectMutex::new(())));
        }
    }

    /// Wait until this task exclusively holds `project`'s lock. The entry is
    /// created atomically on first reference.
    pub async fn acquire(&self, project: &str) -> ProjectGuard {
        let lock = {
            let mut locks = self.locks.lock().expect("lock registry poisoned");
            locks
                .entry(project.to_string())
                .or_insert_with(|| Arc::new(ProjectMutex::new(())))
                .clone()
        };
        let guard = lock.lock_owned().await;
        trace!(project, "acquired repository lock");
        ProjectGuard {
            project: project.to_string(),
            _guard: guard,
        }
    }

    /// Number of registered locks.
    pub fn len(&self) -> usize {
        self.locks.lock().expect("lock registry poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tear the registry down at shutdown. Callers must have stopped
    /// accepting work first; outstanding guards keep their mutexes alive
    /// until they drop.
    pub fn shutdown(&self) {
        let mut locks = self.locks.lock().expect("lock registry poisoned");
        trace!(count = locks.len(), "destroying repository locks");
        locks.clear();
    }
}

impl Default for LockRegistry {
    fn default() -> Self {
        Self::new()
    }
}
