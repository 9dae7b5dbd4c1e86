//! Maps decoded commands to handlers.
//!
//! Every handler walks the same stages: validate, acquire the project lock,
//! read/mutate the manifest through the store, append a history record,
//! release the lock, reply. A handler that fails at any stage still releases
//! the lock (the guard drops with the stack frame) before the error reply is
//! built. Locks are held across disk work only, never across socket I/O:
//! the connection task writes the reply after the handler has returned.

use std::path::Path;
use tracing::{debug, info, warn};
use trove_core::error::{Error, ProtocolError, Result};
use trove_core::history::{HistoryAction, HistoryEntry, HistoryLog};
use trove_core::lock::LockRegistry;
use trove_core::manifest::{validate_path, validate_project_name, FileEntry, ManifestStore};
use trove_core::protocol::{PushEntry, Reply, Request};
use trove_core::store::{BlobStore, FsBlobStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BatchKind {
    Push,
    Commit,
}

impl std::fmt::Display for BatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchKind::Push => write!(f, "push"),
            BatchKind::Commit => write!(f, "commit"),
        }
    }
}

/// Shared server state, threaded by handle into every connection task.
pub struct Dispatcher {
    manifests: ManifestStore,
    locks: LockRegistry,
}

impl Dispatcher {
    /// Build the dispatcher for a project root, registering locks for every
    /// project already on disk.
    pub fn new(project_root: &Path) -> Result<Self> {
        let manifests = ManifestStore::new(project_root);
        let locks = LockRegistry::new();
        let projects = manifests.list_projects()?;
        if !projects.is_empty() {
            info!(count = projects.len(), "registering locks for existing projects");
        }
        locks.preload(projects);
        Ok(Self { manifests, locks })
    }

    pub fn lock_registry(&self) -> &LockRegistry {
        &self.locks
    }

    /// Drive one request to a reply. Errors never escape: they become error
    /// replies after any held lock guard has been dropped.
    pub async fn dispatch(&self, request: Request) -> Reply {
        let command = request.command();
        let project = request.project().to_string();
        match self.handle(request).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(command, project = %project, error = %err, "request failed");
                Reply::from_error(&err)
            }
        }
    }

    async fn handle(&self, request: Request) -> Result<Reply> {
        match request {
            Request::CreateProject { project } => self.create_project(&project).await,
            Request::Push { project, batch } => {
                self.apply_batch(&project, batch, BatchKind::Push).await
            }
            Request::Commit { project, batch } => {
                self.apply_batch(&project, batch, BatchKind::Commit).await
            }
            Request::Checkout { project } => self.checkout(&project).await,
            Request::GetCurrentVersion { project } => self.current_version(&project).await,
            Request::Rollback { project } => self.rollback(&project).await,
        }
    }

    async fn create_project(&self, project: &str) -> Result<Reply> {
        validate_project_name(project)?;
        let _guard = self.locks.acquire(project).await;
        let manifest = self.manifests.create(project)?;
        self.history(project)
            .append(&HistoryEntry::now(manifest.version, HistoryAction::Created))?;
        info!(project, "created project");
        Ok(Reply::Version(manifest.version))
    }

    async fn apply_batch(
        &self,
        project: &str,
        batch: Vec<PushEntry>,
        kind: BatchKind,
    ) -> Result<Reply> {
        validate_project_name(project)?;
        for push_entry in &batch {
            validate_path(&push_entry.entry.path)?;
        }
        if kind == BatchKind::Commit && batch.is_empty() {
            return Err(Error::NothingStaged(project.to_string()));
        }

        let _guard = self.locks.acquire(project).await;
        let mut manifest = self.manifests.load(project)?;

        // Store incoming content before touching the manifest, verifying
        // each token against its declared digest. A failed write or a
        // mismatch leaves the manifest untouched.
        let blobs = FsBlobStore::new(self.manifests.objects_dir(project));
        for push_entry in &batch {
            match &push_entry.content {
                Some(content) => {
                    let stored = blobs.put(content.clone()).await?;
                    if stored != push_entry.entry.hash {
                        return Err(
                            ProtocolError::HashMismatch(push_entry.entry.path.clone()).into()
                        );
                    }
                }
                None => {
                    if PushEntry::carries_content(&push_entry.entry) {
                        return Err(ProtocolError::BadEntry(format!(
                            "missing content for {}",
                            push_entry.entry.path
                        ))
                        .into());
                    }
                }
            }
        }

        self.manifests.snapshot_prev(&manifest)?;
        let entries: Vec<FileEntry> = batch.into_iter().map(|pe| pe.entry).collect();
        let outcome = manifest.apply_batch(&entries);
        self.manifests.save(&manifest)?;

        let action = match kind {
            BatchKind::Push => HistoryAction::push(outcome),
            BatchKind::Commit => HistoryAction::commit(outcome),
        };
        let record = HistoryEntry::now(manifest.version, action);
        self.history(project).append(&record)?;
        info!(project, result = %record.describe(), "applied {kind}");
        Ok(Reply::Version(manifest.version))
    }

    async fn checkout(&self, project: &str) -> Result<Reply> {
        validate_project_name(project)?;
        let _guard = self.locks.acquire(project).await;
        let manifest = self.manifests.load(project)?;
        let blobs = FsBlobStore::new(self.manifests.objects_dir(project));
        let mut contents = Vec::new();
        for entry in manifest.entries() {
            if PushEntry::carries_content(entry) {
                contents.push(blobs.get(entry.hash).await?);
            }
        }
        debug!(project, version = manifest.version, files = manifest.len(), "checkout");
        Ok(Reply::Snapshot { manifest, contents })
    }

    async fn current_version(&self, project: &str) -> Result<Reply> {
        validate_project_name(project)?;
        let _guard = self.locks.acquire(project).await;
        let manifest = self.manifests.load(project)?;
        Ok(Reply::Version(manifest.version))
    }

    async fn rollback(&self, project: &str) -> Result<Reply> {
        validate_project_name(project)?;
        let _guard = self.locks.acquire(project).await;
        let mut manifest = self.manifests.load(project)?;
        let prev = self
            .manifests
            .load_prev(project)?
            .ok_or_else(|| Error::NoHistory(project.to_string()))?;
        let restored_from = prev.version;

        // The pre-rollback state becomes the next rollback target, so
        // rollback is itself rollback-able.
        self.manifests.snapshot_prev(&manifest)?;
        manifest.restore_from(&prev);
        self.manifests.save(&manifest)?;

        let record = HistoryEntry::now(manifest.version, HistoryAction::Rollback { restored_from });
        self.history(project).append(&record)?;
        info!(project, result = %record.describe(), "rolled back");
        Ok(Reply::Version(manifest.version))
    }

    fn history(&self, project: &str) -> HistoryLog {
        HistoryLog::new(&self.manifests.project_dir(project))
    }
}
