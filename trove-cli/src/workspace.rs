//! Client-side workspace: the working tree plus `.trove/` metadata.
//!
//! The metadata directory holds the local manifest copy, the previous
//! manifest snapshot (mirroring the server's rollback target), and the
//! client configuration. Staged entries keep their `!` marker in the local
//! manifest from staging until the server acknowledges them, so an
//! interrupted push can be finished later with `commit`.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use trove_core::error::{Error, ProtocolError, Result};
use trove_core::manifest::{validate_path, EntryStatus, FileEntry, Manifest};
use trove_core::protocol::PushEntry;
use trove_core::store::ContentHash;

pub const META_DIR: &str = ".trove";
const MANIFEST_FILE: &str = "manifest";
const PREV_FILE: &str = "manifest.prev";
const CONFIG_FILE: &str = "config.json";

/// Client configuration stored at `.trove/config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Server address, e.g. `127.0.0.1:7878`.
    pub server_addr: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:7878".to_string(),
        }
    }
}

/// A working tree rooted at one directory.
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn meta_dir(&self) -> PathBuf {
        self.root.join(META_DIR)
    }

    fn manifest_path(&self) -> PathBuf {
        self.meta_dir().join(MANIFEST_FILE)
    }

    fn prev_path(&self) -> PathBuf {
        self.meta_dir().join(PREV_FILE)
    }

    fn config_path(&self) -> PathBuf {
        self.meta_dir().join(CONFIG_FILE)
    }

    /// Load the configuration; an absent file means defaults.
    pub fn load_config(&self) -> Result<ClientConfig> {
        match fs::read_to_string(self.config_path()) {
            Ok(data) => serde_json::from_str(&data).map_err(|e| Error::Io(std::io::Error::other(e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ClientConfig::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save_config(&self, config: &ClientConfig) -> Result<()> {
        let data = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;
        self.write_meta(&self.config_path(), data.as_bytes())
    }

    /// The local manifest copy.
    pub fn manifest(&self) -> Result<Manifest> {
        self.try_manifest()?.ok_or_else(|| {
            Error::ProjectNotFound(format!(
                "no workspace manifest under {}; run create-project or checkout first",
                self.root.display()
            ))
        })
    }

    pub fn try_manifest(&self) -> Result<Option<Manifest>> {
        match fs::read_to_string(self.manifest_path()) {
            Ok(text) => Ok(Some(Manifest::parse(&text)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save_manifest(&self, manifest: &Manifest) -> Result<()> {
        self.write_meta(&self.manifest_path(), manifest.to_text().as_bytes())
    }

    /// Record the state backing a local rollback mirror.
    pub fn snapshot_prev(&self, manifest: &Manifest) -> Result<()> {
        self.write_meta(&self.prev_path(), manifest.to_text().as_bytes())
    }

    pub fn load_prev(&self) -> Result<Option<Manifest>> {
        match fs::read_to_string(self.prev_path()) {
            Ok(text) => Ok(Some(Manifest::parse(&text)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_meta(&self, path: &Path, data: &[u8]) -> Result<()> {
        fs::create_dir_all(self.meta_dir())?;
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, data)?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Hash every file in the working tree (relative path, digest), sorted.
    pub fn scan(&self) -> Result<Vec<(String, ContentHash)>> {
        let mut files = Vec::new();
        if self.root.exists() {
            self.scan_dir(&self.root, &mut files)?;
        }
        files.sort();
        Ok(files)
    }

    fn scan_dir(&self, dir: &Path, out: &mut Vec<(String, ContentHash)>) -> Result<()> {
        for dir_entry in fs::read_dir(dir)? {
            let dir_entry = dir_entry?;
            if dir_entry.file_name() == META_DIR {
                continue;
            }
            let path = dir_entry.path();
            if dir_entry.file_type()?.is_dir() {
                self.scan_dir(&path, out)?;
            } else {
                let rel = path
                    .strip_prefix(&self.root)
                    .expect("scan stays under the workspace root")
                    .to_string_lossy()
                    .replace('\\', "/");
                if validate_path(&rel).is_err() {
                    debug!(path = %rel, "skipping file with unrepresentable path");
                    continue;
                }
                let data = fs::read(&path)?;
                out.push((rel, ContentHash::from_data(&data)));
            }
        }
        Ok(())
    }

    /// Compare the working tree against the local manifest and stage the
    /// differences: new files as added, changed hashes in place, tracked
    /// files missing from the tree as deleted. Staged entries lose their
    /// `seen` flag until the server acknowledges them.
    pub fn stage_changes(&self) -> Result<Manifest> {
        let mut manifest = self.manifest()?;
        let scanned = self.scan()?;
        let on_disk: BTreeSet<&str> = scanned.iter().map(|(path, _)| path.as_str()).collect();

        for (path, hash) in &scanned {
            match manifest.entry_mut(path) {
                Some(existing) => {
                    if existing.status == EntryStatus::Deleted {
                        // The file is back; cancel the staged deletion.
                        existing.status = EntryStatus::Unchanged;
                        existing.seen = existing.hash == *hash;
                    }
                    if existing.hash != *hash {
                        existing.hash = *hash;
                        existing.seen = false;
                    }
                }
                None => {
                    manifest.upsert(FileEntry::added(path.clone(), *hash));
                }
            }
        }

        let tracked: Vec<String> = manifest.entries().iter().map(|e| e.path.clone()).collect();
        for path in tracked {
            if !on_disk.contains(path.as_str()) {
                if let Some(entry) = manifest.entry_mut(&path) {
                    entry.status = EntryStatus::Deleted;
                    entry.seen = false;
                }
            }
        }
        Ok(manifest)
    }

    /// Entries awaiting acknowledgment, paired with their file contents.
    pub fn staged_batch(&self, manifest: &Manifest) -> Result<Vec<PushEntry>> {
        let mut batch = Vec::new();
        for entry in manifest.entries() {
            if entry.seen {
                continue;
            }
            let content = if PushEntry::carries_content(entry) {
                Some(Bytes::from(fs::read(self.root.join(&entry.path))?))
            } else {
                None
            };
            batch.push(PushEntry::new(entry.clone(), content));
        }
        Ok(batch)
    }

    /// Mirror a successful push/commit: snapshot the pre-push state for the
    /// local rollback mirror, then adopt the server-assigned version with
    /// markers cleared and file-local versions reset.
    pub fn apply_ack(&self, before: &Manifest, staged: Manifest, version: u64) -> Result<Manifest> {
        self.snapshot_prev(before)?;
        let mut acked = staged;
        acked.acknowledge(version);
        self.save_manifest(&acked)?;
        Ok(acked)
    }

    /// Write a checkout snapshot into the working tree and adopt it as the
    /// local manifest.
    pub fn materialize(&self, manifest: &Manifest, contents: &[Bytes]) -> Result<()> {
        let mut content_iter = contents.iter();
        for entry in manifest.entries() {
            let data: &[u8] = if PushEntry::carries_content(entry) {
                content_iter
                    .next()
                    .map(|bytes| bytes.as_ref())
                    .ok_or_else(|| {
                        Error::Protocol(ProtocolError::BadReply("missing content token".into()))
                    })?
            } else {
                &[]
            };
            let path = self.root.join(&entry.path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, data)?;
        }
        if let Some(current) = self.try_manifest()? {
            self.snapshot_prev(&current)?;
        }
        self.save_manifest(manifest)?;
        Ok(())
    }
}
