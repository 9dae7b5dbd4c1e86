//! Manifest model and the on-disk manifest store.
//!
//! A manifest is the authoritative record of a project's tracked files. The
//! on-disk format is line-oriented:
//!
//! ```text
//! <project_name>
//! <version_number>
//! ~ <marker><path>:<file_version>:<hash>:<trailing_marker>
//! ```
//!
//! `marker` is `A ` for added, `D ` for deleted, empty for unchanged;
//! `trailing_marker` is `!` while the server has not yet acknowledged the
//! entry, empty otherwise. The server's copy is the source of truth after
//! any successful push; client copies may be stale until synchronized.

use crate::error::{Error, ProtocolError, Result};
use crate::store::ContentHash;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const ENTRY_PREFIX: &str = "~ ";
const MANIFEST_FILE: &str = "manifest";
const PREV_FILE: &str = "manifest.prev";
const OBJECTS_DIR: &str = "objects";

/// Change marker carried by a manifest entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Added,
    Deleted,
    Unchanged,
}

/// One tracked file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Relative path, unique within a manifest
    pub path: String,
    /// File-local version, independent of the manifest version
    pub version: u64,
    /// Digest of the file bytes
    pub hash: ContentHash,
    /// Change marker
    pub status: EntryStatus,
    /// Whether the server has stored this exact entry. False only between
    /// client-side staging and server acknowledgment.
    pub seen: bool,
}

impl FileEntry {
    /// A freshly staged file, not yet acknowledged.
    pub fn added(path: impl Into<String>, hash: ContentHash) -> Self {
        Self {
            path: path.into(),
            version: 1,
            hash,
            status: EntryStatus::Added,
            seen: false,
        }
    }

    /// A staged deletion of a tracked file.
    pub fn deleted(path: impl Into<String>, hash: ContentHash) -> Self {
        Self {
            path: path.into(),
            version: 1,
            hash,
            status: EntryStatus::Deleted,
            seen: false,
        }
    }

    /// A server-acknowledged entry.
    pub fn tracked(path: impl Into<String>, hash: ContentHash) -> Self {
        Self {
            path: path.into(),
            version: 1,
            hash,
            status: EntryStatus::Unchanged,
            seen: true,
        }
    }

    /// Serialize without the leading `~ `. The same field travels as a
    /// batch token in push/commit frames.
    pub fn to_field(&self) -> String {
        let marker = match self.status {
            EntryStatus::Added => "A ",
            EntryStatus::Deleted => "D ",
            EntryStatus::Unchanged => "",
        };
        let trailing = if self.seen { "" } else { "!" };
        format!(
            "{marker}{}:{}:{}:{trailing}",
            self.path,
            self.version,
            self.hash.to_hex()
        )
    }

    /// Parse the `<marker><path>:<version>:<hash>:<trailing>` field.
    pub fn parse_field(field: &str) -> Result<Self> {
        let (status, rest) = if let Some(rest) = field.strip_prefix("A ") {
            (EntryStatus::Added, rest)
        } else if let Some(rest) = field.strip_prefix("D ") {
            (EntryStatus::Deleted, rest)
        } else {
            (EntryStatus::Unchanged, field)
        };

        let corrupt = |why: &str| Error::ManifestCorrupt(format!("entry {field:?}: {why}"));

        let mut parts = rest.split(':');
        let path = parts.next().unwrap_or_default();
        let version = parts.next().ok_or_else(|| corrupt("missing version"))?;
        let hash = parts.next().ok_or_else(|| corrupt("missing hash"))?;
        let trailing = parts.next().ok_or_else(|| corrupt("missing trailing marker"))?;
        if parts.next().is_some() {
            return Err(corrupt("too many fields"));
        }

        validate_path(path).map_err(|_| corrupt("invalid path"))?;
        let version: u64 = version.parse().map_err(|_| corrupt("bad version"))?;
        if version == 0 {
            return Err(corrupt("version must be at least 1"));
        }
        let hash = ContentHash::from_hex(hash).map_err(|_| corrupt("bad hash"))?;
        let seen = match trailing {
            "" => true,
            "!" => false,
            _ => return Err(corrupt("bad trailing marker")),
        };

        Ok(Self {
            path: path.to_string(),
            version,
            hash,
            status,
            seen,
        })
    }
}

/// Summary of one applied batch, recorded in history
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub deleted: Vec<String>,
}

impl ApplyOutcome {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }
}

/// A project's versioned file manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Project name
    pub project: String,
    /// Global version, bumped by exactly 1 per successful mutation
    pub version: u64,
    entries: Vec<FileEntry>,
}

impl Manifest {
    /// Create an empty manifest at version 1
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            version: 1,
            entries: Vec::new(),
        }
    }

    /// Tracked entries, in manifest order
    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    /// Look up an entry by path
    pub fn entry(&self, path: &str) -> Option<&FileEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    /// Mutable lookup by path
    pub fn entry_mut(&mut self, path: &str) -> Option<&mut FileEntry> {
        self.entries.iter_mut().find(|e| e.path == path)
    }

    /// Insert or replace the entry with the same path
    pub fn upsert(&mut self, entry: FileEntry) {
        match self.entry_mut(&entry.path) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Remove an entry by path
    pub fn remove(&mut self, path: &str) -> Option<FileEntry> {
        let idx = self.entries.iter().position(|e| e.path == path)?;
        Some(self.entries.remove(idx))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse the on-disk format
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.lines();
        let project = lines
            .next()
            .ok_or_else(|| Error::ManifestCorrupt("missing project name".into()))?;
        validate_project_name(project)
            .map_err(|_| Error::ManifestCorrupt(format!("invalid project name {project:?}")))?;
        let version_line = lines
            .next()
            .ok_or_else(|| Error::ManifestCorrupt("missing version number".into()))?;
        let version: u64 = version_line
            .parse()
            .map_err(|_| Error::ManifestCorrupt(format!("bad version number {version_line:?}")))?;
        if version == 0 {
            return Err(Error::ManifestCorrupt("version must be at least 1".into()));
        }

        let mut manifest = Self {
            project: project.to_string(),
            version,
            entries: Vec::new(),
        };
        for line in lines {
            if line.is_empty() {
                continue;
            }
            let field = line.strip_prefix(ENTRY_PREFIX).ok_or_else(|| {
                Error::ManifestCorrupt(format!("entry line {line:?} must start with {ENTRY_PREFIX:?}"))
            })?;
            let entry = FileEntry::parse_field(field)?;
            if manifest.entry(&entry.path).is_some() {
                return Err(Error::ManifestCorrupt(format!(
                    "duplicate path {:?}",
                    entry.path
                )));
            }
            manifest.entries.push(entry);
        }
        Ok(manifest)
    }

    /// Serialize to the on-disk format
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.project);
        out.push('\n');
        out.push_str(&self.version.to_string());
        out.push('\n');
        for entry in &self.entries {
            out.push_str(ENTRY_PREFIX);
            out.push_str(&entry.to_field());
            out.push('\n');
        }
        out
    }

    /// Apply a push/commit batch as the authority.
    ///
    /// New paths are appended at file-local version 1; existing paths with a
    /// differing hash get a version bump and the new hash; deletions remove
    /// the entry (deleting an untracked path is a no-op). The global version
    /// then moves forward by exactly 1 no matter how many files changed, and
    /// every file-local version resets to 1: pushes carry no client-declared
    /// versions and the server is the sole authority, so the reset sidesteps
    /// version skew between concurrent pushers at the cost of per-file
    /// version granularity.
    pub fn apply_batch(&mut self, batch: &[FileEntry]) -> ApplyOutcome {
        let mut outcome = ApplyOutcome::default();
        for incoming in batch {
            match incoming.status {
                EntryStatus::Deleted => {
                    if self.remove(&incoming.path).is_some() {
                        outcome.deleted.push(incoming.path.clone());
                    }
                }
                EntryStatus::Added | EntryStatus::Unchanged => {
                    match self.entry_mut(&incoming.path) {
                        Some(existing) => {
                            if existing.hash != incoming.hash {
                                existing.version += 1;
                                existing.hash = incoming.hash;
                                existing.seen = true;
                                outcome.updated.push(incoming.path.clone());
                            }
                        }
                        None => {
                            self.entries
                                .push(FileEntry::added(incoming.path.clone(), incoming.hash));
                            outcome.added.push(incoming.path.clone());
                        }
                    }
                }
            }
        }
        self.version += 1;
        for entry in &mut self.entries {
            entry.version = 1;
            entry.status = EntryStatus::Unchanged;
            entry.seen = true;
        }
        outcome
    }

    /// Replace the tracked entries with a prior snapshot's, moving the
    /// version forward. Rollback corrects, it never rewrites history.
    pub fn restore_from(&mut self, snapshot: &Manifest) {
        self.entries = snapshot.entries.clone();
        for entry in &mut self.entries {
            entry.status = EntryStatus::Unchanged;
            entry.seen = true;
        }
        self.version += 1;
    }

    /// Client-side mirror of a successful push/commit: drop deleted
    /// entries, clear staging markers, reset file-local versions, and adopt
    /// the server-assigned manifest version.
    pub fn acknowledge(&mut self, version: u64) {
        self.entries.retain(|e| e.status != EntryStatus::Deleted);
        for entry in &mut self.entries {
            entry.version = 1;
            entry.status = EntryStatus::Unchanged;
            entry.seen = true;
        }
        self.version = version;
    }
}

/// Project names become directory names and manifest headers.
pub fn validate_project_name(name: &str) -> Result<()> {
    let invalid = || Error::Protocol(ProtocolError::InvalidProjectName(name.to_string()));
    if name.is_empty() || name == "." || name == ".." {
        return Err(invalid());
    }
    if name
        .chars()
        .any(|c| c == '/' || c == '\\' || c == '\0' || c == '\n' || c == '\r')
    {
        return Err(invalid());
    }
    Ok(())
}

/// Paths are relative, `:`-free (the manifest grammar splits on `:`), and
/// must not begin with a marker prefix.
pub fn validate_path(path: &str) -> Result<()> {
    let invalid = || Error::Protocol(ProtocolError::InvalidPath(path.to_string()));
    if path.is_empty() || path.starts_with('/') || path.ends_with('/') {
        return Err(invalid());
    }
    if path.starts_with("A ") || path.starts_with("D ") {
        return Err(invalid());
    }
    if path
        .chars()
        .any(|c| c == ':' || c == '\\' || c == '\0' || c == '\n' || c == '\r')
    {
        return Err(invalid());
    }
    if path.split('/').any(|part| part.is_empty() || part == "." || part == "..") {
        return Err(invalid());
    }
    Ok(())
}

/// On-disk manifest storage for all projects under one root.
///
/// Handlers never touch manifest files directly; every read and write goes
/// through load/save here, under the project's lock.
pub struct ManifestStore {
    root: PathBuf,
}

impl ManifestStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn project_dir(&self, project: &str) -> PathBuf {
        self.root.join(project)
    }

    /// Root of the project's content-addressed blob store.
    pub fn objects_dir(&self, project: &str) -> PathBuf {
        self.project_dir(project).join(OBJECTS_DIR)
    }

    fn manifest_path(&self, project: &str) -> PathBuf {
        self.project_dir(project).join(MANIFEST_FILE)
    }

    fn prev_path(&self, project: &str) -> PathBuf {
        self.project_dir(project).join(PREV_FILE)
    }

    pub fn exists(&self, project: &str) -> bool {
        self.manifest_path(project).exists()
    }

    /// Create a project with an empty manifest at version 1.
    ///
    /// `create_dir` (not `create_dir_all`) is the atomic check-and-create:
    /// two racing creators cannot both succeed.
    pub fn create(&self, project: &str) -> Result<Manifest> {
        validate_project_name(project)?;
        fs::create_dir_all(&self.root)?;
        match fs::create_dir(self.project_dir(project)) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(Error::ProjectExists(project.to_string()));
            }
            Err(e) => return Err(e.into()),
        }
        let manifest = Manifest::new(project);
        self.save(&manifest)?;
        debug!(project, "created manifest");
        Ok(manifest)
    }

    /// Load the authoritative manifest.
    pub fn load(&self, project: &str) -> Result<Manifest> {
        validate_project_name(project)?;
        let text = match fs::read_to_string(self.manifest_path(project)) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ProjectNotFound(project.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let manifest = Manifest::parse(&text)?;
        if manifest.project != project {
            return Err(Error::ManifestCorrupt(format!(
                "manifest for {:?} found under {project:?}",
                manifest.project
            )));
        }
        Ok(manifest)
    }

    /// Persist the manifest atomically: write a temporary file, then rename
    /// over the old one, so a crash mid-write never leaves a half-written
    /// manifest.
    pub fn save(&self, manifest: &Manifest) -> Result<()> {
        write_atomic(
            &self.manifest_path(&manifest.project),
            manifest.to_text().as_bytes(),
        )
    }

    /// Record the pre-mutation state backing the next rollback.
    pub fn snapshot_prev(&self, manifest: &Manifest) -> Result<()> {
        write_atomic(
            &self.prev_path(&manifest.project),
            manifest.to_text().as_bytes(),
        )
    }

    /// The manifest as it was before the last mutation, if any.
    pub fn load_prev(&self, project: &str) -> Result<Option<Manifest>> {
        validate_project_name(project)?;
        let text = match fs::read_to_string(self.prev_path(project)) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(Manifest::parse(&text)?))
    }

    /// Names of all projects under the root, for the startup lock scan.
    pub fn list_projects(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut projects = Vec::new();
        for dir_entry in fs::read_dir(&self.root)? {
            let dir_entry = dir_entry?;
            if !dir_entry.file_type()?.is_dir() {
                continue;
            }
            let Ok(name) = dir_entry.file_name().into_string() else {
                continue;
            };
            if self.exists(&name) {
                projects.push(name);
            }
        }
        projects.sort();
        Ok(projects)
    }
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, data)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(data: &[u8]) -> ContentHash {
        ContentHash::from_data(data)
    }

    #[test]
    fn test_entry_field_roundtrip() {
        let cases = vec![
            FileEntry::added("src/main.rs", hash(b"one")),
            FileEntry::deleted("old.txt", hash(b"two")),
            FileEntry::tracked("docs/readme.md", hash(b"three")),
        ];
        for entry in cases {
            let parsed = FileEntry::parse_field(&entry.to_field()).unwrap();
            assert_eq!(parsed, entry);
        }
    }

    #[test]
    fn test_entry_field_marker_is_unambiguous() {
        // A path starting with a literal `A` must not read as a marker.
        let entry = FileEntry::tracked("Apps/config.rs", hash(b"x"));
        let parsed = FileEntry::parse_field(&entry.to_field()).unwrap();
        assert_eq!(parsed.path, "Apps/config.rs");
        assert_eq!(parsed.status, EntryStatus::Unchanged);
    }

    #[test]
    fn test_entry_field_rejects_garbage() {
        for field in [
            "no-fields-here",
            "a.txt:0:e3b0:",
            "a.txt:1:not-hex:",
            "a.txt:1",
            ":1:abc:",
        ] {
            assert!(
                matches!(FileEntry::parse_field(field), Err(Error::ManifestCorrupt(_))),
                "expected corrupt error for {field:?}"
            );
        }
    }

    #[test]
    fn test_manifest_roundtrip() {
        let mut manifest = Manifest::new("p1");
        manifest.upsert(FileEntry::tracked("a.txt", hash(b"a")));
        manifest.upsert(FileEntry::added("b/c.txt", hash(b"c")));
        manifest.version = 7;
        let parsed = Manifest::parse(&manifest.to_text()).unwrap();
        assert_eq!(parsed, manifest);
    }

    #[test]
    fn test_manifest_rejects_bad_header() {
        assert!(matches!(
            Manifest::parse(""),
            Err(Error::ManifestCorrupt(_))
        ));
        assert!(matches!(
            Manifest::parse("p1\nnot-a-number\n"),
            Err(Error::ManifestCorrupt(_))
        ));
        assert!(matches!(
            Manifest::parse("p1\n0\n"),
            Err(Error::ManifestCorrupt(_))
        ));
    }

    #[test]
    fn test_manifest_rejects_duplicate_paths() {
        let entry = FileEntry::tracked("a.txt", hash(b"a")).to_field();
        let text = format!("p1\n3\n~ {entry}\n~ {entry}\n");
        assert!(matches!(
            Manifest::parse(&text),
            Err(Error::ManifestCorrupt(_))
        ));
    }

    #[test]
    fn test_manifest_rejects_unprefixed_entry_line() {
        let text = "p1\n1\na.txt:1:00:\n";
        assert!(matches!(
            Manifest::parse(text),
            Err(Error::ManifestCorrupt(_))
        ));
    }

    #[test]
    fn test_apply_batch_add_update_delete() {
        let mut manifest = Manifest::new("p1");

        let outcome = manifest.apply_batch(&[FileEntry::added("a.txt", hash(b"v1"))]);
        assert_eq!(outcome.added, vec!["a.txt"]);
        assert_eq!(manifest.version, 2);
        let entry = manifest.entry("a.txt").unwrap();
        assert_eq!(entry.version, 1);
        assert_eq!(entry.status, EntryStatus::Unchanged);
        assert!(entry.seen);

        let outcome = manifest.apply_batch(&[FileEntry::added("a.txt", hash(b"v2"))]);
        assert_eq!(outcome.updated, vec!["a.txt"]);
        assert_eq!(manifest.version, 3);
        // Version reset rule: still file-local version 1 after the bump.
        assert_eq!(manifest.entry("a.txt").unwrap().version, 1);
        assert_eq!(manifest.entry("a.txt").unwrap().hash, hash(b"v2"));

        let outcome = manifest.apply_batch(&[FileEntry::deleted("a.txt", hash(b"v2"))]);
        assert_eq!(outcome.deleted, vec!["a.txt"]);
        assert_eq!(manifest.version, 4);
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_apply_batch_same_hash_is_noop_but_bumps_version() {
        let mut manifest = Manifest::new("p1");
        manifest.apply_batch(&[FileEntry::added("a.txt", hash(b"v1"))]);
        let outcome = manifest.apply_batch(&[FileEntry::tracked("a.txt", hash(b"v1"))]);
        assert!(outcome.is_empty());
        assert_eq!(manifest.version, 3);
    }

    #[test]
    fn test_apply_batch_untracked_delete_is_noop() {
        let mut manifest = Manifest::new("p1");
        let outcome = manifest.apply_batch(&[FileEntry::deleted("ghost.txt", hash(b"x"))]);
        assert!(outcome.is_empty());
        assert_eq!(manifest.version, 2);
    }

    #[test]
    fn test_restore_from_moves_version_forward() {
        let mut manifest = Manifest::new("p1");
        manifest.apply_batch(&[FileEntry::added("a.txt", hash(b"v1"))]);
        let snapshot = manifest.clone();
        manifest.apply_batch(&[FileEntry::added("a.txt", hash(b"v2"))]);
        assert_eq!(manifest.version, 3);

        manifest.restore_from(&snapshot);
        assert_eq!(manifest.version, 4);
        assert_eq!(manifest.entry("a.txt").unwrap().hash, hash(b"v1"));
    }

    #[test]
    fn test_acknowledge_clears_markers() {
        let mut manifest = Manifest::new("p1");
        manifest.upsert(FileEntry::added("a.txt", hash(b"a")));
        manifest.upsert(FileEntry::deleted("b.txt", hash(b"b")));
        manifest.acknowledge(5);
        assert_eq!(manifest.version, 5);
        assert!(manifest.entry("b.txt").is_none());
        let entry = manifest.entry("a.txt").unwrap();
        assert!(entry.seen);
        assert_eq!(entry.status, EntryStatus::Unchanged);
        assert_eq!(entry.version, 1);
    }

    #[test]
    fn test_validate_project_name() {
        assert!(validate_project_name("p1").is_ok());
        assert!(validate_project_name("my-project_2").is_ok());
        for bad in ["", ".", "..", "a/b", "a\\b", "a\nb"] {
            assert!(validate_project_name(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_validate_path() {
        assert!(validate_path("a.txt").is_ok());
        assert!(validate_path("src/deep/mod.rs").is_ok());
        assert!(validate_path("Dockerfile").is_ok());
        for bad in [
            "",
            "/abs.txt",
            "trailing/",
            "a:b.txt",
            "a//b.txt",
            "../escape.txt",
            "a/../b.txt",
            "A marked.txt",
            "D marked.txt",
            "new\nline.txt",
        ] {
            assert!(validate_path(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_store_create_load_save() {
        let dir = tempfile::tempdir().unwrap();
        let store = ManifestStore::new(dir.path());

        let mut manifest = store.create("p1").unwrap();
        assert_eq!(manifest.version, 1);
        assert!(matches!(store.create("p1"), Err(Error::ProjectExists(_))));

        manifest.apply_batch(&[FileEntry::added("a.txt", hash(b"a"))]);
        store.save(&manifest).unwrap();
        let loaded = store.load("p1").unwrap();
        assert_eq!(loaded, manifest);

        assert!(matches!(
            store.load("missing"),
            Err(Error::ProjectNotFound(_))
        ));
    }

    #[test]
    fn test_store_rejects_corrupt_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let store = ManifestStore::new(dir.path());
        store.create("p1").unwrap();
        fs::write(dir.path().join("p1").join(MANIFEST_FILE), "p1\nbogus\n").unwrap();
        assert!(matches!(
            store.load("p1"),
            Err(Error::ManifestCorrupt(_))
        ));
    }

    #[test]
    fn test_store_prev_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = ManifestStore::new(dir.path());
        let mut manifest = store.create("p1").unwrap();
        assert!(store.load_prev("p1").unwrap().is_none());

        store.snapshot_prev(&manifest).unwrap();
        manifest.apply_batch(&[FileEntry::added("a.txt", hash(b"a"))]);
        store.save(&manifest).unwrap();

        let prev = store.load_prev("p1").unwrap().unwrap();
        assert_eq!(prev.version, 1);
        assert!(prev.is_empty());
    }

    #[test]
    fn test_list_projects() {
        let dir = tempfile::tempdir().unwrap();
        let store = ManifestStore::new(dir.path());
        assert!(store.list_projects().unwrap().is_empty());
        store.create("beta").unwrap();
        store.create("alpha").unwrap();
        fs::create_dir(dir.path().join("not-a-project")).unwrap();
        assert_eq!(store.list_projects().unwrap(), vec!["alpha", "beta"]);
    }
}
