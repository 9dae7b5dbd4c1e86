//! Trove Core Library
//!
//! Core functionality for trove including:
//! - Length-prefixed wire codec and the request/reply protocol
//! - Manifest model, parsing, and the push/rollback algorithms
//! - Per-project repository lock registry
//! - Content-addressed blob store
//! - Append-only per-project history log

pub mod error;
pub mod history;
pub mod lock;
pub mod manifest;
pub mod protocol;
pub mod store;
pub mod wire;

pub use error::{Error, ProtocolError, Result};
pub use history::{HistoryAction, HistoryEntry, HistoryLog};
pub use lock::{LockRegistry, ProjectGuard};
pub use manifest::{
    validate_path, validate_project_name, ApplyOutcome, EntryStatus, FileEntry, Manifest,
    ManifestStore,
};
pub use protocol::{PushEntry, Reply, Request};
pub use store::{BlobStore, ContentHash, FsBlobStore};
pub use wire::{Frame, MAX_FRAME_SIZE};
