//! Content addressing and the on-disk blob store.
//!
//! File contents are stored once per distinct digest under
//! `objects/<2-hex>/<62-hex>`, so repeated pushes of the same bytes cost
//! nothing and rollback never has to restore content.

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Fixed-size content digest of a tracked file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Create a ContentHash from raw bytes
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Compute the digest of `data`
    pub fn from_data(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(hash.into())
    }

    /// Digest of zero-length input. Entries carrying this hash never ship a
    /// content token (the wire grammar has no zero-length token); receivers
    /// materialize empty content from it.
    pub fn empty() -> Self {
        Self::from_data(&[])
    }

    /// Convert to hexadecimal string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hexadecimal string
    pub fn from_hex(hex_str: &str) -> std::result::Result<Self, hex::FromHexError> {
        let bytes = hex::decode(hex_str)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Content-addressed storage for tracked file bytes
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Get blob data by digest
    async fn get(&self, hash: ContentHash) -> Result<Bytes>;

    /// Check if a blob exists
    async fn exists(&self, hash: ContentHash) -> Result<bool>;

    /// Put blob data (returns the digest)
    async fn put(&self, data: Bytes) -> Result<ContentHash>;
}

/// Filesystem blob store rooted at a project's `objects/` directory
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Create a store rooted at `root`. The directory is created on first
    /// write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path for a digest: two-character fan-out, remainder as file name.
    fn blob_path(&self, hash: ContentHash) -> PathBuf {
        let hex = hash.to_hex();
        self.root.join(&hex[..2]).join(&hex[2..])
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn get(&self, hash: ContentHash) -> Result<Bytes> {
        if hash == ContentHash::empty() {
            return Ok(Bytes::new());
        }
        let data = tokio::fs::read(self.blob_path(hash)).await?;
        Ok(Bytes::from(data))
    }

    async fn exists(&self, hash: ContentHash) -> Result<bool> {
        if hash == ContentHash::empty() {
            return Ok(true);
        }
        Ok(tokio::fs::try_exists(self.blob_path(hash)).await?)
    }

    async fn put(&self, data: Bytes) -> Result<ContentHash> {
        let hash = ContentHash::from_data(&data);
        if hash == ContentHash::empty() {
            return Ok(hash);
        }
        let path = self.blob_path(hash);
        if tokio::fs::try_exists(&path).await? {
            return Ok(hash);
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        // Write-then-rename so a crash never leaves a truncated blob at the
        // addressed path. Concurrent writers of the same digest write the
        // same bytes, so the last rename winning is harmless.
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, &data).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(hash)
    }
}
