//! Server configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration loaded from `troved.json`, with CLI flags layered on top.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address, e.g. `0.0.0.0:7878`.
    pub listen_addr: String,
    /// Directory holding one subdirectory per project.
    pub project_root: PathBuf,
    /// How long shutdown waits for in-flight requests before aborting them.
    pub shutdown_grace_secs: u64,
    /// Upper bound for one request frame.
    pub max_frame_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:7878".to_string(),
            project_root: PathBuf::from("./data/projects"),
            shutdown_grace_secs: 10,
            max_frame_bytes: trove_core::MAX_FRAME_SIZE,
        }
    }
}

impl ServerConfig {
    /// Load from a JSON file; an absent file means defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read server config from {path:?}"))?;
        let config: ServerConfig =
            serde_json::from_str(&data).with_context(|| "Failed to parse server config JSON")?;
        Ok(config)
    }

    /// Save to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let tmp_path = path.with_extension("tmp");
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(&tmp_path, &data)?;
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig::load(&dir.path().join("troved.json")).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:7878");
        assert_eq!(config.shutdown_grace_secs, 10);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("troved.json");
        let mut config = ServerConfig::default();
        config.listen_addr = "127.0.0.1:9999".to_string();
        config.save(&path).unwrap();
        let loaded = ServerConfig::load(&path).unwrap();
        assert_eq!(loaded.listen_addr, "127.0.0.1:9999");
    }
}
