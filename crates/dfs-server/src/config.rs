use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use dfs_store::StoreConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Directory all uploaded files are stored under.
    pub root_dir: PathBuf,
    /// Largest accepted upload request body, in bytes.
    pub max_upload_size: usize,
    pub store: StoreConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            root_dir: PathBuf::from("dfs-data"),
            max_upload_size: 100 * 1024 * 1024,
            store: StoreConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Parse a TOML document. Missing keys take their default values.
    pub fn from_toml_str(s: &str) -> ServerResult<Self> {
        toml::from_str(s).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Load a TOML configuration file.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ServerError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dfs_store::OverwritePolicy;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(c.root_dir, PathBuf::from("dfs-data"));
        assert_eq!(c.max_upload_size, 100 * 1024 * 1024);
        assert_eq!(c.store.overwrite, OverwritePolicy::LastWriteWins);
    }

    #[test]
    fn parse_full_toml() {
        let c = ServerConfig::from_toml_str(
            r#"
            bind_addr = "0.0.0.0:9000"
            root_dir = "/srv/dfs"
            max_upload_size = 1024

            [store]
            overwrite = "reject"
            sync_on_commit = false
            "#,
        )
        .unwrap();
        assert_eq!(c.bind_addr, "0.0.0.0:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(c.root_dir, PathBuf::from("/srv/dfs"));
        assert_eq!(c.max_upload_size, 1024);
        assert_eq!(c.store.overwrite, OverwritePolicy::Reject);
        assert!(!c.store.sync_on_commit);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let c = ServerConfig::from_toml_str(r#"root_dir = "files""#).unwrap();
        assert_eq!(c.root_dir, PathBuf::from("files"));
        assert_eq!(c.bind_addr, ServerConfig::default().bind_addr);
        assert!(c.store.sync_on_commit);
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = ServerConfig::from_toml_str("bind_addr = 12").unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dfs.toml");
        std::fs::write(&path, "max_upload_size = 42\n").unwrap();
        assert_eq!(ServerConfig::load(&path).unwrap().max_upload_size, 42);

        let err = ServerConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }
}
