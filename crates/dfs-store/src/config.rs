use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What happens when a file is uploaded under a name that already exists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverwritePolicy {
    /// Replace the existing file atomically (last write wins).
    #[default]
    LastWriteWins,
    /// Refuse the upload with [`StoreError::AlreadyExists`](crate::StoreError::AlreadyExists).
    Reject,
}

/// Configuration for a [`LocalStore`](crate::LocalStore).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Duplicate-name policy.
    pub overwrite: OverwritePolicy,
    /// `fsync` the temporary file before it is renamed into place.
    pub sync_on_commit: bool,
    /// Temporary upload files untouched for this many seconds are treated
    /// as left over from a crash and removed by recovery. Younger ones may
    /// belong to a live upload in another process and are kept.
    pub stale_upload_secs: u64,
}

impl StoreConfig {
    /// Idle time after which a temporary upload file counts as abandoned.
    pub fn stale_upload_age(&self) -> Duration {
        Duration::from_secs(self.stale_upload_secs)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            overwrite: OverwritePolicy::default(),
            sync_on_commit: true,
            stale_upload_secs: 3600,
        }
    }
}
