//! Local file storage for DFS.
//!
//! This crate implements the store behind the DFS upload, download, and
//! listing endpoints: a flat namespace of named binary files kept under a
//! single root directory.
//!
//! # Operations
//!
//! - [`LocalStore::save`] / [`LocalStore::begin_upload`] -- persist content
//!   under a name, atomically replacing any previous file
//! - [`LocalStore::resolve`] / [`LocalStore::open_file`] -- look a name up;
//!   absence is `Ok(None)`, not an error
//! - [`LocalStore::list`] -- snapshot of all stored names
//!
//! # Design Rules
//!
//! 1. Names are validated before any filesystem access and are never
//!    rewritten into a different name.
//! 2. A resolved location is always a direct child of the root directory.
//! 3. Write-then-rename: content lands in a temporary file and is renamed
//!    into place on commit, so readers never see a partial file.
//! 4. Abandoned uploads leave nothing behind; leftovers from a crash are
//!    purged when the store is opened, once they have gone stale.
//! 5. The store never retries and never logs on behalf of its caller.

pub mod config;
pub mod error;
pub mod name;
pub mod store;
pub mod upload;

// Re-export primary types at crate root for ergonomic imports.
pub use config::{OverwritePolicy, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use name::{validate_file_name, FileName, MAX_NAME_LEN};
pub use store::{LocalStore, StoredFile};
pub use upload::PendingUpload;
