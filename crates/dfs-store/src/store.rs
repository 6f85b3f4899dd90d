use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use serde::Serialize;
use tracing::debug;

use crate::config::{OverwritePolicy, StoreConfig};
use crate::error::{StoreError, StoreResult};
use crate::name::{validate_file_name, FileName, UPLOAD_PREFIX};
use crate::upload::PendingUpload;

/// A file held by the store, as seen at lookup time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StoredFile {
    /// Logical name.
    pub name: FileName,
    /// Absolute location, always directly under the root directory.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
}

/// Flat-namespace file store rooted at a single local directory.
///
/// Every operation is a self-contained blocking call against the current
/// filesystem state, safe to invoke concurrently from many threads. Writes
/// to the same name are serialized by the filesystem's atomic rename; writes
/// to different names never coordinate.
pub struct LocalStore {
    root: PathBuf,
    config: StoreConfig,
    /// Set once the root directory has been seen to exist.
    root_seen: AtomicBool,
}

impl LocalStore {
    /// Open a store rooted at `root`.
    ///
    /// The directory is not created until the first upload. If it already
    /// exists, temporary artifacts abandoned by interrupted uploads are
    /// removed (see [`purge_partial_uploads`](Self::purge_partial_uploads)).
    pub fn open(root: impl AsRef<Path>, config: StoreConfig) -> StoreResult<Self> {
        let root = std::path::absolute(root.as_ref())?;

        let (root, seen) = match fs::metadata(&root) {
            Ok(meta) if meta.is_dir() => (fs::canonicalize(&root)?, true),
            Ok(_) => {
                return Err(StoreError::Io(io::Error::other(format!(
                    "root {} is not a directory",
                    root.display()
                ))))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => (root, false),
            Err(e) => return Err(e.into()),
        };

        let store = Self {
            root,
            config,
            root_seen: AtomicBool::new(seen),
        };
        if seen {
            store.purge_partial_uploads()?;
        }
        Ok(store)
    }

    /// Open a store with the default configuration.
    pub fn with_root(root: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open(root, StoreConfig::default())
    }

    /// The root directory all files live under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ---- Writes ----

    /// Store the full contents of `reader` under `name`.
    ///
    /// The name is validated before the filesystem is touched. If reading
    /// from `reader` fails midway, the partial upload is discarded and the
    /// previous file (if any) is left untouched.
    pub fn save<R: Read>(&self, name: &str, mut reader: R) -> StoreResult<StoredFile> {
        let mut upload = self.begin_upload(name)?;
        io::copy(&mut reader, &mut upload)?;
        upload.commit()
    }

    /// Store an in-memory buffer under `name`.
    pub fn save_bytes(&self, name: &str, data: &[u8]) -> StoreResult<StoredFile> {
        self.save(name, data)
    }

    /// Start a chunked upload under `name`.
    ///
    /// Creates the root directory if it does not exist yet.
    pub fn begin_upload(&self, name: &str) -> StoreResult<PendingUpload> {
        let name = FileName::parse(name)?;
        let target = self.contained_path(&name)?;

        self.ensure_root()?;

        if self.config.overwrite == OverwritePolicy::Reject && fs::symlink_metadata(&target).is_ok()
        {
            return Err(StoreError::AlreadyExists(name.into_string()));
        }

        let mut builder = tempfile::Builder::new();
        builder.prefix(UPLOAD_PREFIX);
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            // Narrowed by the process umask, same as a plain file create.
            builder.permissions(fs::Permissions::from_mode(0o666));
        }
        let temp = builder.tempfile_in(&self.root)?;

        Ok(PendingUpload::new(name, target, temp, self.config.clone()))
    }

    // ---- Reads ----

    /// Look up a stored file.
    ///
    /// Returns `Ok(None)` if nothing is stored under `name`. Names that fail
    /// validation, or whose entry resolves outside the root (for example
    /// through a planted symlink), are rejected as `InvalidName`.
    pub fn resolve(&self, name: &str) -> StoreResult<Option<StoredFile>> {
        let name = FileName::parse(name)?;
        let Some(path) = self.locate(&name)? else {
            return Ok(None);
        };

        let meta = match fs::metadata(&path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if !meta.is_file() {
            return Ok(None);
        }

        Ok(Some(StoredFile {
            name,
            path,
            size: meta.len(),
        }))
    }

    /// Open a stored file for reading.
    ///
    /// The reported size comes from the opened handle, so it always matches
    /// the bytes the handle yields even if the name is overwritten
    /// concurrently.
    pub fn open_file(&self, name: &str) -> StoreResult<Option<(File, StoredFile)>> {
        let name = FileName::parse(name)?;
        let Some(path) = self.locate(&name)? else {
            return Ok(None);
        };

        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let meta = file.metadata()?;
        if !meta.is_file() {
            return Ok(None);
        }

        let size = meta.len();
        Ok(Some((file, StoredFile { name, path, size })))
    }

    /// Read a stored file fully into memory.
    pub fn read(&self, name: &str) -> StoreResult<Option<Vec<u8>>> {
        let Some((mut file, stored)) = self.open_file(name)? else {
            return Ok(None);
        };
        let mut data = Vec::with_capacity(usize::try_from(stored.size).unwrap_or(0));
        file.read_to_end(&mut data)?;
        Ok(Some(data))
    }

    /// Names of all stored files, sorted.
    ///
    /// Only regular files directly under the root are reported. Directories,
    /// symlinks, in-flight uploads, and entries whose name would not pass
    /// validation are skipped. A root that has never existed lists as empty;
    /// a root that disappeared after being seen is an I/O error.
    pub fn list(&self) -> StoreResult<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e)
                if e.kind() == io::ErrorKind::NotFound
                    && !self.root_seen.load(Ordering::Acquire) =>
            {
                return Ok(Vec::new())
            }
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            if validate_file_name(&name).is_err() {
                continue;
            }
            // The store only ever creates regular files; links are not listed.
            if entry.file_type()?.is_file() {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    // ---- Housekeeping ----

    /// Remove temporary artifacts left behind by interrupted uploads.
    ///
    /// Runs automatically in [`open`](Self::open). Only files idle for at
    /// least [`StoreConfig::stale_upload_secs`] are removed, so uploads that
    /// another store on the same root is still writing survive.
    pub fn purge_partial_uploads(&self) -> StoreResult<usize> {
        let max_age = self.config.stale_upload_age();
        let now = SystemTime::now();

        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        for entry in entries {
            let entry = entry?;
            let is_partial = entry
                .file_name()
                .to_str()
                .is_some_and(|n| n.starts_with(UPLOAD_PREFIX));
            if !is_partial || !entry.file_type()?.is_file() {
                continue;
            }
            let modified = match entry.metadata().and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            // A timestamp in the future counts as fresh.
            let idle = now.duration_since(modified).unwrap_or_default();
            if idle < max_age {
                continue;
            }
            match fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        if removed > 0 {
            debug!(root = %self.root.display(), removed, "purged partial uploads");
        }
        Ok(removed)
    }

    // ---- Path containment ----

    /// Join a validated name onto the root and check the result stays a
    /// direct child of the root.
    fn contained_path(&self, name: &FileName) -> StoreResult<PathBuf> {
        let path = self.root.join(name.as_str());
        if path.parent() != Some(self.root.as_path()) || !path.starts_with(&self.root) {
            return Err(StoreError::invalid(
                name.as_str(),
                "resolves outside the root directory",
            ));
        }
        Ok(path)
    }

    /// Containment check against the canonical root, following any links.
    ///
    /// Returns `Ok(None)` when the root or the entry does not exist.
    fn locate(&self, name: &FileName) -> StoreResult<Option<PathBuf>> {
        let path = self.contained_path(name)?;

        let canonical_root = match fs::canonicalize(&self.root) {
            Ok(root) => root,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let canonical = match fs::canonicalize(&path) {
            Ok(path) => path,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if !canonical.starts_with(&canonical_root) {
            return Err(StoreError::invalid(
                name.as_str(),
                "resolves outside the root directory",
            ));
        }
        Ok(Some(path))
    }

    fn ensure_root(&self) -> StoreResult<()> {
        fs::create_dir_all(&self.root)?;
        self.root_seen.store(true, Ordering::Release);
        Ok(())
    }
}

impl std::fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStore")
            .field("root", &self.root)
            .field("overwrite", &self.config.overwrite)
            .finish()
    }
}
