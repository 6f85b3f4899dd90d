use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use tempfile::NamedTempFile;

use crate::config::{OverwritePolicy, StoreConfig};
use crate::error::{StoreError, StoreResult};
use crate::name::FileName;
use crate::store::StoredFile;

/// An upload in progress.
///
/// Bytes go to a temporary file inside the root directory. Nothing is
/// visible under the target name until [`commit`](Self::commit) renames the
/// temporary file into place, so readers observe either the previous file or
/// the complete new one.
///
/// Dropping a `PendingUpload` without committing removes the temporary
/// file. A transport that aborts on client disconnect only has to drop it.
pub struct PendingUpload {
    name: FileName,
    target: PathBuf,
    writer: BufWriter<NamedTempFile>,
    written: u64,
    config: StoreConfig,
}

impl PendingUpload {
    pub(crate) fn new(
        name: FileName,
        target: PathBuf,
        temp: NamedTempFile,
        config: StoreConfig,
    ) -> Self {
        Self {
            name,
            target,
            writer: BufWriter::new(temp),
            written: 0,
            config,
        }
    }

    /// Logical name this upload will be stored under.
    pub fn name(&self) -> &FileName {
        &self.name
    }

    /// Bytes accepted so far.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Append a chunk of content.
    pub fn write_chunk(&mut self, chunk: &[u8]) -> StoreResult<()> {
        self.write_all(chunk)?;
        Ok(())
    }

    /// Flush, optionally sync, and atomically move the content into place.
    pub fn commit(self) -> StoreResult<StoredFile> {
        let temp = self.writer.into_inner().map_err(|e| e.into_error())?;
        if self.config.sync_on_commit {
            temp.as_file().sync_all()?;
        }

        let persisted = match self.config.overwrite {
            OverwritePolicy::LastWriteWins => temp.persist(&self.target),
            OverwritePolicy::Reject => temp.persist_noclobber(&self.target),
        };
        // On failure the temporary file travels inside the error and is
        // removed when it drops.
        persisted.map_err(|e| {
            if e.error.kind() == io::ErrorKind::AlreadyExists {
                StoreError::AlreadyExists(self.name.to_string())
            } else {
                StoreError::Io(e.error)
            }
        })?;

        Ok(StoredFile {
            name: self.name,
            path: self.target,
            size: self.written,
        })
    }

    /// Discard the upload and remove the temporary file.
    pub fn abort(self) -> StoreResult<()> {
        // Buffered bytes are discarded, not flushed.
        let (temp, _) = self.writer.into_parts();
        temp.close()?;
        Ok(())
    }
}

impl Write for PendingUpload {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.writer.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl std::fmt::Debug for PendingUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingUpload")
            .field("name", &self.name)
            .field("target", &self.target)
            .field("written", &self.written)
            .finish()
    }
}
