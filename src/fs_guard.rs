//! Scoped filesystem resources released on drop.

use crate::error::ConvertError;
use fs2::FileExt;
use log::{debug, warn};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Working directory that is deleted with everything in it on drop.
pub struct TempWorkDir {
    dir: tempfile::TempDir,
}

impl TempWorkDir {
    /// Creates the directory under `base`, or under the system temp dir.
    pub fn new(base: Option<&Path>) -> Result<Self, ConvertError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("worldbridge-");
        let dir = match base {
            Some(base) => {
                std::fs::create_dir_all(base)?;
                builder.tempdir_in(base)?
            }
            None => builder.tempdir()?,
        };
        debug!("Working directory {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Exclusive lock on a Java world's `session.lock`.
///
/// The game holds the same lock while a world is open, so taking it fails
/// instead of reading or writing a world that is in use.
pub struct SessionLock {
    file: File,
    path: PathBuf,
}

impl SessionLock {
    pub fn acquire(world_dir: &Path) -> Result<Self, ConvertError> {
        let path = world_dir.join("session.lock");
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        if file.try_lock_exclusive().is_err() {
            return Err(ConvertError::fatal(format!(
                "{} is in use by another program",
                world_dir.display()
            )));
        }
        // Same marker the game writes.
        file.set_len(0)?;
        file.write_all("☃".as_bytes())?;
        Ok(Self { file, path })
    }
}

impl Drop for SessionLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!("Could not unlock {}: {e}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_dir_is_removed_on_drop() {
        let base = tempfile::tempdir().unwrap();
        let work = TempWorkDir::new(Some(base.path())).unwrap();
        let path = work.path().to_path_buf();
        std::fs::write(path.join("scratch"), b"x").unwrap();
        assert!(path.starts_with(base.path()));
        drop(work);
        assert!(!path.exists());
    }

    #[test]
    fn test_session_lock_is_exclusive_until_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let lock = SessionLock::acquire(dir.path()).unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("session.lock")).unwrap(), "☃");
        assert!(matches!(
            SessionLock::acquire(dir.path()),
            Err(ConvertError::Fatal { .. })
        ));
        drop(lock);
        assert!(SessionLock::acquire(dir.path()).is_ok());
    }
}
