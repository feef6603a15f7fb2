use crate::error::SealedStoreError;
use parking_lot::Mutex;
use std::{
    fs,
    io::{ErrorKind, Read, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

/// File-backed persistence for the enclave's sealed blob.
/// The contents are opaque to the host and are never parsed here.
#[derive(Debug)]
pub struct SealedStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl SealedStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        SealedStore {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the file contents with `data`.
    pub fn save(&self, data: &[u8]) -> Result<(), SealedStoreError> {
        let _guard = self.lock.lock();

        let mut file = Self::create_file(&self.path).map_err(|source| {
            warn!("Failed to open sealed state file {:?}: {}", self.path, source);
            SealedStoreError::Open {
                path: self.path.clone(),
                source,
            }
        })?;
        file.write_all(data)?;
        file.flush()?;
        file.sync_all()?;

        debug!("Saved {} sealed bytes to {:?}", data.len(), self.path);
        Ok(())
    }

    /// Fills `buf` from the file. Anything short of `buf.len()` bytes is an error.
    pub fn load(&self, buf: &mut [u8]) -> Result<(), SealedStoreError> {
        let _guard = self.lock.lock();

        let mut file = fs::File::open(&self.path).map_err(|source| {
            debug!("No sealed state at {:?}: {}", self.path, source);
            SealedStoreError::Open {
                path: self.path.clone(),
                source,
            }
        })?;

        let mut filled = 0;
        while filled < buf.len() {
            match file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        if filled < buf.len() {
            warn!(
                "Sealed state file {:?} is truncated: {} of {} bytes",
                self.path,
                filled,
                buf.len()
            );
            return Err(SealedStoreError::ShortRead {
                path: self.path.clone(),
                expected: buf.len(),
                actual: filled,
            });
        }

        Ok(())
    }

    #[cfg(unix)]
    fn create_file(path: &Path) -> std::io::Result<fs::File> {
        use std::os::unix::fs::OpenOptionsExt;

        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600) // Owner's read & write permission
            .open(path)
    }

    #[cfg(not(unix))]
    fn create_file(path: &Path) -> std::io::Result<fs::File> {
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frame_types::UntrustedStatus;

    #[test]
    fn test_load_returns_what_was_saved() {
        let dir = tempfile::tempdir().unwrap();
        let store = SealedStore::new(dir.path().join("enclave_data.seal"));

        store.save(&[7u8; 64]).unwrap();
        let mut buf = [0u8; 64];
        store.load(&mut buf).unwrap();

        assert_eq!(buf, [7u8; 64]);
    }

    #[test]
    fn test_save_truncates_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("enclave_data.seal");
        let store = SealedStore::new(&path);

        store.save(&[1u8; 32]).unwrap();
        store.save(&[2u8; 8]).unwrap();

        assert_eq!(fs::read(&path).unwrap(), vec![2u8; 8]);
    }

    #[test]
    fn test_missing_file_maps_to_open_failed() {
        let dir = tempfile::tempdir().unwrap();
        let store = SealedStore::new(dir.path().join("absent.seal"));

        let err = store.load(&mut [0u8; 16]).unwrap_err();
        assert_eq!(err.status(), UntrustedStatus::OPEN_FAILED);
    }

    #[test]
    fn test_short_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("enclave_data.seal");
        fs::write(&path, [9u8; 10]).unwrap();

        let err = SealedStore::new(&path).load(&mut [0u8; 16]).unwrap_err();
        match err {
            SealedStoreError::ShortRead {
                expected, actual, ..
            } => {
                assert_eq!(expected, 16);
                assert_eq!(actual, 10);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(
            SealedStore::new(&path)
                .load(&mut [0u8; 16])
                .unwrap_err()
                .status(),
            UntrustedStatus::IO_FAILED
        );
    }

    #[test]
    fn test_save_into_missing_directory_maps_to_open_failed() {
        let dir = tempfile::tempdir().unwrap();
        let store = SealedStore::new(dir.path().join("nope").join("enclave_data.seal"));

        let err = store.save(&[0u8; 4]).unwrap_err();
        assert_eq!(err.status(), UntrustedStatus::OPEN_FAILED);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("enclave_data.seal");
        SealedStore::new(&path).save(&[0u8; 4]).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
