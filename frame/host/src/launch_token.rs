use frame_config::{MAX_PATH, TOKEN_FILENAME};
use frame_types::LAUNCH_TOKEN_SIZE;
use parking_lot::Mutex;
use sgx_types::sgx_launch_token_t;
use std::{
    fs,
    io::{BufWriter, Read, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// Where the launch token lives, and how it is read back and written out.
///
/// Every failure here is soft: a missing or malformed token just means the
/// platform gets an all-zero token and provisions a fresh one.
#[derive(Debug)]
pub struct LaunchTokenStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl LaunchTokenStore {
    /// Token file under the user's home directory, or in the working directory
    /// when there is no home or the composed path would be too long.
    pub fn from_home() -> Self {
        let home = dirs::home_dir();
        Self::at(token_path(home.as_deref()))
    }

    pub fn at<P: AsRef<Path>>(path: P) -> Self {
        LaunchTokenStore {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> sgx_launch_token_t {
        let _guard = self.lock.lock();
        let mut token = [0u8; LAUNCH_TOKEN_SIZE];

        let file = match fs::File::open(&self.path) {
            Ok(f) => f,
            Err(_) => {
                info!("No launch token file at {:?}. Will create one.", self.path);
                return token;
            }
        };

        let mut buf = Vec::with_capacity(LAUNCH_TOKEN_SIZE);
        if let Err(e) = file.take(LAUNCH_TOKEN_SIZE as u64).read_to_end(&mut buf) {
            warn!("Failed to read launch token from {:?}: {}", self.path, e);
            return token;
        }

        match buf.len() {
            0 => {}
            LAUNCH_TOKEN_SIZE => {
                token.copy_from_slice(&buf);
                debug!("[+] Token file valid!");
            }
            _ => warn!("Invalid launch token read from {:?}", self.path),
        }

        token
    }

    /// Writes the token back, but only when the platform reported it as updated.
    pub fn save(&self, token: &sgx_launch_token_t, updated: bool) {
        if !updated {
            return;
        }
        let _guard = self.lock.lock();

        if let Err(e) = Self::write_token(&self.path, token) {
            warn!("Failed to save launch token to {:?}: {}", self.path, e);
            return;
        }
        debug!("Saved launch token to {:?}", self.path);
    }

    fn write_token(path: &Path, token: &sgx_launch_token_t) -> std::io::Result<()> {
        let f = fs::File::create(path)?;
        let mut writer = BufWriter::new(f);
        writer.write_all(&token[..])?;
        writer.flush()?;

        Ok(())
    }
}

/// `<home>/enclave.token` when it fits in `MAX_PATH`, otherwise the bare file name.
pub fn token_path(home: Option<&Path>) -> PathBuf {
    if let Some(home) = home {
        let home_len = home.as_os_str().len();
        // separator, file name with its NUL, and one spare byte
        if home_len + 1 + (TOKEN_FILENAME.len() + 1) + 1 <= MAX_PATH {
            return home.join(TOKEN_FILENAME);
        }
    }
    PathBuf::from(TOKEN_FILENAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::LogCapture;

    #[test]
    fn test_token_path_under_home() {
        assert_eq!(
            token_path(Some(Path::new("/home/alice"))),
            PathBuf::from("/home/alice/enclave.token")
        );
    }

    #[test]
    fn test_token_path_falls_back_to_working_dir() {
        assert_eq!(token_path(None), PathBuf::from(TOKEN_FILENAME));

        let long_home = format!("/{}", "a".repeat(MAX_PATH));
        assert_eq!(
            token_path(Some(Path::new(&long_home))),
            PathBuf::from(TOKEN_FILENAME)
        );
    }

    #[test]
    fn test_token_path_length_boundary() {
        // the longest home directory still accepted
        let fits = format!("/{}", "a".repeat(MAX_PATH - TOKEN_FILENAME.len() - 4));
        assert_eq!(fits.len() + 1 + TOKEN_FILENAME.len() + 2, MAX_PATH);
        assert_eq!(
            token_path(Some(Path::new(&fits))),
            Path::new(&fits).join(TOKEN_FILENAME)
        );

        let too_long = format!("{}a", fits);
        assert_eq!(
            token_path(Some(Path::new(&too_long))),
            PathBuf::from(TOKEN_FILENAME)
        );
    }

    #[test]
    fn test_missing_token_is_zeroed() {
        let dir = tempfile::tempdir().unwrap();
        let store = LaunchTokenStore::at(dir.path().join("enclave.token"));

        assert_eq!(store.load(), [0u8; LAUNCH_TOKEN_SIZE]);
    }

    #[test]
    fn test_short_token_is_zeroed_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("enclave.token");
        fs::write(&path, [5u8; 100]).unwrap();
        let store = LaunchTokenStore::at(&path);

        let logs = LogCapture::new();
        let token = tracing::subscriber::with_default(logs.subscriber(), || store.load());

        assert_eq!(token, [0u8; LAUNCH_TOKEN_SIZE]);
        assert!(logs.contains("Invalid launch token read from"));
    }

    #[test]
    fn test_empty_token_file_is_zeroed_silently() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("enclave.token");
        fs::write(&path, b"").unwrap();
        let store = LaunchTokenStore::at(&path);

        let logs = LogCapture::new();
        let token = tracing::subscriber::with_default(logs.subscriber(), || store.load());

        assert_eq!(token, [0u8; LAUNCH_TOKEN_SIZE]);
        assert!(!logs.contains("Invalid launch token"));
    }

    #[test]
    fn test_oversized_token_keeps_leading_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("enclave.token");
        let mut contents = vec![3u8; LAUNCH_TOKEN_SIZE];
        contents.extend_from_slice(&[4u8; 16]);
        fs::write(&path, &contents).unwrap();

        assert_eq!(LaunchTokenStore::at(&path).load(), [3u8; LAUNCH_TOKEN_SIZE]);
    }

    #[test]
    fn test_save_only_when_updated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("enclave.token");
        let store = LaunchTokenStore::at(&path);
        let token = [1u8; LAUNCH_TOKEN_SIZE];

        store.save(&token, false);
        assert!(!path.exists());

        store.save(&token, true);
        assert_eq!(store.load(), token);
    }

    #[test]
    fn test_save_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = LaunchTokenStore::at(dir.path().join("missing").join("enclave.token"));

        let logs = LogCapture::new();
        tracing::subscriber::with_default(logs.subscriber(), || {
            store.save(&[1u8; LAUNCH_TOKEN_SIZE], true)
        });

        assert!(logs.contains("Failed to save launch token"));
    }
}
