use crate::client::Credentials;
use crate::error::Result;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Durable home of the current credential record.
///
/// The token provider only talks to this trait, so tests can swap in an
/// in-memory store.
pub trait TokenStore {
    /// Read the current record
    fn load(&self) -> Result<Credentials>;

    /// Replace the stored record
    fn save(&self, credentials: &Credentials) -> Result<()>;
}

/// Credential record persisted as a JSON file
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if a credential file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Credentials> {
        let json = fs::read_to_string(&self.path)?;
        let credentials = serde_json::from_str(&json).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Malformed credential file {}: {}", self.path.display(), e),
            )
        })?;
        Ok(credentials)
    }

    fn save(&self, credentials: &Credentials) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            super::ensure_dir(parent)?;
        }

        let json = serde_json::to_string_pretty(credentials)?;
        fs::write(&self.path, json)?;

        // Set restrictive permissions on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }
}
