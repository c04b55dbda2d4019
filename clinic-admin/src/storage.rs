use anyhow::{Context, Result};
use clinic_api::Session;
use std::path::{Path, PathBuf};
#[cfg(unix)]
use std::{io::Write, os::unix::fs::OpenOptionsExt};

const SESSION_FILE: &str = "session.json";

pub fn root_path() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Cannot determine config directory")?
        .join("clinic-admin"))
}

fn secure_write(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    #[cfg(unix)]
    {
        std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)?
            .write_all(content.as_bytes())?;
    }

    #[cfg(not(unix))]
    {
        std::fs::write(path, content)?;
    }

    Ok(())
}

/// Durable record of the signed-in user: one JSON file holding the login
/// response. A missing file means nobody is signed in.
#[derive(Debug, Clone)]
pub struct SessionStorage {
    path: PathBuf,
}

impl SessionStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(SESSION_FILE))
    }

    pub fn default_location() -> Result<Self> {
        Ok(Self::in_dir(root_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session file {}", self.path.display()))?;
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }

        let session = serde_json::from_str::<Session>(raw)
            .with_context(|| format!("Failed to parse session file {}", self.path.display()))?;
        Ok(Some(session))
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string_pretty(session).context("Failed to serialize session")?;
        secure_write(&self.path, &json)
            .with_context(|| format!("Failed to write session file {}", self.path.display()))
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).with_context(|| {
                format!("Failed to remove session file {}", self.path.display())
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinic_api::UserId;

    fn session() -> Session {
        Session {
            user_id: UserId::new("u-1"),
            first_name: "Alice".into(),
            last_name: "Moreau".into(),
            email: "alice@clinic.test".into(),
            role: "ADMIN".into(),
            token: "tok-alice".into(),
        }
    }

    #[test]
    fn missing_file_means_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SessionStorage::in_dir(dir.path());
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn saved_session_is_restored() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SessionStorage::in_dir(dir.path().join("nested"));

        storage.save(&session()).unwrap();
        assert_eq!(storage.load().unwrap(), Some(session()));
    }

    #[test]
    fn clear_removes_file_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SessionStorage::in_dir(dir.path());

        storage.save(&session()).unwrap();
        storage.clear().unwrap();
        assert!(!storage.path().exists());
        storage.clear().unwrap();
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SessionStorage::in_dir(dir.path());
        std::fs::write(storage.path(), "{not json").unwrap();

        assert!(storage.load().is_err());
    }

    #[test]
    fn blank_file_means_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SessionStorage::in_dir(dir.path());
        std::fs::write(storage.path(), "\n").unwrap();

        assert!(storage.load().unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn session_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let storage = SessionStorage::in_dir(dir.path());
        storage.save(&session()).unwrap();

        let mode = std::fs::metadata(storage.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
