use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::warn;
use uuid::Uuid;

use crate::error::Result;

/// Persists the current session id across CLI invocations, so consecutive
/// commands act as one session. The CLI stand-in for a browser session.
pub(crate) struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub(crate) fn new(cache_dir: &Path) -> Self {
        Self {
            path: cache_dir.join("current-session"),
        }
    }

    pub(crate) fn load(&self) -> Option<Uuid> {
        let contents = fs::read_to_string(&self.path).ok()?;
        match Uuid::parse_str(contents.trim()) {
            Ok(id) => Some(id),
            Err(_) => {
                warn!("Ignoring malformed session id in {}", self.path.display());
                None
            }
        }
    }

    pub(crate) fn save(&self, id: Uuid) -> Result<()> {
        fs::write(&self.path, id.to_string())?;
        Ok(())
    }

    /// Forget `id` if it is the persisted session. Another session's id is
    /// left untouched.
    pub(crate) fn forget(&self, id: Uuid) -> Result<()> {
        if self.load() != Some(id) {
            return Ok(());
        }
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_returns_saved_id() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());
        let id = Uuid::new_v4();

        store.save(id).unwrap();

        assert_eq!(store.load(), Some(id));
    }

    #[test]
    fn forget_only_clears_the_matching_id() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());
        let id = Uuid::new_v4();
        store.save(id).unwrap();

        store.forget(Uuid::new_v4()).unwrap();
        assert_eq!(store.load(), Some(id));

        store.forget(id).unwrap();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn malformed_contents_are_ignored() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());
        fs::write(dir.path().join("current-session"), "not-a-uuid").unwrap();

        assert_eq!(store.load(), None);
    }
}
