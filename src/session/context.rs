use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use rspotify::AuthCodeSpotify;
use uuid::Uuid;

use crate::error::Result;
use crate::spotify::SpotifyClient;

/// Authentication lifecycle of one session. States carry their data, so a
/// partially authenticated session is unrepresentable.
enum SessionState {
    Unauthenticated,
    Authenticating { pending: AuthCodeSpotify },
    Authenticated { client: SpotifyClient },
}

/// One session's authentication state, passed explicitly to every session
/// operation.
///
/// Distinct contexts never share token caches: the cache file name is
/// derived from the session id alone, so concurrent sessions are isolated
/// without any locking.
pub struct SessionContext {
    id: Uuid,
    cache_dir: PathBuf,
    state: SessionState,
}

/// Outcome of starting the authorization handshake.
pub enum AuthProgress {
    /// A valid cached token was reused; no user interaction needed.
    Authenticated,
    /// The user must visit this URL and return with the callback URL.
    RedirectTo(String),
}

impl SessionContext {
    pub fn new(id: Uuid, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            id,
            cache_dir: cache_dir.into(),
            state: SessionState::Unauthenticated,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Token cache location for this session, a pure function of the
    /// session id.
    pub fn cache_path(&self) -> PathBuf {
        self.cache_dir.join(format!("token-{}.json", self.id))
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated { .. })
    }

    /// Authenticated API handle, once the handshake has completed.
    pub fn client(&self) -> Option<&SpotifyClient> {
        match &self.state {
            SessionState::Authenticated { client } => Some(client),
            _ => None,
        }
    }

    pub(crate) fn set_authenticated(&mut self, client: SpotifyClient) {
        self.state = SessionState::Authenticated { client };
    }

    pub(crate) fn set_authenticating(&mut self, pending: AuthCodeSpotify) {
        self.state = SessionState::Authenticating { pending };
    }

    /// Take the in-flight handshake client, dropping back to
    /// `Unauthenticated` until the exchange succeeds.
    pub(crate) fn take_pending(&mut self) -> Option<AuthCodeSpotify> {
        match std::mem::replace(&mut self.state, SessionState::Unauthenticated) {
            SessionState::Authenticating { pending } => Some(pending),
            other => {
                self.state = other;
                None
            }
        }
    }

    pub(crate) fn reset(&mut self) {
        self.state = SessionState::Unauthenticated;
    }

    /// Delete this session's token cache entry. A missing entry is
    /// already-clean, not an error.
    pub(crate) fn remove_cache_entry(&self) -> Result<()> {
        match fs::remove_file(self.cache_path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
