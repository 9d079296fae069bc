use std::fs;

use rspotify::{
    prelude::*, scopes, AuthCodeSpotify, Config as RspotifyConfig, Credentials, OAuth,
};
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::config::{Config, SCOPE};
use crate::error::{AppError, Result};
use crate::session::context::{AuthProgress, SessionContext};
use crate::session::store::SessionStore;
use crate::spotify::{SpotifyClient, UserProfile};

/// Creates sessions and drives their authentication lifecycle.
///
/// All per-session state lives in the [`SessionContext`] handed back to the
/// caller; the manager itself only holds the application credentials and the
/// cache directory, so any number of sessions can be driven concurrently.
pub struct SessionManager {
    config: Config,
    store: SessionStore,
}

impl SessionManager {
    pub fn new(config: Config) -> Result<Self> {
        if !config.validate() {
            return Err(AppError::Config(
                "Spotify credentials are not configured".into(),
            ));
        }

        fs::create_dir_all(&config.cache_dir)?;
        let store = SessionStore::new(&config.cache_dir);

        Ok(Self { config, store })
    }

    /// Resume the persisted current session, or start a fresh one. Calling
    /// this again yields the same session until [`Self::logout`].
    pub fn start_session(&self) -> Result<SessionContext> {
        let id = match self.store.load() {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4();
                self.store.save(id)?;
                info!("Started session {}", id);
                id
            }
        };

        Ok(SessionContext::new(id, self.config.cache_dir.clone()))
    }

    /// A session independent of the persisted current one. Each call yields
    /// a fresh id, and with it a fresh token cache entry.
    pub fn create_session(&self) -> SessionContext {
        SessionContext::new(Uuid::new_v4(), self.config.cache_dir.clone())
    }

    /// First phase of the handshake. Reuses this session's cached token when
    /// one is usable; otherwise hands back the authorize URL and parks the
    /// pending client until [`Self::complete_authorization`].
    pub async fn begin_authorization(
        &self,
        session: &mut SessionContext,
    ) -> Result<AuthProgress> {
        if session.is_authenticated() {
            return Ok(AuthProgress::Authenticated);
        }

        let client = self.oauth_client(session);

        if self.try_cached_token(&client, session).await? {
            session.set_authenticated(SpotifyClient::new(client));
            return Ok(AuthProgress::Authenticated);
        }

        let auth_url = client.get_authorize_url(false)?;
        session.set_authenticating(client);

        Ok(AuthProgress::RedirectTo(auth_url))
    }

    /// Second phase: exchange the code carried by the callback URL for a
    /// token, persist it at the session's cache entry, and verify it by
    /// fetching the user's profile. Any failure reverts the session to
    /// `Unauthenticated` with no cache entry left behind.
    pub async fn complete_authorization(
        &self,
        session: &mut SessionContext,
        callback_url: &str,
    ) -> Result<UserProfile> {
        let pending = session.take_pending().ok_or_else(|| {
            AppError::Session("no authorization handshake in progress".into())
        })?;

        let code = parse_callback_code(callback_url)?;

        if let Err(e) = pending.request_token(&code).await {
            session.remove_cache_entry()?;
            return Err(AppError::Auth(format!("token exchange failed: {e}")));
        }

        let client = SpotifyClient::new(pending);
        match client.current_user_profile().await {
            Ok(profile) => {
                info!(
                    "Session {} authenticated as {}",
                    session.id(),
                    profile.display_name
                );
                session.set_authenticated(client);
                Ok(profile)
            }
            Err(e) => {
                // the token exchange already wrote the cache entry; remove it
                // so the failed session leaves nothing behind
                session.remove_cache_entry()?;
                Err(e)
            }
        }
    }

    /// Tear the session down: in-memory state first, then the token cache
    /// entry, then the persisted session id. Afterwards the session is
    /// indistinguishable from a never-authenticated one.
    pub fn logout(&self, session: &mut SessionContext) -> Result<()> {
        session.reset();
        session.remove_cache_entry()?;
        self.store.forget(session.id())?;

        info!("Session {} logged out", session.id());
        Ok(())
    }

    /// Install this session's cached token into `client`, refreshing it if
    /// expired. Returns false when there is no usable cached token; a stale
    /// entry that fails to refresh is deleted on the way out.
    async fn try_cached_token(
        &self,
        client: &AuthCodeSpotify,
        session: &SessionContext,
    ) -> Result<bool> {
        let Some(token) = client.read_token_cache(true).await.ok().flatten() else {
            return Ok(false);
        };

        let expired = token.is_expired();
        *client
            .token
            .lock()
            .await
            .map_err(|_| AppError::Auth("token store is poisoned".into()))? = Some(token);

        if expired {
            if let Err(e) = client.refresh_token().await {
                warn!("Cached token refresh failed, re-authorizing: {}", e);
                session.remove_cache_entry()?;
                *client
                    .token
                    .lock()
                    .await
                    .map_err(|_| AppError::Auth("token store is poisoned".into()))? = None;
                return Ok(false);
            }
        }

        debug!("Reusing cached token for session {}", session.id());
        Ok(true)
    }

    fn oauth_client(&self, session: &SessionContext) -> AuthCodeSpotify {
        let creds = Credentials::new(&self.config.client_id, &self.config.client_secret);

        let oauth = OAuth {
            redirect_uri: self.config.redirect_uri.clone(),
            scopes: scopes!(SCOPE),
            ..Default::default()
        };

        let api_config = RspotifyConfig {
            cache_path: session.cache_path(),
            token_cached: true,
            token_refreshing: true,
            ..Default::default()
        };

        AuthCodeSpotify::with_config(creds, oauth, api_config)
    }
}

/// Extract the authorization code from the callback URL. An `error` query
/// parameter means the user or the upstream rejected the request; its value
/// is surfaced verbatim.
fn parse_callback_code(callback_url: &str) -> Result<String> {
    let url = Url::parse(callback_url.trim())
        .map_err(|e| AppError::Auth(format!("invalid callback URL: {e}")))?;

    let mut code = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "error" => return Err(AppError::Auth(format!("authorization rejected: {value}"))),
            "code" => code = Some(value.into_owned()),
            _ => {}
        }
    }

    code.ok_or_else(|| AppError::Auth("callback URL carries no authorization code".into()))
}
