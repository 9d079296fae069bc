use async_trait::async_trait;
use rspotify::{prelude::*, AuthCodeSpotify};
use tracing::{debug, info};

use crate::error::Result;
use crate::report::TrackSource;
use crate::spotify::models::{RecencyWindow, TrackRecord, UserProfile};

/// Spotify's documented ceiling for a single top-tracks page.
const MAX_TOP_TRACKS: u32 = 50;

/// Authenticated handle over the Spotify Web API.
///
/// Constructed by the session manager once the authorization handshake has
/// produced a usable token. Everything here assumes a valid token and never
/// mutates session state.
#[derive(Clone)]
pub struct SpotifyClient {
    client: AuthCodeSpotify,
}

impl SpotifyClient {
    pub(crate) fn new(client: AuthCodeSpotify) -> Self {
        Self { client }
    }

    pub async fn current_user_profile(&self) -> Result<UserProfile> {
        let user = self.client.current_user().await?;
        let display_name = user.display_name.unwrap_or_else(|| user.id.to_string());

        debug!("Fetched profile for {}", display_name);

        Ok(UserProfile {
            display_name,
            email: user.email,
        })
    }

    /// The current user's top tracks within `window`, in upstream ranking
    /// order, capped at `limit` items. Single page read, no retries.
    pub async fn top_tracks(&self, limit: u32, window: RecencyWindow) -> Result<Vec<TrackRecord>> {
        let limit = limit.min(MAX_TOP_TRACKS);

        let page = self
            .client
            .current_user_top_tracks_manual(Some(window.into()), Some(limit), None)
            .await?;

        let records: Vec<TrackRecord> = page
            .items
            .into_iter()
            .map(|track| TrackRecord {
                name: track.name,
                artists: track.artists.into_iter().map(|a| a.name).collect(),
                popularity: track.popularity as u8,
            })
            .collect();

        info!("Fetched {} top tracks ({})", records.len(), window);
        Ok(records)
    }
}

#[async_trait]
impl TrackSource for SpotifyClient {
    async fn top_tracks(&self, limit: u32, window: RecencyWindow) -> Result<Vec<TrackRecord>> {
        SpotifyClient::top_tracks(self, limit, window).await
    }

    async fn profile(&self) -> Result<UserProfile> {
        self.current_user_profile().await
    }
}
