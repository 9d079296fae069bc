use async_trait::async_trait;

use crate::error::Result;
use crate::spotify::{RecencyWindow, TrackRecord, UserProfile};

/// Port over the upstream capabilities the reporter consumes.
///
/// The production implementation lives in `spotify::client`; tests
/// substitute in-memory stubs.
#[async_trait]
pub trait TrackSource {
    /// The current user's top tracks for `window`, at most `limit` items,
    /// in upstream ranking order.
    async fn top_tracks(&self, limit: u32, window: RecencyWindow) -> Result<Vec<TrackRecord>>;

    /// The current user's profile.
    async fn profile(&self) -> Result<UserProfile>;
}
