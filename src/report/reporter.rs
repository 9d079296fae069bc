use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{info, warn};

use crate::error::Result;
use crate::report::models::TrackReport;
use crate::report::source::TrackSource;
use crate::spotify::{RecencyWindow, UserProfile};

pub const DEFAULT_LIMIT: u32 = 10;

/// Fetch the current user's top tracks and rank them by popularity.
pub async fn fetch_top_tracks<S: TrackSource>(
    source: &S,
    limit: u32,
    window: RecencyWindow,
) -> Result<TrackReport> {
    let records = source.top_tracks(limit, window).await?;
    Ok(TrackReport::from_records(records))
}

/// Boundary variant of [`fetch_top_tracks`]: an upstream failure becomes an
/// empty report plus the upstream message, for verbatim display. The data is
/// advisory, so there is no retry; an empty report with no message means the
/// user simply has no listening history yet.
pub async fn fetch_report<S: TrackSource>(
    source: &S,
    limit: u32,
    window: RecencyWindow,
) -> (TrackReport, Option<String>) {
    match fetch_top_tracks(source, limit, window).await {
        Ok(report) => (report, None),
        Err(e) => {
            warn!("Top tracks fetch failed: {}", e);
            (TrackReport::default(), Some(e.to_string()))
        }
    }
}

pub async fn fetch_profile<S: TrackSource>(source: &S) -> Result<UserProfile> {
    source.profile().await
}

/// Write the report as pretty JSON under `dir`, one timestamped file per
/// call.
pub fn save_report(report: &TrackReport, dir: &Path) -> Result<PathBuf> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");

    fs::create_dir_all(dir)?;

    let filename = dir.join(format!("top_tracks_{}.json", timestamp));
    let json = serde_json::to_string_pretty(report)?;

    fs::write(&filename, json)?;

    info!("Report saved to: {}", filename.display());

    Ok(filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tempfile::TempDir;

    use crate::error::AppError;
    use crate::spotify::TrackRecord;

    struct StubSource {
        records: Vec<TrackRecord>,
        failure: Option<String>,
    }

    #[async_trait]
    impl TrackSource for StubSource {
        async fn top_tracks(
            &self,
            limit: u32,
            _window: RecencyWindow,
        ) -> Result<Vec<TrackRecord>> {
            match &self.failure {
                Some(message) => Err(AppError::Auth(message.clone())),
                None => Ok(self.records.iter().take(limit as usize).cloned().collect()),
            }
        }

        async fn profile(&self) -> Result<UserProfile> {
            Ok(UserProfile {
                display_name: "Stub Listener".to_string(),
                email: None,
            })
        }
    }

    #[tokio::test]
    async fn report_is_sorted_and_capped() {
        let source = StubSource {
            records: (0..20)
                .map(|i| TrackRecord::mock(&format!("Track {i}"), "Artist", (i * 5) as u8))
                .collect(),
            failure: None,
        };

        let report = fetch_top_tracks(&source, 10, RecencyWindow::ShortTerm)
            .await
            .unwrap();

        assert_eq!(report.len(), 10);
        let popularities: Vec<u8> = report.records().iter().map(|r| r.popularity).collect();
        assert!(popularities.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[tokio::test]
    async fn ranks_tracks_by_popularity() {
        let source = StubSource {
            records: vec![
                TrackRecord::mock("A", "Artist", 80),
                TrackRecord::mock("B", "Artist", 95),
                TrackRecord::mock("C", "Artist", 60),
            ],
            failure: None,
        };

        let report = fetch_top_tracks(&source, 10, RecencyWindow::ShortTerm)
            .await
            .unwrap();

        let ranked: Vec<(&str, u8)> = report
            .records()
            .iter()
            .map(|r| (r.name.as_str(), r.popularity))
            .collect();
        assert_eq!(ranked, vec![("B", 95), ("A", 80), ("C", 60)]);
    }

    #[tokio::test]
    async fn upstream_failure_becomes_empty_report_with_message() {
        let source = StubSource {
            records: Vec::new(),
            failure: Some("status code 401 Unauthorized".to_string()),
        };

        let (report, message) = fetch_report(&source, 10, RecencyWindow::ShortTerm).await;

        assert!(report.is_empty());
        let message = message.unwrap();
        assert!(message.contains("401"), "message was: {message}");
    }

    #[tokio::test]
    async fn empty_history_is_not_an_error() {
        let source = StubSource {
            records: Vec::new(),
            failure: None,
        };

        let (report, message) = fetch_report(&source, 10, RecencyWindow::ShortTerm).await;

        assert!(report.is_empty());
        assert!(message.is_none());
    }

    #[tokio::test]
    async fn failed_fetch_leaves_session_authenticated() {
        use rspotify::{AuthCodeSpotify, Credentials, OAuth};

        use crate::session::SessionContext;
        use crate::spotify::SpotifyClient;

        let mut session = SessionContext::new(uuid::Uuid::new_v4(), "unused");
        session.set_authenticated(SpotifyClient::new(AuthCodeSpotify::new(
            Credentials::new("client-id", "client-secret"),
            OAuth::default(),
        )));

        let source = StubSource {
            records: Vec::new(),
            failure: Some("rate limited".to_string()),
        };
        let (report, message) = fetch_report(&source, 10, RecencyWindow::ShortTerm).await;

        assert!(report.is_empty());
        assert!(message.is_some());
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn profile_comes_from_the_source() {
        let source = StubSource {
            records: Vec::new(),
            failure: None,
        };

        let profile = fetch_profile(&source).await.unwrap();
        assert_eq!(profile.display_name, "Stub Listener");
    }

    #[test]
    fn save_report_writes_json() {
        let dir = TempDir::new().unwrap();
        let report = TrackReport::from_records(vec![TrackRecord::mock("Song", "Artist", 42)]);

        let path = save_report(&report, dir.path()).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let parsed: TrackReport = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed.len(), 1);
    }
}
