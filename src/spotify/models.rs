use clap::ValueEnum;
use rspotify::model::TimeRange;
use serde::{Deserialize, Serialize};

/// One top-listened track, reduced to what the report needs. Immutable once
/// fetched; lives for a single render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackRecord {
    pub name: String,
    pub artists: Vec<String>,
    pub popularity: u8,
}

impl TrackRecord {
    /// "Name - Artist, Artist" label used in tables and charts.
    pub fn display_label(&self) -> String {
        format!("{} - {}", self.name, self.artists.join(", "))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub display_name: String,
    pub email: Option<String>,
}

/// Recency window accepted by the top-tracks endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum RecencyWindow {
    /// Roughly the last four weeks
    #[default]
    ShortTerm,
    /// Roughly the last six months
    MediumTerm,
    /// Several years of listening history
    LongTerm,
}

impl From<RecencyWindow> for TimeRange {
    fn from(window: RecencyWindow) -> Self {
        match window {
            RecencyWindow::ShortTerm => TimeRange::ShortTerm,
            RecencyWindow::MediumTerm => TimeRange::MediumTerm,
            RecencyWindow::LongTerm => TimeRange::LongTerm,
        }
    }
}

impl std::fmt::Display for RecencyWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecencyWindow::ShortTerm => write!(f, "short-term"),
            RecencyWindow::MediumTerm => write!(f, "medium-term"),
            RecencyWindow::LongTerm => write!(f, "long-term"),
        }
    }
}

#[cfg(test)]
impl TrackRecord {
    pub fn mock(name: &str, artist: &str, popularity: u8) -> Self {
        Self {
            name: name.to_string(),
            artists: vec![artist.to_string()],
            popularity,
        }
    }
}
