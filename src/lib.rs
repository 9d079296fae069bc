pub mod config;
pub mod error;
pub mod report;
pub mod session;
pub mod spotify;

pub use config::Config;
pub use error::{AppError, Result};
pub use report::{
    fetch_profile, fetch_report, fetch_top_tracks, save_report, PopularitySlice, TrackReport,
    TrackSource, DEFAULT_LIMIT,
};
pub use session::{AuthProgress, SessionContext, SessionManager};
pub use spotify::{RecencyWindow, SpotifyClient, TrackRecord, UserProfile};
