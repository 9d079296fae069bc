pub mod models;
pub mod reporter;
pub mod source;

pub use models::{PopularitySlice, TrackReport};
pub use reporter::{fetch_profile, fetch_report, fetch_top_tracks, save_report, DEFAULT_LIMIT};
pub use source::TrackSource;
