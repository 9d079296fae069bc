use serde::{Deserialize, Serialize};

use crate::spotify::TrackRecord;

/// Popularity-ranked top tracks for one render. Regenerated on every fetch,
/// never cached across renders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackReport {
    records: Vec<TrackRecord>,
}

impl TrackReport {
    /// Rank records by descending popularity. The sort is stable, so the
    /// upstream retrieval order (already relevance-ranked) breaks ties.
    pub fn from_records(mut records: Vec<TrackRecord>) -> Self {
        records.sort_by(|a, b| b.popularity.cmp(&a.popularity));
        Self { records }
    }

    pub fn records(&self) -> &[TrackRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Per-track share of the report's popularity total, for proportional
    /// charts. `None` when the total is zero: shares are undefined and the
    /// caller should fall back to an informational message. Callers are
    /// expected to check `is_empty` before asking for a breakdown.
    pub fn summarize_popularity(&self) -> Option<Vec<PopularitySlice>> {
        let total: u32 = self.records.iter().map(|r| u32::from(r.popularity)).sum();
        if total == 0 {
            return None;
        }

        Some(
            self.records
                .iter()
                .map(|record| PopularitySlice {
                    label: record.display_label(),
                    popularity: record.popularity,
                    share: f64::from(record.popularity) / f64::from(total) * 100.0,
                })
                .collect(),
        )
    }
}

/// One slice of the popularity breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopularitySlice {
    pub label: String,
    pub popularity: u8,
    /// Percentage of the report's popularity total.
    pub share: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spotify::TrackRecord;

    #[test]
    fn sorts_by_descending_popularity() {
        let report = TrackReport::from_records(vec![
            TrackRecord::mock("Low", "A", 10),
            TrackRecord::mock("High", "B", 90),
            TrackRecord::mock("Mid", "C", 50),
        ]);

        let popularities: Vec<u8> = report.records().iter().map(|r| r.popularity).collect();
        assert_eq!(popularities, vec![90, 50, 10]);
    }

    #[test]
    fn ties_keep_retrieval_order() {
        let report = TrackReport::from_records(vec![
            TrackRecord::mock("First", "A", 70),
            TrackRecord::mock("Second", "B", 70),
        ]);

        let names: Vec<&str> = report.records().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second"]);
    }

    #[test]
    fn report_length_matches_input() {
        for n in 0..=10usize {
            let records = (0..n)
                .map(|i| TrackRecord::mock(&format!("Track {i}"), "Artist", (i * 7) as u8))
                .collect();
            let report = TrackReport::from_records(records);

            assert_eq!(report.len(), n);
            let popularities: Vec<u8> = report.records().iter().map(|r| r.popularity).collect();
            assert!(popularities.windows(2).all(|pair| pair[0] >= pair[1]));
        }
    }

    #[test]
    fn zero_popularity_total_has_no_breakdown() {
        let report = TrackReport::from_records(vec![
            TrackRecord::mock("One", "A", 0),
            TrackRecord::mock("Two", "B", 0),
        ]);

        assert!(!report.is_empty());
        assert!(report.summarize_popularity().is_none());
    }

    #[test]
    fn shares_sum_to_one_hundred() {
        let report = TrackReport::from_records(vec![
            TrackRecord::mock("One", "A", 80),
            TrackRecord::mock("Two", "B", 95),
            TrackRecord::mock("Three", "C", 60),
        ]);

        let slices = report.summarize_popularity().unwrap();
        let total: f64 = slices.iter().map(|s| s.share).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn slice_labels_join_artists() {
        let record = TrackRecord {
            name: "Song".to_string(),
            artists: vec!["A".to_string(), "B".to_string()],
            popularity: 40,
        };
        let report = TrackReport::from_records(vec![record]);

        let slices = report.summarize_popularity().unwrap();
        assert_eq!(slices[0].label, "Song - A, B");
        assert_eq!(slices[0].popularity, 40);
    }

    #[test]
    fn empty_report_has_no_breakdown() {
        let report = TrackReport::default();
        assert!(report.is_empty());
        assert!(report.summarize_popularity().is_none());
    }
}
