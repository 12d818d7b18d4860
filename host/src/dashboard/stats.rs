//! Derived statistics over one sensor's reading history.

use crate::domain::{MoistureRecord, MoistureState};
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedStatistics {
    pub min: f64,
    pub max: f64,
    /// mean rounded to two decimals
    pub average: f64,
    pub dry_count: usize,
    pub moderate_count: usize,
    pub wet_count: usize,
    pub total: usize,
}

impl DerivedStatistics {
    /// Single pass over `records`. An empty slice gives all zeros.
    pub fn from_records(records: &[MoistureRecord]) -> Self {
        let mut stats = DerivedStatistics::default();
        let mut sum = 0.0;

        for (i, record) in records.iter().enumerate() {
            let m = record.moisture;
            if i == 0 {
                stats.min = m;
                stats.max = m;
            } else {
                stats.min = stats.min.min(m);
                stats.max = stats.max.max(m);
            }
            sum += m;

            match record.level() {
                Some(MoistureState::Dry) => stats.dry_count += 1,
                Some(MoistureState::Moderate) => stats.moderate_count += 1,
                Some(MoistureState::Wet) => stats.wet_count += 1,
                None => {}
            }
        }

        stats.total = records.len();
        if stats.total > 0 {
            let mean = sum / stats.total as f64;
            // rounding may nudge past an extreme when readings carry more than
            // two decimals; keep min <= average <= max
            stats.average = round2(mean).clamp(stats.min, stats.max);
        }
        stats
    }

    pub fn count(&self, state: MoistureState) -> usize {
        match state {
            MoistureState::Dry => self.dry_count,
            MoistureState::Moderate => self.moderate_count,
            MoistureState::Wet => self.wet_count,
        }
    }

    /// non-empty state buckets in DRY, MODERATE, WET order
    pub fn distribution(&self) -> Vec<(MoistureState, usize)> {
        MoistureState::ALL
            .iter()
            .map(|s| (*s, self.count(*s)))
            .filter(|(_, n)| *n > 0)
            .collect()
    }

    pub fn classified(&self) -> usize {
        self.dry_count + self.moderate_count + self.wet_count
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
