//! Scroll heuristics
//!
//! Scripted scrolling shows up as near-constant gaps between scroll events or
//! as one long downward sweep with no backtracking.

use crate::behavior::stats::population_variance;
use crate::behavior::types::ScrollSample;
use crate::config::ScrollThresholds;
use crate::types::{PatternResult, SignalTier};

/// Analyzer for scroll traces
pub struct ScrollAnalyzer;

impl ScrollAnalyzer {
    /// Classify a scroll trace
    ///
    /// The first sample only anchors the trace: gaps and positions are taken
    /// from the second sample onwards.
    pub fn analyze(samples: &[ScrollSample], thresholds: &ScrollThresholds) -> PatternResult {
        if samples.len() < thresholds.min_samples.max(2) {
            return PatternResult::insufficient_data();
        }

        let tail = &samples[1..];
        let gaps: Vec<f64> = tail.iter().map(|s| s.ms_since_last_sample as f64).collect();
        let positions: Vec<f64> = tail.iter().map(|s| s.scroll_position).collect();

        let gap_variance = population_variance(&gaps).unwrap_or(0.0);
        log::debug!(
            "scroll trace: {} samples, gap variance {:.2}",
            samples.len(),
            gap_variance
        );

        if gap_variance < thresholds.min_gap_variance {
            return PatternResult::new("Overly regular scrolling", SignalTier::Warning);
        }

        if is_one_directional(&positions, thresholds.one_directional_distance) {
            return PatternResult::new("One-directional scrolling", SignalTier::Warning);
        }

        PatternResult::new("Natural scrolling", SignalTier::Safe)
    }
}

/// Never at the top and travelled far from the first to the last position
fn is_one_directional(positions: &[f64], min_distance: f64) -> bool {
    match (positions.first(), positions.last()) {
        (Some(first), Some(last)) => {
            positions.iter().all(|&p| p > 0.0) && last - first > min_distance
        }
        _ => false,
    }
}
