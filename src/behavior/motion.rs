//! Pointer-movement heuristics
//!
//! Classifies a pointer trace as human-like or automated from its geometry.
//! Scripted pointers tend to travel along interpolated straight lines or with
//! mechanically uniform speed and turning, so the analyzer looks at:
//!
//! - how often consecutive headings stay within a few degrees (straight runs)
//! - the mean absolute heading change between moves
//! - the population variance of instantaneous speed (px/ms)

use crate::behavior::stats::{mean, population_variance};
use crate::behavior::types::InteractionSample;
use crate::config::MotionThresholds;
use crate::types::{PatternResult, SignalTier};
use serde::{Deserialize, Serialize};

/// Statistics computed over a pointer trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionStats {
    /// Number of samples analyzed
    pub sample_count: usize,
    /// Number of straight-line continuations
    pub straight_lines: u32,
    /// Mean speed in px/ms
    pub mean_speed: f64,
    /// Population variance of speed
    pub speed_variance: f64,
    /// Mean absolute heading change in degrees, `None` with fewer than two headings
    pub mean_angle_change: Option<f64>,
}

/// Analyzer for pointer traces
pub struct MotionAnalyzer;

impl MotionAnalyzer {
    /// Classify a pointer trace
    pub fn analyze(samples: &[InteractionSample], thresholds: &MotionThresholds) -> PatternResult {
        match Self::stats(samples, thresholds) {
            Some(stats) => {
                let result = classify(&stats, thresholds);
                log::debug!(
                    "pointer trace: {} samples, {} straight, speed var {:.3}, angle change {:?} -> {}",
                    stats.sample_count,
                    stats.straight_lines,
                    stats.speed_variance,
                    stats.mean_angle_change,
                    result.pattern
                );
                result
            }
            None => PatternResult::insufficient_data(),
        }
    }

    /// Compute trace statistics, or `None` below the minimum sample count
    pub fn stats(
        samples: &[InteractionSample],
        thresholds: &MotionThresholds,
    ) -> Option<MotionStats> {
        if samples.len() < thresholds.min_samples.max(2) {
            return None;
        }

        let mut angles: Vec<f64> = Vec::with_capacity(samples.len());
        let mut speeds: Vec<f64> = Vec::with_capacity(samples.len());
        let mut straight_lines = 0u32;

        for (pair_index, pair) in samples.windows(2).enumerate() {
            let (prev, curr) = (&pair[0], &pair[1]);

            let dx = curr.x - prev.x;
            let dy = curr.y - prev.y;
            let distance = (dx * dx + dy * dy).sqrt();
            let elapsed = curr.timestamp_ms.saturating_sub(prev.timestamp_ms) as f64;
            let speed = if elapsed > 0.0 { distance / elapsed } else { 0.0 };

            if dx != 0.0 || dy != 0.0 {
                angles.push(dy.atan2(dx).to_degrees());
            }
            speeds.push(speed);

            // From the third pair on, compare the two latest headings. A
            // stationary pair re-checks the previous two.
            if pair_index >= 2 && angles.len() >= 2 {
                let last = angles[angles.len() - 1];
                let before = angles[angles.len() - 2];
                if (last - before).abs() < thresholds.straight_angle_deg {
                    straight_lines += 1;
                }
            }
        }

        let angle_changes: Vec<f64> = angles.windows(2).map(|w| (w[1] - w[0]).abs()).collect();

        Some(MotionStats {
            sample_count: samples.len(),
            straight_lines,
            mean_speed: mean(&speeds).unwrap_or(0.0),
            speed_variance: population_variance(&speeds).unwrap_or(0.0),
            mean_angle_change: mean(&angle_changes),
        })
    }
}

/// First matching rule wins
fn classify(stats: &MotionStats, thresholds: &MotionThresholds) -> PatternResult {
    if stats.straight_lines as f64 > stats.sample_count as f64 * thresholds.straight_line_ratio {
        return PatternResult::new("Overly straight movements", SignalTier::Warning);
    }

    if let Some(angle_change) = stats.mean_angle_change {
        if angle_change < thresholds.min_mean_angle_change
            || angle_change > thresholds.max_mean_angle_change
        {
            return PatternResult::new("Unnatural angle changes", SignalTier::Warning);
        }
    }

    if stats.speed_variance < thresholds.min_speed_variance
        || stats.speed_variance > thresholds.max_speed_variance
    {
        return PatternResult::new("Unnatural speed variance", SignalTier::Warning);
    }

    PatternResult::new("Natural movements", SignalTier::Safe)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a trace from (heading in degrees, distance) moves, 10 ms apart
    fn trace_from_moves(moves: &[(f64, f64)]) -> Vec<InteractionSample> {
        let mut samples = vec![InteractionSample::new(100.0, 100.0, 0)];
        let (mut x, mut y, mut t) = (100.0, 100.0, 0);
        for &(heading, distance) in moves {
            let rad = heading.to_radians();
            x += distance * rad.cos();
            y += distance * rad.sin();
            t += 10;
            samples.push(InteractionSample::new(x, y, t));
        }
        samples
    }

    fn zigzag(count: usize, headings: (f64, f64), distances: (f64, f64)) -> Vec<(f64, f64)> {
        (0..count)
            .map(|i| {
                if i % 2 == 0 {
                    (headings.0, distances.0)
                } else {
                    (headings.1, distances.1)
                }
            })
            .collect()
    }

    #[test]
    fn test_insufficient_data() {
        let thresholds = MotionThresholds::default();
        for n in 0..5 {
            let samples: Vec<InteractionSample> = (0..n)
                .map(|i| InteractionSample::new(i as f64 * 7.0, (i * i) as f64, i * 13))
                .collect();
            let result = MotionAnalyzer::analyze(&samples, &thresholds);
            assert_eq!(result, PatternResult::insufficient_data());
        }
    }

    #[test]
    fn test_straight_line_constant_speed() {
        let samples: Vec<InteractionSample> = (0..10)
            .map(|i| InteractionSample::new(i as f64 * 10.0, i as f64 * 5.0, i * 16))
            .collect();
        let thresholds = MotionThresholds::default();

        let stats = MotionAnalyzer::stats(&samples, &thresholds).unwrap();
        assert!(stats.straight_lines as f64 >= 0.3 * samples.len() as f64);
        assert_eq!(stats.straight_lines, 7);

        let result = MotionAnalyzer::analyze(&samples, &thresholds);
        assert_eq!(result.pattern, "Overly straight movements");
        assert_eq!(result.risk, SignalTier::Warning);
    }

    #[test]
    fn test_natural_movements() {
        // Alternating 0°/60° headings, speeds alternating 1 and 3 px/ms
        let samples = trace_from_moves(&zigzag(8, (0.0, 60.0), (10.0, 30.0)));
        let thresholds = MotionThresholds::default();

        let stats = MotionAnalyzer::stats(&samples, &thresholds).unwrap();
        assert_eq!(stats.straight_lines, 0);
        assert!((stats.mean_angle_change.unwrap() - 60.0).abs() < 1e-6);
        assert!((stats.mean_speed - 2.0).abs() < 1e-9);
        assert!((stats.speed_variance - 1.0).abs() < 1e-9);

        let result = MotionAnalyzer::analyze(&samples, &thresholds);
        assert_eq!(result, PatternResult::new("Natural movements", SignalTier::Safe));
    }

    #[test]
    fn test_small_angle_changes() {
        let samples = trace_from_moves(&zigzag(8, (0.0, 10.0), (10.0, 30.0)));
        let result = MotionAnalyzer::analyze(&samples, &MotionThresholds::default());
        assert_eq!(result.pattern, "Unnatural angle changes");
        assert_eq!(result.risk, SignalTier::Warning);
    }

    #[test]
    fn test_large_angle_changes() {
        let samples = trace_from_moves(&zigzag(8, (0.0, 150.0), (10.0, 30.0)));
        let result = MotionAnalyzer::analyze(&samples, &MotionThresholds::default());
        assert_eq!(result.pattern, "Unnatural angle changes");
    }

    #[test]
    fn test_uniform_speed() {
        let samples = trace_from_moves(&zigzag(8, (0.0, 60.0), (10.0, 10.0)));
        let result = MotionAnalyzer::analyze(&samples, &MotionThresholds::default());
        assert_eq!(result.pattern, "Unnatural speed variance");
        assert_eq!(result.risk, SignalTier::Warning);
    }

    #[test]
    fn test_erratic_speed() {
        // Speeds alternating 1 and 9 px/ms: variance 16
        let samples = trace_from_moves(&zigzag(8, (0.0, 60.0), (10.0, 90.0)));
        let result = MotionAnalyzer::analyze(&samples, &MotionThresholds::default());
        assert_eq!(result.pattern, "Unnatural speed variance");
    }

    #[test]
    fn test_stationary_pointer() {
        let samples: Vec<InteractionSample> = (0..6)
            .map(|i| InteractionSample::new(50.0, 50.0, i * 10))
            .collect();
        let thresholds = MotionThresholds::default();

        let stats = MotionAnalyzer::stats(&samples, &thresholds).unwrap();
        assert_eq!(stats.straight_lines, 0);
        assert_eq!(stats.mean_angle_change, None);
        assert_eq!(stats.speed_variance, 0.0);

        let result = MotionAnalyzer::analyze(&samples, &thresholds);
        assert_eq!(result.pattern, "Unnatural speed variance");
    }

    #[test]
    fn test_zero_elapsed_time_gives_zero_speed() {
        let samples: Vec<InteractionSample> = (0..5)
            .map(|i| InteractionSample::new(i as f64 * 10.0, 0.0, 1_000))
            .collect();
        let stats = MotionAnalyzer::stats(&samples, &MotionThresholds::default()).unwrap();
        assert_eq!(stats.mean_speed, 0.0);
    }

    #[test]
    fn test_extreme_timestamps_do_not_overflow() {
        let timestamps = [i64::MIN, i64::MAX, i64::MIN, i64::MAX, i64::MIN, i64::MAX];
        let samples: Vec<InteractionSample> = timestamps
            .iter()
            .enumerate()
            .map(|(i, &t)| InteractionSample::new(i as f64 * 10.0, 0.0, t))
            .collect();
        let stats = MotionAnalyzer::stats(&samples, &MotionThresholds::default()).unwrap();
        assert!(stats.mean_speed.is_finite());
        assert!(stats.speed_variance.is_finite());
    }

    #[test]
    fn test_thresholds_are_tunable() {
        let samples = trace_from_moves(&zigzag(8, (0.0, 10.0), (10.0, 30.0)));
        let thresholds = MotionThresholds {
            min_mean_angle_change: 5.0,
            ..MotionThresholds::default()
        };
        let result = MotionAnalyzer::analyze(&samples, &thresholds);
        assert_eq!(result.pattern, "Natural movements");
    }
}
