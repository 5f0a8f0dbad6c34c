//! Session duration heuristics

use crate::config::TimingThresholds;
use crate::types::{PatternResult, SignalTier};

/// Classify the elapsed interaction time in seconds.
///
/// `None` means no run start was recorded.
pub fn analyze_session_time(elapsed_secs: Option<f64>, thresholds: &TimingThresholds) -> PatternResult {
    let Some(elapsed) = elapsed_secs else {
        return PatternResult::new("Not analyzed", SignalTier::Unknown);
    };

    if elapsed < thresholds.min_session_secs {
        PatternResult::new("Very short session", SignalTier::Warning)
    } else if elapsed > thresholds.max_session_secs {
        PatternResult::new("Very long session", SignalTier::Warning)
    } else {
        PatternResult::new(format!("Active for {:.1}s", elapsed), SignalTier::Safe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_analyzed() {
        let result = analyze_session_time(None, &TimingThresholds::default());
        assert_eq!(result.pattern, "Not analyzed");
        assert_eq!(result.risk, SignalTier::Unknown);
    }

    #[test]
    fn test_short_session() {
        let result = analyze_session_time(Some(2.9), &TimingThresholds::default());
        assert_eq!(result, PatternResult::new("Very short session", SignalTier::Warning));
    }

    #[test]
    fn test_long_session() {
        let result = analyze_session_time(Some(300.5), &TimingThresholds::default());
        assert_eq!(result, PatternResult::new("Very long session", SignalTier::Warning));
    }

    #[test]
    fn test_active_session_label() {
        let result = analyze_session_time(Some(42.37), &TimingThresholds::default());
        assert_eq!(result, PatternResult::new("Active for 42.4s", SignalTier::Safe));
    }

    #[test]
    fn test_boundaries_are_inclusive_of_safe() {
        let thresholds = TimingThresholds::default();
        assert_eq!(analyze_session_time(Some(3.0), &thresholds).risk, SignalTier::Safe);
        assert_eq!(analyze_session_time(Some(300.0), &thresholds).risk, SignalTier::Safe);
    }
}
