//! Interaction sample types
//!
//! Samples are produced by the page's event listeners while a run is active
//! and consumed as read-only snapshots by the analyzers.

use serde::{Deserialize, Serialize};

/// A single pointer position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InteractionSample {
    /// Client X coordinate in CSS pixels
    pub x: f64,
    /// Client Y coordinate in CSS pixels
    pub y: f64,
    /// Wall-clock timestamp in milliseconds
    pub timestamp_ms: i64,
}

impl InteractionSample {
    pub fn new(x: f64, y: f64, timestamp_ms: i64) -> Self {
        Self { x, y, timestamp_ms }
    }
}

/// A single scroll observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollSample {
    /// Vertical scroll offset in pixels
    pub scroll_position: f64,
    /// Wall-clock timestamp in milliseconds
    pub timestamp_ms: i64,
    /// Time since the previous scroll event (0 for the first one)
    #[serde(default)]
    pub ms_since_last_sample: u64,
}

impl ScrollSample {
    pub fn new(scroll_position: f64, timestamp_ms: i64, ms_since_last_sample: u64) -> Self {
        Self {
            scroll_position,
            timestamp_ms,
            ms_since_last_sample,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_sample_gap_defaults_to_zero() {
        let json = r#"{"scroll_position": 120.0, "timestamp_ms": 1700000000000}"#;
        let sample: ScrollSample = serde_json::from_str(json).unwrap();
        assert_eq!(sample.ms_since_last_sample, 0);
        assert_eq!(sample.scroll_position, 120.0);
    }

    #[test]
    fn test_interaction_sample_deserialization() {
        let json = r#"{"x": 10.5, "y": 20.0, "timestamp_ms": 42}"#;
        let sample: InteractionSample = serde_json::from_str(json).unwrap();
        assert_eq!(sample, InteractionSample::new(10.5, 20.0, 42));
    }
}
