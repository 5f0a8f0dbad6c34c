//! Tunable thresholds and weights
//!
//! The heuristic cut-offs and the aggregation weight table are not derived
//! from data. They are kept as plain configuration so they can be tuned
//! without touching the analyzers. Every section has a `Default` matching the
//! reference behavior, and partial JSON files fill the rest from defaults.

use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pointer buffer capacity
pub const DEFAULT_POINTER_CAPACITY: usize = 50;

/// Scroll buffer capacity
pub const DEFAULT_SCROLL_CAPACITY: usize = 20;

/// DNS leak observation window in milliseconds
pub const DEFAULT_DNS_WAIT_MS: u64 = 2000;

/// Thresholds for pointer-movement classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionThresholds {
    /// Minimum number of samples before any analysis runs
    pub min_samples: usize,
    /// Two consecutive angles closer than this (degrees) continue a straight line
    pub straight_angle_deg: f64,
    /// Straight-line count above `ratio * N` is flagged
    pub straight_line_ratio: f64,
    /// Mean angle change below this (degrees) is flagged
    pub min_mean_angle_change: f64,
    /// Mean angle change above this (degrees) is flagged
    pub max_mean_angle_change: f64,
    /// Speed variance below this is flagged
    pub min_speed_variance: f64,
    /// Speed variance above this is flagged
    pub max_speed_variance: f64,
}

impl Default for MotionThresholds {
    fn default() -> Self {
        Self {
            min_samples: 5,
            straight_angle_deg: 5.0,
            straight_line_ratio: 0.3,
            min_mean_angle_change: 15.0,
            max_mean_angle_change: 120.0,
            min_speed_variance: 0.5,
            max_speed_variance: 10.0,
        }
    }
}

/// Thresholds for scroll classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollThresholds {
    pub min_samples: usize,
    /// Gap variance (ms²) below this counts as machine-regular
    pub min_gap_variance: f64,
    /// Net downward travel (px) above this counts as one-directional
    pub one_directional_distance: f64,
}

impl Default for ScrollThresholds {
    fn default() -> Self {
        Self {
            min_samples: 3,
            min_gap_variance: 20.0,
            one_directional_distance: 500.0,
        }
    }
}

/// Thresholds for session duration classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingThresholds {
    pub min_session_secs: f64,
    pub max_session_secs: f64,
}

impl Default for TimingThresholds {
    fn default() -> Self {
        Self {
            min_session_secs: 3.0,
            max_session_secs: 300.0,
        }
    }
}

/// Aggregation weight table and verdict cut-offs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskWeights {
    pub low_device_memory: u32,
    pub proxy_danger: u32,
    pub proxy_warning: u32,
    pub dns_leak: u32,
    pub language_mismatch: u32,
    pub timezone_mismatch: u32,
    pub unnatural_mouse: u32,
    pub unnatural_scroll: u32,
    pub disposable_email: u32,
    pub invalid_mx: u32,
    /// Scores at or above this are High Risk
    pub high_risk_from: u8,
    /// Scores at or above this (and below `high_risk_from`) are Moderate Risk
    pub moderate_risk_from: u8,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            low_device_memory: 10,
            proxy_danger: 30,
            proxy_warning: 15,
            dns_leak: 20,
            language_mismatch: 10,
            timezone_mismatch: 10,
            unnatural_mouse: 5,
            unnatural_scroll: 5,
            disposable_email: 30,
            invalid_mx: 15,
            high_risk_from: 70,
            moderate_risk_from: 30,
        }
    }
}

/// Complete analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub pointer_capacity: usize,
    pub scroll_capacity: usize,
    /// How long the DNS leak probe observes before reporting
    pub dns_wait_ms: u64,
    /// Extra time allowed on top of `dns_wait_ms` before the probe is abandoned
    pub dns_grace_ms: u64,
    pub motion: MotionThresholds,
    pub scroll: ScrollThresholds,
    pub timing: TimingThresholds,
    pub weights: RiskWeights,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            pointer_capacity: DEFAULT_POINTER_CAPACITY,
            scroll_capacity: DEFAULT_SCROLL_CAPACITY,
            dns_wait_ms: DEFAULT_DNS_WAIT_MS,
            dns_grace_ms: 500,
            motion: MotionThresholds::default(),
            scroll: ScrollThresholds::default(),
            timing: TimingThresholds::default(),
            weights: RiskWeights::default(),
        }
    }
}

impl AnalysisConfig {
    /// Parse a configuration from JSON, filling missing fields with defaults
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn from_file(path: &Path) -> Result<Self, AnalysisError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            AnalysisError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, AnalysisError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<(), AnalysisError> {
        if self.pointer_capacity == 0 || self.scroll_capacity == 0 {
            return Err(AnalysisError::Config(
                "buffer capacities must be positive".to_string(),
            ));
        }
        if self.weights.moderate_risk_from > self.weights.high_risk_from {
            return Err(AnalysisError::Config(
                "moderate_risk_from must not exceed high_risk_from".to_string(),
            ));
        }
        Ok(())
    }
}
