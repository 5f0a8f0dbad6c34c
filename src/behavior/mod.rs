//! Behavioral heuristics
//!
//! Classifies raw interaction traces as human-like or automated.
//!
//! Traces: pointer ring buffer, scroll ring buffer → Motion / Scroll / Timing
//! analyzers → `PatternResult` (label + tier) per signal.

pub mod buffer;
pub mod motion;
pub mod scroll;
mod stats;
pub mod timing;
pub mod types;

pub use buffer::{InteractionTrace, SampleBuffer};
pub use motion::{MotionAnalyzer, MotionStats};
pub use scroll::ScrollAnalyzer;
pub use timing::analyze_session_time;
pub use types::{InteractionSample, ScrollSample};
