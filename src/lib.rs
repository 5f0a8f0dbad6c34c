//! Risklens - Browser fraud-risk self-check engine
//!
//! Risklens turns client-side signals (device fingerprint, network identity,
//! interaction behavior, optional email reputation) into a single bounded
//! risk score and verdict through a deterministic pipeline: collection →
//! normalization → behavior heuristics → aggregation.
//!
//! ## Modules
//!
//! - **Orchestrator**: single-flight live runs over async collaborators
//! - **Replay**: stateless evaluation of a recorded session
//! - **Behavior**: pointer, scroll and session-time heuristics

pub mod aggregator;
pub mod behavior;
pub mod collectors;
pub mod config;
pub mod email;
pub mod error;
pub mod fingerprint;
pub mod network;
pub mod normalizer;
pub mod pipeline;
pub mod types;

pub use aggregator::aggregate;
pub use config::AnalysisConfig;
pub use error::AnalysisError;
pub use pipeline::{
    evaluate_recorded, AnalysisReport, Collaborators, InteractionRecorder, Orchestrator,
    Progress, RecordedSession, RunOutcome, RunState,
};
pub use types::{AggregateVerdict, SignalTier, SignalTiers, VerdictTier};

/// Risklens version
pub const RISKLENS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "risklens";
