//! Error types for Risklens

use thiserror::Error;

/// Errors that can occur while collecting signals or running an analysis
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A single collaborator call failed. Recovered locally by the pipeline,
    /// which downgrades the affected signal to `unknown`.
    #[error("{phase} collection failed: {message}")]
    Collection { phase: String, message: String },

    /// Unexpected failure that aborts the whole run.
    #[error("Analysis pipeline failed: {0}")]
    Pipeline(String),

    /// Input rejected before any work started.
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AnalysisError {
    /// Shorthand for a collection failure in the named phase
    pub fn collection(phase: impl Into<String>, message: impl Into<String>) -> Self {
        AnalysisError::Collection {
            phase: phase.into(),
            message: message.into(),
        }
    }

    /// Whether this error should abort the run instead of degrading one signal
    pub fn is_fatal(&self) -> bool {
        matches!(self, AnalysisError::Pipeline(_))
    }
}
