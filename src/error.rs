//! Error types shared by every optimizer and the controller.

use crate::tour::PermutationDefect;
use thiserror::Error;

/// Result type alias for crate operations.
pub type TspResult<T> = Result<T, TspError>;

/// Unified error type for graph construction, configuration and stepping.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TspError {
    /// A construction parameter is outside its valid range. The run never starts.
    #[error("invalid configuration: `{parameter}` {reason}")]
    InvalidConfig {
        /// Name of the offending parameter.
        parameter: &'static str,
        /// What is wrong with the supplied value.
        reason: String,
    },

    /// The city graph cannot support the requested operation.
    #[error("invalid graph: {0}")]
    InvalidGraph(String),

    /// A caller-supplied sequence is not a permutation of all city indices.
    #[error("invalid tour: {0}")]
    InvalidTour(PermutationDefect),

    /// An optimizer produced a non-permutation. This is a logic defect and is fatal.
    #[error("tour invariant violated by {operation} at step {step}: {defect}")]
    InvalidTourState {
        /// Generation or iteration index in which the breach was detected.
        step: usize,
        /// Operator that produced the broken tour.
        operation: &'static str,
        /// How the tour failed to be a permutation.
        defect: PermutationDefect,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(String),

    /// Malformed JSON in a configuration or city layout file.
    #[error("parse error: {0}")]
    Parse(String),
}

impl TspError {
    /// Shorthand for [`TspError::InvalidConfig`].
    pub fn invalid_config(parameter: &'static str, reason: impl Into<String>) -> Self {
        TspError::InvalidConfig {
            parameter,
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for TspError {
    fn from(err: std::io::Error) -> Self {
        TspError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for TspError {
    fn from(err: serde_json::Error) -> Self {
        TspError::Parse(err.to_string())
    }
}
