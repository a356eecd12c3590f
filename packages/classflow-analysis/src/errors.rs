//! Error types for classflow-analysis
//!
//! Benign analysis conditions (division by a constant zero, unknown
//! expression shapes, unresolvable dispatch) never surface here; the
//! analyses recover from those locally. This enum covers the fatal
//! conditions: malformed IR, broken class hierarchies, missing
//! prerequisite results, unusable configuration.

use thiserror::Error;

/// Main error type for analysis construction and execution
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// IO error (configuration files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The IR violates a structural invariant
    #[error("malformed IR: {0}")]
    MalformedIr(String),

    /// The class hierarchy contains a cycle in a superclass chain
    #[error("cyclic class hierarchy: {0}")]
    CyclicHierarchy(String),

    /// A prerequisite analysis result was not available
    #[error("missing analysis result: {0}")]
    MissingResult(String),

    /// Configuration error (options or taint-config file)
    #[error("configuration error: {0}")]
    Config(String),
}

impl AnalysisError {
    /// Create a malformed-IR error
    pub fn malformed(msg: impl Into<String>) -> Self {
        AnalysisError::MalformedIr(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        AnalysisError::Config(msg.into())
    }
}

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;
