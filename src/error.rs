//! Unified error type for ports-toolkit.

use thiserror::Error;

/// Unified error type for all ports-toolkit operations.
///
/// This error type covers all possible failure modes across different modules,
/// providing clear, actionable error messages.
#[derive(Error, Debug)]
pub enum PortsToolkitError {
    /// Filesystem or other I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid regular expression in a search pattern.
    #[error("Invalid regular expression: {0}")]
    Regex(#[from] regex::Error),

    /// Invalid shell wildcard in a search pattern.
    #[error("Invalid wildcard pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Invalid input parameter; raised by front-ends sharing this error
    /// type for argument validation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Port or package not found; raised by front-ends sharing this error
    /// type for lookups they treat as hard errors.
    #[error("Package not found")]
    NotFound,

    /// The dependency graph contains at least one cycle.
    #[error("Cyclic dependencies detected")]
    CyclicDependencies,
}

/// Result type alias for ports-toolkit operations.
pub type Result<T> = std::result::Result<T, PortsToolkitError>;
