//! Error types for vartag

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for vartag operations
pub type Result<T> = std::result::Result<T, VartagError>;

/// Error types that can occur in vartag
///
/// Every variant is fatal to a run: the merge driver processes each input
/// record exactly once, so there is no per-record retry or partial-failure
/// mode. Errors propagate to the caller with enough context to identify the
/// failing stage.
#[derive(Debug, Error)]
pub enum VartagError {
    /// Malformed format template (unterminated `${`, non-numeric or
    /// non-positive column reference)
    #[error("bad format in \"{format}\": {reason}")]
    TemplateSyntax {
        /// The offending format string
        format: String,
        /// What was wrong with it
        reason: String,
    },

    /// A template column reference exceeds a feature's token count
    #[error("template references column {column} but the line has only {available} column(s)")]
    ColumnOutOfRange {
        /// 1-based column number as written in the template
        column: usize,
        /// Number of columns available on the offending line
        available: usize,
    },

    /// A data line in the interval file is malformed
    #[error("invalid interval line {line}: {msg}")]
    FeatureFormat {
        /// Line number where the error occurred (1-based)
        line: usize,
        /// Error message
        msg: String,
    },

    /// A VCF line or header is malformed
    #[error("invalid VCF at line {line}: {msg}")]
    VcfFormat {
        /// Line number where the error occurred (1-based)
        line: usize,
        /// Error message
        msg: String,
    },

    /// The interval file index cannot be built, loaded, or saved
    #[error("index unavailable for {path}: {reason}")]
    IndexUnavailable {
        /// Path of the interval file or its sidecar index
        path: PathBuf,
        /// Underlying cause
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
