//! Error types for unified-waf.
//!
//! Inspection itself never fails: anomalies and signature hits are content
//! classifications and live in the audit trail. These errors only arise while
//! building the substitution table and blocklist, before any payload is seen.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for unified-waf configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// Error parsing a rules file line.
    #[error("parse error at {location}: {message}")]
    Parse {
        /// Human-readable error message.
        message: String,
        /// Location in the source (file:line:col or line:col).
        location: String,
        /// The source line that caused the error (if available).
        source_text: Option<String>,
    },

    /// Error loading a rules file.
    #[error("failed to load rules file {path}: {source}")]
    RuleFileLoad {
        /// Path to the file that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Error reading payloads to inspect.
    #[error("failed to read payloads: {source}")]
    ReadInput {
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A substitution table entry is unusable.
    #[error("invalid substitution '{from}' -> '{to}': {message}")]
    InvalidSubstitution {
        /// Character being replaced.
        from: char,
        /// Replacement character.
        to: char,
        /// Error message.
        message: String,
    },

    /// A blocklist term is unusable.
    #[error("invalid signature '{term}': {message}")]
    InvalidSignature {
        /// The offending term.
        term: String,
        /// Error message.
        message: String,
    },

    /// Error compiling the signature automaton.
    #[error("invalid pattern set: {message}")]
    PatternSet {
        /// Error message.
        message: String,
    },
}

impl Error {
    /// Create a parse error with location and source text.
    pub fn parse_with_source(
        message: impl Into<String>,
        location: impl Into<String>,
        source_text: impl Into<String>,
    ) -> Self {
        Self::Parse {
            message: message.into(),
            location: location.into(),
            source_text: Some(source_text.into()),
        }
    }
}

/// Source location for error reporting.
#[derive(Debug, Clone, Default)]
pub struct SourceLocation {
    /// File path (if known).
    pub file: Option<PathBuf>,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref file) = self.file {
            write!(f, "{}:{}:{}", file.display(), self.line, self.column)
        } else {
            write!(f, "{}:{}", self.line, self.column)
        }
    }
}
