//! Error types for the audio authenticity engine

use std::fmt;

/// Errors that can occur during audio analysis
///
/// Decode-stage failures (`UnsupportedFormat`, `Decode`, `EmptySignal`) are not
/// retryable: the caller has to supply a different file. `Timeout` may be
/// retried with the same input.
#[derive(Debug, Clone)]
pub enum AnalysisError {
    /// Format tag is not in the supported set
    UnsupportedFormat(String),

    /// Bytes could not be parsed as the declared format
    Decode(String),

    /// Decoded signal is shorter than the minimum analysable duration
    EmptySignal {
        /// Decoded duration in milliseconds
        duration_ms: f32,
        /// Minimum accepted duration in milliseconds
        min_duration_ms: f32,
    },

    /// Wall-clock budget exceeded
    Timeout {
        /// Elapsed time when the budget check failed
        elapsed_ms: f32,
        /// Configured budget
        limit_ms: f32,
        /// Pipeline stage that completed last
        stage: String,
    },

    /// Unexpected numeric failure inside a component that must be total
    Internal(String),

    /// Configuration failed validation
    InvalidConfig(String),
}

impl AnalysisError {
    /// Stable reason code handed to the presentation layer
    pub fn reason(&self) -> &'static str {
        match self {
            AnalysisError::UnsupportedFormat(_) => "unsupported_format",
            AnalysisError::Decode(_) => "decode_error",
            AnalysisError::EmptySignal { .. } => "empty_signal",
            AnalysisError::Timeout { .. } => "analysis_timeout",
            AnalysisError::Internal(_) => "internal_error",
            AnalysisError::InvalidConfig(_) => "invalid_config",
        }
    }

    /// Whether the caller may retry with the same input
    pub fn is_retryable(&self) -> bool {
        matches!(self, AnalysisError::Timeout { .. })
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::UnsupportedFormat(tag) => write!(f, "Unsupported format: {}", tag),
            AnalysisError::Decode(msg) => write!(f, "Decoding error: {}", msg),
            AnalysisError::EmptySignal {
                duration_ms,
                min_duration_ms,
            } => write!(
                f,
                "Empty signal: {:.1} ms decoded, at least {:.1} ms required",
                duration_ms, min_duration_ms
            ),
            AnalysisError::Timeout {
                elapsed_ms,
                limit_ms,
                stage,
            } => write!(
                f,
                "Analysis timed out after {}: {:.1} ms elapsed, limit {:.1} ms",
                stage, elapsed_ms, limit_ms
            ),
            AnalysisError::Internal(msg) => write!(f, "Internal analysis error: {}", msg),
            AnalysisError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for AnalysisError {}
