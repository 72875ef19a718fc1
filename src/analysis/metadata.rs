//! Analysis metadata structures

use serde::{Deserialize, Serialize};

use crate::features::AnalyzerId;
use crate::io::{FormatTag, WaveformInfo};
use crate::preprocessing::normalization::LoudnessMetadata;

/// Analysis metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    /// Analysed duration in seconds
    pub duration_seconds: f32,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Container the audio was decoded from, `None` for in-memory input
    pub source_format: Option<FormatTag>,

    /// Level before normalization
    pub source_loudness: LoudnessMetadata,

    /// Processing time in milliseconds
    pub processing_time_ms: f32,

    /// Algorithm version
    pub algorithm_version: String,

    /// Analyzers absent from fusion (empty in normal operation)
    pub missing_analyzers: Vec<AnalyzerId>,
}

impl AnalysisMetadata {
    /// Metadata for a waveform, timing filled in by the assembler
    pub fn from_waveform(info: WaveformInfo) -> Self {
        Self {
            duration_seconds: info.duration_seconds,
            sample_rate: info.sample_rate,
            source_format: info.source_format,
            source_loudness: info.source_loudness,
            processing_time_ms: 0.0,
            algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
            missing_analyzers: Vec::new(),
        }
    }
}
