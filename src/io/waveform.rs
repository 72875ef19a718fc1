//! The decoded, immutable signal every analysis stage reads

use serde::{Deserialize, Serialize};

use super::decoder::FormatTag;
use crate::error::AnalysisError;
use crate::preprocessing::normalization::LoudnessMetadata;
use crate::preprocessing::resample::resample_mono;

/// Mono audio at a fixed sample rate, samples in [-1.0, 1.0]
///
/// Built once by the decoder (or directly from memory with [`Waveform::new`])
/// and only read afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f32>,
    sample_rate: u32,
    source_loudness: LoudnessMetadata,
    source_format: Option<FormatTag>,
}

/// Summary of where a waveform came from, carried into the result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveformInfo {
    /// Duration in seconds
    pub duration_seconds: f32,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Container the samples were decoded from, if any
    pub source_format: Option<FormatTag>,
    /// Level before normalization
    pub source_loudness: LoudnessMetadata,
}

/// Replace non-finite samples with silence and clamp to [-1, 1]
pub(crate) fn sanitize(samples: &mut [f32]) {
    for sample in samples.iter_mut() {
        *sample = if sample.is_finite() {
            sample.clamp(-1.0, 1.0)
        } else {
            0.0
        };
    }
}

impl Waveform {
    /// Wrap in-memory mono samples
    ///
    /// Samples are sanitized but not normalized, so the source loudness equals
    /// the measured loudness of `samples`.
    pub fn new(mut samples: Vec<f32>, sample_rate: u32) -> Result<Self, AnalysisError> {
        if sample_rate == 0 {
            return Err(AnalysisError::Decode("invalid sample rate: 0".to_string()));
        }
        sanitize(&mut samples);
        let source_loudness = LoudnessMetadata::measure(&samples);
        Ok(Self {
            samples,
            sample_rate,
            source_loudness,
            source_format: None,
        })
    }

    /// Used by the decoder once samples are sanitized and normalized
    pub(crate) fn from_decoded(
        samples: Vec<f32>,
        sample_rate: u32,
        source_loudness: LoudnessMetadata,
        source_format: FormatTag,
    ) -> Self {
        Self {
            samples,
            sample_rate,
            source_loudness,
            source_format: Some(source_format),
        }
    }

    /// Samples, mono
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Duration in seconds
    pub fn duration_seconds(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Loudness before normalization
    pub fn source_loudness(&self) -> LoudnessMetadata {
        self.source_loudness
    }

    /// Declared container format, `None` for in-memory waveforms
    pub fn source_format(&self) -> Option<FormatTag> {
        self.source_format
    }

    /// Copy at another sample rate, keeping the source metadata
    pub fn resampled(&self, sample_rate: u32) -> Result<Self, AnalysisError> {
        if sample_rate == self.sample_rate {
            return Ok(self.clone());
        }
        if sample_rate == 0 {
            return Err(AnalysisError::Decode("invalid sample rate: 0".to_string()));
        }
        let mut samples = resample_mono(&self.samples, self.sample_rate, sample_rate)?;
        sanitize(&mut samples);
        Ok(Self {
            samples,
            sample_rate,
            source_loudness: self.source_loudness,
            source_format: self.source_format,
        })
    }

    /// Summary for result metadata
    pub fn info(&self) -> WaveformInfo {
        WaveformInfo {
            duration_seconds: self.duration_seconds(),
            sample_rate: self.sample_rate,
            source_format: self.source_format,
            source_loudness: self.source_loudness,
        }
    }
}
