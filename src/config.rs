//! Configuration parameters for audio analysis

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::analysis::fusion::FusionConfig;
use crate::error::AnalysisError;
use crate::preprocessing::normalization::NormalizationMethod;
use crate::scam::ScamDetectorConfig;

/// Analysis configuration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    // Decoding
    /// Canonical sample rate every input is resampled to (default: 16000)
    pub sample_rate: u32,

    /// Shortest decoded duration that is analysed (default: 100 ms)
    pub min_duration_ms: f32,

    /// Longer recordings are truncated to this length (default: 600 s)
    pub max_duration_seconds: f32,

    // Preprocessing
    /// Normalization method to use (default: Peak)
    pub normalization: NormalizationMethod,

    /// Headroom below 0 dBFS left by normalization (default: 1.0)
    pub max_headroom_db: f32,

    // Framing
    /// Frame size for STFT and contours (default: 512 = 32 ms at 16 kHz)
    pub frame_size: usize,

    /// Hop size between frames (default: 256)
    pub hop_size: usize,

    // Execution
    /// Wall-clock budget for one analysis (default: 30 s, `None` disables)
    pub timeout: Option<Duration>,

    /// Run the six extractors on the rayon pool (default: true)
    pub parallel: bool,

    /// Weighted fusion policy
    pub fusion: FusionConfig,

    /// Scam pattern detection rules
    pub scam: ScamDetectorConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            min_duration_ms: 100.0,
            max_duration_seconds: 600.0,
            normalization: NormalizationMethod::Peak,
            max_headroom_db: 1.0,
            frame_size: 512,
            hop_size: 256,
            timeout: Some(Duration::from_secs(30)),
            parallel: true,
            fusion: FusionConfig::default(),
            scam: ScamDetectorConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Check parameter ranges and the fusion weights
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.sample_rate < 8_000 {
            return Err(AnalysisError::InvalidConfig(format!(
                "sample rate {} Hz is below 8000 Hz",
                self.sample_rate
            )));
        }
        if self.frame_size < 64 || !self.frame_size.is_power_of_two() {
            return Err(AnalysisError::InvalidConfig(format!(
                "frame size {} must be a power of two >= 64",
                self.frame_size
            )));
        }
        if self.hop_size == 0 || self.hop_size > self.frame_size {
            return Err(AnalysisError::InvalidConfig(format!(
                "hop size {} must be in 1..={}",
                self.hop_size, self.frame_size
            )));
        }
        if !(self.min_duration_ms > 0.0) {
            return Err(AnalysisError::InvalidConfig(
                "minimum duration must be positive".to_string(),
            ));
        }
        if !(self.max_duration_seconds * 1000.0 > self.min_duration_ms) {
            return Err(AnalysisError::InvalidConfig(format!(
                "maximum duration {:.1} s is not above the minimum {:.1} ms",
                self.max_duration_seconds, self.min_duration_ms
            )));
        }
        if !(self.max_headroom_db.is_finite() && self.max_headroom_db >= 0.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "headroom {} dB must be a non-negative number",
                self.max_headroom_db
            )));
        }
        self.fusion.validate()?;
        self.scam.validate()
    }
}
