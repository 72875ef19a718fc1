//! Scam pattern detection
//!
//! Flags acoustic cues often present in fraudulent calls. Every pattern has
//! its own rule in [`rules`]; rules never see each other's output, so one cue
//! cannot suppress another. The detector reads the same [`SignalFeatures`] the
//! authenticity analyzers use and never fails: a recording without cues yields
//! an empty list.
//!
//! # Example
//!
//! ```
//! use voiceshield_dsp::features::frames::SignalFeatures;
//! use voiceshield_dsp::io::Waveform;
//! use voiceshield_dsp::scam::{ScamDetector, ScamDetectorConfig};
//!
//! let waveform = Waveform::new(vec![0.0f32; 16000], 16000)?;
//! let features = SignalFeatures::compute(&waveform, 512, 256);
//! let indicators = ScamDetector::new(ScamDetectorConfig::default()).detect(&features);
//! assert!(indicators.is_empty());
//! # Ok::<(), voiceshield_dsp::AnalysisError>(())
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::features::frames::SignalFeatures;

pub mod rules;

/// The fixed set of scam-indicative patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScamPattern {
    /// Sudden sustained loudness increase near the start or end
    UrgencyBurst,
    /// The energy contour repeats itself (looped or replayed script)
    RepetitionLoop,
    /// Pauses of near-identical length
    UnnaturalPausePattern,
    /// The recording is loud throughout
    SustainedHighEnergy,
}

impl ScamPattern {
    /// All patterns in report order
    pub const ALL: [ScamPattern; 4] = [
        ScamPattern::UrgencyBurst,
        ScamPattern::RepetitionLoop,
        ScamPattern::UnnaturalPausePattern,
        ScamPattern::SustainedHighEnergy,
    ];

    /// Stable snake_case label
    pub fn as_str(&self) -> &'static str {
        match self {
            ScamPattern::UrgencyBurst => "urgency_burst",
            ScamPattern::RepetitionLoop => "repetition_loop",
            ScamPattern::UnnaturalPausePattern => "unnatural_pause_pattern",
            ScamPattern::SustainedHighEnergy => "sustained_high_energy",
        }
    }

    /// Human-readable explanation for display
    pub fn description(&self) -> &'static str {
        match self {
            ScamPattern::UrgencyBurst => {
                "Sudden sustained loudness increase near the start or end (possible urgency tactics)"
            }
            ScamPattern::RepetitionLoop => {
                "Energy pattern repeats itself (possible looped or replayed script)"
            }
            ScamPattern::UnnaturalPausePattern => "Pauses of near-identical length",
            ScamPattern::SustainedHighEnergy => {
                "High audio energy throughout (possible urgency tactics)"
            }
        }
    }
}

impl fmt::Display for ScamPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected pattern
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScamIndicator {
    /// Which pattern fired
    pub pattern: ScamPattern,
    /// Detection strength in [0, 1]
    pub strength: f32,
}

impl ScamIndicator {
    /// Indicator with strength clamped to [0, 1]
    pub fn new(pattern: ScamPattern, strength: f32) -> Self {
        let strength = if strength.is_finite() {
            strength.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self { pattern, strength }
    }
}

/// Rule parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScamDetectorConfig {
    // Urgency burst
    /// Length of the start and end windows searched (default: 5.0 s)
    pub urgency_edge_seconds: f32,

    /// Level above the median a burst must hold (default: 6.0 dB)
    pub urgency_rise_db: f32,

    /// Level above the median the burst must rise from (default: 3.0 dB)
    pub urgency_entry_db: f32,

    /// Shortest burst (default: 1.0 s)
    pub urgency_min_seconds: f32,

    /// How quickly the rise into the burst must happen (default: 0.5 s)
    pub urgency_entry_seconds: f32,

    /// Mean excess that maps to full strength (default: 12.0 dB)
    pub urgency_full_scale_db: f32,

    // Repetition loop
    /// Energy CV below which a contour is too flat to call repetitive (default: 0.1)
    pub repetition_min_cv: f32,

    /// Autocorrelation peak required (default: 0.8)
    pub repetition_min_correlation: f32,

    /// Shortest loop length (default: 1.0 s)
    pub repetition_min_lag_seconds: f32,

    // Pauses
    /// Internal pauses needed (default: 3)
    pub pause_min_count: usize,

    /// Pause duration CV below which pauses are too regular (default: 0.2)
    pub pause_max_cv: f32,

    /// Strength reported for a barely regular pattern (default: 0.3)
    pub pause_min_strength: f32,

    // High energy
    /// Source RMS over active frames that counts as loud (default: -10.0 dBFS)
    pub high_energy_rms_db: f32,
}

impl Default for ScamDetectorConfig {
    fn default() -> Self {
        Self {
            urgency_edge_seconds: 5.0,
            urgency_rise_db: 6.0,
            urgency_entry_db: 3.0,
            urgency_min_seconds: 1.0,
            urgency_entry_seconds: 0.5,
            urgency_full_scale_db: 12.0,
            repetition_min_cv: 0.1,
            repetition_min_correlation: 0.8,
            repetition_min_lag_seconds: 1.0,
            pause_min_count: 3,
            pause_max_cv: 0.2,
            pause_min_strength: 0.3,
            high_energy_rms_db: -10.0,
        }
    }
}

impl ScamDetectorConfig {
    /// Durations and scales must be positive, levels finite
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let positive = [
            ("urgency_edge_seconds", self.urgency_edge_seconds),
            ("urgency_min_seconds", self.urgency_min_seconds),
            ("urgency_full_scale_db", self.urgency_full_scale_db),
            ("repetition_min_lag_seconds", self.repetition_min_lag_seconds),
            ("pause_max_cv", self.pause_max_cv),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(AnalysisError::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }

        let finite = [
            ("urgency_rise_db", self.urgency_rise_db),
            ("urgency_entry_db", self.urgency_entry_db),
            ("urgency_entry_seconds", self.urgency_entry_seconds),
            ("repetition_min_cv", self.repetition_min_cv),
            ("high_energy_rms_db", self.high_energy_rms_db),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(AnalysisError::InvalidConfig(format!(
                    "{} must be finite, got {}",
                    name, value
                )));
            }
        }

        let unit = [
            ("repetition_min_correlation", self.repetition_min_correlation),
            ("pause_min_strength", self.pause_min_strength),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(AnalysisError::InvalidConfig(format!(
                    "{} must be in [0, 1], got {}",
                    name, value
                )));
            }
        }

        if self.pause_min_count == 0 {
            return Err(AnalysisError::InvalidConfig(
                "pause_min_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Runs every pattern rule over one recording
#[derive(Debug, Clone)]
pub struct ScamDetector {
    config: ScamDetectorConfig,
}

impl ScamDetector {
    /// Create a detector
    pub fn new(config: ScamDetectorConfig) -> Self {
        Self { config }
    }

    /// Rule parameters in use
    pub fn config(&self) -> &ScamDetectorConfig {
        &self.config
    }

    /// Detect patterns, sorted by [`ScamPattern`] order
    pub fn detect(&self, features: &SignalFeatures) -> Vec<ScamIndicator> {
        let mut indicators: Vec<ScamIndicator> = [
            rules::urgency_burst(features, &self.config),
            rules::repetition_loop(features, &self.config),
            rules::unnatural_pause_pattern(features, &self.config),
            rules::sustained_high_energy(features, &self.config),
        ]
        .into_iter()
        .flatten()
        .collect();
        indicators.sort_by_key(|indicator| indicator.pattern);

        log::debug!(
            "Scam patterns: [{}]",
            indicators
                .iter()
                .map(|i| format!("{}={:.2}", i.pattern, i.strength))
                .collect::<Vec<_>>()
                .join(", ")
        );

        indicators
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::Waveform;

    fn tone(i: usize) -> f32 {
        (2.0 * std::f32::consts::PI * (i % 64) as f32 / 64.0).sin()
    }

    #[test]
    fn test_plain_tone_has_no_indicators() {
        let samples: Vec<f32> = (0..48000).map(|i| 0.3 * tone(i)).collect();
        let waveform = Waveform::new(samples, 16000).unwrap();
        let features = SignalFeatures::compute(&waveform, 512, 256);
        assert!(ScamDetector::new(ScamDetectorConfig::default()).detect(&features).is_empty());
    }

    #[test]
    fn test_independent_patterns_are_sorted() {
        // Loud throughout, with identical 400 ms pauses between 500 ms bursts
        let mut samples = Vec::new();
        for burst in 0..6 {
            if burst > 0 {
                samples.extend(std::iter::repeat(0.0f32).take(6400));
            }
            samples.extend((0..8000).map(|i| 0.95 * tone(i)));
        }
        let waveform = Waveform::new(samples, 16000).unwrap();
        let features = SignalFeatures::compute(&waveform, 512, 256);
        let indicators = ScamDetector::new(ScamDetectorConfig::default()).detect(&features);

        let patterns: Vec<ScamPattern> = indicators.iter().map(|i| i.pattern).collect();
        assert!(patterns.contains(&ScamPattern::UnnaturalPausePattern));
        assert!(patterns.contains(&ScamPattern::SustainedHighEnergy));
        let mut sorted = patterns.clone();
        sorted.sort();
        assert_eq!(patterns, sorted);
        assert!(indicators.iter().all(|i| (0.0..=1.0).contains(&i.strength)));
    }

    #[test]
    fn test_config_validation() {
        assert!(ScamDetectorConfig::default().validate().is_ok());

        let zero_scale = ScamDetectorConfig {
            urgency_full_scale_db: 0.0,
            ..ScamDetectorConfig::default()
        };
        assert!(matches!(zero_scale.validate(), Err(AnalysisError::InvalidConfig(_))));

        let nan_level = ScamDetectorConfig {
            high_energy_rms_db: f32::NAN,
            ..ScamDetectorConfig::default()
        };
        assert!(nan_level.validate().is_err());

        let no_pauses = ScamDetectorConfig {
            pause_min_count: 0,
            ..ScamDetectorConfig::default()
        };
        assert!(no_pauses.validate().is_err());
    }

    #[test]
    fn test_indicator_clamps_strength() {
        assert_eq!(ScamIndicator::new(ScamPattern::UrgencyBurst, 3.0).strength, 1.0);
        assert_eq!(ScamIndicator::new(ScamPattern::UrgencyBurst, f32::NAN).strength, 0.0);
    }

    #[test]
    fn test_pattern_labels() {
        let json = serde_json::to_string(&ScamPattern::UnnaturalPausePattern).unwrap();
        assert_eq!(json, "\"unnatural_pause_pattern\"");
        for pattern in ScamPattern::ALL {
            assert_eq!(format!("\"{}\"", pattern), serde_json::to_string(&pattern).unwrap());
            assert!(!pattern.description().is_empty());
        }
    }
}
