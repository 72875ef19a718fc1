//! Feature extraction modules
//!
//! Shared signal contours and the six authenticity analyzers:
//! - Spectral regularity (envelope variance across windows)
//! - Temporal regularity (energy contour periodicity)
//! - Naturalness (MFCC trajectory smoothness)
//! - Harmonic stability (f0 jitter and harmonic ratios)
//! - Formant consistency (formant transition shape)
//! - Prosody (pitch, energy and speaking-rate variability)
//!
//! Every analyzer is total: any waveform yields a score in [0, 1] and an
//! input without enough usable frames yields exactly [`NEUTRAL_SCORE`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::io::Waveform;

pub mod autocorrelation;
pub mod cepstral;
pub mod formant;
pub mod frames;
pub mod harmonic;
pub mod mel;
pub mod onsets;
pub mod pitch;
pub mod prosody;
pub mod spectral;
pub mod temporal;

use frames::SignalFeatures;

/// Score reported when an analyzer has nothing to measure
pub const NEUTRAL_SCORE: f32 = 0.5;

/// Frame size used by [`Analyzer::extract`]
pub const DEFAULT_FRAME_SIZE: usize = 512;

/// Hop size used by [`Analyzer::extract`]
pub const DEFAULT_HOP_SIZE: usize = 256;

/// Map a variability measure to a synthetic-indicative score
///
/// Returns 1.0 at zero variability, falling linearly to 0.0 at `floor` (the
/// lowest variability expected from natural speech) and staying there above
/// it. Non-finite input is passed through so the pipeline can report it.
pub fn score_below_floor(value: f32, floor: f32) -> f32 {
    if value.is_nan() {
        return f32::NAN;
    }
    (1.0 - value / floor).clamp(0.0, 1.0)
}

/// Mean and standard deviation (population) of a slice
pub(crate) fn mean_std(values: &[f32]) -> Option<(f32, f32)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f32;
    let mean = values.iter().sum::<f32>() / n;
    let variance = values.iter().map(|&v| (v - mean) * (v - mean)).sum::<f32>() / n;
    Some((mean, variance.sqrt()))
}

/// Identifier of one of the six analyzers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzerId {
    /// Spectral envelope variance
    SpectralRegularity,
    /// Energy contour periodicity
    TemporalRegularity,
    /// Cepstral trajectory smoothness
    Naturalness,
    /// Pitch and harmonic jitter
    HarmonicStability,
    /// Formant transition shape
    FormantConsistency,
    /// Intonation and rhythm variability
    Prosody,
}

impl AnalyzerId {
    /// All analyzers in canonical order
    pub const ALL: [AnalyzerId; 6] = [
        AnalyzerId::SpectralRegularity,
        AnalyzerId::TemporalRegularity,
        AnalyzerId::Naturalness,
        AnalyzerId::HarmonicStability,
        AnalyzerId::FormantConsistency,
        AnalyzerId::Prosody,
    ];

    /// Stable snake_case name
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyzerId::SpectralRegularity => "spectral_regularity",
            AnalyzerId::TemporalRegularity => "temporal_regularity",
            AnalyzerId::Naturalness => "naturalness",
            AnalyzerId::HarmonicStability => "harmonic_stability",
            AnalyzerId::FormantConsistency => "formant_consistency",
            AnalyzerId::Prosody => "prosody",
        }
    }

    /// Position in [`AnalyzerId::ALL`]
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for AnalyzerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of one analyzer run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScore {
    /// Which analyzer produced the score
    pub analyzer: AnalyzerId,

    /// Synthetic-indicative score in [0, 1] (1 = strongly synthetic)
    pub score: f32,

    /// Named sub-metrics for explainability
    pub diagnostics: BTreeMap<String, f32>,
}

impl FeatureScore {
    /// Score with no diagnostics
    pub fn new(analyzer: AnalyzerId, score: f32) -> Self {
        Self {
            analyzer,
            score,
            diagnostics: BTreeMap::new(),
        }
    }

    /// The neutral score, tagged with the reason it was used
    pub fn neutral(analyzer: AnalyzerId, usable_frames: usize) -> Self {
        Self::new(analyzer, NEUTRAL_SCORE).with("usable_frames", usable_frames as f32)
    }

    /// Add a diagnostic value
    ///
    /// Non-finite values are dropped: diagnostics must survive a JSON round
    /// trip.
    pub fn with(mut self, name: &str, value: f32) -> Self {
        if value.is_finite() {
            self.diagnostics.insert(name.to_string(), value);
        } else {
            log::debug!("{}: dropping non-finite diagnostic {}={}", self.analyzer, name, value);
        }
        self
    }
}

/// The closed set of authenticity analyzers
///
/// # Example
///
/// ```
/// use voiceshield_dsp::features::Analyzer;
/// use voiceshield_dsp::io::Waveform;
///
/// let silence = Waveform::new(vec![0.0f32; 16000], 16000)?;
/// for analyzer in Analyzer::ALL {
///     assert_eq!(analyzer.extract(&silence).score, 0.5);
/// }
/// # Ok::<(), voiceshield_dsp::AnalysisError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Analyzer {
    /// See [`spectral`]
    SpectralRegularity,
    /// See [`temporal`]
    TemporalRegularity,
    /// See [`cepstral`]
    Naturalness,
    /// See [`harmonic`]
    HarmonicStability,
    /// See [`formant`]
    FormantConsistency,
    /// See [`prosody`]
    Prosody,
}

impl Analyzer {
    /// All analyzers in canonical order
    pub const ALL: [Analyzer; 6] = [
        Analyzer::SpectralRegularity,
        Analyzer::TemporalRegularity,
        Analyzer::Naturalness,
        Analyzer::HarmonicStability,
        Analyzer::FormantConsistency,
        Analyzer::Prosody,
    ];

    /// Identifier of this analyzer
    pub fn id(&self) -> AnalyzerId {
        match self {
            Analyzer::SpectralRegularity => AnalyzerId::SpectralRegularity,
            Analyzer::TemporalRegularity => AnalyzerId::TemporalRegularity,
            Analyzer::Naturalness => AnalyzerId::Naturalness,
            Analyzer::HarmonicStability => AnalyzerId::HarmonicStability,
            Analyzer::FormantConsistency => AnalyzerId::FormantConsistency,
            Analyzer::Prosody => AnalyzerId::Prosody,
        }
    }

    /// Run on a waveform with the default frame grid
    pub fn extract(&self, waveform: &Waveform) -> FeatureScore {
        let features = SignalFeatures::compute(waveform, DEFAULT_FRAME_SIZE, DEFAULT_HOP_SIZE);
        self.extract_from(&features)
    }

    /// Run on precomputed contours
    pub fn extract_from(&self, features: &SignalFeatures) -> FeatureScore {
        let score = match self {
            Analyzer::SpectralRegularity => spectral::analyze(features),
            Analyzer::TemporalRegularity => temporal::analyze(features),
            Analyzer::Naturalness => cepstral::analyze(features),
            Analyzer::HarmonicStability => harmonic::analyze(features),
            Analyzer::FormantConsistency => formant::analyze(features),
            Analyzer::Prosody => prosody::analyze(features),
        };
        log::debug!("{}: score={:.3}", score.analyzer, score.score);
        score
    }
}
