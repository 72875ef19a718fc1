//! # VoiceShield DSP
//!
//! An audio authenticity engine: decides whether a recorded voice is
//! synthetically generated and flags acoustic patterns common in scam calls.
//!
//! ## Features
//!
//! - **Decoding**: WAV, MP3, FLAC, OGG and M4A from memory, mixed to mono and
//!   resampled to a canonical rate
//! - **Six analyzers**: spectral regularity, temporal regularity, cepstral
//!   naturalness, harmonic stability, formant consistency and prosody
//! - **Scam patterns**: urgency bursts, repetition loops, regular pauses and
//!   sustained high energy
//! - **Fusion**: fixed weighted policy with a documented threshold
//!
//! ## Quick Start
//!
//! ```no_run
//! use voiceshield_dsp::{analyze, AnalysisConfig, FormatTag};
//!
//! let bytes = std::fs::read("call.wav")?;
//! let result = analyze(&bytes, FormatTag::Wav, &AnalysisConfig::default())?;
//!
//! println!(
//!     "AI generated: {} (confidence {:.2})",
//!     result.is_ai_generated, result.confidence_score
//! );
//! for indicator in &result.scam_indicators {
//!     println!("{}: {:.2}", indicator.pattern, indicator.strength);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Bytes → Decoder/Normalizer → Signal features ─┬→ 6 analyzers → Fusion ─┬→ Result
//!                                               └→ Scam detector ─────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::time::Instant;

use rayon::prelude::*;

pub mod analysis;
pub mod config;
pub mod error;
pub mod features;
pub mod io;
pub mod preprocessing;
pub mod scam;

// Re-export main types
pub use analysis::fusion::{Classification, FusionConfig, FusionWeights, ScoreFusion};
pub use analysis::metadata::AnalysisMetadata;
pub use analysis::result::{AnalysisRecord, AnalysisResult, ResultAssembler};
pub use config::AnalysisConfig;
pub use error::AnalysisError;
pub use features::{Analyzer, AnalyzerId, FeatureScore};
pub use io::{decode, FormatTag, Waveform};
pub use scam::{ScamDetector, ScamDetectorConfig, ScamIndicator, ScamPattern};

use analysis::deadline::Deadline;
use features::frames::SignalFeatures;

/// Main analysis function
///
/// Decodes `bytes` as `format` and runs the full pipeline.
///
/// # Arguments
///
/// * `bytes` - Encoded audio, fully in memory
/// * `format` - Declared container format
/// * `config` - Analysis configuration parameters
///
/// # Returns
///
/// `AnalysisResult` with label, confidence, per-analyzer scores and scam
/// indicators
///
/// # Errors
///
/// - `InvalidConfig` if `config` fails validation
/// - `Decode` / `EmptySignal` from the decoder
/// - `Timeout` if `config.timeout` runs out while decoding or between stages
/// - `Internal` if an analyzer returns a non-finite score
///
/// # Example
///
/// ```no_run
/// use voiceshield_dsp::{analyze, AnalysisConfig, FormatTag};
///
/// let bytes = std::fs::read("voicemail.mp3")?;
/// let format: FormatTag = "mp3".parse()?;
/// let result = analyze(&bytes, format, &AnalysisConfig::default())?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn analyze(
    bytes: &[u8],
    format: FormatTag,
    config: &AnalysisConfig,
) -> Result<AnalysisResult, AnalysisError> {
    config.validate()?;
    let start_time = Instant::now();
    let deadline = Deadline::start(config.timeout);

    let waveform = io::decode_within(bytes, format, config, &deadline)?;

    run_pipeline(&waveform, config, &deadline, start_time)
}

/// Analyze an already decoded waveform
///
/// A waveform at another rate is resampled to `config.sample_rate` first.
///
/// # Errors
///
/// As [`analyze`], minus the decode errors; `EmptySignal` if the waveform is
/// shorter than `config.min_duration_ms`.
///
/// # Example
///
/// ```
/// use voiceshield_dsp::{analyze_waveform, AnalysisConfig, Waveform};
///
/// let silence = Waveform::new(vec![0.0f32; 16000], 16000)?;
/// let result = analyze_waveform(&silence, &AnalysisConfig::default())?;
/// assert!(result.feature_scores.iter().all(|f| f.score == 0.5));
/// # Ok::<(), voiceshield_dsp::AnalysisError>(())
/// ```
pub fn analyze_waveform(
    waveform: &Waveform,
    config: &AnalysisConfig,
) -> Result<AnalysisResult, AnalysisError> {
    config.validate()?;
    let start_time = Instant::now();
    let deadline = Deadline::start(config.timeout);

    let duration_ms = waveform.duration_seconds() * 1000.0;
    if duration_ms < config.min_duration_ms {
        return Err(AnalysisError::EmptySignal {
            duration_ms,
            min_duration_ms: config.min_duration_ms,
        });
    }

    if waveform.sample_rate() != config.sample_rate {
        let resampled = waveform.resampled(config.sample_rate)?;
        deadline.check("resample")?;
        return run_pipeline(&resampled, config, &deadline, start_time);
    }

    run_pipeline(waveform, config, &deadline, start_time)
}

fn run_pipeline(
    waveform: &Waveform,
    config: &AnalysisConfig,
    deadline: &Deadline,
    start_time: Instant,
) -> Result<AnalysisResult, AnalysisError> {
    log::debug!(
        "Starting analysis: {} samples at {} Hz",
        waveform.samples().len(),
        waveform.sample_rate()
    );

    let fusion = ScoreFusion::new(config.fusion)?;

    let features = SignalFeatures::compute(waveform, config.frame_size, config.hop_size);
    if features.is_silent() {
        log::warn!("Signal is silent, every analyzer reports the neutral score");
    }
    deadline.check("features")?;

    let scores: Vec<FeatureScore> = if config.parallel {
        Analyzer::ALL
            .par_iter()
            .map(|analyzer| analyzer.extract_from(&features))
            .collect()
    } else {
        Analyzer::ALL
            .iter()
            .map(|analyzer| analyzer.extract_from(&features))
            .collect()
    };
    for score in &scores {
        if !score.score.is_finite() {
            return Err(AnalysisError::Internal(format!(
                "{} produced a non-finite score",
                score.analyzer
            )));
        }
    }
    deadline.check("analyzers")?;

    let scam_indicators = ScamDetector::new(config.scam.clone()).detect(&features);
    deadline.check("scam_patterns")?;

    let classification = fusion.fuse(&scores)?;

    let mut metadata = AnalysisMetadata::from_waveform(waveform.info());
    metadata.processing_time_ms = start_time.elapsed().as_secs_f32() * 1000.0;

    let result = ResultAssembler.assemble(
        classification,
        fusion.config().threshold,
        scores,
        scam_indicators,
        metadata,
    );

    log::debug!(
        "Analysis complete: ai={}, confidence={:.3}, {} scam indicators, {:.1} ms",
        result.is_ai_generated,
        result.confidence_score,
        result.scam_indicators.len(),
        result.metadata.processing_time_ms
    );

    Ok(result)
}
