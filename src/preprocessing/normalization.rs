//! Amplitude normalization
//!
//! Supports:
//! - Peak normalization (scales the loudest sample to 0 dBFS minus headroom)
//! - RMS normalization (scales the mean level to a speech reference)
//! - None (samples are only sanitized)
//!
//! Loudness of the source is measured before any gain is applied and returned
//! as [`LoudnessMetadata`], so level-based cues can still see how loud the
//! recording really was.
//!
//! # Example
//!
//! ```
//! use voiceshield_dsp::preprocessing::normalization::{normalize, NormalizationMethod};
//!
//! let mut samples = vec![0.25f32; 16000];
//! let loudness = normalize(&mut samples, NormalizationMethod::Peak, 1.0);
//! assert!(loudness.gain_db > 0.0);
//! ```

use serde::{Deserialize, Serialize};

/// Normalization method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMethod {
    /// Leave the level untouched
    None,
    /// Simple peak normalization (fast, scales to max peak)
    Peak,
    /// RMS-based normalization (scales to [`TARGET_SPEECH_RMS_DB`])
    Rms,
}

/// Loudness measured before normalization
///
/// Levels are floored at [`LEVEL_FLOOR_DB`], so digital silence still
/// serializes as a number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoudnessMetadata {
    /// Peak level in dBFS (before normalization)
    pub peak_db: f32,
    /// RMS level in dBFS (before normalization)
    pub rms_db: f32,
    /// Gain applied in dB
    pub gain_db: f32,
}

impl LoudnessMetadata {
    /// Measure a signal without changing it
    pub fn measure(samples: &[f32]) -> Self {
        Self {
            peak_db: to_db(peak(samples)).max(LEVEL_FLOOR_DB),
            rms_db: to_db(rms(samples)).max(LEVEL_FLOOR_DB),
            gain_db: 0.0,
        }
    }
}

/// Numerical stability epsilon for divisions
const EPSILON: f32 = 1e-10;

/// Lowest level reported in [`LoudnessMetadata`] (dBFS)
pub const LEVEL_FLOOR_DB: f32 = -120.0;

/// Level RMS normalization aims for (typical close-talk speech)
pub const TARGET_SPEECH_RMS_DB: f32 = -20.0;

/// Linear amplitude to dBFS, `-inf` for silence
pub fn to_db(linear: f32) -> f32 {
    if linear > EPSILON {
        20.0 * linear.log10()
    } else {
        f32::NEG_INFINITY
    }
}

fn peak(samples: &[f32]) -> f32 {
    samples.iter().map(|&x| x.abs()).fold(0.0f32, f32::max)
}

fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|&x| x * x).sum::<f32>() / samples.len() as f32).sqrt()
}

/// Normalize samples in place
///
/// Gain never pushes the peak past `0 dBFS - max_headroom_db`. Silent input is
/// left untouched with a warning.
///
/// # Returns
///
/// `LoudnessMetadata` with the pre-gain levels and the gain that was applied
pub fn normalize(
    samples: &mut [f32],
    method: NormalizationMethod,
    max_headroom_db: f32,
) -> LoudnessMetadata {
    let mut metadata = LoudnessMetadata::measure(samples);
    let peak_linear = peak(samples);

    if method == NormalizationMethod::None {
        return metadata;
    }

    if peak_linear <= EPSILON {
        log::warn!("Audio is silent or extremely quiet, cannot normalize");
        return metadata;
    }

    let ceiling = 10.0_f32.powf(-max_headroom_db / 20.0);
    let gain_linear = match method {
        NormalizationMethod::Peak => ceiling / peak_linear,
        NormalizationMethod::Rms => {
            let target = 10.0_f32.powf(TARGET_SPEECH_RMS_DB / 20.0);
            let wanted = target / rms(samples).max(EPSILON);
            if peak_linear * wanted > ceiling {
                log::warn!("RMS normalization would clip, limiting gain to preserve headroom");
                ceiling / peak_linear
            } else {
                wanted
            }
        }
        NormalizationMethod::None => 1.0,
    };

    for sample in samples.iter_mut() {
        *sample *= gain_linear;
    }
    metadata.gain_db = 20.0 * gain_linear.log10();

    log::debug!(
        "{:?} normalization: peak={:.2} dBFS, rms={:.2} dBFS, gain={:.2} dB",
        method,
        metadata.peak_db,
        metadata.rms_db,
        metadata.gain_db
    );

    metadata
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(length: usize, amplitude: f32, sample_rate: f32) -> Vec<f32> {
        (0..length)
            .map(|i| amplitude * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_peak_normalization() {
        let mut samples = sine(16000, 0.5, 16000.0);
        let metadata = normalize(&mut samples, NormalizationMethod::Peak, 1.0);

        let new_peak = peak(&samples);
        let target_peak = 10.0_f32.powf(-1.0 / 20.0);
        assert!((new_peak - target_peak).abs() < 0.01);
        assert!((metadata.peak_db - to_db(0.5)).abs() < 0.1);
        assert!(metadata.gain_db > 0.0);
    }

    #[test]
    fn test_rms_normalization_limits_clipping() {
        let mut samples = sine(16000, 0.01, 16000.0);
        normalize(&mut samples, NormalizationMethod::Rms, 1.0);
        let target = 10.0_f32.powf(TARGET_SPEECH_RMS_DB / 20.0);
        assert!((rms(&samples) - target).abs() < 0.01);

        // A square-ish signal already above the target gets only attenuated
        let mut loud = vec![0.9f32; 1000];
        normalize(&mut loud, NormalizationMethod::Rms, 1.0);
        assert!(peak(&loud) <= 1.0);
    }

    #[test]
    fn test_silent_audio() {
        let mut samples = vec![0.0f32; 16000];
        let metadata = normalize(&mut samples, NormalizationMethod::Peak, 1.0);
        assert_eq!(metadata.gain_db, 0.0);
        assert_eq!(metadata.peak_db, LEVEL_FLOOR_DB);
        assert_eq!(metadata.rms_db, LEVEL_FLOOR_DB);
        assert!(samples.iter().all(|&x| x == 0.0));

        let json = serde_json::to_string(&metadata).unwrap();
        let back: LoudnessMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, metadata);
    }

    #[test]
    fn test_none_keeps_level() {
        let mut samples = sine(1000, 0.3, 16000.0);
        let before = samples.clone();
        let metadata = normalize(&mut samples, NormalizationMethod::None, 1.0);
        assert_eq!(samples, before);
        assert_eq!(metadata.gain_db, 0.0);
        assert!(metadata.rms_db < metadata.peak_db);
    }
}
