//! Harmonic stability analyzer
//!
//! A human voice source never holds its fundamental perfectly: cycle-to-cycle
//! jitter and shimmer make both f0 and the balance of the harmonics wander.
//! Two measurements over voiced frames:
//!
//! - relative frame-to-frame f0 jitter, mean `|f0[n+1] - f0[n]| / f0[n]` over
//!   adjacent voiced frames (floor [`JITTER_FLOOR`])
//! - standard deviation of the harmonic ratio `(H2 + H3) / H1` (floor
//!   [`HARMONIC_RATIO_FLOOR`])
//!
//! `score = 0.7 · jitter term + 0.3 · ratio term`

use super::frames::SignalFeatures;
use super::{mean_std, score_below_floor, AnalyzerId, FeatureScore, NEUTRAL_SCORE};

/// Relative jitter expected from natural speech at minimum
pub const JITTER_FLOOR: f32 = 0.03;

/// Harmonic ratio deviation expected from natural speech at minimum
pub const HARMONIC_RATIO_FLOOR: f32 = 0.15;

/// Voiced frames needed
pub const MIN_VOICED_FRAMES: usize = 5;

const JITTER_WEIGHT: f32 = 0.7;
const RATIO_WEIGHT: f32 = 0.3;
const EPSILON: f32 = 1e-10;

/// Magnitude of the strongest bin within one bin of `hz`
fn harmonic_magnitude(spectrum: &[f32], hz: f32, bin_hz: f32) -> Option<f32> {
    let center = (hz / bin_hz).round() as usize;
    if center == 0 || center + 1 >= spectrum.len() {
        return None;
    }
    Some(spectrum[center - 1].max(spectrum[center]).max(spectrum[center + 1]))
}

/// Score pitch and harmonic stability
pub fn analyze(features: &SignalFeatures) -> FeatureScore {
    let voiced = features.voiced_pitches().len();
    if voiced < MIN_VOICED_FRAMES {
        return FeatureScore::neutral(AnalyzerId::HarmonicStability, voiced);
    }

    let jitters: Vec<f32> = features
        .pitch
        .windows(2)
        .filter_map(|pair| match pair {
            [Some(a), Some(b)] if *a > EPSILON => Some((b - a).abs() / a),
            _ => None,
        })
        .collect();
    if jitters.is_empty() {
        return FeatureScore::neutral(AnalyzerId::HarmonicStability, voiced);
    }
    let jitter = jitters.iter().sum::<f32>() / jitters.len() as f32;

    let bin_hz = features.bin_hz();
    let ratios: Vec<f32> = features
        .pitch
        .iter()
        .zip(&features.spectra)
        .filter_map(|(f0, spectrum)| {
            let f0 = (*f0)?;
            let h1 = harmonic_magnitude(spectrum, f0, bin_hz)?;
            let h2 = harmonic_magnitude(spectrum, 2.0 * f0, bin_hz)?;
            let h3 = harmonic_magnitude(spectrum, 3.0 * f0, bin_hz)?;
            if h1 > EPSILON {
                Some((h2 + h3) / h1)
            } else {
                None
            }
        })
        .collect();

    let (ratio_std, ratio_term) = match mean_std(&ratios) {
        Some((_, std)) if ratios.len() >= 2 => (std, score_below_floor(std, HARMONIC_RATIO_FLOOR)),
        _ => (0.0, NEUTRAL_SCORE),
    };
    let jitter_term = score_below_floor(jitter, JITTER_FLOOR);

    let score = (JITTER_WEIGHT * jitter_term + RATIO_WEIGHT * ratio_term).clamp(0.0, 1.0);

    log::debug!(
        "Harmonic stability: jitter={:.4}, ratio std={:.4}, {} voiced frames",
        jitter,
        ratio_std,
        voiced
    );

    FeatureScore::new(AnalyzerId::HarmonicStability, score)
        .with("f0_jitter", jitter)
        .with("harmonic_ratio_std", ratio_std)
        .with("voiced_frames", voiced as f32)
}
