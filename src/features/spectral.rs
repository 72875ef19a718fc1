//! Spectral regularity analyzer
//!
//! Vocoders tend to reproduce the same spectral envelope window after window.
//! Each active frame's magnitude spectrum is scaled to unit sum (so level does
//! not matter) and the per-bin standard deviation across frames is summed into
//! an envelope deviation. Natural speech moves its envelope with every phoneme;
//! deviations under [`ENVELOPE_DEVIATION_FLOOR`] raise the score.

use super::frames::SignalFeatures;
use super::{score_below_floor, AnalyzerId, FeatureScore};

/// Envelope deviation expected from natural speech at minimum
pub const ENVELOPE_DEVIATION_FLOOR: f32 = 0.25;

/// Active frames needed before the envelope variance means anything
pub const MIN_ACTIVE_FRAMES: usize = 3;

const EPSILON: f32 = 1e-10;

/// Score spectral envelope variance
pub fn analyze(features: &SignalFeatures) -> FeatureScore {
    let envelopes: Vec<Vec<f32>> = features
        .active_frames()
        .into_iter()
        .filter_map(|i| {
            let spectrum = &features.spectra[i];
            let total: f32 = spectrum.iter().sum();
            if total > EPSILON {
                Some(spectrum.iter().map(|&m| m / total).collect())
            } else {
                None
            }
        })
        .collect();

    if envelopes.len() < MIN_ACTIVE_FRAMES {
        return FeatureScore::neutral(AnalyzerId::SpectralRegularity, envelopes.len());
    }

    let n = envelopes.len() as f32;
    let n_bins = envelopes[0].len();
    let deviation: f32 = (0..n_bins)
        .map(|bin| {
            let mean = envelopes.iter().map(|e| e[bin]).sum::<f32>() / n;
            let variance = envelopes.iter().map(|e| (e[bin] - mean).powi(2)).sum::<f32>() / n;
            variance.sqrt()
        })
        .sum();

    let flux = envelopes
        .windows(2)
        .map(|pair| pair[0].iter().zip(&pair[1]).map(|(a, b)| (a - b).abs()).sum::<f32>())
        .sum::<f32>()
        / (envelopes.len() - 1) as f32;

    let score = score_below_floor(deviation, ENVELOPE_DEVIATION_FLOOR);

    log::debug!(
        "Spectral regularity: deviation={:.4}, flux={:.4}, {} frames",
        deviation,
        flux,
        envelopes.len()
    );

    FeatureScore::new(AnalyzerId::SpectralRegularity, score)
        .with("envelope_deviation", deviation)
        .with("spectral_flux", flux)
        .with("active_frames", envelopes.len() as f32)
}
