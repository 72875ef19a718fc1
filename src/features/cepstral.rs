//! Naturalness analyzer (cepstral trajectory smoothness)
//!
//! Articulation moves the vocal tract constantly, so MFCC trajectories of real
//! speech are jagged from frame to frame. Generative models tend to produce
//! trajectories that are too smooth. The analyzer computes 13 MFCCs per active
//! frame (26 mel bands, DCT-II), drops c0 (level), and takes the RMS of the
//! second frame difference of c1..c12 over runs of consecutive active frames.

use super::frames::SignalFeatures;
use super::mel::{dct_ii, MelFilterbank};
use super::{score_below_floor, AnalyzerId, FeatureScore};

/// Mel bands
pub const MEL_BANDS: usize = 26;

/// Cepstral coefficients computed per frame (c0 included)
pub const MFCC_COEFFICIENTS: usize = 13;

/// Second-difference RMS expected from natural speech at minimum
pub const ACCELERATION_FLOOR: f32 = 0.6;

/// Consecutive active triplets needed
pub const MIN_TRIPLETS: usize = 3;

const MIN_HZ: f32 = 60.0;

/// Score MFCC trajectory smoothness
pub fn analyze(features: &SignalFeatures) -> FeatureScore {
    let n_bins = features.frame_size / 2 + 1;
    let bank = MelFilterbank::new(
        MEL_BANDS,
        n_bins,
        features.sample_rate,
        MIN_HZ,
        features.sample_rate as f32 / 2.0,
    );

    let mfcc: Vec<Option<Vec<f32>>> = features
        .spectra
        .iter()
        .zip(&features.active)
        .map(|(spectrum, &active)| {
            if !active {
                return None;
            }
            let power: Vec<f32> = spectrum.iter().map(|&m| m * m).collect();
            let coeffs = dct_ii(&bank.log_energies(&power), MFCC_COEFFICIENTS);
            Some(coeffs[1..].to_vec())
        })
        .collect();

    let mut sum_squares = 0.0f32;
    let mut count = 0usize;
    let mut triplets = 0usize;
    for window in mfcc.windows(3) {
        if let [Some(a), Some(b), Some(c)] = window {
            for k in 0..a.len() {
                let acceleration = c[k] - 2.0 * b[k] + a[k];
                sum_squares += acceleration * acceleration;
                count += 1;
            }
            triplets += 1;
        }
    }

    if triplets < MIN_TRIPLETS || count == 0 {
        return FeatureScore::neutral(AnalyzerId::Naturalness, triplets);
    }

    let acceleration_rms = (sum_squares / count as f32).sqrt();
    let score = score_below_floor(acceleration_rms, ACCELERATION_FLOOR);

    log::debug!(
        "Naturalness: delta2 rms={:.4} over {} triplets",
        acceleration_rms,
        triplets
    );

    FeatureScore::new(AnalyzerId::Naturalness, score)
        .with("mfcc_acceleration_rms", acceleration_rms)
        .with("triplets", triplets as f32)
}
