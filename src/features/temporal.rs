//! Temporal regularity analyzer
//!
//! Frame-synthesized audio often carries an energy contour that repeats or
//! barely moves. Two measurements on the RMS contour:
//!
//! - **Periodicity**: strongest normalized autocorrelation peak after the
//!   initial decay, for lags up to [`MAX_LAG_SECONDS`]. A contour with no
//!   variance at all counts as fully periodic.
//! - **Steadiness**: coefficient of variation of active-frame RMS, mapped with
//!   [`ENERGY_CV_FLOOR`].
//!
//! `score = 0.6 · periodicity + 0.4 · steadiness`

use super::autocorrelation::{peak_after_first_minimum, Autocorrelator};
use super::frames::SignalFeatures;
use super::{mean_std, score_below_floor, AnalyzerId, FeatureScore};

/// Energy CV expected from natural speech at minimum
pub const ENERGY_CV_FLOOR: f32 = 0.6;

/// CV below which a contour is read as steady even without an ACF peak
pub const STEADY_CV_FLOOR: f32 = 0.05;

/// Longest lag searched for periodicity
pub const MAX_LAG_SECONDS: f32 = 1.0;

/// Active frames needed for a contour
pub const MIN_ACTIVE_FRAMES: usize = 8;

const PERIODICITY_WEIGHT: f32 = 0.6;
const STEADINESS_WEIGHT: f32 = 0.4;

/// Score energy contour periodicity
pub fn analyze(features: &SignalFeatures) -> FeatureScore {
    let active = features.active_count();
    if active < MIN_ACTIVE_FRAMES {
        return FeatureScore::neutral(AnalyzerId::TemporalRegularity, active);
    }

    let active_rms: Vec<f32> = features
        .frame_rms
        .iter()
        .zip(&features.active)
        .filter(|&(_, &a)| a)
        .map(|(&rms, _)| rms)
        .collect();
    let cv = match mean_std(&active_rms) {
        Some((mean, std)) if mean > 0.0 => std / mean,
        _ => return FeatureScore::neutral(AnalyzerId::TemporalRegularity, active),
    };

    let contour = &features.frame_rms;
    let max_lag = ((MAX_LAG_SECONDS / features.hop_seconds()).round() as usize).max(3);
    let acf_periodicity = match Autocorrelator::new(contour.len()).normalized(contour) {
        Some(acf) => peak_after_first_minimum(&acf, 2, max_lag)
            .map(|(_, value)| value.clamp(0.0, 1.0))
            .unwrap_or(0.0),
        None => 1.0,
    };
    let periodicity = acf_periodicity.max(score_below_floor(cv, STEADY_CV_FLOOR));
    let steadiness = score_below_floor(cv, ENERGY_CV_FLOOR);

    let score = (PERIODICITY_WEIGHT * periodicity + STEADINESS_WEIGHT * steadiness).clamp(0.0, 1.0);

    log::debug!(
        "Temporal regularity: periodicity={:.3}, energy_cv={:.3}",
        periodicity,
        cv
    );

    FeatureScore::new(AnalyzerId::TemporalRegularity, score)
        .with("periodicity", periodicity)
        .with("energy_cv", cv)
        .with("active_frames", active as f32)
}
