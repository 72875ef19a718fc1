//! Prosody analyzer
//!
//! Utterance-level variability of intonation, loudness and speaking rate.
//! Three terms, each mapped with [`score_below_floor`] and averaged over the
//! ones that can be measured:
//!
//! | Term | Measure | Floor |
//! |------|---------|-------|
//! | Intonation | p95/p5 pitch range in semitones | 4 st |
//! | Loudness | std of active-frame level in dB | 6 dB |
//! | Rate | CV of inter-onset intervals (>= 3 onsets) | 0.3 |

use super::frames::SignalFeatures;
use super::{mean_std, score_below_floor, AnalyzerId, FeatureScore};

/// Pitch range expected from natural speech at minimum (semitones)
pub const PITCH_RANGE_FLOOR_ST: f32 = 4.0;

/// Level deviation expected from natural speech at minimum (dB)
pub const ENERGY_STD_FLOOR_DB: f32 = 6.0;

/// Inter-onset interval CV expected from natural speech at minimum
pub const ONSET_CV_FLOOR: f32 = 0.3;

/// Voiced frames needed for the intonation term
pub const MIN_VOICED_FRAMES: usize = 5;

/// Active frames needed for the loudness term
pub const MIN_ACTIVE_FRAMES: usize = 8;

/// Onsets needed for the rate term
pub const MIN_ONSETS: usize = 3;

/// Value at fraction `q` of a sorted slice (nearest rank)
fn percentile(sorted: &[f32], q: f32) -> f32 {
    let index = ((sorted.len() - 1) as f32 * q).round() as usize;
    sorted[index.min(sorted.len() - 1)]
}

/// Score intonation, loudness and rate variability
pub fn analyze(features: &SignalFeatures) -> FeatureScore {
    let mut result = FeatureScore::new(AnalyzerId::Prosody, 0.0);
    let mut terms: Vec<f32> = Vec::with_capacity(3);

    let mut pitches = features.voiced_pitches();
    if pitches.len() >= MIN_VOICED_FRAMES {
        pitches.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let low = percentile(&pitches, 0.05);
        let high = percentile(&pitches, 0.95);
        if low > 0.0 {
            let range_st = 12.0 * (high / low).log2();
            terms.push(score_below_floor(range_st, PITCH_RANGE_FLOOR_ST));
            result = result.with("pitch_range_semitones", range_st);
        }
    }

    let levels: Vec<f32> = features
        .frame_db
        .iter()
        .zip(&features.active)
        .filter(|(db, &a)| a && db.is_finite())
        .map(|(&db, _)| db)
        .collect();
    if levels.len() >= MIN_ACTIVE_FRAMES {
        if let Some((_, std)) = mean_std(&levels) {
            terms.push(score_below_floor(std, ENERGY_STD_FLOOR_DB));
            result = result.with("energy_std_db", std);
        }
    }

    if features.onsets.len() >= MIN_ONSETS {
        let intervals: Vec<f32> = features
            .onsets
            .windows(2)
            .map(|pair| (pair[1] - pair[0]) as f32 * features.hop_seconds())
            .collect();
        if let Some((mean, std)) = mean_std(&intervals) {
            if mean > 0.0 {
                let cv = std / mean;
                terms.push(score_below_floor(cv, ONSET_CV_FLOOR));
                result = result.with("onset_interval_cv", cv);
            }
        }
    }

    if terms.is_empty() {
        return FeatureScore::neutral(AnalyzerId::Prosody, features.active_count());
    }

    result.score = (terms.iter().sum::<f32>() / terms.len() as f32).clamp(0.0, 1.0);
    log::debug!("Prosody: {} terms, score={:.3}", terms.len(), result.score);
    result.with("terms", terms.len() as f32)
}
