//! One detection rule per [`ScamPattern`]
//!
//! Each rule returns `Some(indicator)` when its cue is present. Rules only
//! read [`SignalFeatures`] and their own parameters.

use super::{ScamDetectorConfig, ScamIndicator, ScamPattern};
use crate::features::autocorrelation::{peak_after_first_minimum, Autocorrelator};
use crate::features::frames::SignalFeatures;
use crate::features::mean_std;
use crate::preprocessing::normalization::to_db;

fn seconds_to_frames(seconds: f32, features: &SignalFeatures) -> usize {
    (seconds / features.hop_seconds()).round().max(1.0) as usize
}

/// Loudness jump held for a while near either end of the recording
///
/// A run of frames at least `urgency_rise_db` above the median active level,
/// lasting `urgency_min_seconds`, that either starts the recording or is
/// entered from below median + `urgency_entry_db` within
/// `urgency_entry_seconds`. The run has to touch the first or last
/// `urgency_edge_seconds`. Strength is the mean excess over the median divided
/// by `urgency_full_scale_db`.
pub fn urgency_burst(features: &SignalFeatures, config: &ScamDetectorConfig) -> Option<ScamIndicator> {
    let median = features.median_active_db()?;
    let frames = features.frame_count();
    let hot = median + config.urgency_rise_db;
    let entry = median + config.urgency_entry_db;
    let min_run = seconds_to_frames(config.urgency_min_seconds, features);
    let entry_window = seconds_to_frames(config.urgency_entry_seconds, features);
    let edge = seconds_to_frames(config.urgency_edge_seconds, features);

    let mut best: Option<f32> = None;
    let mut i = 0;
    while i < frames {
        if features.frame_db[i] < hot {
            i += 1;
            continue;
        }
        let start = i;
        while i < frames && features.frame_db[i] >= hot {
            i += 1;
        }
        let end = i;

        let long_enough = end - start >= min_run;
        let near_edge = start < edge || end + edge > frames;
        let entered_quickly = start == 0
            || features.frame_db[start.saturating_sub(entry_window)..start]
                .iter()
                .any(|&db| db < entry);

        if long_enough && near_edge && entered_quickly {
            let excess = features.frame_db[start..end].iter().map(|&db| db - median).sum::<f32>()
                / (end - start) as f32;
            log::debug!(
                "Urgency burst: frames {}..{}, mean excess {:.1} dB",
                start,
                end,
                excess
            );
            best = Some(best.map_or(excess, |b: f32| b.max(excess)));
        }
    }

    best.map(|excess| {
        ScamIndicator::new(ScamPattern::UrgencyBurst, excess / config.urgency_full_scale_db)
    })
}

/// Energy contour that repeats at a lag of at least `repetition_min_lag_seconds`
///
/// Uses the lag-unbiased normalized autocorrelation of the RMS contour up to
/// half the recording, so a loop that plays twice still correlates fully.
/// Strength is the correlation peak.
pub fn repetition_loop(features: &SignalFeatures, config: &ScamDetectorConfig) -> Option<ScamIndicator> {
    let contour = &features.frame_rms;
    let n = contour.len();
    let min_lag = seconds_to_frames(config.repetition_min_lag_seconds, features);
    let max_lag = n / 2;
    if max_lag <= min_lag {
        return None;
    }

    let active: Vec<f32> = contour
        .iter()
        .zip(&features.active)
        .filter(|&(_, &a)| a)
        .map(|(&rms, _)| rms)
        .collect();
    match mean_std(&active) {
        Some((mean, std)) if mean > 0.0 && std / mean > config.repetition_min_cv => {}
        _ => return None,
    }

    let biased = Autocorrelator::new(n).normalized(contour)?;
    let acf: Vec<f32> = biased
        .iter()
        .enumerate()
        .map(|(lag, &r)| (r * n as f32 / (n - lag) as f32).min(1.0))
        .collect();

    let (lag, peak) = peak_after_first_minimum(&acf, min_lag, max_lag)?;
    if peak < config.repetition_min_correlation {
        return None;
    }
    log::debug!(
        "Repetition loop: lag {:.2} s, correlation {:.3}",
        lag as f32 * features.hop_seconds(),
        peak
    );
    Some(ScamIndicator::new(ScamPattern::RepetitionLoop, peak))
}

/// Internal pauses of near-identical length
///
/// Needs `pause_min_count` silences inside the recording (as found by the
/// silence detector) whose duration CV is below `pause_max_cv`. Strength is
/// `1 - cv / pause_max_cv`, at least `pause_min_strength`.
pub fn unnatural_pause_pattern(
    features: &SignalFeatures,
    config: &ScamDetectorConfig,
) -> Option<ScamIndicator> {
    let frames = features.frame_count();
    let durations: Vec<f32> = features
        .silence
        .detect(&features.frame_db, features.hop_seconds())
        .into_iter()
        .filter(|region| region.is_internal(frames))
        .map(|region| region.duration_seconds)
        .collect();
    if durations.len() < config.pause_min_count {
        return None;
    }

    let (mean, std) = mean_std(&durations)?;
    if mean <= 0.0 {
        return None;
    }
    let cv = std / mean;
    if cv >= config.pause_max_cv {
        return None;
    }
    log::debug!("Pause pattern: {} pauses, duration cv {:.3}", durations.len(), cv);
    Some(ScamIndicator::new(
        ScamPattern::UnnaturalPausePattern,
        (1.0 - cv / config.pause_max_cv).max(config.pause_min_strength),
    ))
}

/// Loud delivery over the whole recording
///
/// Mean power of the active frames, taken back to the source level by removing
/// the normalization gain. Fires at `high_energy_rms_db`; strength starts at
/// 0.5 and reaches 1.0 ten dB higher.
pub fn sustained_high_energy(
    features: &SignalFeatures,
    config: &ScamDetectorConfig,
) -> Option<ScamIndicator> {
    let powers: Vec<f32> = features
        .frame_rms
        .iter()
        .zip(&features.active)
        .filter(|&(_, &a)| a)
        .map(|(&rms, _)| rms * rms)
        .collect();
    if powers.is_empty() {
        return None;
    }
    let mean_power = powers.iter().sum::<f32>() / powers.len() as f32;
    let source_rms_db = to_db(mean_power.sqrt()) - features.source_loudness.gain_db;
    if !(source_rms_db >= config.high_energy_rms_db) {
        return None;
    }
    log::debug!("High energy: source rms {:.1} dBFS", source_rms_db);
    Some(ScamIndicator::new(
        ScamPattern::SustainedHighEnergy,
        0.5 + (source_rms_db - config.high_energy_rms_db) / 10.0,
    ))
}
