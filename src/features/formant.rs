//! Formant consistency analyzer
//!
//! Formants are estimated per active frame by peak picking on a smoothed
//! magnitude spectrum (triangular kernel `[1, 2, 3, 2, 1] / 9`, parabolic
//! refinement), keeping the three strongest peaks in 200–4000 Hz sorted by
//! frequency. Across triplets of consecutive frames with the same number of
//! peaks, the second difference `F[n+1] - 2·F[n] + F[n-1]` of each track tells
//! how curved a transition is. Real articulation produces curved, uneven
//! transitions; interpolating synthesizers produce straight ones.
//!
//! `score = 0.5 · curvature term + 0.5 · fraction of linear triplets`

use super::frames::SignalFeatures;
use super::{score_below_floor, AnalyzerId, FeatureScore};

/// Lowest formant frequency searched (Hz)
pub const MIN_FORMANT_HZ: f32 = 200.0;

/// Highest formant frequency searched (Hz)
pub const MAX_FORMANT_HZ: f32 = 4000.0;

/// Formants tracked per frame
pub const MAX_FORMANTS: usize = 3;

/// Peaks weaker than this fraction of the frame maximum are ignored
pub const PEAK_RELATIVE_THRESHOLD: f32 = 0.05;

/// Normalized curvature expected from natural speech at minimum
pub const CURVATURE_FLOOR: f32 = 0.05;

/// Second difference below this is a perfectly linear transition (Hz)
pub const LINEAR_TOLERANCE_HZ: f32 = 1.0;

/// Transitions faster than this are physiologically implausible (Hz per frame)
pub const MAX_NATURAL_TRANSITION_HZ: f32 = 300.0;

/// Formant observations over triplets needed
pub const MIN_OBSERVATIONS: usize = 3;

const SMOOTHING_KERNEL: [f32; 5] = [1.0 / 9.0, 2.0 / 9.0, 3.0 / 9.0, 2.0 / 9.0, 1.0 / 9.0];

fn smooth(spectrum: &[f32]) -> Vec<f32> {
    let n = spectrum.len() as isize;
    (0..n)
        .map(|i| {
            SMOOTHING_KERNEL
                .iter()
                .enumerate()
                .map(|(k, &w)| {
                    let j = (i + k as isize - 2).clamp(0, n - 1);
                    w * spectrum[j as usize]
                })
                .sum()
        })
        .collect()
}

/// Formant frequencies of one magnitude spectrum, ascending
pub fn pick_formants(spectrum: &[f32], bin_hz: f32) -> Vec<f32> {
    if spectrum.len() < 3 || bin_hz <= 0.0 {
        return Vec::new();
    }
    let smoothed = smooth(spectrum);
    let first = ((MIN_FORMANT_HZ / bin_hz).ceil() as usize).max(1);
    let last = ((MAX_FORMANT_HZ / bin_hz).floor() as usize).min(smoothed.len() - 2);
    if first > last {
        return Vec::new();
    }

    let max = smoothed[first..=last].iter().copied().fold(0.0f32, f32::max);
    if max <= 0.0 {
        return Vec::new();
    }

    let mut peaks: Vec<(f32, f32)> = (first..=last)
        .filter(|&i| {
            smoothed[i] > smoothed[i - 1]
                && smoothed[i] >= smoothed[i + 1]
                && smoothed[i] >= PEAK_RELATIVE_THRESHOLD * max
        })
        .map(|i| {
            let (prev, value, next) = (smoothed[i - 1], smoothed[i], smoothed[i + 1]);
            let denominator = prev - 2.0 * value + next;
            let offset = if denominator.abs() > 1e-12 {
                (0.5 * (prev - next) / denominator).clamp(-0.5, 0.5)
            } else {
                0.0
            };
            ((i as f32 + offset) * bin_hz, value)
        })
        .collect();

    peaks.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    peaks.truncate(MAX_FORMANTS);
    let mut formants: Vec<f32> = peaks.into_iter().map(|(hz, _)| hz).collect();
    formants.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    formants
}

/// Score formant transition shape
pub fn analyze(features: &SignalFeatures) -> FeatureScore {
    let bin_hz = features.bin_hz();
    let tracks: Vec<Option<Vec<f32>>> = features
        .spectra
        .iter()
        .zip(&features.active)
        .map(|(spectrum, &active)| {
            if active {
                Some(pick_formants(spectrum, bin_hz)).filter(|f| !f.is_empty())
            } else {
                None
            }
        })
        .collect();

    let mut transitions = 0usize;
    let mut fast_transitions = 0usize;
    for pair in tracks.windows(2) {
        if let [Some(a), Some(b)] = pair {
            if a.len() == b.len() {
                for (fa, fb) in a.iter().zip(b) {
                    transitions += 1;
                    if (fb - fa).abs() > MAX_NATURAL_TRANSITION_HZ {
                        fast_transitions += 1;
                    }
                }
            }
        }
    }

    let mut curvature_sum = 0.0f32;
    let mut linear = 0usize;
    let mut observations = 0usize;
    for window in tracks.windows(3) {
        if let [Some(a), Some(b), Some(c)] = window {
            if a.len() != b.len() || b.len() != c.len() {
                continue;
            }
            for k in 0..b.len() {
                let second_difference = (c[k] - 2.0 * b[k] + a[k]).abs();
                curvature_sum += second_difference / b[k].max(MIN_FORMANT_HZ);
                if second_difference < LINEAR_TOLERANCE_HZ {
                    linear += 1;
                }
                observations += 1;
            }
        }
    }

    if observations < MIN_OBSERVATIONS {
        return FeatureScore::neutral(AnalyzerId::FormantConsistency, observations);
    }

    let curvature = curvature_sum / observations as f32;
    let linear_fraction = linear as f32 / observations as f32;
    let fast_fraction = if transitions > 0 {
        fast_transitions as f32 / transitions as f32
    } else {
        0.0
    };

    let score = (0.5 * score_below_floor(curvature, CURVATURE_FLOOR) + 0.5 * linear_fraction)
        .clamp(0.0, 1.0);

    log::debug!(
        "Formant consistency: curvature={:.4}, linear={:.3}, fast={:.3}",
        curvature,
        linear_fraction,
        fast_fraction
    );

    FeatureScore::new(AnalyzerId::FormantConsistency, score)
        .with("normalized_curvature", curvature)
        .with("linear_fraction", linear_fraction)
        .with("fast_transition_fraction", fast_fraction)
        .with("observations", observations as f32)
}
