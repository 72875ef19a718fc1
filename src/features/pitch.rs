//! Frame-level fundamental frequency estimation
//!
//! Autocorrelation pitch tracker:
//! 1. Remove the frame mean and compute the ACF (FFT accelerated)
//! 2. Normalize by the zero-lag energy (biased ACF, so longer lags are
//!    slightly penalized, which counters sub-harmonic picks)
//! 3. Find the strongest peak in the lag range of 60–400 Hz
//! 4. Take the shortest-lag local peak within 90% of it (octave guard)
//! 5. Refine the lag with parabolic interpolation
//!
//! A frame is voiced when the chosen peak reaches [`VOICING_THRESHOLD`].

use super::autocorrelation::Autocorrelator;

/// Lowest tracked fundamental (Hz)
pub const MIN_F0_HZ: f32 = 60.0;

/// Highest tracked fundamental (Hz)
pub const MAX_F0_HZ: f32 = 400.0;

/// Normalized ACF peak required to call a frame voiced
pub const VOICING_THRESHOLD: f32 = 0.45;

/// Peaks within this fraction of the maximum compete on lag
const OCTAVE_GUARD: f32 = 0.9;

/// Per-frame pitch estimator for a fixed sample rate and frame length
pub struct PitchTracker {
    sample_rate: u32,
    min_lag: usize,
    max_lag: usize,
    autocorrelator: Autocorrelator,
}

impl PitchTracker {
    /// Create a tracker for frames of `frame_size` samples
    pub fn new(sample_rate: u32, frame_size: usize) -> Self {
        let min_lag = ((sample_rate as f32 / MAX_F0_HZ).floor() as usize).max(2);
        let max_lag = ((sample_rate as f32 / MIN_F0_HZ).ceil() as usize).min(frame_size.saturating_sub(2));
        Self {
            sample_rate,
            min_lag,
            max_lag,
            autocorrelator: Autocorrelator::new(frame_size),
        }
    }

    /// Estimate f0 in Hz, `None` for unvoiced or silent frames
    pub fn estimate(&self, frame: &[f32]) -> Option<f32> {
        if self.max_lag <= self.min_lag + 1 {
            return None;
        }
        let acf = self.autocorrelator.normalized(frame)?;
        if acf.len() <= self.max_lag + 1 {
            return None;
        }

        let mut peaks = Vec::new();
        for lag in self.min_lag..=self.max_lag {
            let value = acf[lag];
            if value > acf[lag - 1] && value >= acf[lag + 1] {
                peaks.push((lag, value));
            }
        }

        let strongest = peaks.iter().map(|&(_, v)| v).fold(f32::NEG_INFINITY, f32::max);
        if !(strongest >= VOICING_THRESHOLD) {
            return None;
        }

        let (lag, value) = peaks
            .into_iter()
            .find(|&(_, v)| v >= strongest * OCTAVE_GUARD)?;

        let prev = acf[lag - 1];
        let next = acf[lag + 1];
        let denominator = prev - 2.0 * value + next;
        let offset = if denominator.abs() > 1e-9 {
            (0.5 * (prev - next) / denominator).clamp(-0.5, 0.5)
        } else {
            0.0
        };

        let f0 = self.sample_rate as f32 / (lag as f32 + offset);
        if f0.is_finite() {
            Some(f0)
        } else {
            None
        }
    }
}
