//! FFT-accelerated autocorrelation
//!
//! Uses the identity `ACF = IFFT(|FFT(signal)|²)` with zero padding to twice
//! the signal length, so the result is the linear (not circular)
//! autocorrelation. Shared by the pitch tracker (per frame), the temporal
//! regularity analyzer and the repetition rule (per contour).

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

const EPSILON: f32 = 1e-10;

/// Reusable forward/inverse FFT pair for signals up to a fixed length
pub struct Autocorrelator {
    max_len: usize,
    fft_size: usize,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
}

impl Autocorrelator {
    /// Plan FFTs for signals of at most `max_len` samples
    pub fn new(max_len: usize) -> Self {
        let fft_size = (2 * max_len.max(1)).next_power_of_two();
        let mut planner = FftPlanner::new();
        Self {
            max_len,
            fft_size,
            forward: planner.plan_fft_forward(fft_size),
            inverse: planner.plan_fft_inverse(fft_size),
        }
    }

    /// Raw autocorrelation for lags `0..signal.len()`
    ///
    /// Signals longer than the planned length are truncated.
    pub fn compute(&self, signal: &[f32]) -> Vec<f32> {
        let n = signal.len().min(self.max_len);
        if n == 0 {
            return Vec::new();
        }

        let mut buffer: Vec<Complex<f32>> = signal[..n]
            .iter()
            .map(|&x| Complex::new(x, 0.0))
            .collect();
        buffer.resize(self.fft_size, Complex::new(0.0, 0.0));

        self.forward.process(&mut buffer);
        for x in &mut buffer {
            *x = Complex::new(x.norm_sqr(), 0.0);
        }
        self.inverse.process(&mut buffer);

        let scale = 1.0 / self.fft_size as f32;
        buffer[..n].iter().map(|x| x.re * scale).collect()
    }

    /// Mean-removed autocorrelation divided by its zero-lag value
    ///
    /// Returns `None` for a signal with (numerically) no variance.
    pub fn normalized(&self, signal: &[f32]) -> Option<Vec<f32>> {
        if signal.is_empty() {
            return None;
        }
        let mean = signal.iter().sum::<f32>() / signal.len() as f32;
        let centered: Vec<f32> = signal.iter().map(|&x| x - mean).collect();
        let acf = self.compute(&centered);
        let zero_lag = acf.first().copied().unwrap_or(0.0);
        if zero_lag <= EPSILON {
            return None;
        }
        Some(acf.iter().map(|&r| r / zero_lag).collect())
    }
}

/// Strongest local maximum of a normalized ACF once it has passed its first
/// local minimum
///
/// Skipping the initial decay keeps a slowly varying contour from reading as
/// periodic. Searches lags in `min_lag..=max_lag`.
///
/// # Returns
///
/// `(lag, value)` of the peak, `None` if no peak exists in range
pub fn peak_after_first_minimum(acf: &[f32], min_lag: usize, max_lag: usize) -> Option<(usize, f32)> {
    if acf.len() < 3 {
        return None;
    }
    let max_lag = max_lag.min(acf.len() - 2);

    // First local minimum of the decay from lag 0
    let mut start = 1;
    while start + 1 < acf.len() && acf[start + 1] < acf[start] {
        start += 1;
    }
    let start = start.max(min_lag).max(1);

    let mut best: Option<(usize, f32)> = None;
    for lag in start..=max_lag {
        let value = acf[lag];
        if value > acf[lag - 1] && value >= acf[lag + 1] {
            match best {
                Some((_, best_value)) if best_value >= value => {}
                _ => best = Some((lag, value)),
            }
        }
    }
    best
}
