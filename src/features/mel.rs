//! Mel filterbank and cepstral coefficients
//!
//! Triangular filters equally spaced on the HTK mel scale
//! (`mel = 2595 · log10(1 + f / 700)`), log filter energies, then an
//! orthonormal DCT-II.

/// Floor applied before the logarithm
const LOG_FLOOR: f32 = 1e-10;

fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10.0_f32.powf(mel / 2595.0) - 1.0)
}

/// Triangular mel filterbank over a one-sided power spectrum
#[derive(Debug, Clone)]
pub struct MelFilterbank {
    /// `(first_bin, weights)` per filter
    filters: Vec<(usize, Vec<f32>)>,
}

impl MelFilterbank {
    /// Build `n_filters` filters spanning `min_hz..max_hz`
    ///
    /// # Arguments
    ///
    /// * `n_bins` - Bins in the one-sided spectrum (`frame_size / 2 + 1`)
    /// * `sample_rate` - Sample rate in Hz
    pub fn new(n_filters: usize, n_bins: usize, sample_rate: u32, min_hz: f32, max_hz: f32) -> Self {
        let nyquist = sample_rate as f32 / 2.0;
        let max_hz = max_hz.min(nyquist);
        let bin_hz = nyquist / (n_bins.saturating_sub(1).max(1)) as f32;

        let mel_min = hz_to_mel(min_hz);
        let mel_max = hz_to_mel(max_hz);
        let edges: Vec<f32> = (0..n_filters + 2)
            .map(|i| mel_to_hz(mel_min + (mel_max - mel_min) * i as f32 / (n_filters + 1) as f32))
            .collect();

        let filters = (0..n_filters)
            .map(|m| {
                let (left, center, right) = (edges[m], edges[m + 1], edges[m + 2]);
                let first = (left / bin_hz).floor() as usize;
                let last = ((right / bin_hz).ceil() as usize).min(n_bins.saturating_sub(1));
                let weights = (first..=last)
                    .map(|bin| {
                        let hz = bin as f32 * bin_hz;
                        if hz <= left || hz >= right {
                            0.0
                        } else if hz <= center {
                            (hz - left) / (center - left)
                        } else {
                            (right - hz) / (right - center)
                        }
                    })
                    .collect();
                (first, weights)
            })
            .collect();

        Self { filters }
    }

    /// Number of filters
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// True when the bank has no filters
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Natural-log filter energies of a power spectrum
    pub fn log_energies(&self, power_spectrum: &[f32]) -> Vec<f32> {
        self.filters
            .iter()
            .map(|(first, weights)| {
                let energy: f32 = weights
                    .iter()
                    .enumerate()
                    .filter_map(|(i, w)| power_spectrum.get(first + i).map(|p| p * w))
                    .sum();
                energy.max(LOG_FLOOR).ln()
            })
            .collect()
    }
}

/// Orthonormal DCT-II, first `n_coeffs` coefficients
pub fn dct_ii(input: &[f32], n_coeffs: usize) -> Vec<f32> {
    let n = input.len();
    if n == 0 {
        return vec![0.0; n_coeffs];
    }
    let scale0 = (1.0 / n as f32).sqrt();
    let scale = (2.0 / n as f32).sqrt();
    (0..n_coeffs)
        .map(|k| {
            let sum: f32 = input
                .iter()
                .enumerate()
                .map(|(i, &x)| {
                    x * (std::f32::consts::PI * k as f32 * (i as f32 + 0.5) / n as f32).cos()
                })
                .sum();
            sum * if k == 0 { scale0 } else { scale }
        })
        .collect()
}
