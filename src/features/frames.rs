//! Shared frame-level representation of a waveform
//!
//! Every analyzer and the scam detector read the same contours, so they are
//! computed once per waveform:
//! - per-frame RMS and level (dBFS) with an activity mask
//! - Hann-windowed magnitude spectra
//! - per-frame pitch
//! - level onsets
//!
//! # Example
//!
//! ```
//! use voiceshield_dsp::features::frames::SignalFeatures;
//! use voiceshield_dsp::io::Waveform;
//!
//! let waveform = Waveform::new(vec![0.0f32; 16000], 16000)?;
//! let features = SignalFeatures::compute(&waveform, 512, 256);
//! assert!(features.is_silent());
//! # Ok::<(), voiceshield_dsp::AnalysisError>(())
//! ```

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use super::onsets::detect_level_onsets;
use super::pitch::PitchTracker;
use crate::io::Waveform;
use crate::preprocessing::normalization::{to_db, LoudnessMetadata};
use crate::preprocessing::silence::SilenceDetector;

/// Minimum distance between onsets (seconds), roughly a short syllable
const MIN_ONSET_GAP_SECONDS: f32 = 0.08;

/// Frame-level contours of one waveform
#[derive(Debug, Clone)]
pub struct SignalFeatures {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Frame size in samples
    pub frame_size: usize,
    /// Hop size in samples
    pub hop_size: usize,
    /// Waveform duration in seconds
    pub duration_seconds: f32,
    /// Level of the source before normalization
    pub source_loudness: LoudnessMetadata,
    /// RMS per frame
    pub frame_rms: Vec<f32>,
    /// Level per frame in dBFS (`-inf` for digital silence)
    pub frame_db: Vec<f32>,
    /// Frames above the silence gate
    pub active: Vec<bool>,
    /// Magnitude spectrum per frame (`frame_size / 2 + 1` bins)
    pub spectra: Vec<Vec<f32>>,
    /// Fundamental frequency per frame, `None` when unvoiced or inactive
    pub pitch: Vec<Option<f32>>,
    /// Level onsets (frame indices)
    pub onsets: Vec<usize>,
    /// Gate used for the activity mask
    pub silence: SilenceDetector,
}

/// Periodic Hann window
fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f32::consts::PI * i as f32 / size as f32).cos())
        .collect()
}

/// Split samples into overlapping frames; input shorter than one frame
/// becomes a single zero-padded frame
fn frame_signal(samples: &[f32], frame_size: usize, hop_size: usize) -> Vec<Vec<f32>> {
    if samples.len() <= frame_size {
        let mut frame = samples.to_vec();
        frame.resize(frame_size, 0.0);
        return vec![frame];
    }
    let num_frames = (samples.len() - frame_size) / hop_size + 1;
    (0..num_frames)
        .map(|i| samples[i * hop_size..i * hop_size + frame_size].to_vec())
        .collect()
}

impl SignalFeatures {
    /// Compute all contours for `waveform`
    pub fn compute(waveform: &Waveform, frame_size: usize, hop_size: usize) -> Self {
        let sample_rate = waveform.sample_rate();
        let frames = frame_signal(waveform.samples(), frame_size, hop_size.max(1));

        log::debug!(
            "Computing signal features: {} frames of {} samples, hop {}",
            frames.len(),
            frame_size,
            hop_size
        );

        let frame_rms: Vec<f32> = frames
            .iter()
            .map(|frame| (frame.iter().map(|&x| x * x).sum::<f32>() / frame_size as f32).sqrt())
            .collect();
        let frame_db: Vec<f32> = frame_rms.iter().map(|&rms| to_db(rms)).collect();

        let silence = SilenceDetector::default();
        let active = silence.activity(&frame_db);

        let window = hann_window(frame_size);
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(frame_size);
        let n_bins = frame_size / 2 + 1;

        let spectra: Vec<Vec<f32>> = frames
            .iter()
            .map(|frame| {
                let mut buffer: Vec<Complex<f32>> = frame
                    .iter()
                    .zip(&window)
                    .map(|(&x, &w)| Complex::new(x * w, 0.0))
                    .collect();
                fft.process(&mut buffer);
                buffer[..n_bins].iter().map(|c| c.norm()).collect()
            })
            .collect();

        let tracker = PitchTracker::new(sample_rate, frame_size);
        let pitch: Vec<Option<f32>> = frames
            .iter()
            .zip(&active)
            .map(|(frame, &is_active)| if is_active { tracker.estimate(frame) } else { None })
            .collect();

        let hop_seconds = hop_size.max(1) as f32 / sample_rate as f32;
        let min_gap = (MIN_ONSET_GAP_SECONDS / hop_seconds).round() as usize;
        let onsets = detect_level_onsets(&frame_db, silence.floor_db, min_gap);

        Self {
            sample_rate,
            frame_size,
            hop_size: hop_size.max(1),
            duration_seconds: waveform.duration_seconds(),
            source_loudness: waveform.source_loudness(),
            frame_rms,
            frame_db,
            active,
            spectra,
            pitch,
            onsets,
            silence,
        }
    }

    /// Number of frames
    pub fn frame_count(&self) -> usize {
        self.frame_rms.len()
    }

    /// Seconds between consecutive frames
    pub fn hop_seconds(&self) -> f32 {
        self.hop_size as f32 / self.sample_rate as f32
    }

    /// Width of one spectrum bin in Hz
    pub fn bin_hz(&self) -> f32 {
        self.sample_rate as f32 / self.frame_size as f32
    }

    /// Indices of active frames
    pub fn active_frames(&self) -> Vec<usize> {
        (0..self.frame_count()).filter(|&i| self.active[i]).collect()
    }

    /// Number of active frames
    pub fn active_count(&self) -> usize {
        self.active.iter().filter(|&&a| a).count()
    }

    /// No frame passes the silence gate
    pub fn is_silent(&self) -> bool {
        self.active_count() == 0
    }

    /// Pitch values of voiced frames in time order
    pub fn voiced_pitches(&self) -> Vec<f32> {
        self.pitch.iter().flatten().copied().collect()
    }

    /// Median level of active frames in dBFS
    pub fn median_active_db(&self) -> Option<f32> {
        let mut levels: Vec<f32> = self
            .frame_db
            .iter()
            .zip(&self.active)
            .filter(|&(_, &a)| a)
            .map(|(&db, _)| db)
            .collect();
        if levels.is_empty() {
            return None;
        }
        levels.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        Some(levels[levels.len() / 2])
    }
}
