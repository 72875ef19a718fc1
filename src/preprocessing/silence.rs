//! Silence detection on frame level contours
//!
//! A frame is silent when its level is below both an absolute floor and a gate
//! relative to the loudest frame. The same gate defines the "active" frames
//! the feature extractors work on.

use serde::{Deserialize, Serialize};

/// Silence detection configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SilenceDetector {
    /// Absolute floor in dBFS (default: -60.0)
    pub floor_db: f32,

    /// Gate relative to the loudest frame in dB (default: -35.0)
    pub relative_gate_db: f32,

    /// Minimum region duration in milliseconds (default: 200)
    pub min_duration_ms: u32,
}

impl Default for SilenceDetector {
    fn default() -> Self {
        Self {
            floor_db: -60.0,
            relative_gate_db: -35.0,
            min_duration_ms: 200,
        }
    }
}

/// A run of silent frames
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SilenceRegion {
    /// First silent frame
    pub start_frame: usize,
    /// One past the last silent frame
    pub end_frame: usize,
    /// Start time in seconds
    pub start_seconds: f32,
    /// Duration in seconds
    pub duration_seconds: f32,
}

impl SilenceRegion {
    /// Region touches neither end of the recording
    pub fn is_internal(&self, total_frames: usize) -> bool {
        self.start_frame > 0 && self.end_frame < total_frames
    }
}

impl SilenceDetector {
    /// Level threshold in dBFS for a contour whose loudest frame is `max_db`
    pub fn threshold_db(&self, max_db: f32) -> f32 {
        if max_db.is_finite() {
            self.floor_db.max(max_db + self.relative_gate_db)
        } else {
            self.floor_db
        }
    }

    /// Per-frame activity mask (`true` = above the gate)
    pub fn activity(&self, frame_db: &[f32]) -> Vec<bool> {
        let max_db = frame_db.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let threshold = self.threshold_db(max_db);
        frame_db.iter().map(|&db| db > threshold).collect()
    }

    /// Find silent regions at least `min_duration_ms` long
    ///
    /// # Arguments
    ///
    /// * `frame_db` - Per-frame level in dBFS
    /// * `hop_seconds` - Time between consecutive frames
    pub fn detect(&self, frame_db: &[f32], hop_seconds: f32) -> Vec<SilenceRegion> {
        let activity = self.activity(frame_db);
        let min_frames =
            ((self.min_duration_ms as f32 / 1000.0) / hop_seconds).ceil().max(1.0) as usize;

        let mut regions = Vec::new();
        let mut run_start: Option<usize> = None;

        for (i, &active) in activity.iter().chain(std::iter::once(&true)).enumerate() {
            match (active, run_start) {
                (false, None) => run_start = Some(i),
                (true, Some(start)) => {
                    if i - start >= min_frames {
                        regions.push(SilenceRegion {
                            start_frame: start,
                            end_frame: i,
                            start_seconds: start as f32 * hop_seconds,
                            duration_seconds: (i - start) as f32 * hop_seconds,
                        });
                    }
                    run_start = None;
                }
                _ => {}
            }
        }

        log::debug!(
            "Detected {} silence regions in {} frames",
            regions.len(),
            frame_db.len()
        );

        regions
    }
}
