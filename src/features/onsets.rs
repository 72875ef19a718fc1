//! Energy flux onset detection on a frame level contour
//!
//! Detects syllable-like onsets by finding peaks in the positive level
//! derivative.
//!
//! Algorithm:
//! 1. Floor the dB contour at the silence floor
//! 2. Compute level flux: `flux[n] = max(0, L[n] - L[n-1])`
//! 3. Keep local maxima above both an absolute rise and a threshold relative
//!    to the strongest rise
//! 4. Enforce a minimum gap between onsets
//!
//! # Reference
//!
//! Bello, J. P., Daudet, L., Abdallah, S., Duxbury, C., Davies, M., & Sandler, M. B. (2005).
//! A Tutorial on Onset Detection in Music Signals.
//! *IEEE Transactions on Speech and Audio Processing*, 13(5), 1035-1047.

/// Smallest level rise between frames that counts as an onset (dB)
pub const MIN_ONSET_RISE_DB: f32 = 3.0;

/// Threshold relative to the largest rise (dB)
pub const RELATIVE_THRESHOLD_DB: f32 = -12.0;

/// Detect onsets in a dB contour
///
/// # Arguments
///
/// * `frame_db` - Per-frame level in dBFS (may contain `-inf`)
/// * `floor_db` - Levels below this are treated as the floor
/// * `min_gap_frames` - Minimum distance between reported onsets
///
/// # Returns
///
/// Frame indices of onsets, sorted
pub fn detect_level_onsets(frame_db: &[f32], floor_db: f32, min_gap_frames: usize) -> Vec<usize> {
    if frame_db.len() < 3 {
        return Vec::new();
    }

    let level: Vec<f32> = frame_db.iter().map(|&db| db.max(floor_db)).collect();
    let flux: Vec<f32> = level.windows(2).map(|w| (w[1] - w[0]).max(0.0)).collect();

    let max_flux = flux.iter().copied().fold(0.0f32, f32::max);
    if max_flux < MIN_ONSET_RISE_DB {
        log::debug!("Largest level rise {:.2} dB, no onsets", max_flux);
        return Vec::new();
    }

    // dB flux: the relative threshold is a dB offset from the largest rise
    let threshold = MIN_ONSET_RISE_DB.max(max_flux + RELATIVE_THRESHOLD_DB);

    let mut onsets: Vec<usize> = Vec::new();
    for i in 0..flux.len() {
        let value = flux[i];
        let prev = if i > 0 { flux[i - 1] } else { 0.0 };
        let next = flux.get(i + 1).copied().unwrap_or(0.0);
        if value >= threshold && value > prev && value >= next {
            // flux[i] is the step into frame i + 1
            let onset = i + 1;
            match onsets.last() {
                Some(&last) if onset < last + min_gap_frames.max(1) => {}
                _ => onsets.push(onset),
            }
        }
    }

    log::debug!(
        "Level flux: max={:.2} dB, threshold={:.2} dB, {} onsets",
        max_flux,
        threshold,
        onsets.len()
    );

    onsets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_onsets() {
        // Bursts every 10 frames
        let frame_db: Vec<f32> = (0..60)
            .map(|i| if i % 10 < 4 { -10.0 } else { -50.0 })
            .collect();
        let onsets = detect_level_onsets(&frame_db, -60.0, 3);
        assert_eq!(onsets, vec![10, 20, 30, 40, 50]);
    }

    #[test]
    fn test_flat_contour_has_no_onsets() {
        let frame_db = vec![-6.0f32; 100];
        assert!(detect_level_onsets(&frame_db, -60.0, 3).is_empty());
    }

    #[test]
    fn test_silence_has_no_onsets() {
        let frame_db = vec![f32::NEG_INFINITY; 100];
        assert!(detect_level_onsets(&frame_db, -60.0, 3).is_empty());
    }

    #[test]
    fn test_min_gap() {
        let frame_db = vec![-60.0, -30.0, -40.0, -10.0, -10.0, -10.0];
        let onsets = detect_level_onsets(&frame_db, -60.0, 5);
        assert_eq!(onsets, vec![1]);
    }
}
