//! Channel mixing utilities (multi-channel to mono conversion)

/// Average interleaved multi-channel samples into mono
///
/// # Arguments
///
/// * `interleaved` - Samples as `[c0, c1, .., c0, c1, ..]`
/// * `channels` - Number of interleaved channels
///
/// # Returns
///
/// One sample per frame; a trailing partial frame is dropped
pub fn interleaved_to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }

    let scale = 1.0 / channels as f32;
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() * scale)
        .collect()
}
