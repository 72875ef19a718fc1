//! Sample rate conversion using rubato
//!
//! Every decoded recording is brought to the canonical analysis rate before
//! framing, so frame and hop sizes mean the same duration for every input.

use rubato::{FastFixedIn, PolynomialDegree, Resampler};

use crate::error::AnalysisError;

/// Resample mono audio to `output_rate`
///
/// Returns a copy when the rates already match.
pub fn resample_mono(
    input: &[f32],
    input_rate: u32,
    output_rate: u32,
) -> Result<Vec<f32>, AnalysisError> {
    if input_rate == output_rate || input.is_empty() {
        return Ok(input.to_vec());
    }

    if input_rate == 0 {
        return Err(AnalysisError::Decode("source sample rate is 0".to_string()));
    }

    log::debug!(
        "Resampling {} samples from {} Hz to {} Hz",
        input.len(),
        input_rate,
        output_rate
    );

    // Whole signal in one chunk: no streaming state to carry between calls
    let mut resampler = FastFixedIn::<f32>::new(
        output_rate as f64 / input_rate as f64,
        1.0,
        PolynomialDegree::Septic,
        input.len(),
        1,
    )
    .map_err(|e| AnalysisError::Decode(format!("Failed to create resampler: {}", e)))?;

    let mut output = resampler
        .process(&[input], None)
        .map_err(|e| AnalysisError::Decode(format!("Resampling failed: {}", e)))?;

    Ok(output.pop().unwrap_or_default())
}
