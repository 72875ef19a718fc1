//! Audio I/O modules
//!
//! In-memory decoding with Symphonia and the immutable [`Waveform`] type.

pub mod decoder;
pub mod waveform;

pub use decoder::{decode, decode_within, FormatTag};
pub use waveform::{Waveform, WaveformInfo};
