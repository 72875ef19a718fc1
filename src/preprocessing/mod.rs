//! Audio preprocessing modules
//!
//! This module contains utilities for preparing audio for analysis:
//! - Normalization (peak, RMS)
//! - Silence detection
//! - Channel mixing (multi-channel to mono)
//! - Resampling to the canonical analysis rate

pub mod channel_mixer;
pub mod normalization;
pub mod resample;
pub mod silence;
