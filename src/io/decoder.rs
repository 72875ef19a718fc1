//! Audio decoding using Symphonia
//!
//! Decodes an in-memory container into a mono [`Waveform`] at the canonical
//! analysis rate. Nothing here touches the file system: the caller hands over
//! the bytes of an already stored upload together with its declared format.
//!
//! # Example
//!
//! ```no_run
//! use voiceshield_dsp::io::decoder::{decode, FormatTag};
//! use voiceshield_dsp::AnalysisConfig;
//!
//! let bytes = std::fs::read("call.wav")?;
//! let waveform = decode(&bytes, FormatTag::Wav, &AnalysisConfig::default())?;
//! println!("{:.2} s at {} Hz", waveform.duration_seconds(), waveform.sample_rate());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::waveform::{sanitize, Waveform};
use crate::analysis::deadline::Deadline;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::preprocessing::channel_mixer::interleaved_to_mono;
use crate::preprocessing::normalization::normalize;
use crate::preprocessing::resample::resample_mono;

/// Container formats accepted for analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatTag {
    /// RIFF WAVE (PCM or float)
    Wav,
    /// MPEG-1/2 Layer III
    Mp3,
    /// Free Lossless Audio Codec
    Flac,
    /// Ogg (Vorbis)
    Ogg,
    /// MPEG-4 audio (AAC/ALAC)
    M4a,
}

impl FormatTag {
    /// Every supported tag
    pub const ALL: [FormatTag; 5] = [
        FormatTag::Wav,
        FormatTag::Mp3,
        FormatTag::Flac,
        FormatTag::Ogg,
        FormatTag::M4a,
    ];

    /// Canonical file extension, also used as the probe hint
    pub fn extension(&self) -> &'static str {
        match self {
            FormatTag::Wav => "wav",
            FormatTag::Mp3 => "mp3",
            FormatTag::Flac => "flac",
            FormatTag::Ogg => "ogg",
            FormatTag::M4a => "m4a",
        }
    }

    /// Parse a file extension (case-insensitive, leading dot optional)
    pub fn from_extension(extension: &str) -> Result<Self, AnalysisError> {
        let normalized = extension.trim().trim_start_matches('.').to_ascii_lowercase();
        match normalized.as_str() {
            "wav" | "wave" => Ok(FormatTag::Wav),
            "mp3" => Ok(FormatTag::Mp3),
            "flac" => Ok(FormatTag::Flac),
            "ogg" | "oga" => Ok(FormatTag::Ogg),
            "m4a" | "mp4" => Ok(FormatTag::M4a),
            _ => Err(AnalysisError::UnsupportedFormat(extension.to_string())),
        }
    }
}

impl FromStr for FormatTag {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormatTag::from_extension(s)
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Packets decoded between two budget checks
const PACKETS_PER_DEADLINE_CHECK: usize = 64;

/// Raw decode output before resampling and normalization
struct DecodedPcm {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: usize,
    skipped_packets: usize,
    truncated: bool,
}

/// Decode `bytes` declared as `format` into a normalized mono waveform
///
/// The budget in `config.timeout` starts when this function is called. See
/// [`decode_within`] to share a budget with later stages.
///
/// # Errors
///
/// - `EmptySignal` when `bytes` is empty or decodes to less than
///   `config.min_duration_ms`
/// - `Decode` when the bytes cannot be parsed as `format`
/// - `Timeout` when the budget runs out while decoding
pub fn decode(
    bytes: &[u8],
    format: FormatTag,
    config: &AnalysisConfig,
) -> Result<Waveform, AnalysisError> {
    decode_within(bytes, format, config, &Deadline::start(config.timeout))
}

/// Decode against an already running [`Deadline`]
///
/// Packets are read only up to `config.max_duration_seconds` of audio, and the
/// deadline is checked while packets are decoded, so a very long file costs
/// no more than its analysed prefix.
pub fn decode_within(
    bytes: &[u8],
    format: FormatTag,
    config: &AnalysisConfig,
    deadline: &Deadline,
) -> Result<Waveform, AnalysisError> {
    if bytes.is_empty() {
        return Err(AnalysisError::EmptySignal {
            duration_ms: 0.0,
            min_duration_ms: config.min_duration_ms,
        });
    }

    log::debug!("Decoding {} bytes declared as {}", bytes.len(), format);

    let pcm = decode_pcm(bytes, format, config.max_duration_seconds, deadline)?;
    let duration_ms = pcm.samples.len() as f32 / pcm.sample_rate as f32 * 1000.0;

    log::debug!(
        "Decoded {} mono samples at {} Hz from {} channels ({:.1} ms, {} packets skipped)",
        pcm.samples.len(),
        pcm.sample_rate,
        pcm.channels,
        duration_ms,
        pcm.skipped_packets
    );

    if duration_ms < config.min_duration_ms {
        return Err(AnalysisError::EmptySignal {
            duration_ms,
            min_duration_ms: config.min_duration_ms,
        });
    }
    if pcm.truncated {
        log::warn!(
            "Recording is longer than {:.1} s, analysing the first {:.1} s",
            config.max_duration_seconds,
            config.max_duration_seconds
        );
    }

    let mut samples = resample_mono(&pcm.samples, pcm.sample_rate, config.sample_rate)?;
    deadline.check("resample")?;

    // Resampler rounding can leave a few samples over the cap
    samples.truncate(max_samples(config.max_duration_seconds, config.sample_rate));

    sanitize(&mut samples);
    let loudness = normalize(&mut samples, config.normalization, config.max_headroom_db);

    Ok(Waveform::from_decoded(
        samples,
        config.sample_rate,
        loudness,
        format,
    ))
}

fn max_samples(max_duration_seconds: f32, sample_rate: u32) -> usize {
    (max_duration_seconds as f64 * sample_rate as f64).ceil() as usize
}

fn decode_pcm(
    bytes: &[u8],
    format: FormatTag,
    max_duration_seconds: f32,
    deadline: &Deadline,
) -> Result<DecodedPcm, AnalysisError> {
    let source = Cursor::new(bytes.to_vec());
    let mss = MediaSourceStream::new(Box::new(source), Default::default());

    let mut hint = Hint::new();
    hint.with_extension(format.extension());

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| AnalysisError::Decode(format!("not a valid {} stream: {}", format, e)))?;

    let mut reader = probed.format;

    let track = reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AnalysisError::Decode("no audio track found".to_string()))?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(0);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AnalysisError::Decode(format!("unsupported codec: {}", e)))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut skipped_packets = 0;
    let mut packets = 0usize;
    let mut truncated = false;

    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                return Err(AnalysisError::Decode(format!("error reading packet: {}", e)));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        packets += 1;
        if packets % PACKETS_PER_DEADLINE_CHECK == 0 {
            deadline.check("decode")?;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                channels = spec.channels.count();
                let rate = *sample_rate.get_or_insert(spec.rate);

                let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buffer.copy_interleaved_ref(decoded);
                samples.extend(interleaved_to_mono(buffer.samples(), channels));

                let cap = max_samples(max_duration_seconds, rate);
                if samples.len() >= cap {
                    truncated = samples.len() > cap;
                    samples.truncate(cap);
                    break;
                }
            }
            Err(SymphoniaError::DecodeError(msg)) => {
                log::warn!("Skipping corrupt packet: {}", msg);
                skipped_packets += 1;
            }
            Err(e) => {
                return Err(AnalysisError::Decode(format!("decoder failed: {}", e)));
            }
        }
    }
    deadline.check("decode")?;

    let sample_rate = match sample_rate {
        Some(rate) if rate > 0 => rate,
        _ => return Err(AnalysisError::Decode("sample rate unknown".to_string())),
    };

    Ok(DecodedPcm {
        samples,
        sample_rate,
        channels,
        skipped_packets,
        truncated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_tags() {
        assert_eq!(FormatTag::from_extension("WAV").unwrap(), FormatTag::Wav);
        assert_eq!(FormatTag::from_extension(".mp3").unwrap(), FormatTag::Mp3);
        assert_eq!("flac".parse::<FormatTag>().unwrap(), FormatTag::Flac);
        assert_eq!(FormatTag::M4a.to_string(), "m4a");
        assert!(matches!(
            FormatTag::from_extension("aiff"),
            Err(AnalysisError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_empty_bytes_are_empty_signal() {
        for format in FormatTag::ALL {
            let result = decode(&[], format, &AnalysisConfig::default());
            assert!(
                matches!(result, Err(AnalysisError::EmptySignal { .. })),
                "{} should reject an empty buffer",
                format
            );
        }
    }

    fn long_wav(seconds: usize, sample_rate: u32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for i in 0..seconds * sample_rate as usize {
                let phase = 2.0 * std::f32::consts::PI * (i % 192) as f32 / 192.0;
                writer.write_sample((0.4 * phase.sin() * i16::MAX as f32) as i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_long_input_stops_at_max_duration() {
        let bytes = long_wav(20, 48000);
        let config = AnalysisConfig {
            max_duration_seconds: 1.0,
            ..AnalysisConfig::default()
        };
        let waveform = decode(&bytes, FormatTag::Wav, &config).unwrap();
        assert!(waveform.samples().len() <= 16000);
        assert!(
            (waveform.duration_seconds() - 1.0).abs() < 0.02,
            "expected ~1 s, got {:.3} s",
            waveform.duration_seconds()
        );
    }

    #[test]
    fn test_deadline_is_checked_while_decoding() {
        let bytes = long_wav(20, 48000);
        let err = decode_within(
            &bytes,
            FormatTag::Wav,
            &AnalysisConfig::default(),
            &Deadline::start(Some(std::time::Duration::ZERO)),
        )
        .unwrap_err();
        match err {
            AnalysisError::Timeout { stage, .. } => assert_eq!(stage, "decode"),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let garbage = vec![0x42u8; 4096];
        let result = decode(&garbage, FormatTag::Wav, &AnalysisConfig::default());
        assert!(matches!(result, Err(AnalysisError::Decode(_))));
    }
}
