//! Integration tests for the audio authenticity engine

use std::io::Cursor;
use std::time::Duration;

use voiceshield_dsp::{
    analyze, analyze_waveform, AnalysisConfig, AnalysisError, AnalysisMetadata, AnalysisResult,
    AnalyzerId, FormatTag, ScamPattern, Waveform,
};

/// Encode mono or interleaved samples as an in-memory PCM16 WAV file
fn wav_bytes(samples: &[f32], sample_rate: u32, channels: u16) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).expect("Failed to create WAV writer");
        for &sample in samples {
            writer
                .write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                .expect("Failed to write sample");
        }
        writer.finalize().expect("Failed to finalize WAV");
    }
    cursor.into_inner()
}

/// Sine at 250 Hz (exactly 64 samples per period at 16 kHz)
fn flat_tone(seconds: f32, amplitude: f32) -> Vec<f32> {
    let len = (seconds * 16000.0) as usize;
    (0..len)
        .map(|i| amplitude * (2.0 * std::f32::consts::PI * (i % 64) as f32 / 64.0).sin())
        .collect()
}

struct XorShift(u32);

impl XorShift {
    fn next(&mut self) -> f32 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 17;
        self.0 ^= self.0 << 5;
        self.0 as f32 / u32::MAX as f32
    }
}

/// Speech-like irregular signal: segments of random length, level, pitch
/// trajectory, harmonic balance and voicing, with occasional gaps
fn irregular_signal(seconds: f32) -> Vec<f32> {
    let total = (seconds * 16000.0) as usize;
    let mut rng = XorShift(0x5eed_1234);
    let mut samples = Vec::with_capacity(total);
    let mut phase = 0.0f32;
    let mut f0 = 160.0f32;

    while samples.len() < total {
        let len = 800 + (rng.next() * 4000.0) as usize;
        let amplitude = 0.05 + 0.75 * rng.next();
        let kind = rng.next();
        let h2 = rng.next();
        let h3 = rng.next() * 0.8;

        for n in 0..len {
            let sample = if kind < 0.55 {
                if n % 64 == 0 {
                    f0 = (f0 * (0.94 + 0.12 * rng.next())).clamp(90.0, 350.0);
                }
                phase += 2.0 * std::f32::consts::PI * f0 / 16000.0;
                if phase > 2.0 * std::f32::consts::PI {
                    phase -= 2.0 * std::f32::consts::PI;
                }
                amplitude * (phase.sin() + h2 * (2.0 * phase).sin() + h3 * (3.0 * phase).sin()) / 2.0
            } else if kind < 0.9 {
                amplitude * (rng.next() - 0.5)
            } else {
                0.0
            };
            samples.push(sample);
        }
    }
    samples.truncate(total);
    samples
}

/// Compare everything except the completion time and the measured runtime
fn assert_same_analysis(a: &AnalysisResult, b: &AnalysisResult) {
    let mut a = a.clone();
    let mut b = b.clone();
    b.analyzed_at = a.analyzed_at;
    a.metadata.processing_time_ms = 0.0;
    b.metadata.processing_time_ms = 0.0;
    assert_eq!(a, b);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_wav_end_to_end() {
        let bytes = wav_bytes(&flat_tone(3.0, 0.5), 16000, 1);
        let result = analyze(&bytes, FormatTag::Wav, &AnalysisConfig::default())
            .expect("Analysis should succeed");

        assert_eq!(result.feature_scores.len(), 6);
        for (score, id) in result.feature_scores.iter().zip(AnalyzerId::ALL) {
            assert_eq!(score.analyzer, id);
            assert!((0.0..=1.0).contains(&score.score));
        }
        assert!((0.0..=1.0).contains(&result.confidence_score));
        assert!((result.metadata.duration_seconds - 3.0).abs() < 0.01);
        assert_eq!(result.metadata.sample_rate, 16000);
        assert_eq!(result.metadata.source_format, Some(FormatTag::Wav));
        assert!(result.metadata.missing_analyzers.is_empty());
    }

    #[test]
    fn test_flat_signal_is_classified_synthetic() {
        let bytes = wav_bytes(&flat_tone(3.0, 0.5), 16000, 1);
        let result = analyze(&bytes, FormatTag::Wav, &AnalysisConfig::default()).unwrap();

        assert!(
            result.is_ai_generated,
            "flat tone should be synthetic, scores: {:?}",
            result.diagnostics()
        );
        assert!(result.confidence_score > result.threshold);
        for score in &result.feature_scores {
            assert!(score.score > 0.9, "{} scored {}", score.analyzer, score.score);
        }
    }

    #[test]
    fn test_irregular_signal_is_classified_natural() {
        let waveform = Waveform::new(irregular_signal(6.0), 16000).unwrap();
        let result = analyze_waveform(&waveform, &AnalysisConfig::default()).unwrap();

        assert!(
            !result.is_ai_generated,
            "irregular signal should be natural, confidence {:.3}, scores: {:?}",
            result.confidence_score,
            result.diagnostics()
        );
        assert!(result.confidence_score < 0.4);
    }

    #[test]
    fn test_silence_scores_are_neutral() {
        let bytes = wav_bytes(&[0.0f32; 16000], 16000, 1);
        let result = analyze(&bytes, FormatTag::Wav, &AnalysisConfig::default()).unwrap();

        for score in &result.feature_scores {
            assert_eq!(score.score, 0.5, "{} on silence", score.analyzer);
        }
        assert!((result.confidence_score - 0.5).abs() < 1e-6);
        assert!(!result.is_ai_generated);
        assert!(result.scam_indicators.is_empty());
    }

    #[test]
    fn test_silent_result_survives_json() {
        let silence = Waveform::new(vec![0.0f32; 16000], 16000).unwrap();
        let mut result = analyze_waveform(&silence, &AnalysisConfig::default()).unwrap();
        result.metadata.processing_time_ms = 12.5;
        assert!(result.metadata.source_loudness.peak_db.is_finite());
        assert!(result.metadata.source_loudness.rms_db.is_finite());

        let json = serde_json::to_string(&result).unwrap();
        let back: AnalysisResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);

        let record = result.link("audio-silent", "user-1").unwrap();
        let details: serde_json::Value = serde_json::from_str(&record.analysis_details).unwrap();
        let metadata: AnalysisMetadata = serde_json::from_value(details["metadata"].clone()).unwrap();
        assert_eq!(metadata, result.metadata);
    }

    #[test]
    fn test_short_input_is_empty_signal() {
        let bytes = wav_bytes(&flat_tone(0.06, 0.5), 16000, 1);
        match analyze(&bytes, FormatTag::Wav, &AnalysisConfig::default()) {
            Err(AnalysisError::EmptySignal { duration_ms, .. }) => assert!(duration_ms < 100.0),
            other => panic!("expected EmptySignal, got {:?}", other),
        }

        let short = Waveform::new(flat_tone(0.05, 0.5), 16000).unwrap();
        assert!(matches!(
            analyze_waveform(&short, &AnalysisConfig::default()),
            Err(AnalysisError::EmptySignal { .. })
        ));
    }

    #[test]
    fn test_empty_bytes_for_every_format() {
        for format in FormatTag::ALL {
            let err = analyze(&[], format, &AnalysisConfig::default()).unwrap_err();
            assert_eq!(err.reason(), "empty_signal", "format {}", format);
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn test_unsupported_and_undecodable() {
        let err = "aiff".parse::<FormatTag>().unwrap_err();
        assert!(matches!(err, AnalysisError::UnsupportedFormat(_)));

        let garbage = vec![0x5au8; 4096];
        let err = analyze(&garbage, FormatTag::Flac, &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::Decode(_)));
    }

    #[test]
    fn test_reanalysis_is_identical() {
        let waveform = Waveform::new(irregular_signal(3.0), 16000).unwrap();
        let config = AnalysisConfig::default();
        let first = analyze_waveform(&waveform, &config).unwrap();
        let second = analyze_waveform(&waveform, &config).unwrap();
        assert_same_analysis(&first, &second);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let waveform = Waveform::new(irregular_signal(3.0), 16000).unwrap();
        let parallel = analyze_waveform(&waveform, &AnalysisConfig::default()).unwrap();
        let sequential = analyze_waveform(
            &waveform,
            &AnalysisConfig {
                parallel: false,
                ..AnalysisConfig::default()
            },
        )
        .unwrap();
        assert_same_analysis(&parallel, &sequential);
    }

    #[test]
    fn test_zero_timeout_fails() {
        let bytes = wav_bytes(&flat_tone(1.0, 0.5), 16000, 1);
        let config = AnalysisConfig {
            timeout: Some(Duration::ZERO),
            ..AnalysisConfig::default()
        };
        let err = analyze(&bytes, FormatTag::Wav, &config).unwrap_err();
        assert!(matches!(err, AnalysisError::Timeout { .. }));
        assert_eq!(err.reason(), "analysis_timeout");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_long_recording_is_capped() {
        let bytes = wav_bytes(&flat_tone(30.0, 0.5), 16000, 1);
        let config = AnalysisConfig {
            max_duration_seconds: 1.0,
            ..AnalysisConfig::default()
        };
        let result = analyze(&bytes, FormatTag::Wav, &config).unwrap();
        assert!((result.metadata.duration_seconds - 1.0).abs() < 0.01);
        assert_eq!(result.feature_scores.len(), 6);
    }

    #[test]
    fn test_no_cues_no_indicators() {
        let bytes = wav_bytes(&flat_tone(4.0, 0.3), 16000, 1);
        let result = analyze(&bytes, FormatTag::Wav, &AnalysisConfig::default()).unwrap();
        assert!(
            result.scam_indicators.is_empty(),
            "unexpected indicators: {:?}",
            result.scam_indicators
        );
    }

    #[test]
    fn test_loud_recording_flags_high_energy() {
        let bytes = wav_bytes(&flat_tone(2.0, 0.95), 16000, 1);
        let result = analyze(&bytes, FormatTag::Wav, &AnalysisConfig::default()).unwrap();
        assert!(result
            .scam_indicators
            .iter()
            .any(|i| i.pattern == ScamPattern::SustainedHighEnergy));
    }

    #[test]
    fn test_stereo_44k_is_resampled() {
        let mono: Vec<f32> = (0..44100)
            .map(|i| 0.4 * (2.0 * std::f32::consts::PI * 220.0 * i as f32 / 44100.0).sin())
            .collect();
        let interleaved: Vec<f32> = mono.iter().flat_map(|&s| [s, s]).collect();
        let bytes = wav_bytes(&interleaved, 44100, 2);

        let result = analyze(&bytes, FormatTag::Wav, &AnalysisConfig::default()).unwrap();
        assert_eq!(result.metadata.sample_rate, 16000);
        assert!((result.metadata.duration_seconds - 1.0).abs() < 0.05);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let bytes = wav_bytes(&flat_tone(1.0, 0.5), 16000, 1);
        let mut config = AnalysisConfig::default();
        config.fusion.weights.prosody = 0.9;
        let err = analyze(&bytes, FormatTag::Wav, &config).unwrap_err();
        assert_eq!(err.reason(), "invalid_config");
    }

    #[test]
    fn test_link_for_persistence() {
        let bytes = wav_bytes(&flat_tone(1.0, 0.5), 16000, 1);
        let result = analyze(&bytes, FormatTag::Wav, &AnalysisConfig::default()).unwrap();
        let record = result.link("audio-1", "user-1").unwrap();

        assert_eq!(record.is_ai_generated, result.is_ai_generated);
        assert_eq!(record.confidence_score, result.confidence_score);
        let details: serde_json::Value = serde_json::from_str(&record.analysis_details).unwrap();
        assert!(details["diagnostics"]["spectral_regularity.score"].is_number());
    }
}
