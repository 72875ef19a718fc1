//! Performance benchmarks for audio analysis

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use voiceshield_dsp::features::frames::SignalFeatures;
use voiceshield_dsp::{
    analyze, analyze_waveform, AnalysisConfig, Analyzer, FormatTag, ScamDetector,
    ScamDetectorConfig, Waveform,
};

/// Ten seconds of a vibrato voice-like tone at 16 kHz
fn synthetic_voice() -> Vec<f32> {
    (0..16000 * 10)
        .map(|i| {
            let t = i as f32 / 16000.0;
            let f0 = 140.0 + 20.0 * (2.0 * std::f32::consts::PI * 4.0 * t).sin();
            let phase = 2.0 * std::f32::consts::PI * f0 * t;
            0.4 * (phase.sin() + 0.5 * (2.0 * phase).sin() + 0.25 * (3.0 * phase).sin())
        })
        .collect()
}

fn wav_bytes(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer.write_sample((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

fn bench_analyze(c: &mut Criterion) {
    let samples = synthetic_voice();
    let bytes = wav_bytes(&samples, 16000);
    let waveform = Waveform::new(samples, 16000).unwrap();
    let config = AnalysisConfig::default();
    let sequential = AnalysisConfig {
        parallel: false,
        ..AnalysisConfig::default()
    };

    c.bench_function("analyze_wav_10s", |b| {
        b.iter(|| {
            let _ = analyze(black_box(&bytes), FormatTag::Wav, black_box(&config));
        });
    });

    c.bench_function("analyze_waveform_10s_parallel", |b| {
        b.iter(|| {
            let _ = analyze_waveform(black_box(&waveform), black_box(&config));
        });
    });

    c.bench_function("analyze_waveform_10s_sequential", |b| {
        b.iter(|| {
            let _ = analyze_waveform(black_box(&waveform), black_box(&sequential));
        });
    });
}

fn bench_stages(c: &mut Criterion) {
    let waveform = Waveform::new(synthetic_voice(), 16000).unwrap();
    let config = AnalysisConfig::default();

    c.bench_function("signal_features_10s", |b| {
        b.iter(|| {
            SignalFeatures::compute(
                black_box(&waveform),
                config.frame_size,
                config.hop_size,
            )
        });
    });

    let features = SignalFeatures::compute(&waveform, config.frame_size, config.hop_size);
    for analyzer in Analyzer::ALL {
        c.bench_function(&format!("analyzer_{}", analyzer.id()), |b| {
            b.iter(|| analyzer.extract_from(black_box(&features)));
        });
    }

    let detector = ScamDetector::new(ScamDetectorConfig::default());
    c.bench_function("scam_patterns_10s", |b| {
        b.iter(|| detector.detect(black_box(&features)));
    });
}

criterion_group!(benches, bench_analyze, bench_stages);
criterion_main!(benches);
