//! Example: Analyze multiple audio files in parallel
//!
//! Usage:
//!   cargo run --release --example analyze_batch -- [--jobs N] [--json] <file1> <file2> ...
//!
//! Notes:
//! - Parallelism is across files. Each file still fans its analyzers out on the
//!   same pool.
//! - Default workers: (available CPU threads - 1), keeping one core free for the system.

use std::env;
use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use voiceshield_dsp::{analyze, AnalysisConfig, AnalysisError, FormatTag, ScamPattern};

#[derive(Serialize)]
struct ItemOut {
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_ai_generated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    confidence_score: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    scam_patterns: Vec<ScamPattern>,
    processing_time_ms: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retryable: Option<bool>,
}

fn analyze_path(path: &str, config: &AnalysisConfig) -> Result<ItemOut, AnalysisError> {
    let extension = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let format = FormatTag::from_extension(extension)?;
    let bytes = std::fs::read(path)
        .map_err(|e| AnalysisError::Decode(format!("reading {}: {}", path, e)))?;
    let result = analyze(&bytes, format, config)?;

    Ok(ItemOut {
        file: path.to_string(),
        is_ai_generated: Some(result.is_ai_generated),
        confidence_score: Some(result.confidence_score),
        scam_patterns: result.scam_indicators.iter().map(|i| i.pattern).collect(),
        processing_time_ms: result.metadata.processing_time_ms,
        error: None,
        retryable: None,
    })
}

fn default_jobs() -> usize {
    let n = std::thread::available_parallelism().map(|v| v.get()).unwrap_or(1);
    std::cmp::max(1, n.saturating_sub(1))
}

fn percentile(mut xs: Vec<f32>, p: f32) -> Option<f32> {
    if xs.is_empty() {
        return None;
    }
    xs.sort_by(|a, b| a.total_cmp(b));
    let idx = ((xs.len() - 1) as f32 * p.clamp(0.0, 1.0)).round() as usize;
    Some(xs[idx.min(xs.len() - 1)])
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let mut json = false;
    let mut jobs: Option<usize> = None;
    let mut paths: Vec<String> = Vec::new();

    while !args.is_empty() {
        let a = args.remove(0);
        match a.as_str() {
            "--json" => json = true,
            "--jobs" => {
                if args.is_empty() {
                    return Err("--jobs requires a value".into());
                }
                let v = args.remove(0).parse::<usize>()?;
                jobs = Some(std::cmp::max(1, v));
            }
            "--help" | "-h" => {
                eprintln!(
                    "Usage: analyze_batch [--jobs N] [--json] <file1> <file2> ...\n\
                     \n\
                     --jobs N   Parallel workers (default: CPU-1)\n\
                     --json     Emit one JSON object per line (JSONL)\n"
                );
                return Ok(());
            }
            _ => paths.push(a),
        }
    }

    if paths.is_empty() {
        eprintln!("ERROR: Provide at least one audio file path. Use --help for usage.");
        std::process::exit(2);
    }

    let jobs = jobs.unwrap_or_else(default_jobs);
    eprintln!("Batch: {} files, jobs={}", paths.len(), jobs);

    let config = AnalysisConfig::default();
    let t0 = Instant::now();
    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;

    let outs: Vec<ItemOut> = pool.install(|| {
        paths
            .par_iter()
            .map(|path| {
                analyze_path(path, &config).unwrap_or_else(|e| ItemOut {
                    file: path.clone(),
                    is_ai_generated: None,
                    confidence_score: None,
                    scam_patterns: Vec::new(),
                    processing_time_ms: 0.0,
                    error: Some(format!("{} ({})", e, e.reason())),
                    retryable: Some(e.is_retryable()),
                })
            })
            .collect()
    });

    for (idx, o) in outs.iter().enumerate() {
        if json {
            println!("{}", serde_json::to_string(o)?);
            continue;
        }
        match (&o.error, o.is_ai_generated, o.confidence_score) {
            (None, Some(ai), Some(confidence)) => println!(
                "[{}/{}] {}: ai={} confidence={:.3} scam={:?} time={:.2}ms",
                idx + 1,
                outs.len(),
                o.file,
                ai,
                confidence,
                o.scam_patterns,
                o.processing_time_ms
            ),
            _ => println!(
                "[{}/{}] {}: ERROR: {}",
                idx + 1,
                outs.len(),
                o.file,
                o.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }

    let ok_times: Vec<f32> = outs
        .iter()
        .filter(|o| o.error.is_none())
        .map(|o| o.processing_time_ms)
        .collect();
    let flagged = outs.iter().filter(|o| o.is_ai_generated == Some(true)).count();
    let wall_ms = t0.elapsed().as_secs_f64() * 1000.0;

    eprintln!(
        "Done: ok={}/{} flagged={} wall={:.0}ms",
        ok_times.len(),
        outs.len(),
        flagged,
        wall_ms
    );
    if !ok_times.is_empty() {
        let mean = ok_times.iter().sum::<f32>() / ok_times.len() as f32;
        let p50 = percentile(ok_times.clone(), 0.50).unwrap_or(mean);
        let p90 = percentile(ok_times.clone(), 0.90).unwrap_or(mean);
        eprintln!("processing_time_ms: mean={:.2} p50={:.2} p90={:.2}", mean, p50, p90);
    }

    Ok(())
}
