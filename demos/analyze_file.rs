//! Example: Analyze a single audio file
//!
//! Usage:
//!   cargo run --release --example analyze_file -- [--json] <file>
//!
//! The container is taken from the file extension.

use std::env;
use std::path::Path;

use voiceshield_dsp::{analyze, AnalysisConfig, FormatTag};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut json = false;
    let mut path: Option<String> = None;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--json" => json = true,
            "--help" | "-h" => {
                eprintln!("Usage: analyze_file [--json] <file>");
                return Ok(());
            }
            _ => path = Some(arg),
        }
    }

    let Some(path) = path else {
        eprintln!("ERROR: Provide an audio file path. Use --help for usage.");
        std::process::exit(2);
    };

    let extension = Path::new(&path)
        .extension()
        .and_then(|e| e.to_str())
        .ok_or("file has no extension")?;
    let format: FormatTag = extension.parse()?;
    let bytes = std::fs::read(&path)?;

    let result = analyze(&bytes, format, &AnalysisConfig::default())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("Analysis Results: {}", path);
    println!(
        "  AI generated: {} (confidence: {:.3}, threshold: {:.2})",
        result.is_ai_generated, result.confidence_score, result.threshold
    );
    for feature in &result.feature_scores {
        println!("  {:<22} {:.3}", feature.analyzer, feature.score);
    }
    if result.scam_indicators.is_empty() {
        println!("  Scam patterns: none");
    } else {
        for indicator in &result.scam_indicators {
            println!("  Scam pattern: {} (strength: {:.2})", indicator.pattern, indicator.strength);
        }
    }
    println!(
        "  Duration: {:.2} s, processing time: {:.2} ms",
        result.metadata.duration_seconds, result.metadata.processing_time_ms
    );

    Ok(())
}
