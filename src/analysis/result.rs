//! Analysis result types
//!
//! [`AnalysisResult`] is built once by [`ResultAssembler`] and never changed
//! afterwards. Persistence goes through [`AnalysisResult::link`], which
//! produces the flat row a storage layer writes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::fusion::Classification;
use super::metadata::AnalysisMetadata;
use crate::error::AnalysisError;
use crate::features::{AnalyzerId, FeatureScore};
use crate::scam::{ScamIndicator, ScamPattern};

/// Complete analysis result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// `confidence_score >= threshold`
    pub is_ai_generated: bool,

    /// Fused synthetic-voice confidence (0.0-1.0)
    pub confidence_score: f32,

    /// Threshold the label was decided with
    pub threshold: f32,

    /// Per-analyzer scores in canonical analyzer order
    pub feature_scores: Vec<FeatureScore>,

    /// Detected scam patterns, sorted by pattern
    pub scam_indicators: Vec<ScamIndicator>,

    /// Completion time
    pub analyzed_at: DateTime<Utc>,

    /// Analysis metadata
    pub metadata: AnalysisMetadata,
}

/// Row handed to the persistence layer
///
/// Mirrors the `analysis_results` table: the scam patterns and the analysis
/// details are stored as JSON text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    /// Analysed file
    pub audio_file_id: String,
    /// Owner of the file
    pub user_id: String,
    /// Label
    pub is_ai_generated: bool,
    /// Fused confidence
    pub confidence_score: f32,
    /// JSON array of pattern, description and strength
    pub scam_patterns: String,
    /// JSON object with scores, diagnostics and metadata
    pub analysis_details: String,
    /// Completion time
    pub analyzed_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct StoredIndicator {
    pattern: ScamPattern,
    description: &'static str,
    strength: f32,
}

#[derive(Serialize)]
struct AnalysisDetails<'a> {
    threshold: f32,
    feature_scores: &'a [FeatureScore],
    diagnostics: BTreeMap<String, f32>,
    metadata: &'a AnalysisMetadata,
}

impl AnalysisResult {
    /// Flat name to value mapping of every score and diagnostic
    ///
    /// Keys are `"<analyzer>.score"` and `"<analyzer>.<metric>"`.
    pub fn diagnostics(&self) -> BTreeMap<String, f32> {
        let mut flat = BTreeMap::new();
        for feature in &self.feature_scores {
            flat.insert(format!("{}.score", feature.analyzer), feature.score);
            for (name, value) in &feature.diagnostics {
                flat.insert(format!("{}.{}", feature.analyzer, name), *value);
            }
        }
        flat
    }

    /// Score of one analyzer
    pub fn score_of(&self, analyzer: AnalyzerId) -> Option<f32> {
        self.feature_scores
            .iter()
            .find(|f| f.analyzer == analyzer)
            .map(|f| f.score)
    }

    /// Attach file and owner identifiers for storage
    ///
    /// # Errors
    ///
    /// `AnalysisError::Internal` if the payload cannot be serialized.
    pub fn link(&self, audio_file_id: &str, user_id: &str) -> Result<AnalysisRecord, AnalysisError> {
        let stored: Vec<StoredIndicator> = self
            .scam_indicators
            .iter()
            .map(|i| StoredIndicator {
                pattern: i.pattern,
                description: i.pattern.description(),
                strength: i.strength,
            })
            .collect();
        let scam_patterns = serde_json::to_string(&stored)
            .map_err(|e| AnalysisError::Internal(format!("serializing scam patterns: {}", e)))?;
        let details = AnalysisDetails {
            threshold: self.threshold,
            feature_scores: &self.feature_scores,
            diagnostics: self.diagnostics(),
            metadata: &self.metadata,
        };
        let analysis_details = serde_json::to_string(&details)
            .map_err(|e| AnalysisError::Internal(format!("serializing analysis details: {}", e)))?;

        Ok(AnalysisRecord {
            audio_file_id: audio_file_id.to_string(),
            user_id: user_id.to_string(),
            is_ai_generated: self.is_ai_generated,
            confidence_score: self.confidence_score,
            scam_patterns,
            analysis_details,
            analyzed_at: self.analyzed_at,
        })
    }
}

/// Builds the final result from the stage outputs
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultAssembler;

impl ResultAssembler {
    /// Assemble and stamp with the current time
    pub fn assemble(
        &self,
        classification: Classification,
        threshold: f32,
        feature_scores: Vec<FeatureScore>,
        scam_indicators: Vec<ScamIndicator>,
        metadata: AnalysisMetadata,
    ) -> AnalysisResult {
        self.assemble_at(
            classification,
            threshold,
            feature_scores,
            scam_indicators,
            metadata,
            Utc::now(),
        )
    }

    /// Assemble with an explicit completion time
    pub fn assemble_at(
        &self,
        classification: Classification,
        threshold: f32,
        mut feature_scores: Vec<FeatureScore>,
        scam_indicators: Vec<ScamIndicator>,
        mut metadata: AnalysisMetadata,
        completed_at: DateTime<Utc>,
    ) -> AnalysisResult {
        feature_scores.sort_by_key(|f| f.analyzer);
        metadata.missing_analyzers = classification.missing;
        AnalysisResult {
            is_ai_generated: classification.is_ai_generated,
            confidence_score: classification.confidence,
            threshold,
            feature_scores,
            scam_indicators,
            analyzed_at: completed_at,
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::Waveform;
    use chrono::TimeZone;

    fn sample_result() -> AnalysisResult {
        let waveform = Waveform::new(vec![0.25f32; 1600], 16000).unwrap();
        let scores = vec![
            FeatureScore::new(AnalyzerId::Prosody, 0.2).with("energy_std_db", 3.5),
            FeatureScore::new(AnalyzerId::SpectralRegularity, 0.9).with("envelope_deviation", 0.025),
        ];
        let classification = Classification {
            confidence: 0.7,
            is_ai_generated: true,
            missing: vec![AnalyzerId::TemporalRegularity],
        };
        ResultAssembler.assemble_at(
            classification,
            0.6,
            scores,
            vec![ScamIndicator::new(ScamPattern::RepetitionLoop, 0.85)],
            AnalysisMetadata::from_waveform(waveform.info()),
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_assembler_orders_scores() {
        let result = sample_result();
        assert_eq!(result.feature_scores[0].analyzer, AnalyzerId::SpectralRegularity);
        assert_eq!(result.feature_scores[1].analyzer, AnalyzerId::Prosody);
        assert_eq!(result.metadata.missing_analyzers, vec![AnalyzerId::TemporalRegularity]);
        assert_eq!(result.score_of(AnalyzerId::Prosody), Some(0.2));
        assert_eq!(result.score_of(AnalyzerId::Naturalness), None);
    }

    #[test]
    fn test_flat_diagnostics() {
        let flat = sample_result().diagnostics();
        assert_eq!(flat["spectral_regularity.score"], 0.9);
        assert_eq!(flat["spectral_regularity.envelope_deviation"], 0.025);
        assert_eq!(flat["prosody.energy_std_db"], 3.5);
        assert_eq!(flat.len(), 4);
    }

    #[test]
    fn test_link_builds_record() {
        let result = sample_result();
        let record = result.link("file-42", "user-7").unwrap();
        assert_eq!(record.audio_file_id, "file-42");
        assert_eq!(record.user_id, "user-7");
        assert!(record.is_ai_generated);
        assert_eq!(record.analyzed_at, result.analyzed_at);

        let patterns: serde_json::Value = serde_json::from_str(&record.scam_patterns).unwrap();
        assert_eq!(patterns[0]["pattern"], "repetition_loop");
        assert_eq!(
            patterns[0]["description"],
            ScamPattern::RepetitionLoop.description()
        );
        let indicators: Vec<ScamIndicator> = serde_json::from_str(&record.scam_patterns).unwrap();
        assert_eq!(indicators, result.scam_indicators);

        let details: serde_json::Value = serde_json::from_str(&record.analysis_details).unwrap();
        assert_eq!(details["threshold"].as_f64().map(|t| (t * 10.0).round()), Some(6.0));
        assert!(details["diagnostics"]["prosody.score"].is_number());
        assert_eq!(details["metadata"]["sample_rate"], 16000);
    }

    #[test]
    fn test_result_json_roundtrip() {
        let result = sample_result();
        let json = serde_json::to_string(&result).unwrap();
        let back: AnalysisResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
