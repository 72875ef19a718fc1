//! Score fusion and classification
//!
//! Combines the six analyzer scores into one confidence value with a fixed
//! weighted average and labels the recording synthetic when
//! `confidence >= threshold`.
//!
//! # Weights
//!
//! | Analyzer | Weight |
//! |----------|--------|
//! | Spectral regularity | 0.25 |
//! | Temporal regularity | 0.20 |
//! | Naturalness | 0.20 |
//! | Harmonic stability | 0.15 |
//! | Formant consistency | 0.10 |
//! | Prosody | 0.10 |
//!
//! # Missing analyzers
//!
//! If a score is missing, the weights of the present analyzers are divided by
//! their sum, so the confidence is the weighted mean over what was measured.
//! Summation always runs in canonical analyzer order, so the same scores in a
//! different arrival order give a bitwise-identical confidence.
//!
//! # Example
//!
//! ```
//! use voiceshield_dsp::analysis::fusion::{FusionConfig, ScoreFusion};
//! use voiceshield_dsp::features::{AnalyzerId, FeatureScore};
//!
//! let fusion = ScoreFusion::new(FusionConfig::default())?;
//! let scores: Vec<FeatureScore> = AnalyzerId::ALL
//!     .iter()
//!     .map(|&id| FeatureScore::new(id, 0.9))
//!     .collect();
//! let classification = fusion.fuse(&scores)?;
//! assert!(classification.is_ai_generated);
//! # Ok::<(), voiceshield_dsp::AnalysisError>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::features::{AnalyzerId, FeatureScore};

/// Default classification threshold
pub const DEFAULT_THRESHOLD: f32 = 0.6;

/// Tolerance on the sum of the weights
const WEIGHT_SUM_TOLERANCE: f32 = 1e-4;

/// Per-analyzer weights, summing to 1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    /// Spectral regularity weight
    pub spectral_regularity: f32,
    /// Temporal regularity weight
    pub temporal_regularity: f32,
    /// Naturalness weight
    pub naturalness: f32,
    /// Harmonic stability weight
    pub harmonic_stability: f32,
    /// Formant consistency weight
    pub formant_consistency: f32,
    /// Prosody weight
    pub prosody: f32,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            spectral_regularity: 0.25,
            temporal_regularity: 0.20,
            naturalness: 0.20,
            harmonic_stability: 0.15,
            formant_consistency: 0.10,
            prosody: 0.10,
        }
    }
}

impl FusionWeights {
    /// Weight of one analyzer
    pub fn get(&self, id: AnalyzerId) -> f32 {
        match id {
            AnalyzerId::SpectralRegularity => self.spectral_regularity,
            AnalyzerId::TemporalRegularity => self.temporal_regularity,
            AnalyzerId::Naturalness => self.naturalness,
            AnalyzerId::HarmonicStability => self.harmonic_stability,
            AnalyzerId::FormantConsistency => self.formant_consistency,
            AnalyzerId::Prosody => self.prosody,
        }
    }

    /// Sum over all analyzers, in canonical order
    pub fn total(&self) -> f32 {
        AnalyzerId::ALL.iter().map(|&id| self.get(id)).sum()
    }
}

/// Fusion policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Per-analyzer weights
    pub weights: FusionWeights,
    /// Confidence at or above which a recording is labelled synthetic (default: 0.6)
    pub threshold: f32,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            weights: FusionWeights::default(),
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl FusionConfig {
    /// Weights must be finite, non-negative and sum to 1; threshold in [0, 1]
    pub fn validate(&self) -> Result<(), AnalysisError> {
        for id in AnalyzerId::ALL {
            let weight = self.weights.get(id);
            if !weight.is_finite() || weight < 0.0 {
                return Err(AnalysisError::InvalidConfig(format!(
                    "weight for {} must be a non-negative number, got {}",
                    id, weight
                )));
            }
        }
        let total = self.weights.total();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(AnalysisError::InvalidConfig(format!(
                "fusion weights sum to {:.4}, expected 1.0",
                total
            )));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(AnalysisError::InvalidConfig(format!(
                "threshold {} outside [0, 1]",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// Fused confidence and label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Weighted confidence in [0, 1]
    pub confidence: f32,
    /// `confidence >= threshold`
    pub is_ai_generated: bool,
    /// Analyzers that were absent and had their weight redistributed
    pub missing: Vec<AnalyzerId>,
}

/// Weighted fusion with a validated, immutable policy
#[derive(Debug, Clone)]
pub struct ScoreFusion {
    config: FusionConfig,
}

impl ScoreFusion {
    /// Validate `config` and build the fusion stage
    pub fn new(config: FusionConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Policy in use
    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Fuse analyzer scores
    ///
    /// # Errors
    ///
    /// `AnalysisError::Internal` when no scores are given, a score is not
    /// finite, an analyzer appears twice, or every present analyzer has
    /// weight zero.
    pub fn fuse(&self, scores: &[FeatureScore]) -> Result<Classification, AnalysisError> {
        if scores.is_empty() {
            return Err(AnalysisError::Internal("no analyzer scores to fuse".to_string()));
        }

        let mut slots: [Option<f32>; 6] = [None; 6];
        for score in scores {
            if !score.score.is_finite() {
                return Err(AnalysisError::Internal(format!(
                    "{} produced a non-finite score",
                    score.analyzer
                )));
            }
            let slot = &mut slots[score.analyzer.index()];
            if slot.is_some() {
                return Err(AnalysisError::Internal(format!(
                    "duplicate score for {}",
                    score.analyzer
                )));
            }
            *slot = Some(score.score.clamp(0.0, 1.0));
        }

        let mut weighted_sum = 0.0f32;
        let mut weight_sum = 0.0f32;
        let mut missing = Vec::new();
        for id in AnalyzerId::ALL {
            match slots[id.index()] {
                Some(score) => {
                    let weight = self.config.weights.get(id);
                    weighted_sum += weight * score;
                    weight_sum += weight;
                }
                None => missing.push(id),
            }
        }

        if weight_sum <= 0.0 {
            return Err(AnalysisError::Internal(
                "present analyzers carry no weight".to_string(),
            ));
        }
        if !missing.is_empty() {
            log::warn!(
                "Fusing without {:?}; weights renormalized over {:.2}",
                missing,
                weight_sum
            );
        }

        let confidence = (weighted_sum / weight_sum).clamp(0.0, 1.0);
        let is_ai_generated = confidence >= self.config.threshold;

        log::debug!(
            "Fusion: confidence={:.3}, threshold={:.2}, ai={}",
            confidence,
            self.config.threshold,
            is_ai_generated
        );

        Ok(Classification {
            confidence,
            is_ai_generated,
            missing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(values: [f32; 6]) -> Vec<FeatureScore> {
        AnalyzerId::ALL
            .iter()
            .zip(values)
            .map(|(&id, v)| FeatureScore::new(id, v))
            .collect()
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        assert!((FusionWeights::default().total() - 1.0).abs() < 1e-6);
        assert!(FusionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_weighted_average() {
        let fusion = ScoreFusion::new(FusionConfig::default()).unwrap();
        let result = fusion.fuse(&scores([1.0, 0.5, 0.0, 1.0, 0.5, 0.0])).unwrap();
        // 0.25 + 0.10 + 0 + 0.15 + 0.05 + 0 = 0.55
        assert!((result.confidence - 0.55).abs() < 1e-6);
        assert!(!result.is_ai_generated);
        assert!(result.missing.is_empty());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let fusion = ScoreFusion::new(FusionConfig {
            threshold: 0.5,
            ..FusionConfig::default()
        })
        .unwrap();
        let result = fusion.fuse(&scores([0.5; 6])).unwrap();
        assert!(result.confidence >= 0.5);
        assert!(result.is_ai_generated);
    }

    #[test]
    fn test_deterministic_and_order_independent() {
        let fusion = ScoreFusion::new(FusionConfig::default()).unwrap();
        let forward = scores([0.91, 0.13, 0.77, 0.42, 0.05, 0.66]);
        let mut reversed = forward.clone();
        reversed.reverse();

        let a = fusion.fuse(&forward).unwrap();
        let b = fusion.fuse(&forward).unwrap();
        let c = fusion.fuse(&reversed).unwrap();
        assert_eq!(a.confidence.to_bits(), b.confidence.to_bits());
        assert_eq!(a.confidence.to_bits(), c.confidence.to_bits());
    }

    #[test]
    fn test_missing_analyzers_renormalize() {
        let fusion = ScoreFusion::new(FusionConfig::default()).unwrap();
        let subset = vec![
            FeatureScore::new(AnalyzerId::SpectralRegularity, 0.8),
            FeatureScore::new(AnalyzerId::HarmonicStability, 0.4),
            FeatureScore::new(AnalyzerId::Prosody, 0.2),
        ];
        let result = fusion.fuse(&subset).unwrap();
        // (0.25 * 0.8 + 0.15 * 0.4 + 0.10 * 0.2) / (0.25 + 0.15 + 0.10) = 0.28 / 0.5
        assert!((result.confidence - 0.56).abs() < 1e-6);
        assert_eq!(
            result.missing,
            vec![
                AnalyzerId::TemporalRegularity,
                AnalyzerId::Naturalness,
                AnalyzerId::FormantConsistency
            ]
        );
    }

    #[test]
    fn test_rejects_bad_input() {
        let fusion = ScoreFusion::new(FusionConfig::default()).unwrap();
        assert!(matches!(fusion.fuse(&[]), Err(AnalysisError::Internal(_))));

        let nan = vec![FeatureScore::new(AnalyzerId::Prosody, f32::NAN)];
        assert!(matches!(fusion.fuse(&nan), Err(AnalysisError::Internal(_))));

        let duplicate = vec![
            FeatureScore::new(AnalyzerId::Prosody, 0.2),
            FeatureScore::new(AnalyzerId::Prosody, 0.3),
        ];
        assert!(matches!(fusion.fuse(&duplicate), Err(AnalysisError::Internal(_))));
    }

    #[test]
    fn test_rejects_bad_weights() {
        let config = FusionConfig {
            weights: FusionWeights {
                prosody: 0.5,
                ..FusionWeights::default()
            },
            ..FusionConfig::default()
        };
        assert!(matches!(
            ScoreFusion::new(config),
            Err(AnalysisError::InvalidConfig(_))
        ));
    }
}
