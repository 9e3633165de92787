//! Configuration types for the mimicry analysis engine.
//!
//! Mirrors the shape of the original tool's configuration surface: the four
//! similarity weights are caller-supplied, carry no normalization invariant
//! at the call site, and are renormalized inside the combiner.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::errors::{MimicryError, Result};

/// Weights for combining the four clone-type similarity scores.
///
/// The combiner divides by the weight sum, so the vector does not need to
/// sum to 1.0. A non-positive sum yields a combined score of exactly 0.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityWeights {
    /// Weight for Type-1 (identical modulo formatting) similarity
    pub type1: f64,

    /// Weight for Type-2 (identical modulo renaming) similarity
    pub type2: f64,

    /// Weight for Type-3 (identical modulo loop kind) similarity
    pub type3: f64,

    /// Weight for Type-4 (tree-shape only) similarity
    pub type4: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            type1: 0.25,
            type2: 0.25,
            type3: 0.25,
            type4: 0.25,
        }
    }
}

impl SimilarityWeights {
    /// Construct a weight vector from the four components.
    pub fn new(type1: f64, type2: f64, type3: f64, type4: f64) -> Self {
        Self {
            type1,
            type2,
            type3,
            type4,
        }
    }

    /// Sum of all four weights.
    pub fn total(&self) -> f64 {
        self.type1 + self.type2 + self.type3 + self.type4
    }

    /// Validate that every weight is a finite, non-negative number.
    ///
    /// An all-zero vector is accepted; the combiner defines that case as a
    /// combined score of 0.0 rather than an error.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("weights.type1", self.type1),
            ("weights.type2", self.type2),
            ("weights.type3", self.type3),
            ("weights.type4", self.type4),
        ];

        for (field, value) in fields {
            if !value.is_finite() {
                return Err(MimicryError::config_field(
                    format!("weight must be finite, got {value}"),
                    field,
                ));
            }
            if value < 0.0 {
                return Err(MimicryError::config_field(
                    format!("weight must be non-negative, got {value}"),
                    field,
                ));
            }
        }

        Ok(())
    }
}

/// Top-level configuration for an analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Similarity combination weights
    #[serde(default)]
    pub weights: SimilarityWeights,

    /// Minimum combined score for a pair to appear in rendered reports.
    ///
    /// Applied by the rendering layer only; the engine always returns the
    /// full result set.
    #[serde(default)]
    pub min_combined_score: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            weights: SimilarityWeights::default(),
            min_combined_score: 0.0,
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            MimicryError::io(format!("Failed to read config file: {}", path.display()), e)
        })?;

        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn to_yaml_file(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&path, content).map_err(|e| {
            MimicryError::io(
                format!("Failed to write config file: {}", path.display()),
                e,
            )
        })
    }

    /// Render the default configuration as YAML.
    pub fn default_yaml() -> Result<String> {
        Ok(serde_yaml::to_string(&Self::default())?)
    }

    /// Validate the full configuration.
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;

        if !self.min_combined_score.is_finite()
            || self.min_combined_score < 0.0
            || self.min_combined_score > 1.0
        {
            return Err(MimicryError::config_field(
                format!(
                    "min_combined_score must be in [0.0, 1.0], got {}",
                    self.min_combined_score
                ),
                "min_combined_score",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_are_uniform() {
        let weights = SimilarityWeights::default();
        assert_eq!(weights.type1, 0.25);
        assert_eq!(weights.total(), 1.0);
        assert!(weights.validate().is_ok());
    }

    #[test]
    fn test_zero_weights_are_valid_configuration() {
        let weights = SimilarityWeights::new(0.0, 0.0, 0.0, 0.0);
        assert!(weights.validate().is_ok());
        assert_eq!(weights.total(), 0.0);
    }

    #[test]
    fn test_negative_weight_rejected() {
        let weights = SimilarityWeights::new(0.5, -0.1, 0.3, 0.3);
        let err = weights.validate().unwrap_err();
        assert!(matches!(err, MimicryError::Config { .. }));
    }

    #[test]
    fn test_nan_weight_rejected() {
        let weights = SimilarityWeights::new(f64::NAN, 0.25, 0.25, 0.25);
        assert!(weights.validate().is_err());
    }

    #[test]
    fn test_config_yaml_round_trip() {
        let config = AnalysisConfig {
            weights: SimilarityWeights::new(0.4, 0.3, 0.2, 0.1),
            min_combined_score: 0.5,
        };

        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: AnalysisConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_min_score_out_of_range_rejected() {
        let config = AnalysisConfig {
            weights: SimilarityWeights::default(),
            min_combined_score: 1.5,
        };
        assert!(config.validate().is_err());
    }
}
