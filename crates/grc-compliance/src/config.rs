//! # Engine Configuration
//!
//! Tunables for analysis and assessment. Every field has a default, so an
//! empty YAML document is a valid configuration.

use serde::{Deserialize, Serialize};

use grc_core::GrcError;

/// Version tag stamped on every quality analysis.
pub const ALGORITHM_VERSION: &str = "1.0.0";

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub quality: QualityConfig,
    #[serde(default)]
    pub gaps: GapConfig,
    #[serde(default)]
    pub review: ReviewConfig,
}

impl EngineConfig {
    /// Parse a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, GrcError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| GrcError::Serialization(e.to_string()))
    }
}

/// Mapping quality analysis settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Analyses with confidence below this are flagged for review.
    #[serde(default = "default_review_threshold")]
    pub review_confidence_threshold: u8,
    #[serde(default = "default_algorithm_version")]
    pub algorithm_version: String,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            review_confidence_threshold: default_review_threshold(),
            algorithm_version: default_algorithm_version(),
        }
    }
}

/// Gap summary settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapConfig {
    /// Gaps at or above this confidence count as high-confidence.
    #[serde(default = "default_high_confidence")]
    pub high_confidence_threshold: u8,
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            high_confidence_threshold: default_high_confidence(),
        }
    }
}

/// Fulfillment review scheduling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Days from an assessment to the next scheduled review.
    #[serde(default = "default_interval_days")]
    pub default_interval_days: u32,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            default_interval_days: default_interval_days(),
        }
    }
}

fn default_review_threshold() -> u8 {
    70
}

fn default_algorithm_version() -> String {
    ALGORITHM_VERSION.to_string()
}

fn default_high_confidence() -> u8 {
    80
}

fn default_interval_days() -> u32 {
    365
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = EngineConfig::default();
        assert_eq!(c.quality.review_confidence_threshold, 70);
        assert_eq!(c.quality.algorithm_version, "1.0.0");
        assert_eq!(c.gaps.high_confidence_threshold, 80);
        assert_eq!(c.review.default_interval_days, 365);
    }

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(EngineConfig::from_yaml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let c = EngineConfig::from_yaml_str("quality:\n  review_confidence_threshold: 60\n").unwrap();
        assert_eq!(c.quality.review_confidence_threshold, 60);
        assert_eq!(c.quality.algorithm_version, "1.0.0");
        assert_eq!(c.review.default_interval_days, 365);
    }

    #[test]
    fn malformed_yaml_is_serialization_error() {
        let err = EngineConfig::from_yaml_str("quality: [1, 2").unwrap_err();
        assert!(matches!(err, GrcError::Serialization(_)));
    }
}
