//! # Mapping Gap Items
//!
//! A gap item names something the source requirement of a mapping does not
//! cover. Items are owned by their mapping and dropped with it.

use serde::{Deserialize, Serialize};

use grc_core::{
    GapItemId, GapStatus, GapType, GrcError, IdentificationSource, Percentage, Priority, Timestamp,
};

/// A single gap between a mapping's source and target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingGapItem {
    pub id: GapItemId,
    pub gap_type: GapType,
    pub description: String,
    /// Target concepts absent from the source.
    #[serde(default)]
    pub missing_keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_action: Option<String>,
    pub priority: Priority,
    /// Estimated remediation effort in hours.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_effort: Option<u32>,
    percentage_impact: Percentage,
    pub identification_source: IdentificationSource,
    confidence: Percentage,
    status: GapStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl MappingGapItem {
    /// A manually identified gap with default priority (medium), 0% impact
    /// and 50% confidence.
    pub fn new(gap_type: GapType, description: impl Into<String>) -> Self {
        let now = Timestamp::now();
        Self {
            id: GapItemId::new(),
            gap_type,
            description: description.into(),
            missing_keywords: Vec::new(),
            recommended_action: None,
            priority: Priority::default(),
            estimated_effort: None,
            percentage_impact: Percentage::ZERO,
            identification_source: IdentificationSource::Manual,
            confidence: Percentage::clamped(50),
            status: GapStatus::default(),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// A gap produced by automated analysis.
    pub(crate) fn from_algorithm(
        gap_type: GapType,
        description: String,
        priority: Priority,
        impact: i64,
        confidence: i64,
        effort: u32,
    ) -> Self {
        let mut item = Self::new(gap_type, description);
        item.priority = priority;
        item.identification_source = IdentificationSource::Algorithm;
        item.estimated_effort = Some(effort);
        item.set_percentage_impact(impact);
        item.set_confidence(confidence);
        item
    }

    /// How many percentage points of the mapping this gap accounts for.
    pub fn percentage_impact(&self) -> Percentage {
        self.percentage_impact
    }

    /// Set the impact, clamping into 0–100.
    pub fn set_percentage_impact(&mut self, value: i64) {
        self.percentage_impact = Percentage::clamped(value);
        self.updated_at = Timestamp::now();
    }

    pub fn confidence(&self) -> Percentage {
        self.confidence
    }

    /// Set the confidence, clamping into 0–100.
    pub fn set_confidence(&mut self, value: i64) {
        self.confidence = Percentage::clamped(value);
        self.updated_at = Timestamp::now();
    }

    pub fn status(&self) -> GapStatus {
        self.status
    }

    pub fn set_status(&mut self, status: GapStatus) {
        self.status = status;
        self.updated_at = Timestamp::now();
    }

    /// Parse and set a status string. Unknown values are rejected.
    pub fn set_status_str(&mut self, status: &str) -> Result<(), GrcError> {
        self.set_status(status.parse()?);
        Ok(())
    }

    pub fn is_unresolved(&self) -> bool {
        self.status.is_unresolved()
    }

    /// Badge class for the gap's priority.
    pub fn priority_badge_class(&self) -> &'static str {
        match self.priority {
            Priority::Critical => "danger",
            Priority::High => "warning",
            Priority::Medium => "info",
            Priority::Low => "secondary",
        }
    }

    /// Badge class for the gap's status.
    pub fn status_badge_class(&self) -> &'static str {
        match self.status {
            GapStatus::Identified => "secondary",
            GapStatus::Planned => "info",
            GapStatus::InProgress => "primary",
            GapStatus::Resolved => "success",
            GapStatus::WontFix => "dark",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let g = MappingGapItem::new(GapType::EvidenceGap, "no evidence");
        assert_eq!(g.priority, Priority::Medium);
        assert_eq!(g.confidence().value(), 50);
        assert_eq!(g.percentage_impact().value(), 0);
        assert_eq!(g.status(), GapStatus::Identified);
        assert_eq!(g.identification_source, IdentificationSource::Manual);
        assert!(g.is_unresolved());
    }

    #[test]
    fn test_clamping() {
        let mut g = MappingGapItem::new(GapType::MissingControl, "x");
        g.set_percentage_impact(140);
        g.set_confidence(-5);
        assert_eq!(g.percentage_impact().value(), 100);
        assert_eq!(g.confidence().value(), 0);
    }

    #[test]
    fn test_status_string_is_strict() {
        let mut g = MappingGapItem::new(GapType::MissingControl, "x");
        g.set_status_str("wont_fix").unwrap();
        assert!(!g.is_unresolved());
        assert!(g.set_status_str("closed").is_err());
        assert_eq!(g.status(), GapStatus::WontFix);
    }

    #[test]
    fn test_algorithm_item() {
        let g = MappingGapItem::from_algorithm(
            GapType::ScopeDifference,
            "scope".into(),
            Priority::High,
            15,
            65,
            4,
        );
        assert_eq!(g.identification_source, IdentificationSource::Algorithm);
        assert_eq!(g.estimated_effort, Some(4));
        assert_eq!(g.percentage_impact().value(), 15);
        assert_eq!(g.confidence().value(), 65);
    }

    #[test]
    fn test_badges() {
        let mut g = MappingGapItem::new(GapType::MissingControl, "x");
        g.priority = Priority::Critical;
        assert_eq!(g.priority_badge_class(), "danger");
        g.set_status(GapStatus::Resolved);
        assert_eq!(g.status_badge_class(), "success");
    }
}
