//! # Cross-Framework Mappings
//!
//! A [`ComplianceMapping`] is a directed edge from a source requirement to a
//! target requirement in another framework, stating how much of the target
//! the source satisfies.
//!
//! ## Percentage provenance
//!
//! A mapping carries up to three strength values:
//!
//! - the **baseline** strength set when the mapping is created,
//! - a **calculated** strength written by quality analysis,
//! - a **manual** override written by a reviewer.
//!
//! [`MappingPercentage::final_percentage`] resolves them with strict
//! precedence manual > calculated > baseline and reports which one won.
//! Clearing the manual override makes the calculated value visible again.
//!
//! The mapping type band is derived from the baseline on every read.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use grc_core::{
    round_to, GapItemId, GrcError, IdentificationSource, MappingConfidence, MappingId,
    MappingStrength, MappingType, Percentage, RequirementId, ReviewStatus, Timestamp, UnitScore,
    UserId,
};

use crate::gap::MappingGapItem;
use crate::review::{ReviewTransitionRecord, ReviewWorkflow};

// ─── Percentage Provenance ──────────────────────────────────────────

/// Which of the three strength values the final percentage came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Manual,
    Calculated,
    Baseline,
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Manual => "manual",
            Self::Calculated => "calculated",
            Self::Baseline => "baseline",
        })
    }
}

/// The effective strength of a mapping and where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalPercentage {
    pub value: MappingStrength,
    pub provenance: Provenance,
}

/// Baseline, calculated and manual strengths of a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MappingPercentage {
    baseline: MappingStrength,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    calculated: Option<MappingStrength>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    manual: Option<MappingStrength>,
}

impl MappingPercentage {
    pub fn new(baseline: i64) -> Self {
        Self {
            baseline: MappingStrength::clamped(baseline),
            calculated: None,
            manual: None,
        }
    }

    pub fn baseline(&self) -> MappingStrength {
        self.baseline
    }

    pub fn calculated(&self) -> Option<MappingStrength> {
        self.calculated
    }

    pub fn manual(&self) -> Option<MappingStrength> {
        self.manual
    }

    pub fn set_baseline(&mut self, value: i64) {
        self.baseline = MappingStrength::clamped(value);
    }

    pub fn set_calculated(&mut self, value: Option<i64>) {
        self.calculated = value.map(MappingStrength::clamped);
    }

    pub fn set_manual(&mut self, value: Option<i64>) {
        self.manual = value.map(MappingStrength::clamped);
    }

    /// Resolve the effective strength: manual, else calculated, else baseline.
    pub fn final_percentage(&self) -> FinalPercentage {
        match (self.manual, self.calculated) {
            (Some(value), _) => FinalPercentage {
                value,
                provenance: Provenance::Manual,
            },
            (None, Some(value)) => FinalPercentage {
                value,
                provenance: Provenance::Calculated,
            },
            (None, None) => FinalPercentage {
                value: self.baseline,
                provenance: Provenance::Baseline,
            },
        }
    }
}

// ─── Similarity Signals ─────────────────────────────────────────────

/// Output of the last quality analysis stored on the mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilaritySignals {
    pub textual_similarity: UnitScore,
    pub keyword_overlap: UnitScore,
    pub structural_similarity: UnitScore,
    pub analysis_confidence: Percentage,
    pub quality_score: Percentage,
    pub requires_review: bool,
    pub algorithm_version: String,
}

impl Default for SimilaritySignals {
    fn default() -> Self {
        Self {
            textual_similarity: UnitScore::ZERO,
            keyword_overlap: UnitScore::ZERO,
            structural_similarity: UnitScore::ZERO,
            analysis_confidence: Percentage::ZERO,
            quality_score: Percentage::ZERO,
            requires_review: true,
            algorithm_version: String::new(),
        }
    }
}

// ─── Mapping ────────────────────────────────────────────────────────

/// A directed mapping from a source requirement to a target requirement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceMapping {
    pub id: MappingId,
    pub source: RequirementId,
    pub target: RequirementId,
    percentage: MappingPercentage,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub bidirectional: bool,
    #[serde(default)]
    pub confidence: MappingConfidence,
    #[serde(default)]
    signals: SimilaritySignals,
    #[serde(default)]
    review: ReviewWorkflow,
    #[serde(default)]
    gap_items: Vec<MappingGapItem>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ComplianceMapping {
    pub fn new(source: RequirementId, target: RequirementId, baseline: i64) -> Self {
        let now = Timestamp::now();
        let mapping = Self {
            id: MappingId::new(),
            source,
            target,
            percentage: MappingPercentage::new(baseline),
            rationale: String::new(),
            bidirectional: false,
            confidence: MappingConfidence::default(),
            signals: SimilaritySignals::default(),
            review: ReviewWorkflow::new(),
            gap_items: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        tracing::debug!(
            mapping = %mapping.id,
            strength = %mapping.percentage.baseline(),
            mapping_type = %mapping.mapping_type(),
            "mapping classified"
        );
        mapping
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }

    /// Mark the mapping as one half of a mutual pair.
    pub fn with_bidirectional(mut self, bidirectional: bool) -> Self {
        self.bidirectional = bidirectional;
        self
    }

    // -- percentages --

    pub fn percentage(&self) -> &MappingPercentage {
        &self.percentage
    }

    /// The baseline strength.
    pub fn mapping_percentage(&self) -> MappingStrength {
        self.percentage.baseline()
    }

    pub fn set_mapping_percentage(&mut self, value: i64) {
        self.percentage.set_baseline(value);
        tracing::debug!(
            mapping = %self.id,
            strength = %self.percentage.baseline(),
            mapping_type = %self.mapping_type(),
            "mapping reclassified"
        );
        self.touch();
    }

    pub fn set_calculated_percentage(&mut self, value: Option<i64>) {
        self.percentage.set_calculated(value);
        self.touch();
    }

    pub fn set_manual_percentage(&mut self, value: Option<i64>) {
        self.percentage.set_manual(value);
        self.touch();
    }

    pub fn final_percentage(&self) -> FinalPercentage {
        self.percentage.final_percentage()
    }

    /// Band of the baseline strength.
    pub fn mapping_type(&self) -> MappingType {
        MappingType::classify(self.percentage.baseline())
    }

    pub fn badge_class(&self) -> &'static str {
        self.mapping_type().badge_class()
    }

    pub fn type_description(&self) -> String {
        self.mapping_type().describe(self.percentage.baseline())
    }

    /// Fulfillment credited to the target through this mapping, rounded to
    /// two decimals. Unknown source fulfillment yields no credit.
    pub fn transitive_fulfillment(&self, source_fulfillment: Option<f64>) -> f64 {
        match source_fulfillment {
            Some(source) => round_to(source * self.percentage.baseline().as_ratio(), 2),
            None => 0.0,
        }
    }

    // -- analysis signals --

    pub fn signals(&self) -> &SimilaritySignals {
        &self.signals
    }

    pub fn set_signals(&mut self, signals: SimilaritySignals) {
        self.signals = signals;
        self.touch();
    }

    pub fn requires_review(&self) -> bool {
        self.signals.requires_review
    }

    // -- review workflow --

    pub fn review(&self) -> &ReviewWorkflow {
        &self.review
    }

    pub fn review_status(&self) -> ReviewStatus {
        self.review.status()
    }

    pub fn review_transitions(&self) -> &[ReviewTransitionRecord] {
        self.review.transitions()
    }

    pub fn start_review(&mut self, actor: UserId) -> Result<(), GrcError> {
        self.review.start_review(actor)?;
        self.touch();
        Ok(())
    }

    pub fn approve(&mut self, actor: UserId, notes: Option<String>) -> Result<(), GrcError> {
        self.review.approve(actor, notes)?;
        self.touch();
        Ok(())
    }

    pub fn reject(&mut self, actor: UserId, notes: Option<String>) -> Result<(), GrcError> {
        self.review.reject(actor, notes)?;
        self.touch();
        Ok(())
    }

    pub fn reopen(&mut self, actor: UserId, notes: Option<String>) -> Result<(), GrcError> {
        self.review.reopen(actor, notes)?;
        self.touch();
        Ok(())
    }

    pub fn verify(&mut self, actor: UserId, date: NaiveDate) -> Result<(), GrcError> {
        self.review.verify(actor, date)?;
        self.touch();
        Ok(())
    }

    // -- gap items --

    pub fn gap_items(&self) -> &[MappingGapItem] {
        &self.gap_items
    }

    pub fn gap_item_mut(&mut self, id: &GapItemId) -> Option<&mut MappingGapItem> {
        self.gap_items.iter_mut().find(|g| g.id == *id)
    }

    pub fn add_gap_item(&mut self, item: MappingGapItem) -> GapItemId {
        let id = item.id;
        self.gap_items.push(item);
        self.touch();
        id
    }

    /// Replace all algorithm-identified items, keeping manual ones.
    pub fn replace_algorithm_gaps(&mut self, items: Vec<MappingGapItem>) {
        self.gap_items
            .retain(|g| g.identification_source == IdentificationSource::Manual);
        self.gap_items.extend(items);
        self.touch();
    }

    pub fn remove_gap_item(&mut self, id: &GapItemId) -> Option<MappingGapItem> {
        let pos = self.gap_items.iter().position(|g| g.id == *id)?;
        self.touch();
        Some(self.gap_items.remove(pos))
    }

    /// Plain sum of every item's impact, uncapped.
    pub fn total_gap_impact(&self) -> u32 {
        self.gap_items
            .iter()
            .map(|g| u32::from(g.percentage_impact().value()))
            .sum()
    }

    pub fn unresolved_gap_count(&self) -> usize {
        self.gap_items.iter().filter(|g| g.is_unresolved()).count()
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}
