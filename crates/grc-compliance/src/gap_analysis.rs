//! # Automated Gap Analysis
//!
//! Turns a [`QualityAnalysis`] into concrete [`MappingGapItem`]s explaining
//! why a source requirement falls short of its target.
//!
//! Five independent rules fire in order:
//!
//! 1. **Missing control**: target keywords the source never mentions.
//! 2. **Partial coverage**: textual similarity between 0.3 and 0.7.
//! 3. **Scope difference**: structural similarity below 0.5.
//! 4. **Additional requirement**: target text much longer with many unique
//!    keywords.
//! 5. **Evidence gap**: strong stated mapping but only moderate textual
//!    support.

use std::collections::BTreeMap;

use serde::Serialize;

use grc_core::{GapType, Priority};

use crate::config::GapConfig;
use crate::gap::MappingGapItem;
use crate::mapping::ComplianceMapping;
use crate::quality::QualityAnalysis;
use crate::requirement::ComplianceRequirement;

const CRITICAL_KEYWORDS: &[&str] =
    &["encryption", "authentication", "authorization", "audit", "logging"];
const HIGH_KEYWORDS: &[&str] =
    &["access control", "monitoring", "backup", "incident", "vulnerability"];

/// Keyword fragment → recommended measure. First matching fragment wins.
const RECOMMENDATIONS: &[(&str, &str)] = &[
    ("encryption", "Implement encryption controls (e.g. TLS, encryption of data at rest)"),
    ("authentication", "Implement authentication mechanisms (e.g. MFA, SSO)"),
    ("authorization", "Implement authorization controls (e.g. RBAC, least privilege)"),
    ("access control", "Implement access controls and access management"),
    ("audit", "Establish audit logging and review processes"),
    ("logging", "Implement comprehensive log management"),
    ("monitoring", "Establish continuous monitoring and alerting"),
    ("backup", "Implement backup and recovery procedures"),
    ("incident", "Establish incident response processes"),
    ("vulnerability", "Establish vulnerability management and patching"),
    ("network", "Implement network security controls (firewall, segmentation)"),
    ("risk", "Perform risk assessments and implement risk treatment"),
];

const FALLBACK_RECOMMENDATIONS: &[&str] = &[
    "Analyse the missing concepts in detail",
    "Clarify the requirements with subject matter experts",
    "Create an implementation plan for the missing controls",
];

/// Generates gap items from quality analysis results.
#[derive(Debug, Clone, Copy, Default)]
pub struct GapAnalyzer;

impl GapAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(
        &self,
        mapping: &ComplianceMapping,
        analysis: &QualityAnalysis,
        source: &ComplianceRequirement,
        target: &ComplianceRequirement,
    ) -> Vec<MappingGapItem> {
        let mut gaps = Vec::new();
        let missing = analysis.missing_keywords();
        let textual = analysis.textual_similarity.value();

        if !missing.is_empty() {
            gaps.push(missing_keywords_gap(&missing));
        }
        if textual > 0.3 && textual < 0.7 {
            gaps.push(partial_coverage_gap(textual));
        }
        if analysis.structural_similarity.value() < 0.5 {
            gaps.push(scope_difference_gap(source, target));
        }
        if let Some(gap) = additional_requirement_gap(source, target, &missing) {
            gaps.push(gap);
        }
        if mapping.mapping_percentage().value() > 80 && textual > 0.5 && textual < 0.7 {
            gaps.push(evidence_gap());
        }

        tracing::debug!(mapping = %mapping.id, gaps = gaps.len(), "gap analysis complete");
        gaps
    }
}

fn missing_keywords_gap(missing: &[String]) -> MappingGapItem {
    let critical = missing.iter().filter(|k| CRITICAL_KEYWORDS.contains(&k.as_str())).count();
    let high = missing.iter().filter(|k| HIGH_KEYWORDS.contains(&k.as_str())).count();
    let (priority, impact) = if critical > 0 {
        (Priority::Critical, 30)
    } else if high > 0 {
        (Priority::High, 20)
    } else if missing.len() > 5 {
        (Priority::High, 25)
    } else {
        (Priority::Medium, 15)
    };
    let confidence = match missing.len() {
        n if n > 10 => 85,
        n if n > 5 => 75,
        n if n > 2 => 65,
        _ => 50,
    };
    let other = missing.len() - critical - high;
    let effort = (critical as f64 * 2.0 + high as f64 + other as f64 * 0.5).ceil() as u32;

    let listed: Vec<&str> = missing.iter().take(10).map(String::as_str).collect();
    let description = format!(
        "The source requirement does not cover the following concepts required by the target: {}. \
         These aspects must be implemented additionally to reach full compliance.",
        listed.join(", ")
    );
    let mut gap = MappingGapItem::from_algorithm(
        GapType::MissingControl,
        description,
        priority,
        impact,
        confidence,
        effort,
    );
    gap.missing_keywords = missing.to_vec();
    gap.recommended_action = Some(recommendations(missing));
    gap
}

fn recommendations(missing: &[String]) -> String {
    let mut lines = vec!["The following measures are recommended:".to_string()];
    let mut added: Vec<&str> = Vec::new();
    for keyword in missing {
        let hit = RECOMMENDATIONS
            .iter()
            .find(|(fragment, action)| keyword.contains(fragment) && !added.contains(action));
        if let Some((_, action)) = hit {
            lines.push(format!("- {action}"));
            added.push(*action);
        }
    }
    if added.is_empty() {
        lines.extend(FALLBACK_RECOMMENDATIONS.iter().map(|r| format!("- {r}")));
    }
    lines.join("\n")
}

fn partial_coverage_gap(textual: f64) -> MappingGapItem {
    let coverage = (textual * 100.0).round() as i64;
    let priority = if coverage < 50 { Priority::High } else { Priority::Medium };
    let confidence = if textual > 0.4 && textual < 0.6 { 80 } else { 70 };
    let mut gap = MappingGapItem::from_algorithm(
        GapType::PartialCoverage,
        format!(
            "The source requirement covers only about {coverage}% of the target requirement. \
             Additional measures are needed to cover the missing aspects."
        ),
        priority,
        ((1.0 - textual) * 30.0).round() as i64,
        confidence,
        ((1.0 - textual) * 10.0).round() as u32,
    );
    gap.recommended_action = Some(
        "Compare the target requirement with the source requirement, identify the specific \
         missing aspects, then add controls or extend existing ones."
            .to_string(),
    );
    gap
}

fn scope_difference_gap(
    source: &ComplianceRequirement,
    target: &ComplianceRequirement,
) -> MappingGapItem {
    let source_category = source.category.as_deref().unwrap_or("Unknown");
    let target_category = target.category.as_deref().unwrap_or("Unknown");
    let mut gap = MappingGapItem::from_algorithm(
        GapType::ScopeDifference,
        format!(
            "Scope difference: the source requirement (category: {source_category}) and the \
             target requirement (category: {target_category}) have different focus areas. \
             A one-to-one transfer is not fully possible."
        ),
        Priority::Medium,
        15,
        65,
        4,
    );
    gap.recommended_action = Some(
        "Check whether combining several source requirements covers the target scope, or \
         whether scope-specific controls are needed."
            .to_string(),
    );
    gap
}

fn additional_requirement_gap(
    source: &ComplianceRequirement,
    target: &ComplianceRequirement,
    unique: &[String],
) -> Option<MappingGapItem> {
    let (source_len, target_len) = (source.text().len() as f64, target.text().len() as f64);
    if target_len <= source_len * 1.5 || unique.len() <= 5 {
        return None;
    }
    let confidence = match unique.len() {
        n if n > 8 => 80,
        n if n > 4 => 70,
        _ => 60,
    };
    let mut gap = MappingGapItem::from_algorithm(
        GapType::AdditionalRequirement,
        format!(
            "The target requirement goes beyond the source requirement: {} additional concepts \
             were identified that the source does not contain.",
            unique.len()
        ),
        Priority::High,
        25,
        confidence,
        (unique.len() as f64 * 0.5).ceil() as u32,
    );
    gap.missing_keywords = unique.iter().take(20).cloned().collect();
    gap.recommended_action = Some(
        "Implement the additional target requirements separately. Check whether other \
         requirements of the source framework cover them or whether new controls are needed."
            .to_string(),
    );
    Some(gap)
}

fn evidence_gap() -> MappingGapItem {
    let mut gap = MappingGapItem::from_algorithm(
        GapType::EvidenceGap,
        "The control appears to exist, but documentation or evidence of its implementation \
         may be incomplete. The mapping percentage is high while textual agreement is not."
            .to_string(),
        Priority::Medium,
        10,
        70,
        3,
    );
    gap.recommended_action = Some(
        "Complete the documentation: describe the implemented controls and collect evidence \
         (screenshots, policies, logs) against the target framework."
            .to_string(),
    );
    gap
}

// ─── Summary ────────────────────────────────────────────────────────

/// Aggregate statistics over a set of gap items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GapSummary {
    pub total_gaps: usize,
    pub by_type: BTreeMap<GapType, usize>,
    pub by_priority: BTreeMap<Priority, usize>,
    /// Sum of impacts, capped at 100.
    pub total_impact: u32,
    /// Sum of effort estimates in hours.
    pub total_effort: u32,
    pub high_confidence_gaps: usize,
}

impl GapSummary {
    pub fn from_items<'a, I>(items: I, config: &GapConfig) -> Self
    where
        I: IntoIterator<Item = &'a MappingGapItem>,
    {
        let mut summary = Self::default();
        let mut impact = 0u32;
        for gap in items {
            summary.total_gaps += 1;
            *summary.by_type.entry(gap.gap_type).or_insert(0) += 1;
            *summary.by_priority.entry(gap.priority).or_insert(0) += 1;
            impact += u32::from(gap.percentage_impact().value());
            summary.total_effort += gap.estimated_effort.unwrap_or(0);
            if gap.confidence().value() >= config.high_confidence_threshold {
                summary.high_confidence_gaps += 1;
            }
        }
        summary.total_impact = impact.min(100);
        summary
    }
}
