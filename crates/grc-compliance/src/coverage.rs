//! # Cross-Framework Coverage
//!
//! Framework-level views over the mapping graph for one ordered pair of
//! frameworks:
//!
//! - [`FrameworkCoverage`]: how much of the target framework the source
//!   framework's mappings cover. Each target requirement counts once with its
//!   strongest incoming baseline, capped at 100 when averaged.
//! - [`TransitiveCompliance`]: how much fulfillment a tenant's source
//!   requirements credit to the target framework, one hop per mapping.
//!
//! Both averages divide by every requirement of the target framework, mapped
//! or not.

use std::collections::BTreeMap;

use serde::Serialize;

use grc_core::{round_to, MappingId, MappingStrength, RequirementId};

use crate::framework::ComplianceFramework;
use crate::graph::{FulfillmentSource, MappingGraph};
use crate::mapping::ComplianceMapping;
use crate::requirement::RequirementArena;

/// Mappings from requirements of `source` to requirements of `target`,
/// strongest baseline first.
pub fn cross_framework_mappings<'a>(
    graph: &'a MappingGraph,
    arena: &RequirementArena,
    source: &ComplianceFramework,
    target: &ComplianceFramework,
) -> Vec<&'a ComplianceMapping> {
    let in_framework = |id: &RequirementId, framework: &ComplianceFramework| {
        arena.get(id).is_some_and(|r| r.framework_id == framework.id)
    };
    let mut mappings: Vec<&ComplianceMapping> = graph
        .iter()
        .filter(|m| in_framework(&m.source, source) && in_framework(&m.target, target))
        .collect();
    mappings.sort_by(|a, b| b.mapping_percentage().cmp(&a.mapping_percentage()));
    mappings
}

/// Coverage of a target framework by a source framework.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameworkCoverage {
    pub source_framework: String,
    pub target_framework: String,
    pub total_target_requirements: usize,
    /// Target requirements with at least one incoming mapping.
    pub covered_requirements: usize,
    /// Average best coverage over all target requirements, two decimals.
    pub coverage_percentage: f64,
    /// Covered requirements whose best mapping is 100 or more.
    pub strong_mappings: usize,
    /// Best mapping in 50–99.
    pub partial_mappings: usize,
    /// Best mapping below 50.
    pub weak_mappings: usize,
    /// Mappings between the two frameworks flagged bidirectional.
    pub bidirectional_mappings: usize,
}

impl FrameworkCoverage {
    pub fn calculate(
        graph: &MappingGraph,
        arena: &RequirementArena,
        source: &ComplianceFramework,
        target: &ComplianceFramework,
    ) -> Self {
        let mappings = cross_framework_mappings(graph, arena, source, target);
        let mut best: BTreeMap<RequirementId, MappingStrength> = BTreeMap::new();
        for mapping in &mappings {
            let strength = mapping.mapping_percentage();
            best.entry(mapping.target)
                .and_modify(|b| *b = (*b).max(strength))
                .or_insert(strength);
        }

        let total_target_requirements = arena.requirements_in(&target.id).len();
        let covered: u32 = best.values().map(|s| u32::from(s.value().min(100))).sum();
        let coverage_percentage = if total_target_requirements > 0 {
            round_to(f64::from(covered) / total_target_requirements as f64, 2)
        } else {
            0.0
        };
        let count = |band: fn(u8) -> bool| best.values().filter(|s| band(s.value())).count();

        let coverage = Self {
            source_framework: source.code.clone(),
            target_framework: target.code.clone(),
            total_target_requirements,
            covered_requirements: best.len(),
            coverage_percentage,
            strong_mappings: count(|v| v >= 100),
            partial_mappings: count(|v| (50..100).contains(&v)),
            weak_mappings: count(|v| v < 50),
            bidirectional_mappings: mappings.iter().filter(|m| m.bidirectional).count(),
        };
        tracing::debug!(
            source = %coverage.source_framework,
            target = %coverage.target_framework,
            coverage = coverage.coverage_percentage,
            "framework coverage calculated"
        );
        coverage
    }
}

/// Credit one mapping passes to its target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitiveContribution {
    pub mapping: MappingId,
    pub source: RequirementId,
    pub target: RequirementId,
    pub mapping_strength: MappingStrength,
    pub source_fulfillment: f64,
    pub transitive_contribution: f64,
}

/// Fulfillment a source framework passes to a target framework.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitiveCompliance {
    pub source_framework: String,
    pub target_framework: String,
    /// Target requirements receiving any credit.
    pub requirements_helped: usize,
    /// Total benefit spread over all target requirements, two decimals.
    pub average_transitive_benefit: f64,
    /// Sum of the best credit per helped target requirement.
    pub total_benefit: f64,
    /// Every mapping with a positive contribution, strongest mapping first.
    pub contributions: Vec<TransitiveContribution>,
}

impl TransitiveCompliance {
    pub fn calculate<S>(
        graph: &MappingGraph,
        arena: &RequirementArena,
        source: &ComplianceFramework,
        target: &ComplianceFramework,
        fulfillment: &S,
    ) -> Self
    where
        S: FulfillmentSource + ?Sized,
    {
        let contributions: Vec<TransitiveContribution> =
            cross_framework_mappings(graph, arena, source, target)
                .into_iter()
                .filter_map(|m| {
                    let source_fulfillment = fulfillment.fulfillment_of(&m.source);
                    let contribution = m.transitive_fulfillment(source_fulfillment);
                    (contribution > 0.0).then(|| TransitiveContribution {
                        mapping: m.id,
                        source: m.source,
                        target: m.target,
                        mapping_strength: m.mapping_percentage(),
                        source_fulfillment: source_fulfillment.unwrap_or(0.0),
                        transitive_contribution: contribution,
                    })
                })
                .collect();

        let mut best: BTreeMap<RequirementId, f64> = BTreeMap::new();
        for c in &contributions {
            best.entry(c.target)
                .and_modify(|b| *b = b.max(c.transitive_contribution))
                .or_insert(c.transitive_contribution);
        }
        let total: f64 = best.values().sum();
        let target_count = arena.requirements_in(&target.id).len();
        let average_transitive_benefit = if target_count > 0 {
            round_to(total / target_count as f64, 2)
        } else {
            0.0
        };

        Self {
            source_framework: source.code.clone(),
            target_framework: target.code.clone(),
            requirements_helped: best.len(),
            average_transitive_benefit,
            total_benefit: round_to(total, 2),
            contributions,
        }
    }
}
