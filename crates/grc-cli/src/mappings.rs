//! # Mappings CLI — Quality analysis of cross-framework mappings.
//!
//! Runs the quality analyzer over every mapping in the dataset, stores the
//! calculated percentage, and reports the final percentage with its
//! provenance. With `--tenant`, also reports the fulfillment each mapping
//! credits to its target.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use grc_compliance::graph::FulfillmentSource;
use grc_compliance::mapping::FinalPercentage;
use grc_compliance::{EngineConfig, MappingQualityAnalyzer, QualityAnalysis, TenantFulfillment};
use grc_core::{MappingId, MappingStrength, MappingType};

use crate::dataset::Dataset;

/// Mappings subcommand arguments.
#[derive(Args, Debug)]
pub struct MappingsArgs {
    /// Dataset YAML file.
    #[arg(long)]
    pub dataset: PathBuf,

    /// Tenant whose fulfillment is credited through the mappings.
    #[arg(long)]
    pub tenant: Option<String>,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

/// One analysed mapping.
#[derive(Debug, Clone, Serialize)]
pub struct MappingReport {
    pub id: MappingId,
    pub source: String,
    pub target: String,
    pub baseline: MappingStrength,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual: Option<MappingStrength>,
    pub final_percentage: FinalPercentage,
    pub mapping_type: MappingType,
    /// Whether a bidirectional counterpart runs the other way.
    pub paired: bool,
    pub analysis: QualityAnalysis,
    /// Fulfillment credited to the target, when a tenant was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transitive_credit: Option<f64>,
}

/// Execute the mappings subcommand.
pub fn run_mappings(args: &MappingsArgs, config: &EngineConfig) -> Result<u8> {
    let mut dataset = Dataset::load(&args.dataset)?;
    let reports = analyze_mappings(&mut dataset, args.tenant.as_deref(), config)?;
    if args.json {
        crate::print_json(&reports)?;
        return Ok(0);
    }
    for report in &reports {
        let arrow = if report.paired { "<->" } else { "->" };
        println!("{} {arrow} {}", report.source, report.target);
        println!(
            "  final:      {} ({}, {})",
            report.final_percentage.value, report.final_percentage.provenance, report.mapping_type
        );
        println!(
            "  baseline:   {}   calculated: {}",
            report.baseline, report.analysis.calculated_percentage
        );
        println!(
            "  signals:    textual {:.2}  keyword {:.2}  structural {:.2}",
            report.analysis.textual_similarity.value(),
            report.analysis.keyword_overlap.value(),
            report.analysis.structural_similarity.value()
        );
        println!(
            "  confidence: {}   quality: {}{}",
            report.analysis.analysis_confidence,
            report.analysis.quality_score,
            if report.analysis.requires_review { "   (review required)" } else { "" }
        );
        if let Some(credit) = report.transitive_credit {
            println!("  credit:     {credit:.2}%");
        }
        println!();
    }
    println!("Total: {} mappings", reports.len());
    Ok(0)
}

/// Analyse every mapping and store the calculated percentages.
pub fn analyze_mappings(
    dataset: &mut Dataset,
    tenant: Option<&str>,
    config: &EngineConfig,
) -> Result<Vec<MappingReport>> {
    let tenant = tenant.map(|name| dataset.tenant(name)).transpose()?;
    let analyzer = MappingQualityAnalyzer::new(config.quality.clone());
    let ids = dataset.mappings.ids().to_vec();
    let mut reports = Vec::with_capacity(ids.len());

    for id in ids {
        let analysis = {
            let mapping = dataset.mappings.get(&id).context("mapping vanished")?;
            let ends = dataset.endpoints(mapping)?;
            analyzer.analyze(
                mapping,
                ends.source,
                ends.target,
                ends.source_framework,
                ends.target_framework,
            )
        };
        if let Some(mapping) = dataset.mappings.get_mut(&id) {
            analysis.apply_to(mapping);
        }

        let mapping = dataset.mappings.get(&id).context("mapping vanished")?;
        let transitive_credit = tenant.map(|tid| {
            let view = TenantFulfillment::new(&dataset.ledger, tid);
            mapping.transitive_fulfillment(view.fulfillment_of(&mapping.source))
        });
        reports.push(MappingReport {
            id,
            source: dataset.reference_of(&mapping.source),
            target: dataset.reference_of(&mapping.target),
            baseline: mapping.percentage().baseline(),
            manual: mapping.percentage().manual(),
            final_percentage: mapping.final_percentage(),
            mapping_type: mapping.mapping_type(),
            paired: dataset.mappings.reverse_of(&id).is_some(),
            analysis,
            transitive_credit,
        });
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::SAMPLE;
    use grc_compliance::Provenance;

    #[test]
    fn analysis_stores_calculated_percentage() {
        let mut ds = Dataset::from_yaml_str(SAMPLE).unwrap();
        let reports = analyze_mappings(&mut ds, None, &EngineConfig::default()).unwrap();
        assert_eq!(reports.len(), 1);
        let report = &reports[0];
        assert_eq!(report.source, "ISO27001:A.5.1");
        assert_eq!(report.target, "NIS2:21.2.c");
        assert_eq!(report.baseline.value(), 60);
        assert_eq!(report.mapping_type, MappingType::Partial);
        assert_eq!(report.final_percentage.provenance, Provenance::Calculated);
        assert_eq!(report.final_percentage.value, report.analysis.calculated_percentage);
        assert!(report.transitive_credit.is_none());
        assert!(!report.paired);

        let stored = ds.mappings.get(&report.id).unwrap();
        assert_eq!(stored.percentage().calculated(), Some(report.analysis.calculated_percentage));
    }

    #[test]
    fn transitive_credit_uses_baseline_and_inherited_records() {
        let mut ds = Dataset::from_yaml_str(SAMPLE).unwrap();
        let config = EngineConfig::default();
        // Holding records 90% on the source; 90 × 60% = 54.
        let holding = analyze_mappings(&mut ds, Some("Acme Holding"), &config).unwrap();
        assert_eq!(holding[0].transitive_credit, Some(54.0));
        // The hierarchical subsidiary sees the holding's record.
        let gmbh = analyze_mappings(&mut ds, Some("Acme GmbH"), &config).unwrap();
        assert_eq!(gmbh[0].transitive_credit, Some(54.0));
    }

    #[test]
    fn manual_override_reported() {
        let yaml = SAMPLE.replace("percentage: 60 }", "percentage: 60, manual_percentage: 75 }");
        let mut ds = Dataset::from_yaml_str(&yaml).unwrap();
        let reports = analyze_mappings(&mut ds, None, &EngineConfig::default()).unwrap();
        assert_eq!(reports[0].final_percentage.provenance, Provenance::Manual);
        assert_eq!(reports[0].final_percentage.value.value(), 75);
    }

    #[test]
    fn bidirectional_pair_credits_both_ways() {
        let yaml = SAMPLE.replace(
            r#"  - { source: "ISO27001:A.5.1", target: "NIS2:21.2.c", percentage: 60 }"#,
            r#"  - { source: "ISO27001:A.5.1", target: "NIS2:21.2.c", percentage: 60, bidirectional: true }
  - { source: "NIS2:21.2.c", target: "ISO27001:A.5.1", percentage: 50, bidirectional: true }"#,
        );
        let yaml = yaml.replace(
            "status: in_progress }\n",
            "status: in_progress }\n  - { tenant: Acme Holding, requirement: \"NIS2:21.2.c\", percentage: 40 }\n",
        );
        let mut ds = Dataset::from_yaml_str(&yaml).unwrap();
        let reports = analyze_mappings(&mut ds, Some("Acme Holding"), &EngineConfig::default()).unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.paired));
        // 90 × 60% forward, 40 × 50% back; one hop each.
        assert_eq!(reports[0].transitive_credit, Some(54.0));
        assert_eq!(reports[1].transitive_credit, Some(20.0));
    }

    #[test]
    fn unknown_tenant_is_an_error() {
        let mut ds = Dataset::from_yaml_str(SAMPLE).unwrap();
        assert!(analyze_mappings(&mut ds, Some("Nobody"), &EngineConfig::default()).is_err());
    }
}
