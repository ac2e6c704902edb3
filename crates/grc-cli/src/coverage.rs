//! # Coverage CLI — How far one framework carries another.
//!
//! ```bash
//! grc coverage --dataset grc.yaml --source ISO27001 --target NIS2
//! grc coverage --dataset grc.yaml --source ISO27001 --target NIS2 --tenant Acme --json
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use grc_compliance::{FrameworkCoverage, TenantFulfillment, TransitiveCompliance};

use crate::dataset::Dataset;

/// Coverage subcommand arguments.
#[derive(Args, Debug)]
pub struct CoverageArgs {
    /// Dataset YAML file.
    #[arg(long)]
    pub dataset: PathBuf,

    /// Framework whose requirements are mapped from.
    #[arg(long)]
    pub source: String,

    /// Framework whose requirements are mapped to.
    #[arg(long)]
    pub target: String,

    /// Tenant whose fulfillment is credited across.
    #[arg(long)]
    pub tenant: Option<String>,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Coverage plus, for a tenant, transitive compliance.
#[derive(Debug, Clone, Serialize)]
pub struct CoverageReport {
    pub coverage: FrameworkCoverage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transitive: Option<TransitiveCompliance>,
}

/// Execute the coverage subcommand.
pub fn run_coverage(args: &CoverageArgs) -> Result<u8> {
    let dataset = Dataset::load(&args.dataset)?;
    let report = framework_coverage(&dataset, &args.source, &args.target, args.tenant.as_deref())?;
    if args.json {
        crate::print_json(&report)?;
        return Ok(0);
    }

    let c = &report.coverage;
    println!("{} -> {}", c.source_framework, c.target_framework);
    println!(
        "  covered:      {}/{} requirements ({:.2}%)",
        c.covered_requirements, c.total_target_requirements, c.coverage_percentage
    );
    println!(
        "  best mapping: {} strong, {} partial, {} weak",
        c.strong_mappings, c.partial_mappings, c.weak_mappings
    );
    println!("  bidirectional: {}", c.bidirectional_mappings);
    if let Some(t) = &report.transitive {
        println!(
            "  transitive:   {} helped, total {:.2}, average {:.2}%",
            t.requirements_helped, t.total_benefit, t.average_transitive_benefit
        );
        for contribution in &t.contributions {
            println!(
                "    {} -> {}  {:.2} × {}% = {:.2}",
                dataset.reference_of(&contribution.source),
                dataset.reference_of(&contribution.target),
                contribution.source_fulfillment,
                contribution.mapping_strength,
                contribution.transitive_contribution
            );
        }
    }
    Ok(0)
}

/// Build the coverage report for a framework pair.
pub fn framework_coverage(
    dataset: &Dataset,
    source: &str,
    target: &str,
    tenant: Option<&str>,
) -> Result<CoverageReport> {
    let source = dataset.framework(source)?;
    let target = dataset.framework(target)?;
    let coverage =
        FrameworkCoverage::calculate(&dataset.mappings, &dataset.requirements, source, target);
    let transitive = match tenant {
        Some(name) => {
            let view = TenantFulfillment::new(&dataset.ledger, dataset.tenant(name)?);
            Some(TransitiveCompliance::calculate(
                &dataset.mappings,
                &dataset.requirements,
                source,
                target,
                &view,
            ))
        }
        None => None,
    };
    Ok(CoverageReport {
        coverage,
        transitive,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::SAMPLE;

    #[test]
    fn coverage_of_nis2_by_iso() {
        let ds = Dataset::from_yaml_str(SAMPLE).unwrap();
        let report = framework_coverage(&ds, "ISO27001", "NIS2", None).unwrap();
        assert_eq!(report.coverage.total_target_requirements, 1);
        assert_eq!(report.coverage.covered_requirements, 1);
        assert_eq!(report.coverage.coverage_percentage, 60.0);
        assert_eq!(report.coverage.partial_mappings, 1);
        assert!(report.transitive.is_none());
    }

    #[test]
    fn transitive_for_subsidiary_uses_inherited_record() {
        let ds = Dataset::from_yaml_str(SAMPLE).unwrap();
        let report = framework_coverage(&ds, "ISO27001", "NIS2", Some("Acme GmbH")).unwrap();
        let t = report.transitive.unwrap();
        // Holding's 90% on A.5.1 × 60%.
        assert_eq!(t.total_benefit, 54.0);
        assert_eq!(t.requirements_helped, 1);
        assert_eq!(t.contributions[0].source_fulfillment, 90.0);
    }

    #[test]
    fn reverse_direction_has_no_mappings() {
        let ds = Dataset::from_yaml_str(SAMPLE).unwrap();
        let report = framework_coverage(&ds, "NIS2", "ISO27001", Some("Acme Holding")).unwrap();
        assert_eq!(report.coverage.covered_requirements, 0);
        assert_eq!(report.coverage.total_target_requirements, 2);
        assert!(report.transitive.unwrap().contributions.is_empty());
    }

    #[test]
    fn unknown_framework_or_tenant() {
        let ds = Dataset::from_yaml_str(SAMPLE).unwrap();
        assert!(framework_coverage(&ds, "SOC2", "NIS2", None).is_err());
        assert!(framework_coverage(&ds, "ISO27001", "NIS2", Some("Nobody")).is_err());
    }

    #[test]
    fn run_coverage_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grc.yaml");
        std::fs::write(&path, SAMPLE).unwrap();
        let args = CoverageArgs {
            dataset: path,
            source: "ISO27001".into(),
            target: "NIS2".into(),
            tenant: Some("Acme Holding".into()),
            json: false,
        };
        assert_eq!(run_coverage(&args).unwrap(), 0);
    }
}
