//! # Assess CLI — Framework assessment for one tenant.
//!
//! ```bash
//! grc assess --dataset grc.yaml --framework ISO27001 --tenant Acme
//! grc assess --dataset grc.yaml --framework NIS2 --tenant "Acme GmbH" --json
//! ```

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;

use grc_compliance::assessment::GapSeverity;
use grc_compliance::{EngineConfig, FrameworkAssessment, FrameworkAssessor};
use grc_core::temporal;

use crate::dataset::Dataset;

/// Assess subcommand arguments.
#[derive(Args, Debug)]
pub struct AssessArgs {
    /// Dataset YAML file.
    #[arg(long)]
    pub dataset: PathBuf,

    /// Framework code (e.g., ISO27001, NIS2).
    #[arg(long)]
    pub framework: String,

    /// Tenant name.
    #[arg(long)]
    pub tenant: String,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute the assess subcommand.
pub fn run_assess(args: &AssessArgs, config: &EngineConfig) -> Result<u8> {
    let mut dataset = Dataset::load(&args.dataset)?;
    let today = temporal::today();
    let report = assess(&mut dataset, &args.framework, &args.tenant, config, today)?;
    if args.json {
        crate::print_json(&report)?;
    } else {
        print_report(&report, &args.tenant);
    }
    Ok(0)
}

/// Run the assessment against a loaded dataset.
pub fn assess(
    dataset: &mut Dataset,
    framework: &str,
    tenant: &str,
    config: &EngineConfig,
    today: NaiveDate,
) -> Result<FrameworkAssessment> {
    let framework = dataset.framework(framework)?.clone();
    let tenant = dataset.tenant(tenant)?;
    let report = FrameworkAssessor::new(config.review.clone()).assess(
        &framework,
        &tenant,
        &dataset.requirements,
        &dataset.controls,
        &mut dataset.ledger,
        today,
    )?;
    Ok(report)
}

fn print_report(report: &FrameworkAssessment, tenant: &str) {
    println!("{} ({}) for {tenant}", report.framework_name, report.framework_code);
    println!("  assessed at:  {}", report.assessed_at.to_iso8601());
    println!(
        "  requirements: {}/{}",
        report.requirements_assessed, report.total_requirements
    );
    println!("  compliance:   {:.2}%", report.overall_compliance);
    println!();
    for detail in &report.details {
        let marker = if detail.updated { ' ' } else { '*' };
        match &detail.reason {
            Some(reason) => println!("  {marker} {:<12} {:>4}  ({reason})", detail.requirement_code, "-"),
            None => println!(
                "  {marker} {:<12} {:>4}  {}",
                detail.requirement_code,
                detail.calculated_fulfillment.to_string(),
                detail.title
            ),
        }
        for gap in &detail.gaps {
            let severity = match gap.severity {
                GapSeverity::High => "HIGH",
                GapSeverity::Medium => "MED ",
            };
            println!("        [{severity}] {}", gap.description);
            for control in &gap.details {
                println!("               - {} at {}%", control.control, control.implementation);
            }
            if let Some(recommendation) = &gap.recommendation {
                println!("               -> {recommendation}");
            }
        }
    }
    if report.details.iter().any(|d| !d.updated) {
        println!();
        println!("  * not updated (not applicable or inherited from parent tenant)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::SAMPLE;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    #[test]
    fn assess_iso_for_holding() {
        let mut ds = Dataset::from_yaml_str(SAMPLE).unwrap();
        let report = assess(&mut ds, "ISO27001", "Acme Holding", &EngineConfig::default(), today()).unwrap();
        assert_eq!(report.total_requirements, 2);
        // A.5.1.1 has no controls, A.5.1 is fully implemented.
        assert_eq!(report.overall_compliance, 50.0);

        let parent = ds.requirement("ISO27001:A.5.1").unwrap().id;
        let holding = ds.tenant("Acme Holding").unwrap();
        let record = ds.ledger.get(&holding, &parent).unwrap();
        assert_eq!(record.fulfillment_percentage().value(), 100);
    }

    #[test]
    fn assess_uses_configured_review_interval() {
        let mut ds = Dataset::from_yaml_str(SAMPLE).unwrap();
        let mut config = EngineConfig::default();
        config.review.default_interval_days = 30;
        assess(&mut ds, "NIS2", "Acme Holding", &config, today()).unwrap();
        let req = ds.requirement("NIS2:21.2.c").unwrap().id;
        let holding = ds.tenant("Acme Holding").unwrap();
        let record = ds.ledger.get(&holding, &req).unwrap();
        assert_eq!(record.next_review_date, NaiveDate::from_ymd_opt(2026, 3, 31));
    }

    #[test]
    fn unknown_framework_or_tenant() {
        let mut ds = Dataset::from_yaml_str(SAMPLE).unwrap();
        let config = EngineConfig::default();
        assert!(assess(&mut ds, "SOC2", "Acme Holding", &config, today()).is_err());
        assert!(assess(&mut ds, "NIS2", "Nobody", &config, today()).is_err());
    }

    #[test]
    fn run_assess_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grc.yaml");
        std::fs::write(&path, SAMPLE).unwrap();
        let args = AssessArgs {
            dataset: path,
            framework: "NIS2".into(),
            tenant: "Acme GmbH".into(),
            json: true,
        };
        assert_eq!(run_assess(&args, &EngineConfig::default()).unwrap(), 0);
    }
}
