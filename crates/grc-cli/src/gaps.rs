//! # Gaps CLI — Automated gap analysis of every mapping.
//!
//! Analyses each mapping, replaces its algorithm-identified gap items with
//! fresh ones (manual items are kept), and reports the gaps per mapping
//! together with a summary across the dataset.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use grc_compliance::{EngineConfig, GapAnalyzer, GapSummary, MappingGapItem, MappingQualityAnalyzer};
use grc_core::MappingId;

use crate::dataset::Dataset;

/// Gaps subcommand arguments.
#[derive(Args, Debug)]
pub struct GapsArgs {
    /// Dataset YAML file.
    #[arg(long)]
    pub dataset: PathBuf,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Gap items of one mapping.
#[derive(Debug, Clone, Serialize)]
pub struct MappingGaps {
    pub id: MappingId,
    pub source: String,
    pub target: String,
    pub gaps: Vec<MappingGapItem>,
    /// Summed impact of the mapping's gap items.
    pub total_impact: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct GapReport {
    pub mappings: Vec<MappingGaps>,
    pub summary: GapSummary,
}

/// Execute the gaps subcommand.
pub fn run_gaps(args: &GapsArgs, config: &EngineConfig) -> Result<u8> {
    let mut dataset = Dataset::load(&args.dataset)?;
    let report = analyze_gaps(&mut dataset, config)?;
    if args.json {
        crate::print_json(&report)?;
        return Ok(0);
    }
    for mapping in &report.mappings {
        println!("{} -> {}  ({} gaps)", mapping.source, mapping.target, mapping.gaps.len());
        for gap in &mapping.gaps {
            println!(
                "  [{:<8}] {:<22} impact {:>4}  confidence {:>4}",
                gap.priority.as_str(),
                gap.gap_type.as_str(),
                gap.percentage_impact().to_string(),
                gap.confidence().to_string()
            );
            println!("    {}", gap.description);
            if let Some(action) = &gap.recommended_action {
                println!("    -> {}", action.replace('\n', "\n       "));
            }
        }
        println!();
    }
    let summary = &report.summary;
    println!("Summary");
    println!("  gaps:            {}", summary.total_gaps);
    for (gap_type, count) in &summary.by_type {
        println!("    {:<22} {count}", gap_type.as_str());
    }
    println!("  impact:          {}%", summary.total_impact);
    println!("  effort:          {} h", summary.total_effort);
    println!("  high confidence: {}", summary.high_confidence_gaps);
    Ok(0)
}

/// Run quality and gap analysis over every mapping.
pub fn analyze_gaps(dataset: &mut Dataset, config: &EngineConfig) -> Result<GapReport> {
    let quality = MappingQualityAnalyzer::new(config.quality.clone());
    let gap_analyzer = GapAnalyzer::new();
    let ids = dataset.mappings.ids().to_vec();
    let mut mappings = Vec::with_capacity(ids.len());

    for id in ids {
        let (analysis, gaps) = {
            let mapping = dataset.mappings.get(&id).context("mapping vanished")?;
            let ends = dataset.endpoints(mapping)?;
            let analysis = quality.analyze(
                mapping,
                ends.source,
                ends.target,
                ends.source_framework,
                ends.target_framework,
            );
            let gaps = gap_analyzer.analyze(mapping, &analysis, ends.source, ends.target);
            (analysis, gaps)
        };
        if let Some(mapping) = dataset.mappings.get_mut(&id) {
            analysis.apply_to(mapping);
            mapping.replace_algorithm_gaps(gaps);
        }

        let mapping = dataset.mappings.get(&id).context("mapping vanished")?;
        mappings.push(MappingGaps {
            id,
            source: dataset.reference_of(&mapping.source),
            target: dataset.reference_of(&mapping.target),
            gaps: mapping.gap_items().to_vec(),
            total_impact: mapping.total_gap_impact(),
        });
    }

    let summary = GapSummary::from_items(mappings.iter().flat_map(|m| m.gaps.iter()), &config.gaps);
    tracing::info!(
        mappings = mappings.len(),
        gaps = summary.total_gaps,
        "gap analysis complete"
    );
    Ok(GapReport { mappings, summary })
}
