//! # grc-cli — CLI Tool for the GRC Engine
//!
//! Provides the `grc` command-line interface over a YAML dataset (see
//! [`dataset`] for the format).
//!
//! ## Subcommands
//!
//! - `grc assess` — Recompute a tenant's fulfillment of one framework from
//!   its controls and report the gaps.
//! - `grc mappings` — Quality analysis of every mapping, final percentage
//!   with provenance, and transitive credit for a tenant.
//! - `grc gaps` — Automated gap analysis of every mapping plus a summary.
//! - `grc coverage` — Coverage of one framework by another, and the
//!   fulfillment a tenant's source requirements credit across.
//!
//! ```bash
//! grc assess --dataset grc.yaml --framework NIS2 --tenant Acme
//! grc mappings --dataset grc.yaml --tenant Acme --json
//! grc -v --config engine.yaml gaps --dataset grc.yaml
//! grc coverage --dataset grc.yaml --source ISO27001 --target NIS2 --tenant Acme
//! ```
//!
//! ## Crate Policy
//!
//! - Handler functions delegate to `grc-compliance`; no scoring logic here.
//! - Every handler builds a serializable report first, then prints it as
//!   text or JSON.

pub mod assess;
pub mod coverage;
pub mod dataset;
pub mod gaps;
pub mod mappings;

use std::path::Path;

use anyhow::{Context, Result};

use grc_compliance::EngineConfig;

/// Load the engine configuration, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let config = EngineConfig::from_yaml_str(&content)
        .with_context(|| format!("invalid config: {}", path.display()))?;
    tracing::debug!(path = %path.display(), "engine config loaded");
    Ok(config)
}

/// Print a report as pretty JSON.
pub(crate) fn print_json<T: serde::Serialize>(report: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    println!("{json}");
    Ok(())
}
