//! # grc-compliance — Mapping & Fulfillment Engine
//!
//! Implements the compliance model on top of `grc-core`:
//!
//! - **Requirements** (`requirement.rs`): per-framework requirement forests
//!   in a flat arena, with cascade removal and aggregated fulfillment over
//!   detailed requirements.
//!
//! - **Controls** (`control.rs`): the control inventory and the
//!   control-derived fulfillment calculation.
//!
//! - **Fulfillment** (`fulfillment.rs`): one record per tenant and
//!   requirement, applicability with justification, review scheduling and
//!   hierarchical inheritance between parent and child tenants.
//!
//! - **Mappings** (`mapping.rs`, `review.rs`, `gap.rs`, `graph.rs`):
//!   cross-framework mappings with a three-tier percentage (manual over
//!   calculated over baseline), a review workflow with a transition log,
//!   gap items, and a mapping graph (acyclic apart from bidirectional
//!   pairs) granting one-hop transitive credit.
//!
//! - **Analysis** (`text.rs`, `quality.rs`, `gap_analysis.rs`): textual,
//!   keyword and structural similarity, the calculated mapping percentage,
//!   and rule-based gap identification.
//!
//! - **Coverage** (`coverage.rs`): framework-to-framework coverage and
//!   transitive compliance reports over the mapping graph.
//!
//! - **Assessment** (`assessment.rs`): recompute a tenant's fulfillment of
//!   a whole framework from its controls and report the gaps.
//!
//! - **Scorecards** (`scorecard.rs`, `profiles.rs`): weighted factor
//!   scoring for supplier risk, continuity readiness, change complexity
//!   and inherent/residual risk.
//!
//! ## Crate Policy
//!
//! - Depends on `grc-core` internally. No I/O: datasets are loaded by the
//!   caller.
//! - Thresholds and defaults come from [`EngineConfig`].
//! - Out-of-range scores clamp; invalid workflow transitions and unknown
//!   vocabulary values are errors.

pub mod assessment;
pub mod config;
pub mod control;
pub mod coverage;
pub mod framework;
pub mod fulfillment;
pub mod gap;
pub mod gap_analysis;
pub mod graph;
pub mod mapping;
pub mod profiles;
pub mod quality;
pub mod requirement;
pub mod review;
pub mod scorecard;
pub mod text;

pub use assessment::{FrameworkAssessment, FrameworkAssessor, RequirementAssessment};
pub use config::EngineConfig;
pub use control::{Control, ControlCatalog, ControlImplementation};
pub use coverage::{FrameworkCoverage, TransitiveCompliance};
pub use framework::ComplianceFramework;
pub use fulfillment::{FulfillmentLedger, RequirementFulfillment, Tenant};
pub use gap::MappingGapItem;
pub use gap_analysis::{GapAnalyzer, GapSummary};
pub use graph::{FulfillmentSource, MappingGraph, TenantFulfillment};
pub use mapping::{ComplianceMapping, Provenance};
pub use quality::{MappingQualityAnalyzer, QualityAnalysis};
pub use requirement::{ComplianceRequirement, RequirementArena};
pub use review::ReviewWorkflow;
pub use scorecard::Scorecard;
