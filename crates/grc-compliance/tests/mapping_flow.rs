//! End-to-end flow across the engine: analyse a cross-framework mapping,
//! derive its gap items, take it through review, and credit fulfillment
//! from an assessed framework to the mapped one.

use chrono::NaiveDate;

use grc_compliance::gap_analysis::{GapAnalyzer, GapSummary};
use grc_compliance::{
    ComplianceFramework, ComplianceMapping, ComplianceRequirement, Control, ControlCatalog,
    EngineConfig, FrameworkAssessor, FulfillmentLedger, MappingGapItem, MappingGraph,
    MappingQualityAnalyzer, Provenance, RequirementArena, Tenant, TenantFulfillment,
};
use grc_core::{
    GapType, GovernanceModel, IdentificationSource, ImplementationStatus, MappingType, Percentage,
    Priority, ReviewStatus, UserId,
};

struct World {
    iso: ComplianceFramework,
    nis2: ComplianceFramework,
    arena: RequirementArena,
    controls: ControlCatalog,
    ledger: FulfillmentLedger,
    tenant: Tenant,
}

fn world() -> World {
    let iso = ComplianceFramework::new("ISO27001", "ISO/IEC 27001:2022");
    let nis2 = ComplianceFramework::new("NIS2", "NIS2 Directive");

    let mut controls = ControlCatalog::new();
    let crypto = controls.insert(
        Control::new("A.8.24", "Use of cryptography", ImplementationStatus::Implemented)
            .with_percentage(Percentage::FULL),
    );

    let mut arena = RequirementArena::new();
    let mut source = ComplianceRequirement::new(iso.id, "A.8.24", "Use of cryptography");
    source.description = "Rules for the effective use of cryptography including encryption \
                          and key management shall be defined and implemented."
        .into();
    source.priority = Priority::High;
    source.map_control(crypto);
    arena.insert(source).unwrap();

    let mut target = ComplianceRequirement::new(nis2.id, "21.2.h", "Cryptography policies");
    target.description = "Policies and procedures regarding the use of cryptography and \
                          encryption, and where appropriate authentication."
        .into();
    target.priority = Priority::High;
    arena.insert(target).unwrap();

    let tenant = Tenant::new("Acme", GovernanceModel::Independent);
    let mut ledger = FulfillmentLedger::new();
    ledger.register_tenant(tenant.clone());

    World {
        iso,
        nis2,
        arena,
        controls,
        ledger,
        tenant,
    }
}

#[test]
fn analyse_review_and_credit() {
    let mut w = world();
    let config = EngineConfig::default();
    let source = w.arena.find_by_code(&w.iso.id, "A.8.24").unwrap().clone();
    let target = w.arena.find_by_code(&w.nis2.id, "21.2.h").unwrap().clone();

    let mut mapping = ComplianceMapping::new(source.id, target.id, 80)
        .with_rationale("Cryptography controls cover the NIS2 policy requirement");
    assert_eq!(mapping.mapping_type(), MappingType::Partial);
    assert_eq!(mapping.final_percentage().provenance, Provenance::Baseline);

    // Quality analysis stores a calculated percentage.
    let analysis = MappingQualityAnalyzer::new(config.quality.clone())
        .analyze(&mapping, &source, &target, &w.iso, &w.nis2);
    assert_eq!(analysis.algorithm_version, "1.0.0");
    assert!(analysis.keyword_overlap.value() > 0.0);
    analysis.apply_to(&mut mapping);
    assert_eq!(mapping.final_percentage().provenance, Provenance::Calculated);
    assert_eq!(mapping.final_percentage().value, analysis.calculated_percentage);

    // Authentication is named by the target only.
    let gaps = GapAnalyzer::new().analyze(&mapping, &analysis, &source, &target);
    let missing = gaps
        .iter()
        .find(|g| g.gap_type == GapType::MissingControl)
        .expect("missing control gap");
    assert_eq!(missing.priority, Priority::Critical);
    assert!(missing.missing_keywords.iter().any(|k| k == "authentication"));
    mapping.replace_algorithm_gaps(gaps.clone());

    let manual = MappingGapItem::new(GapType::EvidenceGap, "Key rotation records not retained");
    mapping.add_gap_item(manual);
    mapping.replace_algorithm_gaps(gaps);
    assert_eq!(
        mapping
            .gap_items()
            .iter()
            .filter(|g| g.identification_source == IdentificationSource::Manual)
            .count(),
        1
    );
    let summary = GapSummary::from_items(mapping.gap_items(), &config.gaps);
    assert_eq!(summary.total_gaps, mapping.gap_items().len());
    assert!(summary.total_impact <= 100);

    // A manual override wins over the calculated value.
    mapping.set_manual_percentage(Some(90));
    assert_eq!(mapping.final_percentage().provenance, Provenance::Manual);
    assert_eq!(mapping.final_percentage().value.value(), 90);

    // Review workflow.
    let reviewer = UserId::new();
    assert!(mapping.verify(reviewer, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()).is_err());
    mapping.start_review(reviewer).unwrap();
    mapping.approve(reviewer, Some("Confirmed with CISO".into())).unwrap();
    mapping.verify(reviewer, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()).unwrap();
    assert_eq!(mapping.review_status(), ReviewStatus::Approved);
    assert_eq!(mapping.review_transitions().len(), 2);

    // Assess ISO, then credit NIS2 through the mapping baseline.
    let mut graph = MappingGraph::new();
    graph.insert(mapping).unwrap();
    let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
    let report = FrameworkAssessor::new(config.review.clone())
        .assess(&w.iso, &w.tenant.id, &w.arena, &w.controls, &mut w.ledger, today)
        .unwrap();
    assert_eq!(report.overall_compliance, 100.0);

    let view = TenantFulfillment::new(&w.ledger, w.tenant.id);
    assert_eq!(graph.best_transitive_fulfillment(&target.id, &view), Some(80.0));
    assert_eq!(graph.best_transitive_fulfillment(&source.id, &view), None);

    // The forward mapping is one-way, so a reverse edge closes a cycle.
    let back = ComplianceMapping::new(target.id, source.id, 100);
    assert!(graph.insert(back).is_err());
}

#[test]
fn removing_a_requirement_drops_its_mappings() {
    let mut w = world();
    let source = w.arena.find_by_code(&w.iso.id, "A.8.24").unwrap().id;
    let target = w.arena.find_by_code(&w.nis2.id, "21.2.h").unwrap().id;
    let mut graph = MappingGraph::new();
    graph.insert(ComplianceMapping::new(source, target, 100)).unwrap();

    w.arena.remove(&target).unwrap();
    let dropped = graph.remove_requirement(&target);
    assert_eq!(dropped.len(), 1);
    assert!(graph.is_empty());
    assert!(w.arena.requirements_in(&w.nis2.id).is_empty());
}
