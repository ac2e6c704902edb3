//! # Framework Assessment
//!
//! Recomputes a tenant's fulfillment of every requirement in a framework
//! from the implementation state of the mapped controls, and reports the
//! gaps standing between each requirement and full compliance.
//!
//! For each requirement, in arena order:
//!
//! 1. Resolve the record the tenant sees. An inherited parent record is
//!    reported but never modified; otherwise the tenant's own record is
//!    created on demand.
//! 2. A requirement marked not applicable scores 0 with reason
//!    "not applicable" and is left untouched.
//! 3. Otherwise the fulfillment is the control-derived percentage. An
//!    editable record receives the percentage, a review dated today and
//!    the derived status.

use chrono::NaiveDate;
use serde::Serialize;

use grc_core::{
    FulfillmentStatus, GrcError, ImplementationStatus, Percentage, RequirementId, TenantId,
    Timestamp,
};

use crate::config::ReviewConfig;
use crate::control::{ControlCatalog, ControlImplementation};
use crate::framework::ComplianceFramework;
use crate::fulfillment::FulfillmentLedger;
use crate::requirement::{ComplianceRequirement, RequirementArena};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentGapKind {
    IncompleteControls,
    NoControlsMapped,
    BcmDataNeeded,
    IncidentDataNeeded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GapSeverity {
    Medium,
    High,
}

/// A mapped control that is not fully implemented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlShortfall {
    /// Control code, or the raw id when the control is missing from the
    /// catalog.
    pub control: String,
    /// `None` when the control is missing from the catalog.
    pub status: Option<ImplementationStatus>,
    pub implementation: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequirementGap {
    pub kind: AssessmentGapKind,
    pub severity: GapSeverity,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<ControlShortfall>,
}

impl RequirementGap {
    fn new(kind: AssessmentGapKind, severity: GapSeverity, description: &str) -> Self {
        Self {
            kind,
            severity,
            description: description.to_string(),
            recommendation: None,
            details: Vec::new(),
        }
    }

    fn recommend(mut self, recommendation: &str) -> Self {
        self.recommendation = Some(recommendation.to_string());
        self
    }
}

/// Outcome for one requirement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequirementAssessment {
    pub requirement_id: RequirementId,
    pub requirement_code: String,
    pub title: String,
    pub applicable: bool,
    pub calculated_fulfillment: Percentage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Whether the tenant's record was written.
    pub updated: bool,
    pub gaps: Vec<RequirementGap>,
}

/// Outcome for a whole framework.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameworkAssessment {
    pub framework_code: String,
    pub framework_name: String,
    pub assessed_at: Timestamp,
    pub total_requirements: usize,
    pub requirements_assessed: usize,
    /// Mean compliance score of the tenant's records in this framework.
    pub overall_compliance: f64,
    pub details: Vec<RequirementAssessment>,
}

/// Status implied by a calculated fulfillment.
pub fn status_for(fulfillment: Percentage) -> FulfillmentStatus {
    match fulfillment.value() {
        100.. => FulfillmentStatus::Implemented,
        1..=99 => FulfillmentStatus::InProgress,
        0 => FulfillmentStatus::NotStarted,
    }
}

/// Gaps between a requirement's calculated fulfillment and 100%.
pub fn identify_gaps(
    requirement: &ComplianceRequirement,
    calculated: Percentage,
    controls: &ControlCatalog,
) -> Vec<RequirementGap> {
    let mut gaps = Vec::new();
    if calculated.is_full() {
        return gaps;
    }
    let shortfall = 100 - calculated.value();

    if requirement.mapped_controls.is_empty() {
        gaps.push(
            RequirementGap::new(
                AssessmentGapKind::NoControlsMapped,
                GapSeverity::High,
                "No controls mapped to this requirement",
            )
            .recommend("Map relevant controls to leverage existing ISMS data"),
        );
    } else {
        let details: Vec<ControlShortfall> = requirement
            .mapped_controls
            .iter()
            .filter_map(|id| match controls.get(id) {
                Some(c) if c.is_complete() => None,
                Some(c) => Some(ControlShortfall {
                    control: c.code.clone(),
                    status: Some(c.implementation_status()),
                    implementation: c.implementation_percentage().map_or(0, Percentage::value),
                }),
                None => Some(ControlShortfall {
                    control: id.to_string(),
                    status: None,
                    implementation: 0,
                }),
            })
            .collect();
        if !details.is_empty() {
            let severity = if shortfall > 50 {
                GapSeverity::High
            } else {
                GapSeverity::Medium
            };
            let mut gap = RequirementGap::new(
                AssessmentGapKind::IncompleteControls,
                severity,
                "Mapped controls are not fully implemented",
            );
            gap.details = details;
            gaps.push(gap);
        }
    }

    if requirement.data_sources.bcm_required {
        gaps.push(
            RequirementGap::new(
                AssessmentGapKind::BcmDataNeeded,
                GapSeverity::Medium,
                "Business continuity data is required but may be incomplete",
            )
            .recommend("Complete Business Impact Analysis for critical processes"),
        );
    }
    if requirement.data_sources.incident_management {
        gaps.push(
            RequirementGap::new(
                AssessmentGapKind::IncidentDataNeeded,
                GapSeverity::Medium,
                "Incident management evidence is required",
            )
            .recommend("Document and track security incidents"),
        );
    }
    gaps
}

/// Assesses frameworks for a tenant.
#[derive(Debug, Clone, Default)]
pub struct FrameworkAssessor {
    review: ReviewConfig,
}

impl FrameworkAssessor {
    pub fn new(review: ReviewConfig) -> Self {
        Self { review }
    }

    pub fn assess(
        &self,
        framework: &ComplianceFramework,
        tenant: &TenantId,
        arena: &RequirementArena,
        controls: &ControlCatalog,
        ledger: &mut FulfillmentLedger,
        today: NaiveDate,
    ) -> Result<FrameworkAssessment, GrcError> {
        if ledger.tenant(tenant).is_none() {
            return Err(GrcError::NotFound {
                kind: "tenant",
                id: tenant.to_string(),
            });
        }
        let requirements = arena.requirements_in(&framework.id);
        let mut details = Vec::with_capacity(requirements.len());

        for requirement in &requirements {
            details.push(self.assess_requirement(requirement, tenant, controls, ledger, today)?);
        }

        let overall = ledger.average_compliance(tenant, |rid| {
            arena.get(rid).is_some_and(|r| r.framework_id == framework.id)
        });
        tracing::info!(
            framework = %framework.code,
            tenant = %tenant,
            requirements = requirements.len(),
            overall_compliance = overall,
            "framework assessed"
        );

        Ok(FrameworkAssessment {
            framework_code: framework.code.clone(),
            framework_name: framework.name.clone(),
            assessed_at: Timestamp::now(),
            total_requirements: requirements.len(),
            requirements_assessed: details.len(),
            overall_compliance: overall,
            details,
        })
    }

    fn assess_requirement(
        &self,
        requirement: &ComplianceRequirement,
        tenant: &TenantId,
        controls: &ControlCatalog,
        ledger: &mut FulfillmentLedger,
        today: NaiveDate,
    ) -> Result<RequirementAssessment, GrcError> {
        let inherited = ledger
            .visible_record(tenant, &requirement.id)
            .filter(|r| ledger.is_inherited(r, tenant))
            .map(|r| r.is_applicable());

        let applicable = match inherited {
            Some(applicable) => applicable,
            None => ledger.get_or_create(tenant, &requirement.id)?.is_applicable(),
        };

        let mut result = RequirementAssessment {
            requirement_id: requirement.id,
            requirement_code: requirement.requirement_code.clone(),
            title: requirement.title.clone(),
            applicable,
            calculated_fulfillment: Percentage::ZERO,
            reason: None,
            updated: false,
            gaps: Vec::new(),
        };
        if !applicable {
            result.reason = Some("not applicable".to_string());
            return Ok(result);
        }

        let calculated = controls.fulfillment_for(&requirement.mapped_controls);
        result.calculated_fulfillment = calculated;
        result.gaps = identify_gaps(requirement, calculated, controls);

        if inherited.is_none() {
            let record = ledger.get_or_create(tenant, &requirement.id)?;
            record.set_fulfillment_percentage(i64::from(calculated.value()));
            record.record_review(today, self.review.default_interval_days);
            record.set_status(status_for(calculated));
            result.updated = true;
        } else {
            tracing::debug!(
                requirement = %requirement.requirement_code,
                "fulfillment inherited from parent tenant, left unchanged"
            );
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::Control;
    use crate::fulfillment::Tenant;
    use grc_core::{ControlId, GovernanceModel};

    struct Fixture {
        framework: ComplianceFramework,
        arena: RequirementArena,
        controls: ControlCatalog,
        ledger: FulfillmentLedger,
        tenant: TenantId,
        today: NaiveDate,
    }

    fn fixture() -> Fixture {
        let framework = ComplianceFramework::new("NIS2", "NIS2 Directive");
        let mut controls = ControlCatalog::new();
        let done = controls.insert(
            Control::new("A.5.1", "Policies", ImplementationStatus::Implemented)
                .with_percentage(Percentage::FULL),
        );
        let half = controls.insert(
            Control::new("A.8.13", "Backup", ImplementationStatus::InProgress)
                .with_percentage(Percentage::clamped(40)),
        );

        let mut arena = RequirementArena::new();
        let mut full = ComplianceRequirement::new(framework.id, "21.2.a", "Policies");
        full.map_control(done);
        let mut partial = ComplianceRequirement::new(framework.id, "21.2.c", "Continuity");
        partial.map_control(done);
        partial.map_control(half);
        partial.data_sources.bcm_required = true;
        let empty = ComplianceRequirement::new(framework.id, "21.2.d", "Supply chain");
        arena.insert(full).unwrap();
        arena.insert(partial).unwrap();
        arena.insert(empty).unwrap();
        let other = ComplianceRequirement::new(grc_core::FrameworkId::new(), "X", "Other");
        arena.insert(other).unwrap();

        let mut ledger = FulfillmentLedger::new();
        let tenant = Tenant::new("Acme", GovernanceModel::Independent);
        let tid = tenant.id;
        ledger.register_tenant(tenant);

        Fixture {
            framework,
            arena,
            controls,
            ledger,
            tenant: tid,
            today: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        }
    }

    fn assess(f: &mut Fixture) -> FrameworkAssessment {
        FrameworkAssessor::default()
            .assess(&f.framework, &f.tenant, &f.arena, &f.controls, &mut f.ledger, f.today)
            .unwrap()
    }

    #[test]
    fn test_status_for() {
        assert_eq!(status_for(Percentage::FULL), FulfillmentStatus::Implemented);
        assert_eq!(status_for(Percentage::clamped(1)), FulfillmentStatus::InProgress);
        assert_eq!(status_for(Percentage::ZERO), FulfillmentStatus::NotStarted);
    }

    #[test]
    fn test_assess_framework() {
        let mut f = fixture();
        let report = assess(&mut f);
        assert_eq!(report.framework_code, "NIS2");
        assert_eq!(report.total_requirements, 3);
        assert_eq!(report.requirements_assessed, 3);

        let pcts: Vec<u8> = report
            .details
            .iter()
            .map(|d| d.calculated_fulfillment.value())
            .collect();
        assert_eq!(pcts, vec![100, 70, 0]);
        // (100 + 70 + 0) / 3
        assert_eq!(report.overall_compliance, 56.67);

        let partial = &report.details[1];
        assert_eq!(partial.gaps.len(), 2);
        assert_eq!(partial.gaps[0].kind, AssessmentGapKind::IncompleteControls);
        assert_eq!(partial.gaps[0].severity, GapSeverity::Medium);
        assert_eq!(partial.gaps[0].details.len(), 1);
        assert_eq!(partial.gaps[0].details[0].control, "A.8.13");
        assert_eq!(partial.gaps[0].details[0].implementation, 40);
        assert_eq!(partial.gaps[1].kind, AssessmentGapKind::BcmDataNeeded);

        let empty = &report.details[2];
        assert_eq!(empty.gaps[0].kind, AssessmentGapKind::NoControlsMapped);
        assert_eq!(empty.gaps[0].severity, GapSeverity::High);
        assert!(report.details[0].gaps.is_empty());
    }

    #[test]
    fn test_records_updated() {
        let mut f = fixture();
        assess(&mut f);
        let rid = f.arena.find_by_code(&f.framework.id, "21.2.c").unwrap().id;
        let record = f.ledger.get(&f.tenant, &rid).unwrap();
        assert_eq!(record.fulfillment_percentage().value(), 70);
        assert_eq!(record.status(), FulfillmentStatus::InProgress);
        assert_eq!(record.last_review_date, Some(f.today));
        assert_eq!(record.next_review_date, NaiveDate::from_ymd_opt(2027, 3, 1));
    }

    #[test]
    fn test_not_applicable_untouched() {
        let mut f = fixture();
        let rid = f.arena.find_by_code(&f.framework.id, "21.2.d").unwrap().id;
        f.ledger
            .get_or_create(&f.tenant, &rid)
            .unwrap()
            .set_applicability(false, Some("no suppliers".into()))
            .unwrap();
        let report = assess(&mut f);
        let d = &report.details[2];
        assert!(!d.applicable);
        assert_eq!(d.reason.as_deref(), Some("not applicable"));
        assert!(d.gaps.is_empty());
        assert!(!d.updated);
        let record = f.ledger.get(&f.tenant, &rid).unwrap();
        assert!(record.last_review_date.is_none());
        // inapplicable counts as 100 in the overall score
        assert_eq!(report.overall_compliance, 90.0);
    }

    #[test]
    fn test_inherited_record_not_modified() {
        let mut f = fixture();
        let child = Tenant::new("Acme GmbH", GovernanceModel::Hierarchical).with_parent(f.tenant);
        let cid = child.id;
        f.ledger.register_tenant(child);
        assess(&mut f);

        let report = FrameworkAssessor::default()
            .assess(&f.framework, &cid, &f.arena, &f.controls, &mut f.ledger, f.today)
            .unwrap();
        assert!(report.details.iter().all(|d| !d.updated));
        assert_eq!(f.ledger.records_of(&cid).count(), 0);
    }

    #[test]
    fn test_dangling_control_reported() {
        let mut f = fixture();
        let rid = f.arena.find_by_code(&f.framework.id, "21.2.a").unwrap().id;
        f.arena.get_mut(&rid).unwrap().map_control(ControlId::new());
        let report = assess(&mut f);
        let d = &report.details[0];
        assert_eq!(d.calculated_fulfillment.value(), 50);
        assert_eq!(d.gaps[0].details[0].status, None);
    }

    #[test]
    fn test_unknown_tenant() {
        let mut f = fixture();
        let err = FrameworkAssessor::default()
            .assess(&f.framework, &TenantId::new(), &f.arena, &f.controls, &mut f.ledger, f.today)
            .unwrap_err();
        assert!(matches!(err, GrcError::NotFound { kind: "tenant", .. }));
    }
}
