//! # Tenant Fulfillment Records
//!
//! Each tenant tracks its own progress against each requirement in a
//! [`RequirementFulfillment`] record. The [`FulfillmentLedger`] holds all
//! records and enforces one record per (tenant, requirement).
//!
//! ## Applicability
//!
//! A requirement the tenant declares not applicable scores 100 regardless of
//! its fulfillment percentage. Declaring it not applicable requires a
//! non-blank justification.
//!
//! ## Corporate Structure
//!
//! A tenant may have a parent. Under [`GovernanceModel::Hierarchical`] the
//! child sees the parent's records for requirements it has not assessed
//! itself, and a newly created child record starts from the parent's
//! applicability decision. Progress (the percentage) is never copied.
//! Inherited records are read-only for the child.

use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use grc_core::{
    round_to, FulfillmentId, FulfillmentStatus, GovernanceModel, GrcError, Percentage,
    RequirementId, TenantId, Timestamp, UserId,
};

// ─── Tenant ──────────────────────────────────────────────────────────

/// An organization whose compliance progress is tracked independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    /// Parent organization, if this tenant is a subsidiary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<TenantId>,
    /// How this tenant relates to its parent's records.
    #[serde(default)]
    pub governance: GovernanceModel,
}

impl Tenant {
    pub fn new(name: impl Into<String>, governance: GovernanceModel) -> Self {
        Self {
            id: TenantId::new(),
            name: name.into(),
            parent: None,
            governance,
        }
    }

    pub fn with_parent(mut self, parent: TenantId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// The parent whose records this tenant may inherit.
    pub fn inherits_from(&self) -> Option<TenantId> {
        match self.governance {
            GovernanceModel::Hierarchical => self.parent,
            GovernanceModel::Shared | GovernanceModel::Independent => None,
        }
    }
}

// ─── Fulfillment Record ──────────────────────────────────────────────

/// A tenant's progress against one requirement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequirementFulfillment {
    pub id: FulfillmentId,
    pub tenant_id: TenantId,
    pub requirement_id: RequirementId,
    applicable: bool,
    applicability_justification: Option<String>,
    fulfillment_percentage: Percentage,
    status: FulfillmentStatus,
    pub fulfillment_notes: Option<String>,
    pub evidence_description: Option<String>,
    pub last_review_date: Option<NaiveDate>,
    pub next_review_date: Option<NaiveDate>,
    pub responsible_person: Option<UserId>,
    created_at: Timestamp,
    updated_at: Timestamp,
    last_updated_by: Option<UserId>,
}

impl RequirementFulfillment {
    /// A fresh record: applicable, 0%, not started.
    pub fn new(tenant_id: TenantId, requirement_id: RequirementId) -> Self {
        let now = Timestamp::now();
        Self {
            id: FulfillmentId::new(),
            tenant_id,
            requirement_id,
            applicable: true,
            applicability_justification: None,
            fulfillment_percentage: Percentage::ZERO,
            status: FulfillmentStatus::NotStarted,
            fulfillment_notes: None,
            evidence_description: None,
            last_review_date: None,
            next_review_date: None,
            responsible_person: None,
            created_at: now,
            updated_at: now,
            last_updated_by: None,
        }
    }

    pub fn is_applicable(&self) -> bool {
        self.applicable
    }

    pub fn applicability_justification(&self) -> Option<&str> {
        self.applicability_justification.as_deref()
    }

    /// Set applicability. Marking a requirement not applicable requires a
    /// non-blank justification.
    pub fn set_applicability(
        &mut self,
        applicable: bool,
        justification: Option<String>,
    ) -> Result<(), GrcError> {
        let justification = justification.filter(|j| !j.trim().is_empty());
        if !applicable && justification.is_none() {
            return Err(GrcError::MissingValue {
                field: "applicability_justification",
                reason: "a requirement marked not applicable must be justified".into(),
            });
        }
        self.applicable = applicable;
        self.applicability_justification = justification;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    pub fn fulfillment_percentage(&self) -> Percentage {
        self.fulfillment_percentage
    }

    /// Set the fulfillment percentage, clamping into 0–100.
    pub fn set_fulfillment_percentage(&mut self, value: i64) {
        self.fulfillment_percentage = Percentage::clamped(value);
        self.updated_at = Timestamp::now();
    }

    pub fn status(&self) -> FulfillmentStatus {
        self.status
    }

    pub fn set_status(&mut self, status: FulfillmentStatus) {
        self.status = status;
        self.updated_at = Timestamp::now();
    }

    /// Parse and set a status string. Unknown values are rejected.
    pub fn set_status_str(&mut self, status: &str) -> Result<(), GrcError> {
        let parsed: FulfillmentStatus = status.parse()?;
        self.set_status(parsed);
        Ok(())
    }

    /// Record a review on `date`, scheduling the next one `interval_days`
    /// later.
    pub fn record_review(&mut self, date: NaiveDate, interval_days: u32) {
        self.last_review_date = Some(date);
        self.next_review_date = date.checked_add_signed(Duration::days(i64::from(interval_days)));
        self.updated_at = Timestamp::now();
    }

    /// Attribute the latest change to `actor`.
    pub fn touch(&mut self, actor: UserId) {
        self.last_updated_by = Some(actor);
        self.updated_at = Timestamp::now();
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    pub fn last_updated_by(&self) -> Option<UserId> {
        self.last_updated_by
    }

    /// 100 when not applicable, the fulfillment percentage otherwise.
    pub fn compliance_score(&self) -> u8 {
        if self.applicable {
            self.fulfillment_percentage.value()
        } else {
            100
        }
    }

    /// Whether the next review date lies strictly before `as_of`.
    pub fn is_overdue_for_review(&self, as_of: NaiveDate) -> bool {
        self.next_review_date.is_some_and(|next| next < as_of)
    }

    pub fn is_fully_implemented(&self) -> bool {
        self.compliance_score() == 100
    }
}

// ─── Ledger ──────────────────────────────────────────────────────────

/// Aggregate figures over a tenant's records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FulfillmentStats {
    pub total: usize,
    pub applicable: usize,
    pub not_applicable: usize,
    pub fully_implemented: usize,
    pub overdue_for_review: usize,
    /// Mean compliance score, two decimals. 0 when there are no records.
    pub average_compliance: f64,
    /// Records owned by the tenant.
    pub own: usize,
    /// Records visible through a hierarchical parent.
    pub inherited: usize,
}

/// All fulfillment records, unique per (tenant, requirement).
#[derive(Debug, Clone, Default)]
pub struct FulfillmentLedger {
    tenants: HashMap<TenantId, Tenant>,
    records: BTreeMap<(TenantId, RequirementId), RequirementFulfillment>,
}

impl FulfillmentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a tenant.
    pub fn register_tenant(&mut self, tenant: Tenant) {
        self.tenants.insert(tenant.id, tenant);
    }

    pub fn tenant(&self, id: &TenantId) -> Option<&Tenant> {
        self.tenants.get(id)
    }

    pub fn tenant_by_name(&self, name: &str) -> Option<&Tenant> {
        self.tenants.values().find(|t| t.name == name)
    }

    /// Insert a record. A second record for the same tenant and requirement
    /// is rejected.
    pub fn insert(&mut self, record: RequirementFulfillment) -> Result<(), GrcError> {
        let key = (record.tenant_id, record.requirement_id);
        if self.records.contains_key(&key) {
            return Err(GrcError::Duplicate {
                kind: "fulfillment",
                id: format!("{} / {}", key.0, key.1),
            });
        }
        self.records.insert(key, record);
        Ok(())
    }

    pub fn get(&self, tenant: &TenantId, requirement: &RequirementId) -> Option<&RequirementFulfillment> {
        self.records.get(&(*tenant, *requirement))
    }

    pub fn get_mut(
        &mut self,
        tenant: &TenantId,
        requirement: &RequirementId,
    ) -> Option<&mut RequirementFulfillment> {
        self.records.get_mut(&(*tenant, *requirement))
    }

    /// The tenant's own record, created on first access.
    ///
    /// A new record for a tenant under hierarchical governance starts from
    /// the parent's applicability decision when the parent has a record.
    pub fn get_or_create(
        &mut self,
        tenant: &TenantId,
        requirement: &RequirementId,
    ) -> Result<&mut RequirementFulfillment, GrcError> {
        let key = (*tenant, *requirement);
        if !self.records.contains_key(&key) {
            let owner = self.tenants.get(tenant).ok_or_else(|| GrcError::NotFound {
                kind: "tenant",
                id: tenant.to_string(),
            })?;
            let mut record = RequirementFulfillment::new(*tenant, *requirement);
            if let Some(parent_record) = owner
                .inherits_from()
                .and_then(|parent| self.records.get(&(parent, *requirement)))
            {
                record.applicable = parent_record.applicable;
                record.applicability_justification = parent_record.applicability_justification.clone();
                tracing::debug!(
                    tenant = %tenant,
                    requirement = %requirement,
                    applicable = record.applicable,
                    "new fulfillment inherits applicability from parent"
                );
            }
            self.records.insert(key, record);
        }
        self.records.get_mut(&key).ok_or_else(|| GrcError::NotFound {
            kind: "fulfillment",
            id: format!("{tenant} / {requirement}"),
        })
    }

    /// The record a tenant sees for a requirement: its own, or the
    /// hierarchical parent's.
    pub fn visible_record(
        &self,
        tenant: &TenantId,
        requirement: &RequirementId,
    ) -> Option<&RequirementFulfillment> {
        self.get(tenant, requirement).or_else(|| {
            self.tenants
                .get(tenant)
                .and_then(Tenant::inherits_from)
                .and_then(|parent| self.get(&parent, requirement))
        })
    }

    /// The tenant's own records.
    pub fn records_of(&self, tenant: &TenantId) -> impl Iterator<Item = &RequirementFulfillment> + '_ {
        let tenant = *tenant;
        self.records
            .iter()
            .filter(move |((owner, _), _)| *owner == tenant)
            .map(|(_, record)| record)
    }

    /// Own records plus, under hierarchical governance, the parent's records
    /// for requirements the tenant has not recorded itself.
    pub fn visible_to(&self, tenant: &TenantId) -> Vec<&RequirementFulfillment> {
        let mut visible: Vec<&RequirementFulfillment> = self.records_of(tenant).collect();
        if let Some(parent) = self.tenants.get(tenant).and_then(Tenant::inherits_from) {
            visible.extend(
                self.records_of(&parent)
                    .filter(|r| self.get(tenant, &r.requirement_id).is_none()),
            );
        }
        visible
    }

    /// Whether the record belongs to another tenant.
    pub fn is_inherited(&self, record: &RequirementFulfillment, tenant: &TenantId) -> bool {
        record.tenant_id != *tenant
    }

    pub fn can_edit(&self, record: &RequirementFulfillment, tenant: &TenantId) -> bool {
        !self.is_inherited(record, tenant)
    }

    /// Visible fulfillment percentage, 0 when no record exists.
    pub fn percentage_of(&self, tenant: &TenantId, requirement: &RequirementId) -> f64 {
        self.visible_record(tenant, requirement)
            .map_or(0.0, |r| f64::from(r.fulfillment_percentage.value()))
    }

    /// Visible applicability, `true` when no record exists.
    pub fn is_applicable(&self, tenant: &TenantId, requirement: &RequirementId) -> bool {
        self.visible_record(tenant, requirement)
            .map_or(true, RequirementFulfillment::is_applicable)
    }

    /// Mean compliance score over the tenant's own records accepted by
    /// `filter`, two decimals.
    pub fn average_compliance<F>(&self, tenant: &TenantId, filter: F) -> f64
    where
        F: Fn(&RequirementId) -> bool,
    {
        let scores: Vec<f64> = self
            .records_of(tenant)
            .filter(|r| filter(&r.requirement_id))
            .map(|r| f64::from(r.compliance_score()))
            .collect();
        if scores.is_empty() {
            return 0.0;
        }
        round_to(scores.iter().sum::<f64>() / scores.len() as f64, 2)
    }

    /// Statistics over the tenant's own records accepted by `filter`.
    pub fn stats<F>(&self, tenant: &TenantId, filter: F, as_of: NaiveDate) -> FulfillmentStats
    where
        F: Fn(&RequirementId) -> bool,
    {
        let own: Vec<&RequirementFulfillment> = self
            .records_of(tenant)
            .filter(|r| filter(&r.requirement_id))
            .collect();
        let visible = self
            .visible_to(tenant)
            .into_iter()
            .filter(|r| filter(&r.requirement_id))
            .count();
        let applicable = own.iter().filter(|r| r.applicable).count();
        FulfillmentStats {
            total: own.len(),
            applicable,
            not_applicable: own.len() - applicable,
            fully_implemented: own.iter().filter(|r| r.is_fully_implemented()).count(),
            overdue_for_review: own.iter().filter(|r| r.is_overdue_for_review(as_of)).count(),
            average_compliance: self.average_compliance(tenant, &filter),
            own: own.len(),
            inherited: visible - own.len(),
        }
    }
}
