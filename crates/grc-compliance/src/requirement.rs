//! # Requirements & Requirement Tree
//!
//! Requirements form a forest per framework: core requirements at the roots,
//! detailed requirements and sub-requirements below them. The tree lives in a
//! [`RequirementArena`], a flat store keyed by [`RequirementId`] with parent
//! and child indices, so no requirement holds a reference to another.
//!
//! ## Invariants
//!
//! - A requirement has at most one parent.
//! - The parent relation is acyclic: [`RequirementArena::attach`] rejects
//!   self-parenting and any edge that would close a loop.
//! - Removing a requirement removes its whole subtree.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use grc_core::{
    round_to, ControlId, FrameworkId, GrcError, Priority, RequirementId, RequirementType, TenantId,
    Timestamp,
};

use crate::fulfillment::FulfillmentLedger;

// ─── Requirement ─────────────────────────────────────────────────────

/// Which operational data sources evidence a requirement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSourceMapping {
    /// ISO 27001 control references backing the requirement.
    pub iso_controls: Vec<String>,
    /// Business continuity data is needed.
    pub bcm_required: bool,
    /// Incident management evidence is needed.
    pub incident_management: bool,
    /// Audit evidence is needed.
    pub audit_evidence: bool,
}

/// A single requirement within a compliance framework.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceRequirement {
    /// Unique identifier.
    pub id: RequirementId,
    /// Owning framework.
    pub framework_id: FrameworkId,
    /// Code within the framework, e.g. `A.5.1` or `Art. 32`.
    pub requirement_code: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub requirement_type: RequirementType,
    /// Controls implementing this requirement.
    #[serde(default)]
    pub mapped_controls: BTreeSet<ControlId>,
    #[serde(default)]
    pub data_sources: DataSourceMapping,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ComplianceRequirement {
    pub fn new(
        framework_id: FrameworkId,
        requirement_code: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: RequirementId::new(),
            framework_id,
            requirement_code: requirement_code.into(),
            title: title.into(),
            description: String::new(),
            category: None,
            priority: Priority::default(),
            requirement_type: RequirementType::default(),
            mapped_controls: BTreeSet::new(),
            data_sources: DataSourceMapping::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Title and description joined by a space, skipping empty parts.
    pub fn text(&self) -> String {
        [self.title.as_str(), self.description.as_str()]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Map a control to this requirement. Returns `false` if already mapped.
    pub fn map_control(&mut self, control: ControlId) -> bool {
        let added = self.mapped_controls.insert(control);
        if added {
            self.updated_at = Timestamp::now();
        }
        added
    }

    /// Remove a control mapping. Returns `false` if it was not mapped.
    pub fn unmap_control(&mut self, control: &ControlId) -> bool {
        let removed = self.mapped_controls.remove(control);
        if removed {
            self.updated_at = Timestamp::now();
        }
        removed
    }
}

// ─── Arena ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Node {
    requirement: ComplianceRequirement,
    parent: Option<RequirementId>,
    children: Vec<RequirementId>,
}

/// Flat store of requirements with explicit parent/child indices.
///
/// Iteration order is insertion order.
#[derive(Debug, Clone, Default)]
pub struct RequirementArena {
    nodes: HashMap<RequirementId, Node>,
    order: Vec<RequirementId>,
}

impl RequirementArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a parentless requirement.
    pub fn insert(&mut self, requirement: ComplianceRequirement) -> Result<RequirementId, GrcError> {
        let id = requirement.id;
        if self.nodes.contains_key(&id) {
            return Err(GrcError::Duplicate {
                kind: "requirement",
                id: id.to_string(),
            });
        }
        self.nodes.insert(
            id,
            Node {
                requirement,
                parent: None,
                children: Vec::new(),
            },
        );
        self.order.push(id);
        Ok(id)
    }

    pub fn get(&self, id: &RequirementId) -> Option<&ComplianceRequirement> {
        self.nodes.get(id).map(|n| &n.requirement)
    }

    pub fn get_mut(&mut self, id: &RequirementId) -> Option<&mut ComplianceRequirement> {
        self.nodes.get_mut(id).map(|n| &mut n.requirement)
    }

    pub fn contains(&self, id: &RequirementId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All requirements in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ComplianceRequirement> {
        self.order.iter().filter_map(|id| self.get(id))
    }

    /// Find a requirement by framework and code.
    pub fn find_by_code(&self, framework: &FrameworkId, code: &str) -> Option<&ComplianceRequirement> {
        self.iter()
            .find(|r| r.framework_id == *framework && r.requirement_code == code)
    }

    /// Make `child` a child of `parent`, replacing any previous parent.
    pub fn attach(&mut self, child: RequirementId, parent: RequirementId) -> Result<(), GrcError> {
        self.require(&child)?;
        self.require(&parent)?;
        if child == parent || self.is_ancestor(&child, &parent) {
            tracing::warn!(%child, %parent, "rejected requirement attachment that would create a cycle");
            return Err(GrcError::Cycle {
                kind: "requirement",
                from: child.to_string(),
                to: parent.to_string(),
            });
        }
        self.detach(&child)?;
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(child);
        }
        Ok(())
    }

    /// Remove `child` from its parent, making it a root.
    pub fn detach(&mut self, child: &RequirementId) -> Result<(), GrcError> {
        let previous = self.require(child)?.parent;
        if let Some(parent) = previous {
            if let Some(node) = self.nodes.get_mut(&parent) {
                node.children.retain(|c| c != child);
            }
            if let Some(node) = self.nodes.get_mut(child) {
                node.parent = None;
            }
        }
        Ok(())
    }

    pub fn parent_of(&self, id: &RequirementId) -> Option<RequirementId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// Direct children, in attachment order.
    pub fn children_of(&self, id: &RequirementId) -> &[RequirementId] {
        self.nodes
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Requirements without a parent, in insertion order.
    pub fn roots(&self) -> Vec<RequirementId> {
        self.order
            .iter()
            .filter(|id| self.parent_of(id).is_none())
            .copied()
            .collect()
    }

    /// Requirements of one framework, in insertion order.
    pub fn requirements_in(&self, framework: &FrameworkId) -> Vec<&ComplianceRequirement> {
        self.iter().filter(|r| r.framework_id == *framework).collect()
    }

    /// A root requirement of type `core`.
    pub fn is_core_requirement(&self, id: &RequirementId) -> bool {
        self.nodes.get(id).is_some_and(|n| {
            n.parent.is_none() && n.requirement.requirement_type == RequirementType::Core
        })
    }

    pub fn has_detailed_requirements(&self, id: &RequirementId) -> bool {
        !self.children_of(id).is_empty()
    }

    /// Remove a requirement and its entire subtree. Returns the removed
    /// requirements, the requested one first.
    pub fn remove(&mut self, id: &RequirementId) -> Result<Vec<ComplianceRequirement>, GrcError> {
        self.detach(id)?;
        let mut stack = vec![*id];
        let mut doomed = Vec::new();
        while let Some(next) = stack.pop() {
            doomed.push(next);
            stack.extend(self.children_of(&next).iter().rev().copied());
        }
        let mut removed = Vec::with_capacity(doomed.len());
        for rid in &doomed {
            if let Some(node) = self.nodes.remove(rid) {
                removed.push(node.requirement);
            }
        }
        self.order.retain(|rid| !doomed.contains(rid));
        tracing::debug!(requirement = %id, removed = removed.len(), "removed requirement subtree");
        Ok(removed)
    }

    /// Fulfillment of a requirement including its direct children.
    ///
    /// Without children this is the tenant's own fulfillment percentage.
    /// Otherwise the average of the own percentage and every applicable
    /// child's percentage, rounded to two decimals. A missing fulfillment
    /// record counts as applicable at 0%.
    pub fn aggregated_fulfillment(
        &self,
        id: &RequirementId,
        ledger: &FulfillmentLedger,
        tenant: &TenantId,
    ) -> Result<f64, GrcError> {
        self.require(id)?;
        let own = ledger.percentage_of(tenant, id);
        let children = self.children_of(id);
        if children.is_empty() {
            return Ok(own);
        }
        let mut total = own;
        let mut count = 1u32;
        for child in children {
            if ledger.is_applicable(tenant, child) {
                total += ledger.percentage_of(tenant, child);
                count += 1;
            }
        }
        Ok(round_to(total / f64::from(count), 2))
    }

    /// Number of direct children applicable to the tenant.
    pub fn applicable_detailed_count(
        &self,
        id: &RequirementId,
        ledger: &FulfillmentLedger,
        tenant: &TenantId,
    ) -> usize {
        self.children_of(id)
            .iter()
            .filter(|c| ledger.is_applicable(tenant, c))
            .count()
    }

    /// Number of direct children applicable and fulfilled at 100%.
    pub fn fulfilled_detailed_count(
        &self,
        id: &RequirementId,
        ledger: &FulfillmentLedger,
        tenant: &TenantId,
    ) -> usize {
        self.children_of(id)
            .iter()
            .filter(|c| ledger.is_applicable(tenant, c) && ledger.percentage_of(tenant, c) >= 100.0)
            .count()
    }

    fn require(&self, id: &RequirementId) -> Result<&Node, GrcError> {
        self.nodes.get(id).ok_or_else(|| GrcError::NotFound {
            kind: "requirement",
            id: id.to_string(),
        })
    }

    /// Whether `ancestor` is on the parent chain above `of`.
    fn is_ancestor(&self, ancestor: &RequirementId, of: &RequirementId) -> bool {
        let mut cursor = self.parent_of(of);
        while let Some(current) = cursor {
            if current == *ancestor {
                return true;
            }
            cursor = self.parent_of(&current);
        }
        false
    }
}
