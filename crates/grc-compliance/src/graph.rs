//! # Mapping Graph
//!
//! Holds every [`ComplianceMapping`] with outgoing and incoming indices per
//! requirement, and computes transitive fulfillment credit.
//!
//! ## Cycle policy
//!
//! The graph is kept acyclic except for bidirectional pairs.
//! [`MappingGraph::insert`] rejects self-mappings and any mapping whose
//! target can already reach its source. The one exception is the reverse
//! half of a pair: when both the new mapping and an existing `target →
//! source` mapping are flagged `bidirectional`, that existing edge is
//! ignored during the check, so longer cycles through the pair are still
//! rejected. Credit only ever flows one hop: a target is credited from the
//! sources it is directly mapped from, never through chains.

use std::collections::{BTreeSet, HashMap, VecDeque};

use serde::Serialize;

use grc_core::{GrcError, MappingId, RequirementId, TenantId};

use crate::fulfillment::FulfillmentLedger;
use crate::mapping::ComplianceMapping;

/// Where source fulfillment percentages come from.
pub trait FulfillmentSource {
    /// Fulfillment percentage of a requirement, `None` when unknown.
    fn fulfillment_of(&self, requirement: &RequirementId) -> Option<f64>;
}

impl FulfillmentSource for HashMap<RequirementId, f64> {
    fn fulfillment_of(&self, requirement: &RequirementId) -> Option<f64> {
        self.get(requirement).copied()
    }
}

/// A tenant's view of the ledger, including inherited records.
#[derive(Debug, Clone, Copy)]
pub struct TenantFulfillment<'a> {
    ledger: &'a FulfillmentLedger,
    tenant: TenantId,
}

impl<'a> TenantFulfillment<'a> {
    pub fn new(ledger: &'a FulfillmentLedger, tenant: TenantId) -> Self {
        Self { ledger, tenant }
    }
}

impl FulfillmentSource for TenantFulfillment<'_> {
    fn fulfillment_of(&self, requirement: &RequirementId) -> Option<f64> {
        self.ledger
            .visible_record(&self.tenant, requirement)
            .map(|r| f64::from(r.fulfillment_percentage().value()))
    }
}

/// Credit one incoming mapping contributes to its target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TransitiveCredit {
    pub mapping: MappingId,
    pub source: RequirementId,
    pub credit: f64,
}

/// Directed graph of mappings between requirements.
#[derive(Debug, Clone, Default)]
pub struct MappingGraph {
    mappings: HashMap<MappingId, ComplianceMapping>,
    order: Vec<MappingId>,
    outgoing: HashMap<RequirementId, BTreeSet<MappingId>>,
    incoming: HashMap<RequirementId, BTreeSet<MappingId>>,
}

impl MappingGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mapping. Fails on a duplicate id, a self-mapping, or when the
    /// edge would close a cycle other than a bidirectional pair.
    pub fn insert(&mut self, mapping: ComplianceMapping) -> Result<MappingId, GrcError> {
        let id = mapping.id;
        if self.mappings.contains_key(&id) {
            return Err(GrcError::Duplicate {
                kind: "mapping",
                id: id.to_string(),
            });
        }
        if mapping.source == mapping.target || self.closes_cycle(&mapping) {
            tracing::warn!(
                source = %mapping.source,
                target = %mapping.target,
                "rejected mapping that would create a cycle"
            );
            return Err(GrcError::Cycle {
                kind: "mapping",
                from: mapping.source.to_string(),
                to: mapping.target.to_string(),
            });
        }
        self.outgoing.entry(mapping.source).or_default().insert(id);
        self.incoming.entry(mapping.target).or_default().insert(id);
        self.order.push(id);
        self.mappings.insert(id, mapping);
        Ok(id)
    }

    pub fn get(&self, id: &MappingId) -> Option<&ComplianceMapping> {
        self.mappings.get(id)
    }

    /// Mutable access. Source and target must not be changed through it.
    pub fn get_mut(&mut self, id: &MappingId) -> Option<&mut ComplianceMapping> {
        self.mappings.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Mappings in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ComplianceMapping> {
        self.order.iter().filter_map(|id| self.mappings.get(id))
    }

    pub fn ids(&self) -> &[MappingId] {
        &self.order
    }

    /// Remove a mapping together with its gap items.
    pub fn remove(&mut self, id: &MappingId) -> Option<ComplianceMapping> {
        let mapping = self.mappings.remove(id)?;
        if let Some(out) = self.outgoing.get_mut(&mapping.source) {
            out.remove(id);
        }
        if let Some(inc) = self.incoming.get_mut(&mapping.target) {
            inc.remove(id);
        }
        self.order.retain(|m| m != id);
        Some(mapping)
    }

    /// Remove every mapping touching a requirement.
    pub fn remove_requirement(&mut self, requirement: &RequirementId) -> Vec<ComplianceMapping> {
        let touching: Vec<MappingId> = self
            .outgoing
            .get(requirement)
            .into_iter()
            .chain(self.incoming.get(requirement))
            .flatten()
            .copied()
            .collect();
        touching.iter().filter_map(|id| self.remove(id)).collect()
    }

    pub fn outgoing(&self, requirement: &RequirementId) -> Vec<&ComplianceMapping> {
        self.edges(&self.outgoing, requirement)
    }

    pub fn incoming(&self, requirement: &RequirementId) -> Vec<&ComplianceMapping> {
        self.edges(&self.incoming, requirement)
    }

    fn edges<'a>(
        &'a self,
        index: &'a HashMap<RequirementId, BTreeSet<MappingId>>,
        requirement: &RequirementId,
    ) -> Vec<&'a ComplianceMapping> {
        index
            .get(requirement)
            .into_iter()
            .flatten()
            .filter_map(|id| self.mappings.get(id))
            .collect()
    }

    /// Mappings flagged bidirectional, in insertion order.
    pub fn bidirectional(&self) -> impl Iterator<Item = &ComplianceMapping> {
        self.iter().filter(|m| m.bidirectional)
    }

    /// The bidirectional counterpart of a mapping: a bidirectional mapping
    /// running the opposite way between the same two requirements.
    pub fn reverse_of(&self, id: &MappingId) -> Option<&ComplianceMapping> {
        let mapping = self.mappings.get(id).filter(|m| m.bidirectional)?;
        self.outgoing(&mapping.target)
            .into_iter()
            .find(|m| is_reverse_pair(mapping, m))
    }

    fn closes_cycle(&self, mapping: &ComplianceMapping) -> bool {
        self.walk(&mapping.target, &mapping.source, |edge| {
            is_reverse_pair(mapping, edge)
        })
    }

    /// Whether `to` is reachable from `from` along mapping direction.
    pub fn reaches(&self, from: &RequirementId, to: &RequirementId) -> bool {
        self.walk(from, to, |_| false)
    }

    fn walk<F>(&self, from: &RequirementId, to: &RequirementId, skip: F) -> bool
    where
        F: Fn(&ComplianceMapping) -> bool,
    {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([*from]);
        while let Some(node) = queue.pop_front() {
            if node == *to {
                return true;
            }
            if !seen.insert(node) {
                continue;
            }
            for id in self.outgoing.get(&node).into_iter().flatten() {
                match self.mappings.get(id) {
                    Some(m) if !skip(m) => queue.push_back(m.target),
                    _ => {}
                }
            }
        }
        false
    }

    /// One-hop credit from every mapping into `target`.
    pub fn transitive_credit<S>(&self, target: &RequirementId, source: &S) -> Vec<TransitiveCredit>
    where
        S: FulfillmentSource + ?Sized,
    {
        self.incoming(target)
            .into_iter()
            .map(|m| TransitiveCredit {
                mapping: m.id,
                source: m.source,
                credit: m.transitive_fulfillment(source.fulfillment_of(&m.source)),
            })
            .collect()
    }

    /// Highest one-hop credit into `target`, `None` without incoming
    /// mappings.
    pub fn best_transitive_fulfillment<S>(&self, target: &RequirementId, source: &S) -> Option<f64>
    where
        S: FulfillmentSource + ?Sized,
    {
        self.transitive_credit(target, source)
            .into_iter()
            .map(|c| c.credit)
            .reduce(f64::max)
    }
}

fn is_reverse_pair(a: &ComplianceMapping, b: &ComplianceMapping) -> bool {
    a.bidirectional && b.bidirectional && a.source == b.target && a.target == b.source
}
