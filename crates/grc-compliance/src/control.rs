//! # Controls & Control-Derived Fulfillment
//!
//! A requirement's fulfillment is not stored: it is derived from the
//! implementation state of the controls mapped to it. Each mapped control
//! contributes:
//!
//! | Status        | Contribution |
//! |---------------|--------------|
//! | `implemented` | its percentage, or 100 when unset |
//! | `in_progress` | its percentage, or 50 when unset |
//! | anything else | 0 |
//!
//! The sum is divided by the **total** number of mapped controls and
//! rounded to the nearest integer. Controls that are not started still count
//! in the denominator, so they dilute the result.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use grc_core::{ControlId, ImplementationStatus, Percentage, Timestamp};

// ---------------------------------------------------------------------------
// ControlImplementation Trait
// ---------------------------------------------------------------------------

/// Anything that reports the implementation state of a security control.
pub trait ControlImplementation {
    /// Current implementation status.
    fn implementation_status(&self) -> ImplementationStatus;

    /// Explicit implementation percentage, if the owner recorded one.
    fn implementation_percentage(&self) -> Option<Percentage>;

    /// The points this control contributes to a requirement's fulfillment.
    fn contribution(&self) -> u32 {
        match self.implementation_status() {
            ImplementationStatus::Implemented => {
                u32::from(self.implementation_percentage().map_or(100, Percentage::value))
            }
            ImplementationStatus::InProgress => {
                u32::from(self.implementation_percentage().map_or(50, Percentage::value))
            }
            ImplementationStatus::NotStarted
            | ImplementationStatus::Planned
            | ImplementationStatus::Verified
            | ImplementationStatus::NotImplemented => 0,
        }
    }

    /// Whether this control is implemented at 100%.
    fn is_complete(&self) -> bool {
        self.implementation_status() == ImplementationStatus::Implemented
            && self.implementation_percentage().map_or(0, Percentage::value) >= 100
    }
}

/// Compute fulfillment from the resolved controls of a requirement.
///
/// `controls` yields one entry per mapped control id; `None` stands for a
/// reference that could not be resolved and contributes 0 while still
/// counting toward the denominator.
pub fn fulfillment_from_controls<'a, C, I>(controls: I) -> Percentage
where
    C: ControlImplementation + 'a,
    I: IntoIterator<Item = Option<&'a C>>,
{
    let mut total: u32 = 0;
    let mut count: u32 = 0;
    for control in controls {
        count += 1;
        total += control.map_or(0, |c| c.contribution());
    }
    if count == 0 {
        return Percentage::ZERO;
    }
    Percentage::from_f64(f64::from(total) / f64::from(count))
}

// ---------------------------------------------------------------------------
// Control
// ---------------------------------------------------------------------------

/// A security control (e.g. ISO 27001 Annex A `A.5.15`) and its
/// implementation state for the organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Control {
    /// Unique identifier.
    pub id: ControlId,
    /// Catalog code, unique within the catalog.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Current implementation status.
    pub status: ImplementationStatus,
    /// Explicit implementation percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<Percentage>,
    /// Last modification.
    pub updated_at: Timestamp,
}

impl Control {
    /// Create a control in the given state.
    pub fn new(code: impl Into<String>, name: impl Into<String>, status: ImplementationStatus) -> Self {
        Self {
            id: ControlId::new(),
            code: code.into(),
            name: name.into(),
            status,
            percentage: None,
            updated_at: Timestamp::now(),
        }
    }

    /// Builder-style percentage setter.
    pub fn with_percentage(mut self, percentage: Percentage) -> Self {
        self.percentage = Some(percentage);
        self
    }

    /// Update status and percentage together.
    pub fn set_implementation(&mut self, status: ImplementationStatus, percentage: Option<Percentage>) {
        self.status = status;
        self.percentage = percentage;
        self.updated_at = Timestamp::now();
    }
}

impl ControlImplementation for Control {
    fn implementation_status(&self) -> ImplementationStatus {
        self.status
    }

    fn implementation_percentage(&self) -> Option<Percentage> {
        self.percentage
    }
}

// ---------------------------------------------------------------------------
// ControlCatalog
// ---------------------------------------------------------------------------

/// The organization's control inventory.
#[derive(Debug, Clone, Default)]
pub struct ControlCatalog {
    controls: HashMap<ControlId, Control>,
    by_code: HashMap<String, ControlId>,
}

impl ControlCatalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a control. Returns its id.
    pub fn insert(&mut self, control: Control) -> ControlId {
        let id = control.id;
        self.by_code.insert(control.code.clone(), id);
        self.controls.insert(id, control);
        id
    }

    pub fn get(&self, id: &ControlId) -> Option<&Control> {
        self.controls.get(id)
    }

    pub fn get_mut(&mut self, id: &ControlId) -> Option<&mut Control> {
        self.controls.get_mut(id)
    }

    /// Look up a control by catalog code.
    pub fn by_code(&self, code: &str) -> Option<&Control> {
        self.by_code.get(code).and_then(|id| self.controls.get(id))
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    /// Fulfillment derived from a set of mapped control ids.
    ///
    /// Ids missing from the catalog contribute 0 and are logged.
    pub fn fulfillment_for(&self, mapped: &BTreeSet<ControlId>) -> Percentage {
        fulfillment_from_controls(mapped.iter().map(|id| {
            let control = self.controls.get(id);
            if control.is_none() {
                tracing::warn!(control = %id, "mapped control missing from catalog, counting as 0");
            }
            control
        }))
    }
}
