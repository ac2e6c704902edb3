//! # grc-core — Foundational Types for the GRC Engine
//!
//! This crate is the leaf of the workspace. It defines the primitives every
//! other crate builds on, so that the scoring engine never passes bare
//! strings or unbounded numbers across its API.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype identifiers.** `TenantId`, `RequirementId`, `MappingId`,
//!    `ControlId` and friends are distinct UUID newtypes. A mapping id cannot
//!    be passed where a requirement id is expected.
//!
//! 2. **Categorical values fail fast.** Every status, priority and type
//!    vocabulary is an enum whose `FromStr` rejects unknown strings with
//!    [`GrcError::InvalidArgument`], listing the allowed values.
//!
//! 3. **Continuous values clamp.** [`Percentage`], [`MappingStrength`] and
//!    [`UnitScore`] silently clamp out-of-range input at construction. A
//!    score is advisory; workflow state is not.
//!
//! 4. **UTC-only timestamps.** [`Timestamp`] is always UTC with seconds
//!    precision.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `grc-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod percentage;
pub mod temporal;
pub mod vocabulary;

// Re-export primary types for ergonomic imports.
pub use error::GrcError;
pub use identity::{
    ControlId, FrameworkId, FulfillmentId, GapItemId, MappingId, RequirementId, TenantId, UserId,
};
pub use percentage::{round_to, MappingStrength, Percentage, UnitScore};
pub use temporal::Timestamp;
pub use vocabulary::{
    FulfillmentStatus, GapStatus, GapType, GovernanceModel, IdentificationSource,
    ImplementationStatus, MappingConfidence, MappingType, Priority, RequirementType, ReviewStatus,
};
