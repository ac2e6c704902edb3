//! # Identifier Newtypes
//!
//! UUID newtypes for every record kind in the compliance model. These
//! prevent accidental identifier confusion: a `MappingId` cannot be passed
//! where a `RequirementId` is expected, and a `TenantId` never leaks into a
//! user attribution slot.
//!
//! All identifiers are always valid by construction.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Define a UUID-backed identifier with a display prefix.
macro_rules! define_uuid_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

define_uuid_id!(
    /// Organization whose fulfillment progress is tracked independently.
    TenantId,
    "tenant"
);

define_uuid_id!(
    /// A person responsible for, or reviewing, compliance work.
    UserId,
    "user"
);

define_uuid_id!(
    /// A compliance framework (ISO 27001, GDPR, NIS2, ...).
    FrameworkId,
    "framework"
);

define_uuid_id!(
    /// A single requirement within a framework.
    RequirementId,
    "requirement"
);

define_uuid_id!(
    /// A security control implemented by the organization.
    ControlId,
    "control"
);

define_uuid_id!(
    /// A cross-framework mapping edge between two requirements.
    MappingId,
    "mapping"
);

define_uuid_id!(
    /// A gap analysis line item owned by a mapping.
    GapItemId,
    "gap"
);

define_uuid_id!(
    /// A tenant-specific fulfillment record.
    FulfillmentId,
    "fulfillment"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_unique() {
        assert_ne!(RequirementId::new(), RequirementId::new());
    }

    #[test]
    fn display_uses_prefix() {
        let uuid = Uuid::nil();
        assert_eq!(
            MappingId::from_uuid(uuid).to_string(),
            "mapping:00000000-0000-0000-0000-000000000000"
        );
        assert!(TenantId::from(uuid).to_string().starts_with("tenant:"));
    }

    #[test]
    fn serde_is_transparent() {
        let id = ControlId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));
        let parsed: ControlId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }
}
