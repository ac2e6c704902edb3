//! # Categorical Vocabularies
//!
//! Every status, priority and type field in the compliance model is a closed
//! set. Each set is an enum here with a snake_case wire form, an `as_str()`
//! that matches serde, and a `FromStr` that rejects unknown strings with
//! [`GrcError::InvalidArgument`] listing the allowed values.
//!
//! Adding a variant forces every `match` in the workspace to handle it.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::GrcError;
use crate::percentage::MappingStrength;

/// Define a closed vocabulary enum with strict string parsing.
macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[ $( $name::$variant ),+ ];

            /// The snake_case wire form.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $wire, )+
                }
            }

            /// The accepted wire forms, in declaration order.
            pub fn allowed() -> &'static [&'static str] {
                &[ $( $wire ),+ ]
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = GrcError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $wire => Ok(Self::$variant), )+
                    other => Err(GrcError::invalid_argument($field, other, Self::allowed())),
                }
            }
        }
    };
}

vocabulary!(
    /// Requirement or gap priority.
    Priority, "priority" {
        /// Must be addressed before anything else.
        Critical => "critical",
        /// High.
        High => "high",
        /// Medium.
        Medium => "medium",
        /// Low.
        Low => "low",
    }
);

impl Priority {
    /// Numeric rank, `critical` = 4 down to `low` = 1.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Critical => 4,
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

vocabulary!(
    /// Position of a requirement in its framework's hierarchy.
    RequirementType, "requirement type" {
        /// Top-level requirement (e.g. an ISO 27001 Annex A control).
        Core => "core",
        /// Detailed requirement refining a core one.
        Detailed => "detailed",
        /// Sub-requirement below a detailed requirement.
        SubRequirement => "sub_requirement",
    }
);

impl Default for RequirementType {
    fn default() -> Self {
        Self::Core
    }
}

vocabulary!(
    /// Implementation status of a security control.
    ImplementationStatus, "implementation status" {
        NotStarted => "not_started",
        Planned => "planned",
        InProgress => "in_progress",
        Implemented => "implemented",
        /// Audited after implementation. Only `implemented` and
        /// `in_progress` feed the fulfillment calculation.
        Verified => "verified",
        NotImplemented => "not_implemented",
    }
);

vocabulary!(
    /// Status of a tenant's fulfillment record.
    FulfillmentStatus, "status" {
        /// No work yet.
        NotStarted => "not_started",
        /// Partially fulfilled.
        InProgress => "in_progress",
        /// Fully implemented.
        Implemented => "implemented",
        /// Implemented and independently verified.
        Verified => "verified",
    }
);

impl Default for FulfillmentStatus {
    fn default() -> Self {
        Self::NotStarted
    }
}

vocabulary!(
    /// Kind of gap between a source and a target requirement.
    GapType, "gap type" {
        /// Target covers controls the source does not mention.
        MissingControl => "missing_control",
        /// Textual coverage is only partial.
        PartialCoverage => "partial_coverage",
        /// Category, priority or control scope differ.
        ScopeDifference => "scope_difference",
        /// Target is substantially broader than the source.
        AdditionalRequirement => "additional_requirement",
        /// Strong mapping that still needs supporting evidence.
        EvidenceGap => "evidence_gap",
    }
);

vocabulary!(
    /// Lifecycle of a gap item.
    GapStatus, "gap status" {
        Identified => "identified",
        Planned => "planned",
        InProgress => "in_progress",
        Resolved => "resolved",
        WontFix => "wont_fix",
    }
);

impl GapStatus {
    /// Whether the gap still needs work.
    pub fn is_unresolved(&self) -> bool {
        !matches!(self, Self::Resolved | Self::WontFix)
    }
}

impl Default for GapStatus {
    fn default() -> Self {
        Self::Identified
    }
}

vocabulary!(
    /// Who identified a gap item.
    IdentificationSource, "identification source" {
        Algorithm => "algorithm",
        Manual => "manual",
    }
);

vocabulary!(
    /// Reviewer confidence in a mapping.
    MappingConfidence, "confidence" {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
);

impl Default for MappingConfidence {
    fn default() -> Self {
        Self::Medium
    }
}

vocabulary!(
    /// Band of a mapping's strength.
    ///
    /// | Strength | Type |
    /// |----------|------|
    /// | 0–49     | weak |
    /// | 50–99    | partial |
    /// | 100      | full |
    /// | 101–150  | exceeds |
    MappingType, "mapping type" {
        Weak => "weak",
        Partial => "partial",
        Full => "full",
        Exceeds => "exceeds",
    }
);

impl MappingType {
    /// Classify a (clamped) mapping strength into its band.
    pub fn classify(strength: MappingStrength) -> Self {
        match strength.value() {
            0..=49 => Self::Weak,
            50..=99 => Self::Partial,
            100 => Self::Full,
            _ => Self::Exceeds,
        }
    }

    /// CSS badge class used by the reporting views.
    pub fn badge_class(&self) -> &'static str {
        match self {
            Self::Weak => "secondary",
            Self::Partial => "warning",
            Self::Full | Self::Exceeds => "success",
        }
    }

    /// Human-readable description including the strength.
    pub fn describe(&self, strength: MappingStrength) -> String {
        let pct = strength.value();
        match self {
            Self::Weak => format!("Weak relationship ({pct}%)"),
            Self::Partial => format!("Partially satisfies target requirement ({pct}%)"),
            Self::Full => format!("Fully satisfies target requirement ({pct}%)"),
            Self::Exceeds => format!("Exceeds target requirement ({pct}%)"),
        }
    }
}

vocabulary!(
    /// Review workflow state of a mapping.
    ReviewStatus, "review status" {
        /// Freshly created or generated.
        Unreviewed => "unreviewed",
        /// A reviewer has picked it up.
        InReview => "in_review",
        /// Accepted (terminal until reopened).
        Approved => "approved",
        /// Rejected (terminal until reopened).
        Rejected => "rejected",
    }
);

impl Default for ReviewStatus {
    fn default() -> Self {
        Self::Unreviewed
    }
}

vocabulary!(
    /// How a child tenant relates to its parent's fulfillment records.
    GovernanceModel, "governance model" {
        /// Child sees and inherits the parent's records.
        Hierarchical => "hierarchical",
        /// Child and parent maintain records side by side.
        Shared => "shared",
        /// No relationship.
        Independent => "independent",
    }
);

impl Default for GovernanceModel {
    fn default() -> Self {
        Self::Independent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn fulfillment_status_rejects_unknown_value() {
        let err = "done".parse::<FulfillmentStatus>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid status \"done\". Allowed: not_started, in_progress, implemented, verified"
        );
    }

    #[test]
    fn as_str_matches_serde() {
        for status in GapStatus::ALL {
            let json = serde_json::to_string(status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(status.as_str().parse::<GapStatus>().unwrap(), *status);
        }
        for kind in RequirementType::ALL {
            let json = serde_json::to_string(kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn mapping_type_parse_is_strict() {
        assert_eq!("exceeds".parse::<MappingType>().unwrap(), MappingType::Exceeds);
        assert!("strong".parse::<MappingType>().is_err());
        assert!("Full".parse::<MappingType>().is_err());
    }

    #[test]
    fn mapping_type_band_edges() {
        let band = |v| MappingType::classify(MappingStrength::clamped(v));
        assert_eq!(band(0), MappingType::Weak);
        assert_eq!(band(49), MappingType::Weak);
        assert_eq!(band(50), MappingType::Partial);
        assert_eq!(band(99), MappingType::Partial);
        assert_eq!(band(100), MappingType::Full);
        assert_eq!(band(101), MappingType::Exceeds);
        assert_eq!(band(150), MappingType::Exceeds);
        assert_eq!(band(-10), MappingType::Weak);
        assert_eq!(band(200), MappingType::Exceeds);
    }

    #[test]
    fn badge_classes() {
        assert_eq!(MappingType::Weak.badge_class(), "secondary");
        assert_eq!(MappingType::Partial.badge_class(), "warning");
        assert_eq!(MappingType::Full.badge_class(), "success");
        assert_eq!(MappingType::Exceeds.badge_class(), "success");
    }

    #[test]
    fn descriptions_include_strength() {
        let s = |v| MappingStrength::clamped(v);
        assert_eq!(MappingType::Weak.describe(s(30)), "Weak relationship (30%)");
        assert_eq!(
            MappingType::Partial.describe(s(75)),
            "Partially satisfies target requirement (75%)"
        );
        assert_eq!(
            MappingType::Full.describe(s(100)),
            "Fully satisfies target requirement (100%)"
        );
        assert_eq!(
            MappingType::Exceeds.describe(s(120)),
            "Exceeds target requirement (120%)"
        );
    }

    #[test]
    fn gap_status_resolution() {
        assert!(GapStatus::Identified.is_unresolved());
        assert!(GapStatus::InProgress.is_unresolved());
        assert!(!GapStatus::Resolved.is_unresolved());
        assert!(!GapStatus::WontFix.is_unresolved());
    }

    #[test]
    fn defaults() {
        assert_eq!(Priority::default(), Priority::Medium);
        assert_eq!(MappingConfidence::default(), MappingConfidence::Medium);
        assert_eq!(ReviewStatus::default(), ReviewStatus::Unreviewed);
        assert_eq!(FulfillmentStatus::default(), FulfillmentStatus::NotStarted);
    }

    #[test]
    fn priority_rank_orders_by_severity() {
        assert!(Priority::Critical.rank() > Priority::High.rank());
        assert!(Priority::Medium.rank() > Priority::Low.rank());
    }

    proptest! {
        #[test]
        fn mapping_type_matches_clamped_band(v in -50i64..=200) {
            let clamped = v.clamp(0, 150);
            let expected = if clamped < 50 {
                MappingType::Weak
            } else if clamped < 100 {
                MappingType::Partial
            } else if clamped == 100 {
                MappingType::Full
            } else {
                MappingType::Exceeds
            };
            prop_assert_eq!(MappingType::classify(MappingStrength::clamped(v)), expected);
        }
    }
}
