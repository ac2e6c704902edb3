//! # Compliance Frameworks

use serde::{Deserialize, Serialize};

use grc_core::FrameworkId;

/// Regulation families that share structure and vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameworkFamily {
    /// ISO management system standards (ISO 27001, ISO 22301, ...).
    Iso,
    /// EU regulations (GDPR, NIS2, DORA).
    EuRegulation,
    /// Anything else (BSI, SOC 2, TISAX, ...).
    Other,
}

const EU_REGULATIONS: &[&str] = &["GDPR", "NIS2", "DORA"];

/// A compliance framework such as ISO 27001 or NIS2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceFramework {
    /// Unique identifier.
    pub id: FrameworkId,
    /// Short code, e.g. `ISO27001`, `GDPR`.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Published version, e.g. `2022`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ComplianceFramework {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: FrameworkId::new(),
            code: code.into(),
            name: name.into(),
            version: None,
        }
    }

    /// Classify the framework code into its family.
    pub fn family(&self) -> FrameworkFamily {
        if self.code.starts_with("ISO") {
            FrameworkFamily::Iso
        } else if EU_REGULATIONS.contains(&self.code.as_str()) {
            FrameworkFamily::EuRegulation
        } else {
            FrameworkFamily::Other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_classification() {
        assert_eq!(ComplianceFramework::new("ISO27001", "").family(), FrameworkFamily::Iso);
        assert_eq!(ComplianceFramework::new("ISO22301", "").family(), FrameworkFamily::Iso);
        assert_eq!(ComplianceFramework::new("NIS2", "").family(), FrameworkFamily::EuRegulation);
        assert_eq!(ComplianceFramework::new("DORA", "").family(), FrameworkFamily::EuRegulation);
        assert_eq!(ComplianceFramework::new("BSI", "").family(), FrameworkFamily::Other);
        // Case matters: codes are canonical upper-case.
        assert_eq!(ComplianceFramework::new("gdpr", "").family(), FrameworkFamily::Other);
    }
}
