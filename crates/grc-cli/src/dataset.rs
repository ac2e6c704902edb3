//! # Dataset Loading
//!
//! A dataset is one YAML document describing tenants, frameworks, controls,
//! requirements, mappings and fulfillment records. Cross references use
//! human-readable keys:
//!
//! - tenants and tenant parents by name,
//! - requirements by `framework` code plus `code`, parents by code within
//!   the same framework,
//! - controls by catalog code,
//! - mapping endpoints and fulfillment requirements as `FRAMEWORK:CODE`.
//!
//! ```yaml
//! tenants:
//!   - name: Acme
//! frameworks:
//!   - { code: ISO27001, name: ISO/IEC 27001 }
//! controls:
//!   - { code: A.8.24, name: Use of cryptography, status: implemented }
//! requirements:
//!   - framework: ISO27001
//!     code: A.8.24
//!     title: Use of cryptography
//!     controls: [A.8.24]
//! mappings:
//!   - { source: "ISO27001:A.8.24", target: "NIS2:21.2.h", percentage: 80 }
//! ```
//!
//! Every reference is resolved at load time; an unknown reference is an
//! error naming the entry.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use grc_compliance::requirement::DataSourceMapping;
use grc_compliance::{
    ComplianceFramework, ComplianceMapping, ComplianceRequirement, Control, ControlCatalog,
    FulfillmentLedger, MappingGraph, RequirementArena, Tenant,
};
use grc_core::{
    FulfillmentStatus, GovernanceModel, ImplementationStatus, Percentage, Priority, RequirementId,
    RequirementType, TenantId,
};

// ─── Wire Format ─────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DatasetFile {
    #[serde(default)]
    tenants: Vec<TenantEntry>,
    #[serde(default)]
    frameworks: Vec<FrameworkEntry>,
    #[serde(default)]
    controls: Vec<ControlEntry>,
    #[serde(default)]
    requirements: Vec<RequirementEntry>,
    #[serde(default)]
    mappings: Vec<MappingEntry>,
    #[serde(default)]
    fulfillments: Vec<FulfillmentEntry>,
}

#[derive(Debug, Deserialize)]
struct TenantEntry {
    name: String,
    #[serde(default)]
    parent: Option<String>,
    #[serde(default)]
    governance: GovernanceModel,
}

#[derive(Debug, Deserialize)]
struct FrameworkEntry {
    code: String,
    name: String,
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ControlEntry {
    code: String,
    name: String,
    status: ImplementationStatus,
    #[serde(default)]
    percentage: Option<Percentage>,
}

#[derive(Debug, Deserialize)]
struct RequirementEntry {
    framework: String,
    code: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    priority: Priority,
    #[serde(default)]
    requirement_type: RequirementType,
    #[serde(default)]
    parent: Option<String>,
    #[serde(default)]
    controls: Vec<String>,
    #[serde(default)]
    data_sources: DataSourceMapping,
}

#[derive(Debug, Deserialize)]
struct MappingEntry {
    source: String,
    target: String,
    percentage: i64,
    #[serde(default)]
    manual_percentage: Option<i64>,
    #[serde(default)]
    rationale: String,
    #[serde(default)]
    bidirectional: bool,
}

#[derive(Debug, Deserialize)]
struct FulfillmentEntry {
    tenant: String,
    requirement: String,
    #[serde(default)]
    percentage: Option<i64>,
    #[serde(default)]
    status: Option<FulfillmentStatus>,
    /// Unset keeps the applicability a hierarchical child inherits.
    #[serde(default)]
    applicable: Option<bool>,
    #[serde(default)]
    justification: Option<String>,
}

// ─── Resolved Dataset ────────────────────────────────────────────────

/// A fully resolved dataset.
#[derive(Debug, Default)]
pub struct Dataset {
    pub frameworks: Vec<ComplianceFramework>,
    pub controls: ControlCatalog,
    pub requirements: RequirementArena,
    pub ledger: FulfillmentLedger,
    pub mappings: MappingGraph,
}

impl Dataset {
    /// Read and resolve a dataset file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read dataset: {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("invalid dataset: {}", path.display()))
    }

    /// Parse and resolve a dataset document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: DatasetFile = serde_yaml::from_str(yaml).context("failed to parse dataset YAML")?;
        let mut dataset = Self::default();
        dataset.load_tenants(file.tenants)?;
        dataset.load_frameworks(file.frameworks)?;
        dataset.load_controls(file.controls)?;
        dataset.load_requirements(file.requirements)?;
        dataset.load_mappings(file.mappings)?;
        dataset.load_fulfillments(file.fulfillments)?;
        tracing::info!(
            frameworks = dataset.frameworks.len(),
            controls = dataset.controls.len(),
            requirements = dataset.requirements.len(),
            mappings = dataset.mappings.len(),
            "dataset loaded"
        );
        Ok(dataset)
    }

    pub fn framework(&self, code: &str) -> Result<&ComplianceFramework> {
        self.frameworks
            .iter()
            .find(|f| f.code == code)
            .with_context(|| format!("unknown framework {code:?}"))
    }

    pub fn tenant(&self, name: &str) -> Result<TenantId> {
        self.ledger
            .tenant_by_name(name)
            .map(|t| t.id)
            .with_context(|| format!("unknown tenant {name:?}"))
    }

    /// Resolve a `FRAMEWORK:CODE` reference.
    pub fn requirement(&self, reference: &str) -> Result<&ComplianceRequirement> {
        let (framework, code) = reference
            .split_once(':')
            .with_context(|| format!("requirement reference {reference:?} is not FRAMEWORK:CODE"))?;
        let framework = self.framework(framework)?;
        self.requirements
            .find_by_code(&framework.id, code)
            .with_context(|| format!("unknown requirement {reference:?}"))
    }

    /// `FRAMEWORK:CODE` of a requirement id.
    pub fn reference_of(&self, id: &RequirementId) -> String {
        match self.requirements.get(id) {
            Some(req) => {
                let framework = self
                    .frameworks
                    .iter()
                    .find(|f| f.id == req.framework_id)
                    .map_or("?", |f| f.code.as_str());
                format!("{framework}:{}", req.requirement_code)
            }
            None => id.to_string(),
        }
    }

    /// Source and target requirements of a mapping, with their frameworks.
    pub fn endpoints(&self, mapping: &ComplianceMapping) -> Result<Endpoints<'_>> {
        let (source, source_framework) = self.located(&mapping.source)?;
        let (target, target_framework) = self.located(&mapping.target)?;
        Ok(Endpoints {
            source,
            target,
            source_framework,
            target_framework,
        })
    }

    fn located(&self, id: &RequirementId) -> Result<(&ComplianceRequirement, &ComplianceFramework)> {
        let req = self
            .requirements
            .get(id)
            .with_context(|| format!("unknown requirement {id}"))?;
        let framework = self
            .frameworks
            .iter()
            .find(|f| f.id == req.framework_id)
            .with_context(|| format!("requirement {id} has no framework"))?;
        Ok((req, framework))
    }

    fn load_tenants(&mut self, entries: Vec<TenantEntry>) -> Result<()> {
        for entry in entries {
            if self.ledger.tenant_by_name(&entry.name).is_some() {
                bail!("duplicate tenant {:?}", entry.name);
            }
            let mut tenant = Tenant::new(entry.name, entry.governance);
            if let Some(parent) = entry.parent {
                let parent_id = self
                    .tenant(&parent)
                    .with_context(|| format!("parent of tenant {:?} must be listed before it", tenant.name))?;
                tenant = tenant.with_parent(parent_id);
            }
            self.ledger.register_tenant(tenant);
        }
        Ok(())
    }

    fn load_frameworks(&mut self, entries: Vec<FrameworkEntry>) -> Result<()> {
        for entry in entries {
            if self.frameworks.iter().any(|f| f.code == entry.code) {
                bail!("duplicate framework {:?}", entry.code);
            }
            let mut framework = ComplianceFramework::new(entry.code, entry.name);
            framework.version = entry.version;
            self.frameworks.push(framework);
        }
        Ok(())
    }

    fn load_controls(&mut self, entries: Vec<ControlEntry>) -> Result<()> {
        for entry in entries {
            if self.controls.by_code(&entry.code).is_some() {
                bail!("duplicate control {:?}", entry.code);
            }
            let mut control = Control::new(entry.code, entry.name, entry.status);
            control.percentage = entry.percentage;
            self.controls.insert(control);
        }
        Ok(())
    }

    fn load_requirements(&mut self, entries: Vec<RequirementEntry>) -> Result<()> {
        let mut parents = Vec::new();
        for entry in entries {
            let framework_id = self.framework(&entry.framework)?.id;
            if self.requirements.find_by_code(&framework_id, &entry.code).is_some() {
                bail!("duplicate requirement {}:{}", entry.framework, entry.code);
            }
            let mut req = ComplianceRequirement::new(framework_id, entry.code, entry.title);
            req.description = entry.description;
            req.category = entry.category;
            req.priority = entry.priority;
            req.requirement_type = entry.requirement_type;
            req.data_sources = entry.data_sources;
            for code in &entry.controls {
                let control = self.controls.by_code(code).with_context(|| {
                    format!("requirement {}:{} maps unknown control {code:?}", entry.framework, req.requirement_code)
                })?;
                req.map_control(control.id);
            }
            let id = self.requirements.insert(req)?;
            if let Some(parent) = entry.parent {
                parents.push((id, framework_id, entry.framework, parent));
            }
        }
        // Parents may be listed after their children.
        for (child, framework_id, framework, parent_code) in parents {
            let parent = self
                .requirements
                .find_by_code(&framework_id, &parent_code)
                .map(|r| r.id)
                .with_context(|| format!("unknown parent requirement {framework}:{parent_code}"))?;
            self.requirements.attach(child, parent)?;
        }
        Ok(())
    }

    fn load_mappings(&mut self, entries: Vec<MappingEntry>) -> Result<()> {
        for entry in entries {
            let source = self.requirement(&entry.source)?.id;
            let target = self.requirement(&entry.target)?.id;
            let mut mapping = ComplianceMapping::new(source, target, entry.percentage)
                .with_rationale(entry.rationale)
                .with_bidirectional(entry.bidirectional);
            mapping.set_manual_percentage(entry.manual_percentage);
            self.mappings
                .insert(mapping)
                .with_context(|| format!("mapping {} -> {}", entry.source, entry.target))?;
        }
        Ok(())
    }

    fn load_fulfillments(&mut self, entries: Vec<FulfillmentEntry>) -> Result<()> {
        for entry in entries {
            let tenant = self.tenant(&entry.tenant)?;
            let requirement = self.requirement(&entry.requirement)?.id;
            if self.ledger.get(&tenant, &requirement).is_some() {
                bail!("duplicate fulfillment of {} by {}", entry.requirement, entry.tenant);
            }
            let record = self.ledger.get_or_create(&tenant, &requirement)?;
            if let Some(percentage) = entry.percentage {
                record.set_fulfillment_percentage(percentage);
            }
            if let Some(status) = entry.status {
                record.set_status(status);
            }
            if entry.applicable.is_some() || entry.justification.is_some() {
                let applicable = entry.applicable.unwrap_or_else(|| record.is_applicable());
                record
                    .set_applicability(applicable, entry.justification)
                    .with_context(|| format!("fulfillment of {} by {}", entry.requirement, entry.tenant))?;
            }
        }
        Ok(())
    }
}

/// Both ends of a mapping.
#[derive(Debug, Clone, Copy)]
pub struct Endpoints<'a> {
    pub source: &'a ComplianceRequirement,
    pub target: &'a ComplianceRequirement,
    pub source_framework: &'a ComplianceFramework,
    pub target_framework: &'a ComplianceFramework,
}

/// Two frameworks, a hierarchy of two tenants and one mapping.
#[cfg(test)]
pub(crate) const SAMPLE: &str = r#"
tenants:
  - name: Acme Holding
  - name: Acme GmbH
    parent: Acme Holding
    governance: hierarchical
frameworks:
  - { code: ISO27001, name: "ISO/IEC 27001", version: "2022" }
  - { code: NIS2, name: NIS2 Directive }
controls:
  - { code: A.5.1, name: Policies, status: implemented, percentage: 100 }
  - { code: A.8.13, name: Backup, status: in_progress, percentage: 40 }
requirements:
  - framework: ISO27001
    code: A.5.1.1
    title: Information security policy detail
    parent: A.5.1
  - framework: ISO27001
    code: A.5.1
    title: Policies for information security
    controls: [A.5.1]
  - framework: NIS2
    code: 21.2.c
    title: Business continuity and backup management
    controls: [A.8.13]
    data_sources: { bcm_required: true }
mappings:
  - { source: "ISO27001:A.5.1", target: "NIS2:21.2.c", percentage: 60 }
fulfillments:
  - { tenant: Acme Holding, requirement: "ISO27001:A.5.1", percentage: 90, status: in_progress }
"#;
