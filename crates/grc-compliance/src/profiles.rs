//! # Risk and Readiness Profiles
//!
//! Supplier risk, continuity plan readiness and change complexity, each
//! expressed as a [`Scorecard`], plus the probability × impact risk rating.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use grc_core::Priority;

use crate::scorecard::Scorecard;

/// Whole calendar months from `from` to `to`; 0 when `to` is earlier.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> u32 {
    if to <= from {
        return 0;
    }
    let mut months = (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
    if to.day() < from.day() {
        months -= 1;
    }
    months.max(0) as u32
}

fn filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

fn priority_points(priority: Priority, points: [f64; 4]) -> f64 {
    match priority {
        Priority::Critical => points[0],
        Priority::High => points[1],
        Priority::Medium => points[2],
        Priority::Low => points[3],
    }
}

// ---------------------------------------------------------------------------
// Supplier
// ---------------------------------------------------------------------------

/// Third-party supplier risk inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierRiskProfile {
    pub name: String,
    pub criticality: Priority,
    /// Result of the last security assessment, 0–100.
    #[serde(default)]
    pub security_score: Option<u8>,
    #[serde(default)]
    pub has_iso27001: bool,
    #[serde(default)]
    pub has_iso22301: bool,
    /// Data processing agreement in place.
    #[serde(default)]
    pub has_dpa: bool,
    #[serde(default)]
    pub last_assessment: Option<NaiveDate>,
    #[serde(default)]
    pub next_assessment_date: Option<NaiveDate>,
}

impl SupplierRiskProfile {
    pub fn new(name: impl Into<String>, criticality: Priority) -> Self {
        Self {
            name: name.into(),
            criticality,
            security_score: None,
            has_iso27001: false,
            has_iso22301: false,
            has_dpa: false,
            last_assessment: None,
            next_assessment_date: None,
        }
    }

    /// Without a scheduled date a supplier is overdue only if it was never
    /// assessed.
    pub fn is_assessment_overdue(&self, as_of: NaiveDate) -> bool {
        match self.next_assessment_date {
            Some(next) => next < as_of,
            None => self.last_assessment.is_none(),
        }
    }

    pub fn scorecard(&self, as_of: NaiveDate) -> Scorecard {
        let insecurity = match self.security_score {
            Some(score) => f64::from(100 - score.min(100)) / 100.0,
            None => 1.0,
        };
        Scorecard::new()
            .weighted(
                "criticality",
                40.0,
                priority_points(self.criticality, [40.0, 30.0, 15.0, 5.0]) / 40.0,
            )
            .weighted("security_assessment", 30.0, insecurity)
            .flag("missing_iso27001", 10.0, !self.has_iso27001)
            .flag(
                "missing_iso22301",
                5.0,
                !self.has_iso22301 && self.criticality == Priority::Critical,
            )
            .flag("missing_dpa", 10.0, !self.has_dpa)
            .flag("assessment_overdue", 5.0, self.is_assessment_overdue(as_of))
    }

    /// 0 (low risk) to 100 (high risk).
    pub fn risk_score(&self, as_of: NaiveDate) -> u8 {
        self.scorecard(as_of).score()
    }
}

// ---------------------------------------------------------------------------
// Business continuity plan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    #[default]
    Draft,
    UnderReview,
    Active,
    Archived,
}

/// Business continuity plan content relevant to readiness.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContinuityPlanProfile {
    pub name: Option<String>,
    pub plan_owner: Option<String>,
    pub activation_criteria: Option<String>,
    pub recovery_procedures: Option<String>,
    pub communication_plan: Option<String>,
    pub response_team: Option<String>,
    pub roles_and_responsibilities: Option<String>,
    pub alternative_site: Option<String>,
    pub backup_procedures: Option<String>,
    pub restore_procedures: Option<String>,
    pub critical_assets: Vec<String>,
    pub stakeholder_contacts: Option<String>,
    pub required_resources: Option<String>,
    pub status: PlanStatus,
    pub last_tested: Option<NaiveDate>,
    pub next_test_date: Option<NaiveDate>,
    pub last_review_date: Option<NaiveDate>,
    pub next_review_date: Option<NaiveDate>,
}

impl ContinuityPlanProfile {
    pub fn is_test_overdue(&self, as_of: NaiveDate) -> bool {
        match self.next_test_date {
            Some(next) => next < as_of,
            None => self.status == PlanStatus::Active && self.last_tested.is_none(),
        }
    }

    pub fn is_review_overdue(&self, as_of: NaiveDate) -> bool {
        self.next_review_date.is_some_and(|next| next < as_of)
    }

    pub fn readiness_scorecard(&self, as_of: NaiveDate) -> Scorecard {
        let test_points = match self.last_tested.map(|d| months_between(d, as_of)) {
            Some(m) if m <= 6 => 30.0,
            Some(m) if m <= 12 => 20.0,
            Some(m) if m <= 24 => 10.0,
            _ => 0.0,
        };
        let review_points = match self.last_review_date.map(|d| months_between(d, as_of)) {
            Some(m) if m <= 6 => 20.0,
            Some(m) if m <= 12 => 10.0,
            _ => 0.0,
        };
        Scorecard::new()
            .flag("activation_criteria", 10.0, filled(&self.activation_criteria))
            .flag("recovery_procedures", 10.0, filled(&self.recovery_procedures))
            .flag("communication_plan", 10.0, filled(&self.communication_plan))
            .flag("response_team", 10.0, filled(&self.response_team))
            .weighted("tested_recently", 30.0, test_points / 30.0)
            .weighted("reviewed_recently", 20.0, review_points / 20.0)
            .flag("active", 10.0, self.status == PlanStatus::Active)
    }

    /// 0–100.
    pub fn readiness_score(&self, as_of: NaiveDate) -> u8 {
        self.readiness_scorecard(as_of).score()
    }

    /// Share of the 13 key fields that are filled in.
    pub fn completeness_percentage(&self) -> u8 {
        let fields = [
            ("name", filled(&self.name)),
            ("plan_owner", filled(&self.plan_owner)),
            ("activation_criteria", filled(&self.activation_criteria)),
            ("recovery_procedures", filled(&self.recovery_procedures)),
            ("communication_plan", filled(&self.communication_plan)),
            ("response_team", filled(&self.response_team)),
            ("roles_and_responsibilities", filled(&self.roles_and_responsibilities)),
            ("alternative_site", filled(&self.alternative_site)),
            ("backup_procedures", filled(&self.backup_procedures)),
            ("restore_procedures", filled(&self.restore_procedures)),
            ("critical_assets", !self.critical_assets.is_empty()),
            ("stakeholder_contacts", filled(&self.stakeholder_contacts)),
            ("required_resources", filled(&self.required_resources)),
        ];
        let weight = 100.0 / fields.len() as f64;
        fields
            .into_iter()
            .fold(Scorecard::new(), |card, (label, on)| card.flag(label, weight, on))
            .score()
    }
}

// ---------------------------------------------------------------------------
// Change request
// ---------------------------------------------------------------------------

/// Scope of a change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeImpactProfile {
    pub affected_assets: usize,
    pub affected_controls: usize,
    pub affected_processes: usize,
    pub associated_risks: usize,
    pub priority: Priority,
}

impl ChangeImpactProfile {
    pub fn scorecard(&self) -> Scorecard {
        Scorecard::new()
            .capped_count("assets", 30.0, self.affected_assets, 3.0)
            .capped_count("controls", 25.0, self.affected_controls, 5.0)
            .capped_count("processes", 20.0, self.affected_processes, 4.0)
            .capped_count("risks", 15.0, self.associated_risks, 3.0)
            .weighted(
                "priority",
                10.0,
                priority_points(self.priority, [10.0, 7.0, 4.0, 2.0]) / 10.0,
            )
    }

    /// 0–100.
    pub fn complexity_score(&self) -> u8 {
        self.scorecard().score()
    }
}

// ---------------------------------------------------------------------------
// Risk rating
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Band a probability × impact product.
    pub fn from_score(score: u8) -> Self {
        match score {
            s if s >= 16 => Self::Critical,
            s if s >= 9 => Self::High,
            s if s >= 4 => Self::Medium,
            _ => Self::Low,
        }
    }
}

/// Probability and impact on a 1–5 scale, before and after treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskRating {
    probability: u8,
    impact: u8,
    residual_probability: u8,
    residual_impact: u8,
}

impl RiskRating {
    /// Values are clamped to 1–5.
    pub fn new(probability: u8, impact: u8, residual_probability: u8, residual_impact: u8) -> Self {
        let scale = |v: u8| v.clamp(1, 5);
        Self {
            probability: scale(probability),
            impact: scale(impact),
            residual_probability: scale(residual_probability),
            residual_impact: scale(residual_impact),
        }
    }

    pub fn inherent(&self) -> u8 {
        self.probability * self.impact
    }

    pub fn residual(&self) -> u8 {
        self.residual_probability * self.residual_impact
    }

    /// Negative when treatment made things worse.
    pub fn reduction(&self) -> i16 {
        i16::from(self.inherent()) - i16::from(self.residual())
    }

    pub fn inherent_level(&self) -> RiskLevel {
        RiskLevel::from_score(self.inherent())
    }

    pub fn residual_level(&self) -> RiskLevel {
        RiskLevel::from_score(self.residual())
    }
}
