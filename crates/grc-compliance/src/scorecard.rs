//! # Weighted Scorecards
//!
//! A [`Scorecard`] is an ordered list of weighted factors. Each factor
//! contributes `weight · fraction` points, where the fraction is clamped to
//! `[0, 1]`. The total is rounded once, at the end, and clamped to
//! `[0, 100]`.
//!
//! Supplier risk, continuity readiness and change complexity in
//! [`crate::profiles`] are all expressed as scorecards.

use serde::Serialize;

use grc_core::UnitScore;

/// One weighted factor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Factor {
    pub label: &'static str,
    pub weight: f64,
    pub fraction: UnitScore,
}

impl Factor {
    /// Points this factor contributes, unrounded.
    pub fn points(&self) -> f64 {
        self.weight * self.fraction.value()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Scorecard {
    factors: Vec<Factor>,
}

impl Scorecard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a factor earning `fraction` of `weight`.
    pub fn weighted(mut self, label: &'static str, weight: f64, fraction: f64) -> Self {
        self.factors.push(Factor {
            label,
            weight,
            fraction: UnitScore::clamped(fraction),
        });
        self
    }

    /// Full weight when `on`, nothing otherwise.
    pub fn flag(self, label: &'static str, weight: f64, on: bool) -> Self {
        self.weighted(label, weight, if on { 1.0 } else { 0.0 })
    }

    /// `per_item` points per counted item, capped at `weight`.
    pub fn capped_count(self, label: &'static str, weight: f64, count: usize, per_item: f64) -> Self {
        let fraction = if weight > 0.0 {
            count as f64 * per_item / weight
        } else {
            0.0
        };
        self.weighted(label, weight, fraction)
    }

    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }

    /// Label and points of every factor, in insertion order.
    pub fn breakdown(&self) -> Vec<(&'static str, f64)> {
        self.factors.iter().map(|f| (f.label, f.points())).collect()
    }

    /// Sum of all points, rounded and clamped to `[0, 100]`.
    pub fn score(&self) -> u8 {
        let total: f64 = self.factors.iter().map(Factor::points).sum();
        total.round().clamp(0.0, 100.0) as u8
    }
}
