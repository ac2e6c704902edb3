//! # Mapping Quality Analysis
//!
//! Scores how well a mapping's stated strength is supported by the texts and
//! structure of its two requirements.
//!
//! ## Signals
//!
//! | Signal     | Basis                                                   |
//! |------------|---------------------------------------------------------|
//! | textual    | 0.4 · Jaccard(token sets) + 0.6 · cosine(term freq.)    |
//! | keyword    | security lexicon overlap + 0.2 · category alignment     |
//! | structural | category match, priority distance, ISO control coverage |
//!
//! The calculated percentage weighs keyword 40%, textual 35% and structural
//! 25%, then applies framework-family modifiers. Confidence rises when the
//! three signals agree and when both texts are long.

use serde::{Deserialize, Serialize};

use grc_core::{round_to, MappingStrength, Percentage, Priority, UnitScore};

use crate::config::QualityConfig;
use crate::framework::{ComplianceFramework, FrameworkFamily};
use crate::mapping::{ComplianceMapping, SimilaritySignals};
use crate::requirement::ComplianceRequirement;
use crate::text;

/// Result of analysing one mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAnalysis {
    pub calculated_percentage: MappingStrength,
    pub textual_similarity: UnitScore,
    pub keyword_overlap: UnitScore,
    pub structural_similarity: UnitScore,
    pub analysis_confidence: Percentage,
    pub quality_score: Percentage,
    pub requires_review: bool,
    pub algorithm_version: String,
    pub source_keywords: Vec<String>,
    pub target_keywords: Vec<String>,
}

impl QualityAnalysis {
    /// Store the calculated percentage and every signal on the mapping.
    pub fn apply_to(&self, mapping: &mut ComplianceMapping) {
        mapping.set_calculated_percentage(Some(i64::from(self.calculated_percentage.value())));
        mapping.set_signals(SimilaritySignals {
            textual_similarity: self.textual_similarity,
            keyword_overlap: self.keyword_overlap,
            structural_similarity: self.structural_similarity,
            analysis_confidence: self.analysis_confidence,
            quality_score: self.quality_score,
            requires_review: self.requires_review,
            algorithm_version: self.algorithm_version.clone(),
        });
    }

    /// Target keywords the source does not mention.
    pub fn missing_keywords(&self) -> Vec<String> {
        self.target_keywords
            .iter()
            .filter(|k| !self.source_keywords.contains(k))
            .cloned()
            .collect()
    }
}

/// Computes [`QualityAnalysis`] for mappings.
#[derive(Debug, Clone, Default)]
pub struct MappingQualityAnalyzer {
    config: QualityConfig,
}

impl MappingQualityAnalyzer {
    pub fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    pub fn analyze(
        &self,
        mapping: &ComplianceMapping,
        source: &ComplianceRequirement,
        target: &ComplianceRequirement,
        source_framework: &ComplianceFramework,
        target_framework: &ComplianceFramework,
    ) -> QualityAnalysis {
        let source_text = text::normalize(&source.text());
        let target_text = text::normalize(&target.text());
        let source_tokens = text::tokenize(&source_text);
        let target_tokens = text::tokenize(&target_text);
        let source_keywords = text::extract_keywords(&source_text);
        let target_keywords = text::extract_keywords(&target_text);

        let textual = 0.4 * text::jaccard(&source_tokens, &target_tokens)
            + 0.6 * text::cosine(&source_tokens, &target_tokens);
        let keyword = keyword_overlap(&source_keywords, &target_keywords);
        let structural = structural_similarity(source, target);

        let calculated = calculated_percentage(
            textual,
            keyword,
            structural,
            source,
            source_framework,
            target_framework,
        );
        let confidence = confidence(
            textual,
            keyword,
            structural,
            source_tokens.len().min(target_tokens.len()),
        );
        let verification = if mapping.review().verified_by().is_some() {
            30.0
        } else if mapping.review().reviewed_by().is_some() {
            20.0
        } else {
            0.0
        };
        let quality = f64::from(confidence) * 0.4
            + f64::from(calculated.value().min(100)) * 0.3
            + verification;

        let analysis = QualityAnalysis {
            calculated_percentage: calculated,
            textual_similarity: UnitScore::clamped(round_to(textual, 4)),
            keyword_overlap: UnitScore::clamped(round_to(keyword, 4)),
            structural_similarity: UnitScore::clamped(round_to(structural, 4)),
            analysis_confidence: Percentage::clamped(i64::from(confidence)),
            quality_score: Percentage::from_f64(quality),
            requires_review: confidence < i32::from(self.config.review_confidence_threshold),
            algorithm_version: self.config.algorithm_version.clone(),
            source_keywords,
            target_keywords,
        };
        tracing::debug!(
            mapping = %mapping.id,
            calculated = %analysis.calculated_percentage,
            confidence = %analysis.analysis_confidence,
            requires_review = analysis.requires_review,
            "mapping quality analysed"
        );
        analysis
    }
}

fn keyword_overlap(source: &[String], target: &[String]) -> f64 {
    if source.is_empty() || target.is_empty() {
        return 0.0;
    }
    let common = source.iter().filter(|k| target.contains(k)).count();
    let union = source.len() + target.len() - common;
    let ratio = common as f64 / union as f64;
    (ratio + 0.2 * text::category_alignment(source, target)).min(1.0)
}

fn priority_similarity(a: Priority, b: Priority) -> f64 {
    match a.rank().abs_diff(b.rank()) {
        0 => 1.0,
        1 => 0.7,
        2 => 0.4,
        _ => 0.1,
    }
}

/// Priority is always known, so at least one factor contributes.
fn structural_similarity(source: &ComplianceRequirement, target: &ComplianceRequirement) -> f64 {
    let mut score = 0.0;
    if let (Some(a), Some(b)) = (&source.category, &target.category) {
        if text::categories_match(a, b) {
            score += 0.4;
        }
    }
    score += priority_similarity(source.priority, target.priority) * 0.3;
    let iso_controls = source.data_sources.iso_controls.len();
    if iso_controls > 0 {
        score += (iso_controls as f64 / 3.0).min(1.0) * 0.3;
    }
    score
}

fn calculated_percentage(
    textual: f64,
    keyword: f64,
    structural: f64,
    source: &ComplianceRequirement,
    source_framework: &ComplianceFramework,
    target_framework: &ComplianceFramework,
) -> MappingStrength {
    let mut score = (keyword * 0.40 + textual * 0.35 + structural * 0.25) * 100.0;
    match (source_framework.family(), target_framework.family()) {
        (FrameworkFamily::Iso, FrameworkFamily::Iso)
        | (FrameworkFamily::EuRegulation, FrameworkFamily::EuRegulation) => score += 5.0,
        _ => {}
    }
    if source.data_sources.iso_controls.len() > 10 {
        score -= 10.0;
    }
    MappingStrength::clamped(score.round() as i64)
}

fn confidence(textual: f64, keyword: f64, structural: f64, min_words: usize) -> i32 {
    let mut confidence = 50;
    let spread = text::variance(&[textual, keyword, structural]);
    if spread < 0.05 {
        confidence += 30;
    } else if spread < 0.10 {
        confidence += 20;
    } else if spread < 0.15 {
        confidence += 10;
    }
    confidence += match min_words {
        n if n > 100 => 15,
        n if n > 50 => 10,
        n if n > 20 => 5,
        _ => -10,
    };
    if keyword > 0.7 {
        confidence += 10;
    }
    confidence.clamp(0, 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use grc_core::{FrameworkId, RequirementId, UserId};

    fn framework(code: &str) -> ComplianceFramework {
        ComplianceFramework::new(code, code)
    }

    fn requirement(code: &str, title: &str, description: &str) -> ComplianceRequirement {
        let mut r = ComplianceRequirement::new(FrameworkId::new(), code, title);
        r.description = description.to_string();
        r
    }

    fn run(
        source: &ComplianceRequirement,
        target: &ComplianceRequirement,
        sf: &str,
        tf: &str,
    ) -> QualityAnalysis {
        let mapping = ComplianceMapping::new(RequirementId::new(), RequirementId::new(), 100);
        MappingQualityAnalyzer::default().analyze(
            &mapping,
            source,
            target,
            &framework(sf),
            &framework(tf),
        )
    }

    #[test]
    fn identical_texts_score_high() {
        let text = "Access control authentication authorization identity management";
        let s = requirement("A.9.1", "Source Requirement", text);
        let t = requirement("Art. 32", "Target Requirement", text);
        let a = run(&s, &t, "ISO27001", "GDPR");
        assert!(a.textual_similarity.value() > 0.8);
        assert!(a.calculated_percentage.value() > 70);
        assert_eq!(a.keyword_overlap.value(), 1.0);
        assert_eq!(a.algorithm_version, "1.0.0");
    }

    #[test]
    fn unrelated_texts_score_low() {
        let s = requirement("A.9.1", "Password rules", "Passwords rotate quarterly");
        let t = requirement("Art. 5", "Lawful processing", "Processing of personal data lawful");
        let a = run(&s, &t, "ISO27001", "GDPR");
        assert!(a.textual_similarity.value() < 0.5);
    }

    #[test]
    fn empty_texts() {
        let s = requirement("A.5.1", "", "");
        let t = requirement("Art. 5", "", "");
        let a = run(&s, &t, "BSI", "SOC2");
        assert_eq!(a.textual_similarity.value(), 0.4);
        assert_eq!(a.keyword_overlap.value(), 0.0);
        assert!(a.source_keywords.is_empty());
        // Only the priority factor: equal priorities → 0.3.
        assert_eq!(a.structural_similarity.value(), 0.3);
    }

    #[test]
    fn family_bonus() {
        let s = requirement("A", "Backup policy", "Backups are tested");
        let t = requirement("B", "Backup policy", "Backups are tested");
        let iso = run(&s, &t, "ISO27001", "ISO22301");
        let mixed = run(&s, &t, "ISO27001", "BSI");
        assert_eq!(
            iso.calculated_percentage.value(),
            mixed.calculated_percentage.value() + 5
        );
    }

    #[test]
    fn broad_iso_mapping_penalised() {
        let s = requirement("A", "Backup policy", "Backups are tested");
        let t = requirement("B", "Backup policy", "Backups are tested");
        let mut broad = s.clone();
        broad.data_sources.iso_controls = (0..11).map(|i| format!("A.8.{i}")).collect();
        let narrow = run(&s, &t, "BSI", "SOC2");
        let wide = run(&broad, &t, "BSI", "SOC2");
        // 11 controls saturate the coverage factor (+0.3 · 25 = 7.5) and
        // cost 10 points.
        let expected = narrow.calculated_percentage.value() as i64 + 8 - 10;
        assert!((wide.calculated_percentage.value() as i64 - expected).abs() <= 1);
    }

    #[test]
    fn structural_category_and_priority() {
        let mut s = requirement("A", "x", "");
        let mut t = requirement("B", "y", "");
        s.category = Some("Access Control".into());
        t.category = Some("authentication".into());
        s.priority = Priority::Critical;
        t.priority = Priority::Low;
        assert!((structural_similarity(&s, &t) - (0.4 + 0.1 * 0.3)).abs() < 1e-9);
        t.priority = Priority::High;
        assert!((structural_similarity(&s, &t) - (0.4 + 0.7 * 0.3)).abs() < 1e-9);
    }

    #[test]
    fn confidence_bands() {
        assert_eq!(confidence(0.5, 0.5, 0.5, 0), 70);
        assert_eq!(confidence(0.5, 0.5, 0.5, 120), 95);
        assert_eq!(confidence(0.9, 0.9, 0.9, 120), 100);
        // variance of [0, 1, 0] is 2/9 ≈ 0.222
        assert_eq!(confidence(0.0, 1.0, 0.0, 30), 65);
    }

    #[test]
    fn verification_raises_quality() {
        let s = requirement("A", "Audit logging", "Security events are logged");
        let t = requirement("B", "Audit logging", "Security events are logged");
        let (sf, tf) = (framework("ISO27001"), framework("NIS2"));
        let analyzer = MappingQualityAnalyzer::default();
        let mut mapping = ComplianceMapping::new(RequirementId::new(), RequirementId::new(), 100);
        let unreviewed = analyzer.analyze(&mapping, &s, &t, &sf, &tf);

        let user = UserId::new();
        mapping.start_review(user).unwrap();
        mapping.approve(user, None).unwrap();
        let reviewed = analyzer.analyze(&mapping, &s, &t, &sf, &tf);

        mapping
            .verify(user, NaiveDate::from_ymd_opt(2026, 1, 10).unwrap())
            .unwrap();
        let verified = analyzer.analyze(&mapping, &s, &t, &sf, &tf);

        assert_eq!(
            reviewed.quality_score.value(),
            unreviewed.quality_score.value() + 20
        );
        assert_eq!(
            verified.quality_score.value(),
            unreviewed.quality_score.value() + 30
        );
    }

    #[test]
    fn quality_score_weighs_confidence_and_strength() {
        let s = requirement("A", "", "");
        let t = requirement("B", "", "");
        let a = run(&s, &t, "BSI", "SOC2");
        // textual 0.4, keyword 0.0, structural 0.3: variance ≈ 0.029 (+30),
        // fewer than 20 words (-10).
        assert_eq!(a.analysis_confidence.value(), 70);
        let expected = 70.0 * 0.4 + f64::from(a.calculated_percentage.value().min(100)) * 0.3;
        assert_eq!(a.quality_score, Percentage::from_f64(expected));
        assert!(!a.requires_review);
    }

    #[test]
    fn review_threshold_is_configurable() {
        let s = requirement("A", "Audit", "");
        let t = requirement("B", "Audit", "");
        let mapping = ComplianceMapping::new(RequirementId::new(), RequirementId::new(), 100);
        let strict = MappingQualityAnalyzer::new(QualityConfig {
            review_confidence_threshold: 101,
            ..QualityConfig::default()
        });
        let lax = MappingQualityAnalyzer::new(QualityConfig {
            review_confidence_threshold: 0,
            ..QualityConfig::default()
        });
        let (sf, tf) = (framework("ISO27001"), framework("NIS2"));
        assert!(strict.analyze(&mapping, &s, &t, &sf, &tf).requires_review);
        assert!(!lax.analyze(&mapping, &s, &t, &sf, &tf).requires_review);
    }

    #[test]
    fn apply_to_sets_calculated_provenance() {
        let s = requirement("A", "Encryption at rest", "Data is encrypted");
        let t = requirement("B", "Encryption", "Use strong encryption");
        let mut mapping = ComplianceMapping::new(RequirementId::new(), RequirementId::new(), 100);
        let a = MappingQualityAnalyzer::default().analyze(
            &mapping,
            &s,
            &t,
            &framework("ISO27001"),
            &framework("DORA"),
        );
        a.apply_to(&mut mapping);
        let f = mapping.final_percentage();
        assert_eq!(f.provenance, crate::mapping::Provenance::Calculated);
        assert_eq!(f.value, a.calculated_percentage);
        assert_eq!(mapping.signals().quality_score, a.quality_score);
        assert_eq!(mapping.requires_review(), a.requires_review);
    }

    #[test]
    fn missing_keywords_difference() {
        let s = requirement("A", "Encryption", "");
        let t = requirement("B", "Encryption and audit", "");
        let a = run(&s, &t, "ISO27001", "NIS2");
        assert_eq!(a.missing_keywords(), vec!["audit".to_string()]);
    }
}
