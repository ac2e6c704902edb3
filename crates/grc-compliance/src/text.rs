//! # Requirement Text Analysis
//!
//! Normalization, tokenization and similarity measures shared by the quality
//! and gap analyzers, plus the security keyword lexicon.

use std::collections::{BTreeSet, HashMap};

/// Security keyword lexicon by category. A keyword may appear in several
/// categories (`recovery`, `assessment`, `surveillance`).
pub const SECURITY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "access_control",
        &[
            "access",
            "authentication",
            "authorization",
            "identity",
            "login",
            "password",
            "credential",
            "privileged",
            "least privilege",
            "role",
            "rbac",
            "permission",
        ],
    ),
    (
        "encryption",
        &[
            "encryption",
            "encrypted",
            "cryptographic",
            "cipher",
            "key management",
            "tls",
            "ssl",
            "hash",
            "secure communication",
        ],
    ),
    (
        "audit",
        &[
            "audit",
            "logging",
            "log",
            "monitoring",
            "review",
            "trail",
            "tracking",
            "surveillance",
            "recording",
        ],
    ),
    (
        "data_protection",
        &[
            "data protection",
            "privacy",
            "personal data",
            "sensitive",
            "confidential",
            "classification",
            "gdpr",
            "pii",
            "retention",
            "disposal",
        ],
    ),
    (
        "network",
        &[
            "network",
            "firewall",
            "segmentation",
            "boundary",
            "perimeter",
            "dmz",
            "intrusion",
            "ids",
            "ips",
        ],
    ),
    (
        "incident",
        &["incident", "breach", "response", "recovery", "contingency", "emergency", "crisis"],
    ),
    (
        "vulnerability",
        &[
            "vulnerability",
            "patch",
            "update",
            "scanning",
            "assessment",
            "penetration test",
            "security testing",
        ],
    ),
    (
        "backup",
        &[
            "backup",
            "restore",
            "recovery",
            "redundancy",
            "replication",
            "disaster recovery",
            "business continuity",
        ],
    ),
    (
        "physical",
        &["physical", "facility", "premises", "badge", "cctv", "surveillance", "visitor"],
    ),
    (
        "policy",
        &["policy", "procedure", "standard", "guideline", "documentation", "governance"],
    ),
    (
        "risk",
        &["risk", "assessment", "analysis", "mitigation", "treatment", "acceptance", "threat"],
    ),
    (
        "compliance",
        &["compliance", "regulation", "requirement", "legal", "statutory", "mandatory"],
    ),
    (
        "training",
        &["training", "awareness", "education", "competence", "qualification"],
    ),
    (
        "supplier",
        &[
            "supplier",
            "vendor",
            "third party",
            "outsourcing",
            "contractor",
            "service provider",
        ],
    ),
    (
        "change",
        &["change management", "change control", "version control", "configuration"],
    ),
];

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "from",
    "as", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does",
    "did", "will", "would", "could", "should", "may", "might", "must", "can", "shall",
];

/// Requirement categories considered equivalent for structural matching.
const RELATED_CATEGORIES: &[&[&str]] = &[
    &["access control", "authentication", "authorization", "identity management"],
    &["encryption", "cryptography", "data protection"],
    &["network security", "network", "firewall", "perimeter security"],
    &["incident response", "incident management", "business continuity"],
    &["audit", "logging", "monitoring"],
    &["risk management", "risk assessment"],
];

/// Lowercase, replace everything outside `[a-z0-9]` with a space, collapse
/// runs of whitespace.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let replaced: String = lowered
        .chars()
        .map(|c| if c.is_ascii_lowercase() || c.is_ascii_digit() { c } else { ' ' })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Words longer than two characters that are not stopwords. Expects
/// normalized input.
pub fn tokenize(normalized: &str) -> Vec<&str> {
    normalized
        .split(' ')
        .filter(|w| w.len() > 2 && !STOPWORDS.contains(w))
        .collect()
}

/// Jaccard index over the distinct tokens. Two empty inputs are identical.
pub fn jaccard(a: &[&str], b: &[&str]) -> f64 {
    let a: BTreeSet<&str> = a.iter().copied().collect();
    let b: BTreeSet<&str> = b.iter().copied().collect();
    match (a.is_empty(), b.is_empty()) {
        (true, true) => 1.0,
        (true, false) | (false, true) => 0.0,
        (false, false) => {
            let union = a.union(&b).count();
            a.intersection(&b).count() as f64 / union as f64
        }
    }
}

/// Cosine similarity of term-frequency vectors. 0 when either side is empty.
pub fn cosine(a: &[&str], b: &[&str]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let (va, vb) = (term_frequencies(a), term_frequencies(b));
    let dot: f64 = va
        .iter()
        .filter_map(|(word, x)| vb.get(word).map(|y| x * y))
        .sum();
    let norm = |v: &HashMap<&str, f64>| v.values().map(|x| x * x).sum::<f64>().sqrt();
    let (ma, mb) = (norm(&va), norm(&vb));
    if ma == 0.0 || mb == 0.0 {
        return 0.0;
    }
    dot / (ma * mb)
}

fn term_frequencies<'a>(tokens: &[&'a str]) -> HashMap<&'a str, f64> {
    let mut counts = HashMap::new();
    for t in tokens {
        *counts.entry(*t).or_insert(0.0) += 1.0;
    }
    counts
}

/// Population variance.
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

/// Lexicon keywords occurring as substrings of the normalized text,
/// deduplicated, in lexicon order.
pub fn extract_keywords(normalized: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for (_, keywords) in SECURITY_KEYWORDS {
        for kw in keywords.iter() {
            if normalized.contains(kw) && !found.iter().any(|f| f == kw) {
                found.push((*kw).to_string());
            }
        }
    }
    found
}

/// Every lexicon category containing at least one of the keywords.
pub fn keyword_categories(keywords: &[String]) -> BTreeSet<&'static str> {
    SECURITY_KEYWORDS
        .iter()
        .filter(|(_, members)| keywords.iter().any(|k| members.contains(&k.as_str())))
        .map(|(category, _)| *category)
        .collect()
}

/// Shared categories over all categories; 0 when neither side has any.
pub fn category_alignment(a: &[String], b: &[String]) -> f64 {
    let (ca, cb) = (keyword_categories(a), keyword_categories(b));
    let union = ca.union(&cb).count();
    if union == 0 {
        return 0.0;
    }
    ca.intersection(&cb).count() as f64 / union as f64
}

/// Case-insensitive exact match, or both in the same related group.
pub fn categories_match(a: &str, b: &str) -> bool {
    let (a, b) = (a.to_lowercase(), b.to_lowercase());
    if a == b {
        return true;
    }
    RELATED_CATEGORIES
        .iter()
        .any(|group| group.contains(&a.as_str()) && group.contains(&b.as_str()))
}
