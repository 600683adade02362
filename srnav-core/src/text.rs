//! Token-set text similarity with optional domain-keyword boosting
//!
//! Global invariants enforced:
//! - All similarity values are clamped to [0,1]
//! - Tokenization is deterministic; formatting and case never affect results

use std::collections::HashSet;

/// Default domain keywords that are disproportionately diagnostic of
/// incident relatedness.
pub const DEFAULT_DOMAIN_KEYWORDS: &[&str] = &[
    "error",
    "failure",
    "calculation",
    "billing",
    "system",
    "performance",
    "data",
    "logic",
    "discount",
    "invoice",
    "policy",
];

/// Share of the boosted score carried by plain Jaccard similarity
const JACCARD_BLEND: f64 = 0.7;
/// Maximum bonus contributed by domain-keyword matches
const KEYWORD_BONUS_CAP: f64 = 0.3;
/// Keyword matches saturating the bonus term
const KEYWORD_SATURATION: f64 = 5.0;

/// Lowercase, strip everything outside letters/digits/whitespace, and
/// tokenize on whitespace into a set.
pub fn tokenize(text: &str) -> HashSet<String> {
    let normalized: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();
    normalized.split_whitespace().map(str::to_string).collect()
}

/// Jaccard similarity |A∩B| / |A∪B| in [0,1]; 0.0 if either set is empty.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Plain token-set similarity between two free-text blobs.
pub fn similarity(text_a: &str, text_b: &str) -> f64 {
    jaccard(&tokenize(text_a), &tokenize(text_b))
}

/// Keyword-boosted similarity: `0.7*jaccard + min(matched/5, 1)*0.3`,
/// clamped to 1.0. Keywords only count when present in both texts.
pub fn boosted_similarity(text_a: &str, text_b: &str, keywords: &[String]) -> f64 {
    let tokens_a = tokenize(text_a);
    let tokens_b = tokenize(text_b);
    let base = jaccard(&tokens_a, &tokens_b);

    let matched = keywords
        .iter()
        .filter(|k| {
            let k = k.to_lowercase();
            tokens_a.contains(&k) && tokens_b.contains(&k)
        })
        .count();
    let bonus = (matched as f64 / KEYWORD_SATURATION).min(1.0) * KEYWORD_BONUS_CAP;

    (JACCARD_BLEND * base + bonus).min(1.0)
}
