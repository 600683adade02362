//! Correlation ranking: SR-to-SR and SR-to-incident
//!
//! Two fixed linear policies over the shared weighted scorer. Ranking is
//! deterministic: descending score with a stable ascending-id tie-break,
//! so repeated runs over the same corpus produce identical output.
//!
//! Global invariants enforced:
//! - A target SR never matches itself
//! - Scores are in [0,1]; incident matches below the floor are dropped

use crate::config::ResolvedEngineConfig;
use crate::model::{IncidentReport, RiskFactorSnapshot, ServiceRequest, Severity};
use crate::scorer::WeightedScorer;
use crate::temporal::{decay_weight_for, TemporalBucket};
use crate::text::{boosted_similarity, jaccard, similarity};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;

/// A similar historical SR with its score and why it matched
#[derive(Debug, Clone, Serialize)]
pub struct SrMatch {
    pub sr: ServiceRequest,
    pub score: f64,
    pub match_reasons: Vec<String>,
}

/// A related historical incident with its score, recency class, and
/// derived risk facts
#[derive(Debug, Clone, Serialize)]
pub struct IncidentMatch {
    pub incident: IncidentReport,
    pub score: f64,
    pub temporal_bucket: TemporalBucket,
    pub risk_factors: RiskFactorSnapshot,
    pub match_reasons: Vec<String>,
}

/// Jaccard overlap of two component lists, case-insensitive.
pub fn component_overlap(a: &[String], b: &[String]) -> f64 {
    let set_a: HashSet<String> = a.iter().map(|c| c.trim().to_lowercase()).collect();
    let set_b: HashSet<String> = b.iter().map(|c| c.trim().to_lowercase()).collect();
    jaccard(&set_a, &set_b)
}

fn shared_components(a: &[String], b: &[String]) -> Vec<String> {
    let set_b: HashSet<String> = b.iter().map(|c| c.trim().to_lowercase()).collect();
    let mut shared: Vec<String> = a
        .iter()
        .filter(|c| set_b.contains(&c.trim().to_lowercase()))
        .map(|c| c.trim().to_string())
        .collect();
    shared.sort();
    shared.dedup();
    shared
}

/// Ranks historical SRs against a target SR
pub struct SrRanker {
    scorer: WeightedScorer<ServiceRequest, ServiceRequest>,
}

impl SrRanker {
    pub fn new(config: &ResolvedEngineConfig) -> Self {
        let weights = config.sr_ranker;
        let scorer = WeightedScorer::new()
            .signal("text", weights.text, |q: &ServiceRequest, c: &ServiceRequest| {
                similarity(&q.similarity_text(), &c.similarity_text())
            })
            .signal("system", weights.system, |q: &ServiceRequest, c: &ServiceRequest| {
                if !q.system.is_empty() && q.system == c.system {
                    1.0
                } else {
                    0.0
                }
            })
            .signal("components", weights.components, |q: &ServiceRequest, c: &ServiceRequest| {
                component_overlap(&q.affected_components, &c.affected_components)
            })
            .signal("category", weights.category, |q: &ServiceRequest, c: &ServiceRequest| {
                if !q.category.is_empty() && q.category == c.category {
                    1.0
                } else {
                    0.0
                }
            })
            .signal("priority", weights.priority, |q: &ServiceRequest, c: &ServiceRequest| {
                q.priority.closeness(c.priority)
            });
        SrRanker { scorer }
    }

    /// Score every historical SR against the target, excluding the target
    /// itself by id, and return the top `top_k` in deterministic order.
    pub fn rank(
        &self,
        target: &ServiceRequest,
        corpus: &[ServiceRequest],
        top_k: usize,
    ) -> Vec<SrMatch> {
        let mut matches: Vec<SrMatch> = corpus
            .iter()
            .filter(|candidate| candidate.id != target.id)
            .map(|candidate| {
                let breakdown = self.scorer.score(target, candidate);
                SrMatch {
                    match_reasons: sr_match_reasons(target, candidate),
                    score: breakdown.total,
                    sr: candidate.clone(),
                }
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.sr.id.cmp(&b.sr.id))
        });
        matches.truncate(top_k);
        matches
    }
}

/// Ranks historical incidents against a target SR
pub struct IncidentRanker {
    scorer: WeightedScorer<ServiceRequest, IncidentReport>,
    min_score: f64,
    reference_date: NaiveDate,
}

impl IncidentRanker {
    pub fn new(config: &ResolvedEngineConfig, reference_date: NaiveDate) -> Self {
        let weights = config.incident_ranker;
        let keywords = config.domain_keywords.clone();
        let severity_weights = config.severity_weights;
        let half_life = config.decay_half_life_days;

        let scorer = WeightedScorer::new()
            .signal("system", weights.system, |q: &ServiceRequest, c: &IncidentReport| {
                if !q.system.is_empty() && q.system == c.system {
                    1.0
                } else {
                    0.0
                }
            })
            .signal("components", weights.components, |q: &ServiceRequest, c: &IncidentReport| {
                component_overlap(&q.affected_components, &c.related_components)
            })
            .signal("text", weights.text, move |q: &ServiceRequest, c: &IncidentReport| {
                boosted_similarity(&q.incident_query_text(), &c.correlation_text(), &keywords)
            })
            .signal(
                "severity_recency",
                weights.severity_recency,
                move |_: &ServiceRequest, c: &IncidentReport| {
                    severity_weights.weight(c.severity)
                        * decay_weight_for(&c.reported_date, reference_date, half_life)
                },
            );

        IncidentRanker {
            scorer,
            min_score: weights.min_score,
            reference_date,
        }
    }

    /// Score every incident against the target SR, drop matches below the
    /// minimum score, and return the top `top_k` in deterministic order.
    pub fn rank(
        &self,
        target: &ServiceRequest,
        incidents: &[IncidentReport],
        top_k: usize,
    ) -> Vec<IncidentMatch> {
        let mut matches: Vec<IncidentMatch> = incidents
            .iter()
            .filter_map(|incident| {
                let breakdown = self.scorer.score(target, incident);
                if breakdown.total < self.min_score {
                    return None;
                }
                Some(IncidentMatch {
                    match_reasons: incident_match_reasons(target, incident),
                    score: breakdown.total,
                    temporal_bucket: TemporalBucket::classify(
                        &incident.reported_date,
                        self.reference_date,
                    ),
                    risk_factors: RiskFactorSnapshot::from_incident(incident),
                    incident: incident.clone(),
                })
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.incident.id.cmp(&b.incident.id))
        });
        matches.truncate(top_k);
        matches
    }
}

pub(crate) fn sr_match_reasons(target: &ServiceRequest, candidate: &ServiceRequest) -> Vec<String> {
    let mut reasons = Vec::new();
    if !target.system.is_empty() && target.system == candidate.system {
        reasons.push(format!("same system ({})", target.system));
    }
    let shared = shared_components(&target.affected_components, &candidate.affected_components);
    if !shared.is_empty() {
        reasons.push(format!("shared components: {}", shared.join(", ")));
    }
    if !target.category.is_empty() && target.category == candidate.category {
        reasons.push(format!("same category ({})", target.category));
    }
    if target.priority == candidate.priority {
        reasons.push(format!("same priority ({})", target.priority.as_str()));
    }
    if reasons.is_empty() {
        reasons.push("text similarity".to_string());
    }
    reasons
}

pub(crate) fn incident_match_reasons(target: &ServiceRequest, incident: &IncidentReport) -> Vec<String> {
    let mut reasons = Vec::new();
    if !target.system.is_empty() && target.system == incident.system {
        reasons.push(format!("same system ({})", target.system));
    }
    let shared = shared_components(&target.affected_components, &incident.related_components);
    if !shared.is_empty() {
        reasons.push(format!("shared components: {}", shared.join(", ")));
    }
    if matches!(incident.severity, Severity::Critical | Severity::High) {
        reasons.push(format!("severity: {}", incident.severity.as_str()));
    }
    if reasons.is_empty() {
        reasons.push("text similarity".to_string());
    }
    reasons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::model::{Priority, Severity};

    fn config() -> ResolvedEngineConfig {
        EngineConfig::default().resolve().unwrap()
    }

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()
    }

    fn sr(id: &str, priority: Priority) -> ServiceRequest {
        ServiceRequest {
            id: id.to_string(),
            title: "Adjust discount calculation for corporate plans".to_string(),
            description: "Change the discount calculation logic".to_string(),
            system: "BillingSystem".to_string(),
            priority,
            category: "Enhancement".to_string(),
            affected_components: vec!["DiscountModule".to_string()],
            ..Default::default()
        }
    }

    fn incident(id: &str, severity: Severity, reported: &str) -> IncidentReport {
        IncidentReport {
            id: id.to_string(),
            title: "Discount calculation error in billing".to_string(),
            description: "Wrong discount applied".to_string(),
            system: "BillingSystem".to_string(),
            severity,
            reported_date: reported.to_string(),
            related_components: vec!["DiscountModule".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_sr_ranker_excludes_self() {
        let ranker = SrRanker::new(&config());
        let target = sr("SR-1", Priority::High);
        let corpus = vec![target.clone(), sr("SR-2", Priority::High)];
        let matches = ranker.rank(&target, &corpus, 10);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].sr.id, "SR-2");
    }

    #[test]
    fn test_sr_ranker_priority_closeness_orders_candidates() {
        // Two candidates identical except priority: the one closer to the
        // target's priority must rank higher.
        let ranker = SrRanker::new(&config());
        let target = sr("SR-1", Priority::High);
        let corpus = vec![sr("SR-2", Priority::Medium), sr("SR-3", Priority::Low)];
        let matches = ranker.rank(&target, &corpus, 10);
        assert_eq!(matches[0].sr.id, "SR-2");
        assert!(matches[0].score > matches[1].score);
    }

    #[test]
    fn test_sr_ranker_tie_breaks_by_id() {
        let ranker = SrRanker::new(&config());
        let target = sr("SR-1", Priority::High);
        let corpus = vec![sr("SR-9", Priority::High), sr("SR-2", Priority::High)];
        let matches = ranker.rank(&target, &corpus, 10);
        assert_eq!(matches[0].sr.id, "SR-2");
        assert_eq!(matches[1].sr.id, "SR-9");
        assert_eq!(matches[0].score, matches[1].score);
    }

    #[test]
    fn test_sr_ranker_truncates_to_top_k() {
        let ranker = SrRanker::new(&config());
        let target = sr("SR-1", Priority::High);
        let corpus: Vec<ServiceRequest> = (2..12)
            .map(|n| sr(&format!("SR-{}", n), Priority::High))
            .collect();
        let matches = ranker.rank(&target, &corpus, 3);
        assert_eq!(matches.len(), 3);
    }

    #[test]
    fn test_sr_ranker_is_idempotent() {
        let ranker = SrRanker::new(&config());
        let target = sr("SR-1", Priority::High);
        let corpus = vec![
            sr("SR-4", Priority::Low),
            sr("SR-2", Priority::Critical),
            sr("SR-3", Priority::High),
        ];
        let first = ranker.rank(&target, &corpus, 10);
        let second = ranker.rank(&target, &corpus, 10);
        let ids = |m: &[SrMatch]| m.iter().map(|x| x.sr.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.score, b.score);
        }
    }

    #[test]
    fn test_sr_match_reasons_name_the_overlap() {
        let ranker = SrRanker::new(&config());
        let target = sr("SR-1", Priority::High);
        let corpus = vec![sr("SR-2", Priority::High)];
        let matches = ranker.rank(&target, &corpus, 1);
        let reasons = &matches[0].match_reasons;
        assert!(reasons.iter().any(|r| r.contains("same system (BillingSystem)")));
        assert!(reasons.iter().any(|r| r.contains("shared components: DiscountModule")));
        assert!(reasons.iter().any(|r| r.contains("same category (Enhancement)")));
    }

    #[test]
    fn test_sr_match_reason_falls_back_to_text() {
        let ranker = SrRanker::new(&config());
        let target = sr("SR-1", Priority::High);
        let candidate = ServiceRequest {
            id: "SR-2".to_string(),
            title: "Adjust discount calculation".to_string(),
            system: "SalesSystem".to_string(),
            priority: Priority::Low,
            category: "Defect".to_string(),
            ..Default::default()
        };
        let matches = ranker.rank(&target, &[candidate], 1);
        assert_eq!(matches[0].match_reasons, vec!["text similarity".to_string()]);
    }

    #[test]
    fn test_incident_ranker_prefers_severe_recent() {
        // A critical incident from last week must outrank a low-severity
        // incident from 200 days ago when everything else matches equally.
        let ranker = IncidentRanker::new(&config(), reference());
        let target = sr("SR-1", Priority::High);
        let incidents = vec![
            incident("INC-OLD", Severity::Low, "2025-11-13"),
            incident("INC-NEW", Severity::Critical, "2026-05-25"),
        ];
        let matches = ranker.rank(&target, &incidents, 10);
        assert_eq!(matches[0].incident.id, "INC-NEW");
        assert!(matches[0].score > matches[1].score);
    }

    #[test]
    fn test_incident_ranker_filters_below_min_score() {
        let ranker = IncidentRanker::new(&config(), reference());
        let target = ServiceRequest {
            id: "SR-1".to_string(),
            title: "Completely unrelated request".to_string(),
            system: "ReportingPortal".to_string(),
            ..Default::default()
        };
        let unrelated = IncidentReport {
            id: "INC-1".to_string(),
            title: "Another topic entirely".to_string(),
            system: "Warehouse".to_string(),
            severity: Severity::Low,
            reported_date: "2024-01-01".to_string(),
            ..Default::default()
        };
        let matches = ranker.rank(&target, &[unrelated], 10);
        assert!(matches.is_empty());
    }

    #[test]
    fn test_incident_ranker_attaches_bucket_and_snapshot() {
        let ranker = IncidentRanker::new(&config(), reference());
        let target = sr("SR-1", Priority::High);
        let mut inc = incident("INC-1", Severity::High, "2026-05-25");
        inc.affected_users = 1200;
        inc.resolution = "Rolled back config".to_string();
        let matches = ranker.rank(&target, &[inc], 1);
        assert_eq!(matches[0].temporal_bucket, TemporalBucket::Recent);
        assert_eq!(matches[0].risk_factors.affected_users, 1200);
        assert!(matches[0].risk_factors.has_resolution);
        assert!(matches[0]
            .match_reasons
            .iter()
            .any(|r| r == "severity: High"));
    }

    #[test]
    fn test_incident_ranker_unparsable_date_still_scores() {
        let ranker = IncidentRanker::new(&config(), reference());
        let target = sr("SR-1", Priority::High);
        let inc = incident("INC-1", Severity::Critical, "sometime last year");
        let matches = ranker.rank(&target, &[inc], 1);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].temporal_bucket, TemporalBucket::Unknown);
    }

    #[test]
    fn test_component_overlap_case_insensitive() {
        let a = vec!["DiscountModule".to_string(), "RatingCore".to_string()];
        let b = vec!["discountmodule".to_string()];
        assert!((component_overlap(&a, &b) - 0.5).abs() < 1e-12);
        assert_eq!(component_overlap(&a, &[]), 0.0);
    }
}
