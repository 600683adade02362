//! Aggregate risk scoring for a service request
//!
//! Combines five sub-scores into one weighted score, then amplifies it by
//! recent incident pressure (up to 20%) before mapping to a risk tier.
//!
//! Global invariants enforced:
//! - Sub-scores and the reported total are in [0,1]
//! - The risk tier is derived from the amplified score before clamping,
//!   so heavy amplification can still promote the tier
//! - An empty corpus yields an all-zero Minimal result, never an error

use crate::config::{ResolvedEngineConfig, RiskWeights};
use crate::model::{IncidentReport, Priority, RiskLevel, ServiceRequest};
use crate::temporal::{decay_weight_for, parse_date};
use crate::text::similarity;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;

/// Amplification cap: total score grows at most 20% under maximum
/// time sensitivity.
const TIME_AMPLIFICATION: f64 = 0.2;

const TECH_REQUIREMENT_SATURATION: f64 = 10.0;
const COMPONENT_SATURATION: f64 = 5.0;

/// The five sub-scores feeding the aggregate
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ComponentScores {
    pub sr_similarity: f64,
    pub incident_correlation: f64,
    pub system_importance: f64,
    pub time_sensitivity: f64,
    pub sr_complexity: f64,
}

impl ComponentScores {
    pub fn zero() -> Self {
        ComponentScores {
            sr_similarity: 0.0,
            incident_correlation: 0.0,
            system_importance: 0.0,
            time_sensitivity: 0.0,
            sr_complexity: 0.0,
        }
    }
}

/// Aggregate risk score for one SR
#[derive(Debug, Clone, Serialize)]
pub struct RiskScoreResult {
    pub sr_id: String,
    /// Final score clamped to [0,1]
    pub total_score: f64,
    pub risk_level: RiskLevel,
    pub components: ComponentScores,
    pub weights: RiskWeights,
}

/// Computes aggregate risk scores from the historical corpus
pub struct RiskAggregator<'a> {
    config: &'a ResolvedEngineConfig,
    reference_date: NaiveDate,
}

impl<'a> RiskAggregator<'a> {
    pub fn new(config: &'a ResolvedEngineConfig, reference_date: NaiveDate) -> Self {
        RiskAggregator {
            config,
            reference_date,
        }
    }

    /// Score one SR against the full historical corpus.
    pub fn score(
        &self,
        sr: &ServiceRequest,
        historical_srs: &[ServiceRequest],
        incidents: &[IncidentReport],
    ) -> RiskScoreResult {
        let peers: Vec<&ServiceRequest> = historical_srs
            .iter()
            .filter(|other| other.id != sr.id)
            .collect();

        if peers.is_empty() && incidents.is_empty() {
            return RiskScoreResult {
                sr_id: sr.id.clone(),
                total_score: 0.0,
                risk_level: RiskLevel::Minimal,
                components: ComponentScores::zero(),
                weights: self.config.risk_weights,
            };
        }

        let components = ComponentScores {
            sr_similarity: self.sr_similarity(sr, &peers),
            incident_correlation: self.incident_correlation(sr, incidents),
            system_importance: self.config.importance_of(&sr.system),
            time_sensitivity: self.time_sensitivity(incidents),
            sr_complexity: self.sr_complexity(sr),
        };

        let w = self.config.risk_weights;
        let base = components.sr_similarity * w.sr_similarity
            + components.incident_correlation * w.incident_correlation
            + components.system_importance * w.system_importance
            + components.time_sensitivity * w.time_sensitivity
            + components.sr_complexity * w.sr_complexity;

        // Recent incident pressure amplifies the base score; the tier is
        // read off the amplified value before clamping.
        let amplified = base * (1.0 + components.time_sensitivity * TIME_AMPLIFICATION);
        let risk_level = self.tier_for(amplified);

        RiskScoreResult {
            sr_id: sr.id.clone(),
            total_score: amplified.min(1.0),
            risk_level,
            components,
            weights: w,
        }
    }

    /// Highest title-and-description similarity against any historical SR.
    pub fn sr_similarity(&self, sr: &ServiceRequest, peers: &[&ServiceRequest]) -> f64 {
        peers
            .iter()
            .map(|other| similarity(&sr.core_text(), &other.core_text()))
            .fold(0.0, f64::max)
            .min(1.0)
    }

    /// Severity-and-freshness weighted average of per-incident structural
    /// correlation: `system_match*0.4 + component_coverage*0.6` per
    /// incident, weighted by `severity_weight * time_weight`.
    pub fn incident_correlation(&self, sr: &ServiceRequest, incidents: &[IncidentReport]) -> f64 {
        if incidents.is_empty() {
            return 0.0;
        }

        let target_components: HashSet<String> = sr
            .affected_components
            .iter()
            .map(|c| c.trim().to_lowercase())
            .collect();

        let mut weighted_sum = 0.0;
        let mut total_weight = 0.0;
        for incident in incidents {
            let system_match = if !sr.system.is_empty() && incident.system == sr.system {
                1.0
            } else {
                0.0
            };

            let component_coverage = if target_components.is_empty() {
                0.0
            } else {
                let covered = incident
                    .related_components
                    .iter()
                    .filter(|c| target_components.contains(&c.trim().to_lowercase()))
                    .count();
                covered as f64 / target_components.len() as f64
            };

            let severity_weight = self.config.severity_weights.weight(incident.severity);
            let time_weight = decay_weight_for(
                &incident.reported_date,
                self.reference_date,
                self.config.decay_half_life_days,
            );

            let weight = severity_weight * time_weight;
            weighted_sum += (system_match * 0.4 + component_coverage * 0.6) * weight;
            total_weight += weight;
        }

        if total_weight > 0.0 {
            weighted_sum / total_weight
        } else {
            0.0
        }
    }

    /// Average freshness weight of the incident corpus. Incidents with
    /// unparsable dates are skipped from the sum but still counted in the
    /// denominator, so stale metadata drags the sensitivity down.
    pub fn time_sensitivity(&self, incidents: &[IncidentReport]) -> f64 {
        if incidents.is_empty() {
            return 0.0;
        }

        let total: f64 = incidents
            .iter()
            .filter_map(|incident| parse_date(&incident.reported_date))
            .map(|date| {
                let days = (self.reference_date - date).num_days().max(0) as f64;
                (-days / self.config.decay_half_life_days).exp()
            })
            .sum();

        (total / incidents.len() as f64).min(1.0)
    }

    /// Structural complexity of the SR itself: requirement count,
    /// component count, and declared business impact.
    pub fn sr_complexity(&self, sr: &ServiceRequest) -> f64 {
        let mut score = 0.0;

        let tech_count = sr.technical_requirements.len() as f64;
        score += (tech_count / TECH_REQUIREMENT_SATURATION).min(1.0) * 0.4;

        let component_count = sr.affected_components.len() as f64;
        score += (component_count / COMPONENT_SATURATION).min(1.0) * 0.3;

        let impact = sr.business_impact.to_lowercase();
        let contains_any = |keywords: &[String]| {
            keywords
                .iter()
                .any(|k| !k.is_empty() && impact.contains(&k.to_lowercase()))
        };
        if contains_any(&self.config.severe_impact_keywords) || sr.priority == Priority::Critical {
            score += 0.3;
        } else if contains_any(&self.config.moderate_impact_keywords)
            || sr.priority == Priority::High
        {
            score += 0.2;
        } else if sr.priority == Priority::Medium {
            score += 0.1;
        }

        score.min(1.0)
    }

    fn tier_for(&self, score: f64) -> RiskLevel {
        let t = self.config.risk_thresholds;
        if score >= t.critical {
            RiskLevel::Critical
        } else if score >= t.high {
            RiskLevel::High
        } else if score >= t.medium {
            RiskLevel::Medium
        } else if score >= t.low {
            RiskLevel::Low
        } else {
            RiskLevel::Minimal
        }
    }
}
