//! srnav core library - risk scoring and correlation for service requests

#![deny(warnings)]

// Global invariants enforced in this crate:
// - Scoring is deterministic for a fixed reference date
// - Identical corpus and config yield identical rankings and scores
// - Provider failures are recoverable; the rule-based path always works
// - Malformed records degrade to defaults, never abort a run

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod fmea;
pub mod model;
pub mod provider;
pub mod rank;
pub mod report;
pub mod scorer;
pub mod temporal;
pub mod text;

pub use aggregate::{ComponentScores, RiskAggregator, RiskScoreResult};
pub use catalog::{CatalogSummary, DataCatalog};
pub use config::{EngineConfig, ResolvedEngineConfig};
pub use fmea::{DevelopmentRiskAnalysis, EvaluationMethod, RiskEvaluation};
pub use model::{IncidentReport, Priority, RiskLevel, ServiceRequest, Severity};
pub use rank::{IncidentMatch, SrMatch};

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use crate::provider::{normalize_relevance, LlmProvider, SearchFilters, SearchProvider};
use crate::rank::{IncidentRanker, SrRanker};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

/// Default number of correlation matches returned per query
pub const DEFAULT_TOP_K: usize = 5;

/// FMEA development risk analysis with its correlation context
#[derive(Debug, Clone, Serialize)]
pub struct DevelopmentRiskReport {
    pub task: String,
    pub evaluation_method: EvaluationMethod,
    pub related_srs: Vec<SrMatch>,
    pub related_incidents: Vec<IncidentMatch>,
    pub analysis: DevelopmentRiskAnalysis,
}

/// The engine facade: corpus, policy, and a fixed reference date
pub struct RiskEngine {
    catalog: DataCatalog,
    config: ResolvedEngineConfig,
    reference_date: NaiveDate,
}

impl RiskEngine {
    pub fn new(
        catalog: DataCatalog,
        config: ResolvedEngineConfig,
        reference_date: NaiveDate,
    ) -> Self {
        RiskEngine {
            catalog,
            config,
            reference_date,
        }
    }

    /// Engine pinned to today's local date.
    pub fn with_today(catalog: DataCatalog, config: ResolvedEngineConfig) -> Self {
        Self::new(catalog, config, chrono::Local::now().date_naive())
    }

    pub fn catalog(&self) -> &DataCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &ResolvedEngineConfig {
        &self.config
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    /// Aggregate risk score for one SR against the full corpus.
    pub fn score(&self, sr: &ServiceRequest) -> RiskScoreResult {
        let aggregator = RiskAggregator::new(&self.config, self.reference_date);
        aggregator.score(sr, self.catalog.service_requests(), self.catalog.incidents())
    }

    /// Score the SR with the given catalog id.
    pub fn score_by_id(&self, sr_id: &str) -> Result<RiskScoreResult> {
        let sr = self
            .catalog
            .sr_by_id(sr_id)
            .ok_or_else(|| anyhow!("no service request with id {sr_id}"))?;
        Ok(self.score(sr))
    }

    /// Score every SR in the catalog, highest risk first with a stable
    /// id tie-break.
    pub fn score_all(&self) -> Vec<RiskScoreResult> {
        let mut results: Vec<RiskScoreResult> = self
            .catalog
            .service_requests()
            .par_iter()
            .map(|sr| self.score(sr))
            .collect();
        results.sort_by(|a, b| {
            b.total_score
                .total_cmp(&a.total_score)
                .then_with(|| a.sr_id.cmp(&b.sr_id))
        });
        results
    }

    /// Top similar SRs from the local corpus.
    pub fn similar_srs(&self, sr: &ServiceRequest, top_k: usize) -> Vec<SrMatch> {
        SrRanker::new(&self.config).rank(sr, self.catalog.service_requests(), top_k)
    }

    /// Top related incidents from the local corpus.
    pub fn related_incidents(&self, sr: &ServiceRequest, top_k: usize) -> Vec<IncidentMatch> {
        IncidentRanker::new(&self.config, self.reference_date).rank(
            sr,
            self.catalog.incidents(),
            top_k,
        )
    }

    /// Similar SRs via an external search provider, falling back to the
    /// local ranker when the provider fails.
    pub fn similar_srs_with_provider(
        &self,
        search: &dyn SearchProvider,
        sr: &ServiceRequest,
        top_k: usize,
    ) -> Vec<SrMatch> {
        let filters = SearchFilters {
            system: (!sr.system.is_empty()).then(|| sr.system.clone()),
            exclude_id: (!sr.id.is_empty()).then(|| sr.id.clone()),
        };
        match search.search_service_requests(&sr.similarity_text(), top_k, &filters) {
            Ok(hits) => hits
                .into_iter()
                .filter(|hit| hit.record.id != sr.id)
                .map(|hit| SrMatch {
                    score: normalize_relevance(hit.raw_relevance, self.config.relevance_divisor),
                    match_reasons: rank::sr_match_reasons(sr, &hit.record),
                    sr: hit.record,
                })
                .collect(),
            Err(error) => {
                warn!(%error, "SR search provider failed, using local ranking");
                self.similar_srs(sr, top_k)
            }
        }
    }

    /// Related incidents via an external search provider, falling back to
    /// the local ranker when the provider fails.
    pub fn related_incidents_with_provider(
        &self,
        search: &dyn SearchProvider,
        sr: &ServiceRequest,
        top_k: usize,
    ) -> Vec<IncidentMatch> {
        let filters = SearchFilters {
            system: (!sr.system.is_empty()).then(|| sr.system.clone()),
            exclude_id: None,
        };
        match search.search_incidents(&sr.incident_query_text(), top_k, &filters) {
            Ok(hits) => hits
                .into_iter()
                .map(|hit| IncidentMatch {
                    score: normalize_relevance(hit.raw_relevance, self.config.relevance_divisor),
                    match_reasons: rank::incident_match_reasons(sr, &hit.record),
                    temporal_bucket: temporal::TemporalBucket::classify(
                        &hit.record.reported_date,
                        self.reference_date,
                    ),
                    risk_factors: model::RiskFactorSnapshot::from_incident(&hit.record),
                    incident: hit.record,
                })
                .collect(),
            Err(error) => {
                warn!(%error, "incident search provider failed, using local ranking");
                self.related_incidents(sr, top_k)
            }
        }
    }

    /// Full risk evaluation for one SR.
    ///
    /// With an LLM provider the narrative comes from the model; any
    /// provider or parse failure falls back to the rule-based evaluation
    /// over the same correlation context.
    pub fn evaluate(&self, sr: &ServiceRequest, llm: Option<&dyn LlmProvider>) -> RiskEvaluation {
        let similar = self.similar_srs(sr, DEFAULT_TOP_K);
        let incidents = self.related_incidents(sr, DEFAULT_TOP_K);

        if let Some(llm) = llm {
            let system_prompt = fmea::evaluation_system_prompt(&self.config.risk_weights);
            let user_prompt = fmea::evaluation_user_prompt(sr, &similar, &incidents);
            match llm
                .complete(&system_prompt, &user_prompt)
                .and_then(|content| {
                    fmea::parse_evaluation(&content, sr, &similar, &incidents, &self.config)
                }) {
                Ok(evaluation) => {
                    debug!(sr_id = %sr.id, "LLM evaluation succeeded");
                    return evaluation;
                }
                Err(error) => {
                    warn!(%error, sr_id = %sr.id, "LLM evaluation failed, using rule-based path");
                }
            }
        }

        let score = self.score(sr);
        fmea::rule_based_evaluation(sr, &score, &similar, &incidents, &self.config)
    }

    /// FMEA development risk analysis for a free-text task description.
    pub fn analyze_development_risk(
        &self,
        task: &str,
        top_k_sr: usize,
        top_k_incident: usize,
        llm: Option<&dyn LlmProvider>,
    ) -> DevelopmentRiskReport {
        // The task is treated as an ad-hoc SR for correlation purposes.
        let probe = ServiceRequest {
            id: String::new(),
            title: task.to_string(),
            description: task.to_string(),
            ..Default::default()
        };
        let related_srs = self.similar_srs(&probe, top_k_sr);
        let related_incidents = self.related_incidents(&probe, top_k_incident);

        if let Some(llm) = llm {
            let prompt = fmea::fmea_analysis_prompt(
                task,
                related_srs.len(),
                related_incidents.len(),
                &format_sr_sources(&related_srs),
                &format_incident_sources(&related_incidents),
            );
            match llm
                .complete("", &prompt)
                .and_then(|content| fmea::parse_fmea_analysis(&content))
            {
                Ok(analysis) => {
                    return DevelopmentRiskReport {
                        task: task.to_string(),
                        evaluation_method: EvaluationMethod::Llm,
                        related_srs,
                        related_incidents,
                        analysis,
                    };
                }
                Err(error) => {
                    warn!(%error, "FMEA analysis failed, using rule-based path");
                }
            }
        }

        let evaluation = self.evaluate(&probe, None);
        let analysis = fmea::rule_based_analysis(&evaluation);
        DevelopmentRiskReport {
            task: task.to_string(),
            evaluation_method: EvaluationMethod::RuleBased,
            related_srs,
            related_incidents,
            analysis,
        }
    }
}

fn format_sr_sources(matches: &[SrMatch]) -> String {
    if matches.is_empty() {
        return "No related SRs found.".to_string();
    }
    matches
        .iter()
        .enumerate()
        .map(|(n, m)| {
            format!(
                "{}. [{}] {} | system: {} | priority: {} | score: {:.3}\n   {}",
                n + 1,
                m.sr.id,
                m.sr.title,
                m.sr.system,
                m.sr.priority.as_str(),
                m.score,
                m.sr.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_incident_sources(matches: &[IncidentMatch]) -> String {
    if matches.is_empty() {
        return "No similar incidents found.".to_string();
    }
    matches
        .iter()
        .enumerate()
        .map(|(n, m)| {
            format!(
                "{}. [{}] {} | severity: {} | reported: {} | score: {:.3}\n   root cause: {}",
                n + 1,
                m.incident.id,
                m.incident.title,
                m.incident.severity.as_str(),
                m.incident.reported_date,
                m.score,
                m.incident.root_cause
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderError;

    struct FailingLlm;

    impl LlmProvider for FailingLlm {
        fn complete(&self, _: &str, _: &str) -> Result<String, ProviderError> {
            Err(ProviderError::Request("connection refused".to_string()))
        }
    }

    struct CannedLlm(String);

    impl LlmProvider for CannedLlm {
        fn complete(&self, _: &str, _: &str) -> Result<String, ProviderError> {
            Ok(self.0.clone())
        }
    }

    fn engine() -> RiskEngine {
        let srs = vec![
            ServiceRequest {
                id: "SR-1".to_string(),
                title: "Discount calculation change for corporate plans".to_string(),
                description: "Adjust discount calculation logic".to_string(),
                system: "BillingSystem".to_string(),
                priority: Priority::High,
                affected_components: vec!["DiscountModule".to_string()],
                ..Default::default()
            },
            ServiceRequest {
                id: "SR-2".to_string(),
                title: "Discount calculation rounding fix".to_string(),
                description: "Fix rounding in discount calculation".to_string(),
                system: "BillingSystem".to_string(),
                priority: Priority::Medium,
                affected_components: vec!["DiscountModule".to_string()],
                ..Default::default()
            },
        ];
        let incidents = vec![IncidentReport {
            id: "INC-1".to_string(),
            title: "Discount calculation error in billing".to_string(),
            system: "BillingSystem".to_string(),
            severity: Severity::Critical,
            reported_date: "2026-05-25".to_string(),
            related_components: vec!["DiscountModule".to_string()],
            ..Default::default()
        }];
        RiskEngine::new(
            DataCatalog::new(srs, incidents),
            EngineConfig::default().resolve().unwrap(),
            NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
        )
    }

    #[test]
    fn test_score_by_id_unknown_is_an_error() {
        let err = engine().score_by_id("SR-404").unwrap_err();
        assert!(err.to_string().contains("SR-404"));
    }

    #[test]
    fn test_score_all_is_sorted_descending() {
        let results = engine().score_all();
        assert_eq!(results.len(), 2);
        assert!(results[0].total_score >= results[1].total_score);
    }

    #[test]
    fn test_failed_llm_falls_back_to_rule_based() {
        let engine = engine();
        let sr = engine.catalog().sr_by_id("SR-1").unwrap().clone();
        let evaluation = engine.evaluate(&sr, Some(&FailingLlm));
        assert_eq!(evaluation.evaluation_method, EvaluationMethod::RuleBased);
        assert!(evaluation.total_score > 0.0);
    }

    #[test]
    fn test_llm_evaluation_is_labelled_llm() {
        let engine = engine();
        let sr = engine.catalog().sr_by_id("SR-1").unwrap().clone();
        let llm = CannedLlm(
            r#"{"total_score": 0.7, "risk_level": "High",
                "components": {"sr_similarity": 0.6, "incident_correlation": 0.7,
                               "system_importance": 1.0, "time_sensitivity": 0.5,
                               "sr_complexity": 0.2},
                "reasoning": "Recent critical incident on the same module.",
                "key_risks": [], "recommendations": []}"#
                .to_string(),
        );
        let evaluation = engine.evaluate(&sr, Some(&llm));
        assert_eq!(evaluation.evaluation_method, EvaluationMethod::Llm);
        assert_eq!(evaluation.risk_level, RiskLevel::High);
        // correlation context is attached regardless of the method
        assert!(!evaluation.related_incidents.is_empty());
    }

    #[test]
    fn test_garbled_llm_response_falls_back() {
        let engine = engine();
        let sr = engine.catalog().sr_by_id("SR-1").unwrap().clone();
        let evaluation = engine.evaluate(&sr, Some(&CannedLlm("no json here".to_string())));
        assert_eq!(evaluation.evaluation_method, EvaluationMethod::RuleBased);
    }

    #[test]
    fn test_analyze_development_risk_rule_based() {
        let report =
            engine().analyze_development_risk("rework discount calculation batch", 5, 5, None);
        assert_eq!(report.evaluation_method, EvaluationMethod::RuleBased);
        assert!(report.analysis.risk_factors.is_empty());
        assert!(!report.related_srs.is_empty());
    }

    #[test]
    fn test_analyze_development_risk_with_llm() {
        let llm = CannedLlm(
            r#"```json
            {"summary": {"overall_risk_score": 6.5},
             "risk_factors": [{"id": "R001", "failure_mode": "wrong discount applied",
                               "occurrence": 5, "severity": 7, "detection": 6}],
             "development_guidelines": ["shadow-run the new calculation"],
             "monitoring_recommendations": ["watch invoice deltas"]}
            ```"#
                .to_string(),
        );
        let report = engine().analyze_development_risk("rework discount engine", 5, 5, Some(&llm));
        assert_eq!(report.evaluation_method, EvaluationMethod::Llm);
        assert_eq!(report.analysis.summary.total_risks, 1);
        assert_eq!(report.analysis.risk_factors[0].rpn, 210);
    }
}
