//! FMEA risk items and narrative risk evaluation
//!
//! Two output shapes live here: the per-SR risk evaluation (score, tier,
//! key risks, recommendations) and the FMEA development analysis (failure
//! modes with RPN figures). Both can be produced by an LLM provider; the
//! rule-based path recreates the evaluation locally whenever the provider
//! is absent or fails.
//!
//! Global invariants enforced:
//! - RPN is always `occurrence * severity * detection` over clamped [1,10]
//!   factors; upstream-supplied RPN figures are recomputed, never trusted
//! - Summary counts are recomputed from the item list
//! - The overall 0-10 score is trusted from upstream, clamped, 0 if absent

use crate::aggregate::{ComponentScores, RiskScoreResult};
use crate::config::{ResolvedEngineConfig, RiskWeights};
use crate::model::{RiskLevel, ServiceRequest, Severity};
use crate::provider::{extract_json_payload, ProviderError};
use crate::rank::{IncidentMatch, SrMatch};
use serde::{Deserialize, Serialize};

/// Matches shown to the provider and echoed back in results
const CONTEXT_LIMIT: usize = 3;

/// RPN band boundaries
const RPN_HIGH: u32 = 100;
const RPN_MEDIUM: u32 = 50;

/// How an evaluation was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMethod {
    RuleBased,
    Llm,
}

impl EvaluationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationMethod::RuleBased => "rule_based",
            EvaluationMethod::Llm => "llm",
        }
    }
}

/// RPN-derived risk band for one failure mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskBand {
    High,
    Medium,
    Low,
}

impl RiskBand {
    /// High above 100, Medium above 50, Low otherwise.
    pub fn from_rpn(rpn: u32) -> Self {
        if rpn > RPN_HIGH {
            RiskBand::High
        } else if rpn > RPN_MEDIUM {
            RiskBand::Medium
        } else {
            RiskBand::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskBand::High => "High",
            RiskBand::Medium => "Medium",
            RiskBand::Low => "Low",
        }
    }
}

/// One FMEA failure mode with its risk priority number
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskItem {
    pub id: String,
    pub failure_mode: String,
    pub failure_cause: String,
    pub failure_effect: String,
    pub occurrence: u8,
    pub severity: u8,
    pub detection: u8,
    pub rpn: u32,
    pub risk_level: RiskBand,
    pub mitigation_measures: Vec<String>,
}

impl Default for RiskItem {
    fn default() -> Self {
        RiskItem {
            id: String::new(),
            failure_mode: String::new(),
            failure_cause: String::new(),
            failure_effect: String::new(),
            occurrence: 1,
            severity: 1,
            detection: 1,
            rpn: 1,
            risk_level: RiskBand::Low,
            mitigation_measures: Vec::new(),
        }
    }
}

impl RiskItem {
    /// Clamp the three factors to [1,10], then recompute RPN and band
    /// from the clamped factors.
    pub fn normalize(&mut self) {
        self.occurrence = self.occurrence.clamp(1, 10);
        self.severity = self.severity.clamp(1, 10);
        self.detection = self.detection.clamp(1, 10);
        self.rpn = self.occurrence as u32 * self.severity as u32 * self.detection as u32;
        self.risk_level = RiskBand::from_rpn(self.rpn);
    }
}

/// Counts over the risk item list plus a trusted overall 0-10 score
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskSummary {
    pub total_risks: usize,
    pub high_risk_count: usize,
    pub medium_risk_count: usize,
    pub low_risk_count: usize,
    pub overall_risk_score: f64,
}

impl RiskSummary {
    /// Recount from the items; the overall score is kept as-is (clamped).
    pub fn recount(&mut self, items: &[RiskItem]) {
        self.total_risks = items.len();
        self.high_risk_count = items
            .iter()
            .filter(|i| i.risk_level == RiskBand::High)
            .count();
        self.medium_risk_count = items
            .iter()
            .filter(|i| i.risk_level == RiskBand::Medium)
            .count();
        self.low_risk_count = items
            .iter()
            .filter(|i| i.risk_level == RiskBand::Low)
            .count();
        self.overall_risk_score = if self.overall_risk_score.is_finite() {
            self.overall_risk_score.clamp(0.0, 10.0)
        } else {
            0.0
        };
    }
}

/// FMEA development risk analysis for a free-text task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DevelopmentRiskAnalysis {
    pub summary: RiskSummary,
    pub risk_factors: Vec<RiskItem>,
    pub development_guidelines: Vec<String>,
    pub monitoring_recommendations: Vec<String>,
}

impl DevelopmentRiskAnalysis {
    /// Normalize all items and recount the summary.
    pub fn normalize(&mut self) {
        for item in &mut self.risk_factors {
            item.normalize();
        }
        let items = std::mem::take(&mut self.risk_factors);
        self.summary.recount(&items);
        self.risk_factors = items;
    }
}

/// Full per-SR risk evaluation: score, narrative, and correlation context
#[derive(Debug, Clone, Serialize)]
pub struct RiskEvaluation {
    pub evaluation_method: EvaluationMethod,
    pub sr_id: String,
    pub total_score: f64,
    pub risk_level: RiskLevel,
    pub components: ComponentScores,
    pub reasoning: String,
    pub key_risks: Vec<String>,
    pub recommendations: Vec<String>,
    /// Top matches echoed for context (at most three each)
    pub similar_srs: Vec<SrMatch>,
    pub related_incidents: Vec<IncidentMatch>,
}

/// System prompt for the per-SR evaluation call
pub fn evaluation_system_prompt(weights: &RiskWeights) -> String {
    format!(
        r#"You are an expert evaluating the risk of a service request (SR) using the
FMEA (Failure Mode and Effects Analysis) methodology. Assess these factors:

1. SR similarity ({sim:.0}% weight): are there comparable past SRs, and what
   were their outcomes? Consider text, system, and component overlap.
2. Incident correlation ({inc:.0}% weight): are there related past incidents?
   Weigh severity and recency; same-system incidents count more.
3. System importance ({imp:.0}% weight): how business-critical is the affected
   system? Core billing-grade systems rate highest.
4. Time sensitivity ({time:.0}% weight): recent related incidents (within
   30 days) raise the score; older ones decay.
5. SR complexity ({cx:.0}% weight): requirement count, component spread, and
   implementation difficulty.

Respond with JSON only, in this shape:
{{
    "total_score": <0.0-1.0>,
    "risk_level": "Critical" | "High" | "Medium" | "Low" | "Minimal",
    "components": {{
        "sr_similarity": <0.0-1.0>,
        "incident_correlation": <0.0-1.0>,
        "system_importance": <0.0-1.0>,
        "time_sensitivity": <0.0-1.0>,
        "sr_complexity": <0.0-1.0>
    }},
    "reasoning": "<2-3 sentence justification>",
    "key_risks": ["<risk>", ...],
    "recommendations": ["<recommendation>", ...]
}}"#,
        sim = weights.sr_similarity * 100.0,
        inc = weights.incident_correlation * 100.0,
        imp = weights.system_importance * 100.0,
        time = weights.time_sensitivity * 100.0,
        cx = weights.sr_complexity * 100.0,
    )
}

/// User prompt for the per-SR evaluation call: the target SR plus the top
/// correlated SRs and incidents.
pub fn evaluation_user_prompt(
    sr: &ServiceRequest,
    similar_srs: &[SrMatch],
    related_incidents: &[IncidentMatch],
) -> String {
    let mut lines = Vec::new();

    lines.push("## Target SR".to_string());
    lines.push(format!("ID: {}", sr.id));
    lines.push(format!("Title: {}", sr.title));
    lines.push(format!("Description: {}", sr.description));
    lines.push(format!("System: {}", sr.system));
    lines.push(format!("Priority: {}", sr.priority.as_str()));
    lines.push(format!("Category: {}", sr.category));
    lines.push(format!(
        "Affected components: {}",
        sr.affected_components.join(", ")
    ));
    lines.push(format!(
        "Technical requirements: {}",
        sr.technical_requirements.join(", ")
    ));
    lines.push(format!("Business impact: {}", sr.business_impact));
    lines.push(String::new());

    lines.push("## Similar SRs".to_string());
    if similar_srs.is_empty() {
        lines.push("No similar SRs found.".to_string());
    } else {
        for (n, m) in similar_srs.iter().take(CONTEXT_LIMIT).enumerate() {
            lines.push(format!("{}. {}", n + 1, m.sr.title));
            lines.push(format!("   similarity: {:.3}", m.score));
            lines.push(format!("   id: {}", m.sr.id));
            lines.push(format!("   system: {}", m.sr.system));
            lines.push(format!("   matched on: {}", m.match_reasons.join("; ")));
        }
    }
    lines.push(String::new());

    lines.push("## Related incidents".to_string());
    if related_incidents.is_empty() {
        lines.push("No related incidents found.".to_string());
    } else {
        for (n, m) in related_incidents.iter().take(CONTEXT_LIMIT).enumerate() {
            lines.push(format!("{}. {}", n + 1, m.incident.title));
            lines.push(format!("   correlation: {:.3}", m.score));
            lines.push(format!("   id: {}", m.incident.id));
            lines.push(format!("   severity: {}", m.incident.severity.as_str()));
            lines.push(format!("   reported: {}", m.incident.reported_date));
            lines.push(format!("   root cause: {}", m.incident.root_cause));
            lines.push(format!("   affected users: {}", m.incident.affected_users));
            lines.push(format!("   matched on: {}", m.match_reasons.join("; ")));
        }
    }
    lines.push(String::new());
    lines.push(
        "Evaluate the risk per the FMEA methodology above and respond with JSON.".to_string(),
    );

    lines.join("\n")
}

/// Prompt for the FMEA development risk analysis over a free-text task.
pub fn fmea_analysis_prompt(
    task: &str,
    sr_count: usize,
    incident_count: usize,
    sr_sources: &str,
    incident_sources: &str,
) -> String {
    format!(
        r#"You are an FMEA (Failure Mode and Effects Analysis) risk analyst.
Analyze the risk of a development task using the related SRs and past
incidents below.

## Subject
- Development task: {task}
- Related SRs: {sr_count}
- Similar incidents: {incident_count}

## Related SR details
{sr_sources}

## Similar incident details
{incident_sources}

## Requirements
Identify potential failure modes (functional, performance, security,
usability, compatibility), their causes (technical, design, operational,
environmental) and effects (business, user, system, security). Rate each:

- Occurrence, 1-10: 1-2 very unlikely .. 9-10 near certain
- Severity, 1-10: 1-2 negligible .. 9-10 catastrophic
- Detection, 1-10: 1-2 almost surely detected .. 9-10 almost never detected
- RPN = occurrence x severity x detection

Provide prevention, detection, and mitigation measures plus monitoring
strategies for each risk.

## Output format
Respond with JSON in this shape:

```json
{{
    "summary": {{
        "total_risks": <count>,
        "high_risk_count": <count with RPN > 100>,
        "medium_risk_count": <count with RPN 50-100>,
        "low_risk_count": <count with RPN < 50>,
        "overall_risk_score": <0-10>
    }},
    "risk_factors": [
        {{
            "id": "R001",
            "failure_mode": "<name>",
            "failure_cause": "<cause>",
            "failure_effect": "<effect>",
            "occurrence": 5,
            "severity": 7,
            "detection": 6,
            "rpn": 210,
            "risk_level": "High",
            "mitigation_measures": ["<measure>", ...]
        }}
    ],
    "development_guidelines": ["<guideline>", ...],
    "monitoring_recommendations": ["<recommendation>", ...]
}}
```

Score overall risk on a 0-10 scale, 10 being the most dangerous."#
    )
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct LlmEvaluationPayload {
    total_score: f64,
    risk_level: String,
    components: LlmComponentsPayload,
    reasoning: String,
    key_risks: Vec<String>,
    recommendations: Vec<String>,
}

impl Default for LlmEvaluationPayload {
    fn default() -> Self {
        LlmEvaluationPayload {
            total_score: 0.0,
            risk_level: String::new(),
            components: LlmComponentsPayload::default(),
            reasoning: String::new(),
            key_risks: Vec::new(),
            recommendations: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LlmComponentsPayload {
    sr_similarity: f64,
    incident_correlation: f64,
    system_importance: f64,
    time_sensitivity: f64,
    sr_complexity: f64,
}

fn risk_level_from_label(label: &str) -> Option<RiskLevel> {
    match label.trim().to_ascii_lowercase().as_str() {
        "critical" => Some(RiskLevel::Critical),
        "high" => Some(RiskLevel::High),
        "medium" => Some(RiskLevel::Medium),
        "low" => Some(RiskLevel::Low),
        "minimal" => Some(RiskLevel::Minimal),
        _ => None,
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Parse an LLM evaluation response into a [`RiskEvaluation`].
///
/// Scores are clamped to [0,1]. An unrecognized risk level label is
/// re-derived from the configured thresholds instead of failing the parse.
pub fn parse_evaluation(
    content: &str,
    sr: &ServiceRequest,
    similar_srs: &[SrMatch],
    related_incidents: &[IncidentMatch],
    config: &ResolvedEngineConfig,
) -> Result<RiskEvaluation, ProviderError> {
    let payload = extract_json_payload(content);
    let parsed: LlmEvaluationPayload = serde_json::from_str(payload)
        .map_err(|e| ProviderError::Parse(format!("evaluation JSON: {e}")))?;

    let total_score = clamp_unit(parsed.total_score);
    let risk_level = risk_level_from_label(&parsed.risk_level).unwrap_or_else(|| {
        let t = config.risk_thresholds;
        if total_score >= t.critical {
            RiskLevel::Critical
        } else if total_score >= t.high {
            RiskLevel::High
        } else if total_score >= t.medium {
            RiskLevel::Medium
        } else if total_score >= t.low {
            RiskLevel::Low
        } else {
            RiskLevel::Minimal
        }
    });

    Ok(RiskEvaluation {
        evaluation_method: EvaluationMethod::Llm,
        sr_id: sr.id.clone(),
        total_score,
        risk_level,
        components: ComponentScores {
            sr_similarity: clamp_unit(parsed.components.sr_similarity),
            incident_correlation: clamp_unit(parsed.components.incident_correlation),
            system_importance: clamp_unit(parsed.components.system_importance),
            time_sensitivity: clamp_unit(parsed.components.time_sensitivity),
            sr_complexity: clamp_unit(parsed.components.sr_complexity),
        },
        reasoning: parsed.reasoning,
        key_risks: parsed.key_risks,
        recommendations: parsed.recommendations,
        similar_srs: similar_srs.iter().take(CONTEXT_LIMIT).cloned().collect(),
        related_incidents: related_incidents
            .iter()
            .take(CONTEXT_LIMIT)
            .cloned()
            .collect(),
    })
}

/// Parse an LLM FMEA analysis response, normalizing every item.
pub fn parse_fmea_analysis(content: &str) -> Result<DevelopmentRiskAnalysis, ProviderError> {
    let payload = extract_json_payload(content);
    let mut analysis: DevelopmentRiskAnalysis = serde_json::from_str(payload)
        .map_err(|e| ProviderError::Parse(format!("FMEA analysis JSON: {e}")))?;
    analysis.normalize();
    Ok(analysis)
}

/// Build the rule-based evaluation from a locally computed score.
pub fn rule_based_evaluation(
    sr: &ServiceRequest,
    score: &RiskScoreResult,
    similar_srs: &[SrMatch],
    related_incidents: &[IncidentMatch],
    config: &ResolvedEngineConfig,
) -> RiskEvaluation {
    RiskEvaluation {
        evaluation_method: EvaluationMethod::RuleBased,
        sr_id: sr.id.clone(),
        total_score: score.total_score,
        risk_level: score.risk_level,
        components: score.components,
        reasoning: format!(
            "Rule-based FMEA evaluation: {} risk",
            score.risk_level.as_str()
        ),
        key_risks: extract_key_risks(sr, similar_srs, related_incidents, config),
        recommendations: score_recommendations(score),
        similar_srs: similar_srs.iter().take(CONTEXT_LIMIT).cloned().collect(),
        related_incidents: related_incidents
            .iter()
            .take(CONTEXT_LIMIT)
            .cloned()
            .collect(),
    }
}

/// Rule-based FMEA development analysis: no synthesized failure modes,
/// just the aggregate signal projected onto the 0-10 scale with the
/// evaluation's recommendations as guidelines.
pub fn rule_based_analysis(evaluation: &RiskEvaluation) -> DevelopmentRiskAnalysis {
    DevelopmentRiskAnalysis {
        summary: RiskSummary {
            total_risks: 0,
            high_risk_count: 0,
            medium_risk_count: 0,
            low_risk_count: 0,
            overall_risk_score: (evaluation.total_score * 10.0).clamp(0.0, 10.0),
        },
        risk_factors: Vec::new(),
        development_guidelines: evaluation.recommendations.clone(),
        monitoring_recommendations: vec![
            "Track error rates on the affected components after rollout".to_string(),
            "Compare post-change output against a pre-change baseline".to_string(),
        ],
    }
}

fn extract_key_risks(
    sr: &ServiceRequest,
    similar_srs: &[SrMatch],
    related_incidents: &[IncidentMatch],
    config: &ResolvedEngineConfig,
) -> Vec<String> {
    let mut risks = Vec::new();

    if let Some(top) = similar_srs.first() {
        if top.score > 0.5 {
            risks.push(format!("Similar SR exists: {}", top.sr.title));
        }
    }

    let critical = related_incidents
        .iter()
        .filter(|m| matches!(m.incident.severity, Severity::Critical | Severity::High))
        .count();
    if critical > 0 {
        risks.push(format!("{} severe related incidents on record", critical));
    }

    if config.is_protected_system(&sr.system) {
        risks.push("Core business system impact".to_string());
    }

    if risks.is_empty() {
        risks.push("Baseline risk factors require review".to_string());
    }
    risks
}

fn score_recommendations(score: &RiskScoreResult) -> Vec<String> {
    let mut recommendations = Vec::new();

    if score.risk_level.is_elevated() {
        recommendations.push("Immediate review and response planning required".to_string());
        recommendations.push("Perform a detailed impact analysis".to_string());
        recommendations.push("Strengthen testing and verification coverage".to_string());
    }
    if score.components.sr_similarity > 0.7 {
        recommendations.push("Reference similar SR outcomes when planning verification".to_string());
    }
    if score.components.incident_correlation > 0.6 {
        recommendations
            .push("Analyze related incidents and prepare recurrence countermeasures".to_string());
    }
    if score.components.system_importance > 0.8 {
        recommendations
            .push("Consider a staged rollout given the core system impact".to_string());
    }
    if score.components.sr_complexity > 0.7 {
        recommendations
            .push("Break the complex requirements into a finer-grained delivery plan".to_string());
    }

    recommendations
}
