//! Reporting and output generation
//!
//! Global invariants enforced:
//! - Deterministic output ordering
//! - Byte-for-byte identical output across runs

use crate::aggregate::RiskScoreResult;
use crate::catalog::CatalogSummary;
use crate::fmea::{DevelopmentRiskAnalysis, RiskEvaluation};
use crate::rank::{IncidentMatch, SrMatch};
use serde::Serialize;

const RULER: &str = "----------------------------------------";

/// Render any serializable result as pretty JSON
pub fn render_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Render an aggregate risk score as text
pub fn render_score_text(result: &RiskScoreResult) -> String {
    let mut output = String::new();
    output.push_str(&format!("Risk score for {}\n", result.sr_id));
    output.push_str(RULER);
    output.push('\n');
    output.push_str(&format!("Total score: {:.3}\n", result.total_score));
    output.push_str(&format!("Risk level:  {}\n", result.risk_level.as_str()));
    output.push('\n');
    output.push_str("Components:\n");
    let c = result.components;
    let w = result.weights;
    for (name, value, weight) in [
        ("sr_similarity", c.sr_similarity, w.sr_similarity),
        ("incident_correlation", c.incident_correlation, w.incident_correlation),
        ("system_importance", c.system_importance, w.system_importance),
        ("time_sensitivity", c.time_sensitivity, w.time_sensitivity),
        ("sr_complexity", c.sr_complexity, w.sr_complexity),
    ] {
        output.push_str(&format!("  {:<22} {:.3} (weight {:.2})\n", name, value, weight));
    }
    output
}

/// Render SR correlation matches as a text table
pub fn render_sr_matches_text(matches: &[SrMatch]) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "{:<8} {:<10} {:<20} {}\n",
        "SCORE", "ID", "SYSTEM", "TITLE"
    ));
    for m in matches {
        output.push_str(&format!(
            "{:<8} {:<10} {:<20} {}\n",
            format!("{:.3}", m.score),
            m.sr.id,
            truncate_or_pad(&m.sr.system, 20),
            m.sr.title
        ));
        output.push_str(&format!("         matched on: {}\n", m.match_reasons.join("; ")));
    }
    if matches.is_empty() {
        output.push_str("No similar SRs found.\n");
    }
    output
}

/// Render incident correlation matches as a text table
pub fn render_incident_matches_text(matches: &[IncidentMatch]) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "{:<8} {:<10} {:<10} {:<12} {}\n",
        "SCORE", "ID", "SEVERITY", "RECENCY", "TITLE"
    ));
    for m in matches {
        output.push_str(&format!(
            "{:<8} {:<10} {:<10} {:<12} {}\n",
            format!("{:.3}", m.score),
            m.incident.id,
            m.incident.severity.as_str(),
            m.temporal_bucket.as_str(),
            m.incident.title
        ));
        output.push_str(&format!("         matched on: {}\n", m.match_reasons.join("; ")));
    }
    if matches.is_empty() {
        output.push_str("No related incidents found.\n");
    }
    output
}

/// Render a full risk evaluation as text
pub fn render_evaluation_text(evaluation: &RiskEvaluation) -> String {
    let mut output = String::new();
    output.push_str(&format!("Risk evaluation for {}\n", evaluation.sr_id));
    output.push_str(RULER);
    output.push('\n');
    output.push_str(&format!(
        "Method:      {}\n",
        evaluation.evaluation_method.as_str()
    ));
    output.push_str(&format!("Total score: {:.3}\n", evaluation.total_score));
    output.push_str(&format!("Risk level:  {}\n", evaluation.risk_level.as_str()));
    output.push_str(&format!("Reasoning:   {}\n", evaluation.reasoning));

    output.push_str("\nKey risks:\n");
    for risk in &evaluation.key_risks {
        output.push_str(&format!("  - {}\n", risk));
    }

    output.push_str("\nRecommendations:\n");
    for rec in &evaluation.recommendations {
        output.push_str(&format!("  - {}\n", rec));
    }

    output.push_str("\nSimilar SRs:\n");
    output.push_str(&render_sr_matches_text(&evaluation.similar_srs));
    output.push_str("\nRelated incidents:\n");
    output.push_str(&render_incident_matches_text(&evaluation.related_incidents));
    output
}

/// Render an FMEA development risk analysis as text
pub fn render_fmea_text(analysis: &DevelopmentRiskAnalysis) -> String {
    let mut output = String::new();
    output.push_str("FMEA development risk analysis\n");
    output.push_str(RULER);
    output.push('\n');

    let s = &analysis.summary;
    output.push_str(&format!("Total risks:   {}\n", s.total_risks));
    output.push_str(&format!("High risk:     {} (RPN > 100)\n", s.high_risk_count));
    output.push_str(&format!("Medium risk:   {} (RPN 50-100)\n", s.medium_risk_count));
    output.push_str(&format!("Low risk:      {} (RPN < 50)\n", s.low_risk_count));
    output.push_str(&format!("Overall score: {:.1}/10\n", s.overall_risk_score));

    if !analysis.risk_factors.is_empty() {
        output.push_str(&format!(
            "\n{:<6} {:<6} {:<8} {}\n",
            "ID", "RPN", "BAND", "FAILURE MODE"
        ));
        for item in &analysis.risk_factors {
            output.push_str(&format!(
                "{:<6} {:<6} {:<8} {}\n",
                item.id,
                item.rpn,
                item.risk_level.as_str(),
                item.failure_mode
            ));
            for measure in &item.mitigation_measures {
                output.push_str(&format!("       - {}\n", measure));
            }
        }
    }

    if !analysis.development_guidelines.is_empty() {
        output.push_str("\nDevelopment guidelines:\n");
        for guideline in &analysis.development_guidelines {
            output.push_str(&format!("  - {}\n", guideline));
        }
    }

    if !analysis.monitoring_recommendations.is_empty() {
        output.push_str("\nMonitoring recommendations:\n");
        for rec in &analysis.monitoring_recommendations {
            output.push_str(&format!("  - {}\n", rec));
        }
    }

    output
}

/// Render a catalog summary as text
pub fn render_summary_text(summary: &CatalogSummary) -> String {
    let mut output = String::new();
    output.push_str("Data catalog summary\n");
    output.push_str(RULER);
    output.push('\n');
    output.push_str(&format!("Service requests:     {}\n", summary.total_srs));
    output.push_str(&format!("Incidents:            {}\n", summary.total_incidents));
    output.push_str(&format!("Recent incidents:     {} (last 30 days)\n", summary.recent_incidents));
    output.push_str(&format!("Systems:              {}\n", summary.systems.join(", ")));
    output
}

/// Truncate or pad string to fixed width
fn truncate_or_pad(s: &str, width: usize) -> String {
    if s.len() > width {
        format!("{}...", &s[..width.saturating_sub(3)])
    } else {
        format!("{:<width$}", s, width = width)
    }
}
