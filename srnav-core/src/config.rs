//! Configuration file support for the risk engine
//!
//! Loads engine policy from JSON files.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.srnavrc.json` in the project root
//! 3. `srnav.config.json` in the project root
//!
//! All fields are optional. Weights and thresholds that are present are
//! validated up front: weights that do not sum to 1.0 are a fatal
//! configuration error, never silently renormalized.

use crate::model::Severity;
use crate::temporal::DEFAULT_HALF_LIFE_DAYS;
use crate::text::DEFAULT_DOMAIN_KEYWORDS;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Engine configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Custom weights for the five aggregate risk sub-scores
    #[serde(default)]
    pub risk_weights: Option<RiskWeightConfig>,

    /// Custom risk tier thresholds
    #[serde(default)]
    pub risk_thresholds: Option<RiskThresholdConfig>,

    /// Custom SR-ranker signal weights
    #[serde(default)]
    pub sr_ranker: Option<SrRankerConfig>,

    /// Custom incident-ranker signal weights
    #[serde(default)]
    pub incident_ranker: Option<IncidentRankerConfig>,

    /// Custom incident severity weights
    #[serde(default)]
    pub severity_weights: Option<SeverityWeightConfig>,

    /// Freshness decay half-life in days (default: 30)
    #[serde(default)]
    pub decay_half_life_days: Option<f64>,

    /// Domain keywords used by the boosted similarity measure
    #[serde(default)]
    pub domain_keywords: Option<Vec<String>>,

    /// Per-system business importance in [0,1]
    #[serde(default)]
    pub system_importance: Option<BTreeMap<String, f64>>,

    /// Importance assigned to systems missing from the table (default: 0.5)
    #[serde(default)]
    pub default_system_importance: Option<f64>,

    /// Substrings marking core business systems for key-risk extraction
    #[serde(default)]
    pub protected_systems: Option<Vec<String>>,

    /// Business-impact substrings worth the full complexity impact term
    #[serde(default)]
    pub severe_impact_keywords: Option<Vec<String>>,

    /// Business-impact substrings worth the moderate complexity impact term
    #[serde(default)]
    pub moderate_impact_keywords: Option<Vec<String>>,

    /// Divisor used to normalize raw search-provider relevance (default: 10)
    #[serde(default)]
    pub relevance_divisor: Option<f64>,
}

/// Weights for the five aggregate risk sub-scores; must sum to 1.0
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RiskWeightConfig {
    pub sr_similarity: Option<f64>,
    pub incident_correlation: Option<f64>,
    pub system_importance: Option<f64>,
    pub time_sensitivity: Option<f64>,
    pub sr_complexity: Option<f64>,
}

/// Risk tier thresholds over the aggregate score
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RiskThresholdConfig {
    /// Score for Critical tier (default: 0.8)
    pub critical: Option<f64>,
    /// Score for High tier (default: 0.6)
    pub high: Option<f64>,
    /// Score for Medium tier (default: 0.4)
    pub medium: Option<f64>,
    /// Score for Low tier (default: 0.2); below is Minimal
    pub low: Option<f64>,
}

/// SR-ranker signal weights; must sum to 1.0
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SrRankerConfig {
    /// Plain text similarity (default: 0.40)
    pub text: Option<f64>,
    /// Same-system indicator (default: 0.15)
    pub system: Option<f64>,
    /// Affected-component overlap (default: 0.25)
    pub components: Option<f64>,
    /// Same-category indicator (default: 0.10)
    pub category: Option<f64>,
    /// Priority closeness (default: 0.10)
    pub priority: Option<f64>,
}

/// Incident-ranker signal weights; must sum to 1.0
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IncidentRankerConfig {
    /// Same-system indicator (default: 0.30)
    pub system: Option<f64>,
    /// Component overlap (default: 0.30)
    pub components: Option<f64>,
    /// Keyword-boosted text similarity (default: 0.20)
    pub text: Option<f64>,
    /// Combined severity x recency term (default: 0.20)
    pub severity_recency: Option<f64>,
    /// Minimum score for an incident to be considered related (default: 0.1)
    pub min_score: Option<f64>,
}

/// Incident severity weights in [0,1]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeverityWeightConfig {
    pub critical: Option<f64>,
    pub high: Option<f64>,
    pub medium: Option<f64>,
    pub low: Option<f64>,
}

/// Resolved weights for the five aggregate sub-scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RiskWeights {
    pub sr_similarity: f64,
    pub incident_correlation: f64,
    pub system_importance: f64,
    pub time_sensitivity: f64,
    pub sr_complexity: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        RiskWeights {
            sr_similarity: 0.25,
            incident_correlation: 0.25,
            system_importance: 0.25,
            time_sensitivity: 0.15,
            sr_complexity: 0.10,
        }
    }
}

/// Resolved risk tier thresholds, descending
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub critical: f64,
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        RiskThresholds {
            critical: 0.8,
            high: 0.6,
            medium: 0.4,
            low: 0.2,
        }
    }
}

/// Resolved SR-ranker signal weights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SrRankerWeights {
    pub text: f64,
    pub system: f64,
    pub components: f64,
    pub category: f64,
    pub priority: f64,
}

impl Default for SrRankerWeights {
    fn default() -> Self {
        SrRankerWeights {
            text: 0.40,
            system: 0.15,
            components: 0.25,
            category: 0.10,
            priority: 0.10,
        }
    }
}

/// Resolved incident-ranker signal weights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncidentRankerWeights {
    pub system: f64,
    pub components: f64,
    pub text: f64,
    pub severity_recency: f64,
    pub min_score: f64,
}

impl Default for IncidentRankerWeights {
    fn default() -> Self {
        IncidentRankerWeights {
            system: 0.30,
            components: 0.30,
            text: 0.20,
            severity_recency: 0.20,
            min_score: 0.1,
        }
    }
}

/// Resolved incident severity weights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeverityWeights {
    pub critical: f64,
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl Default for SeverityWeights {
    fn default() -> Self {
        SeverityWeights {
            critical: 1.0,
            high: 0.8,
            medium: 0.6,
            low: 0.4,
        }
    }
}

impl SeverityWeights {
    pub fn weight(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }
}

/// Fully resolved engine configuration
#[derive(Debug, Clone)]
pub struct ResolvedEngineConfig {
    pub risk_weights: RiskWeights,
    pub risk_thresholds: RiskThresholds,
    pub sr_ranker: SrRankerWeights,
    pub incident_ranker: IncidentRankerWeights,
    pub severity_weights: SeverityWeights,
    pub decay_half_life_days: f64,
    pub domain_keywords: Vec<String>,
    pub system_importance: BTreeMap<String, f64>,
    pub default_system_importance: f64,
    pub protected_systems: Vec<String>,
    pub severe_impact_keywords: Vec<String>,
    pub moderate_impact_keywords: Vec<String>,
    pub relevance_divisor: f64,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
}

impl Default for ResolvedEngineConfig {
    fn default() -> Self {
        ResolvedEngineConfig {
            risk_weights: RiskWeights::default(),
            risk_thresholds: RiskThresholds::default(),
            sr_ranker: SrRankerWeights::default(),
            incident_ranker: IncidentRankerWeights::default(),
            severity_weights: SeverityWeights::default(),
            decay_half_life_days: DEFAULT_HALF_LIFE_DAYS,
            domain_keywords: DEFAULT_DOMAIN_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            system_importance: default_system_importance_table(),
            default_system_importance: 0.5,
            protected_systems: vec!["Billing".to_string(), "Rating".to_string()],
            severe_impact_keywords: vec!["revenue loss".to_string()],
            moderate_impact_keywords: vec!["customer complaint".to_string()],
            relevance_divisor: 10.0,
            config_path: None,
        }
    }
}

impl ResolvedEngineConfig {
    /// Business importance of a system, falling back to the default for
    /// unknown systems.
    pub fn importance_of(&self, system: &str) -> f64 {
        self.system_importance
            .get(system)
            .copied()
            .unwrap_or(self.default_system_importance)
    }

    /// True when the system name contains a protected-system substring.
    pub fn is_protected_system(&self, system: &str) -> bool {
        let lower = system.to_lowercase();
        self.protected_systems
            .iter()
            .any(|p| lower.contains(&p.to_lowercase()))
    }
}

fn default_system_importance_table() -> BTreeMap<String, f64> {
    [
        ("BillingSystem", 1.0),
        ("RatingEngine", 0.9),
        ("SubscriptionEngine", 0.9),
        ("DiscountEngine", 0.8),
        ("InvoicingSystem", 0.7),
        ("SalesSystem", 0.6),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

fn check_unit_interval(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        anyhow::bail!("{} must be in [0,1] (got {})", name, value);
    }
    Ok(())
}

fn check_weight_sum(group: &str, weights: &[(&str, f64)]) -> Result<()> {
    for (name, value) in weights {
        check_unit_interval(&format!("{}.{}", group, name), *value)?;
    }
    let sum: f64 = weights.iter().map(|(_, v)| v).sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        anyhow::bail!("{} weights must sum to 1.0 (got {})", group, sum);
    }
    Ok(())
}

impl EngineConfig {
    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        let resolved = self.resolve_unchecked();

        check_weight_sum(
            "risk_weights",
            &[
                ("sr_similarity", resolved.risk_weights.sr_similarity),
                ("incident_correlation", resolved.risk_weights.incident_correlation),
                ("system_importance", resolved.risk_weights.system_importance),
                ("time_sensitivity", resolved.risk_weights.time_sensitivity),
                ("sr_complexity", resolved.risk_weights.sr_complexity),
            ],
        )?;

        check_weight_sum(
            "sr_ranker",
            &[
                ("text", resolved.sr_ranker.text),
                ("system", resolved.sr_ranker.system),
                ("components", resolved.sr_ranker.components),
                ("category", resolved.sr_ranker.category),
                ("priority", resolved.sr_ranker.priority),
            ],
        )?;

        check_weight_sum(
            "incident_ranker",
            &[
                ("system", resolved.incident_ranker.system),
                ("components", resolved.incident_ranker.components),
                ("text", resolved.incident_ranker.text),
                ("severity_recency", resolved.incident_ranker.severity_recency),
            ],
        )?;

        let t = resolved.risk_thresholds;
        for (name, value) in [
            ("critical", t.critical),
            ("high", t.high),
            ("medium", t.medium),
            ("low", t.low),
        ] {
            if !(0.0..=1.0).contains(&value) || value == 0.0 {
                anyhow::bail!("risk_thresholds.{} must be in (0,1] (got {})", name, value);
            }
        }
        if !(t.critical > t.high && t.high > t.medium && t.medium > t.low) {
            anyhow::bail!(
                "risk_thresholds must be strictly descending (critical {} > high {} > medium {} > low {})",
                t.critical,
                t.high,
                t.medium,
                t.low
            );
        }

        let s = resolved.severity_weights;
        for (name, value) in [
            ("critical", s.critical),
            ("high", s.high),
            ("medium", s.medium),
            ("low", s.low),
        ] {
            check_unit_interval(&format!("severity_weights.{}", name), value)?;
        }

        if resolved.decay_half_life_days <= 0.0 {
            anyhow::bail!(
                "decay_half_life_days must be positive (got {})",
                resolved.decay_half_life_days
            );
        }

        if !(0.0..1.0).contains(&resolved.incident_ranker.min_score) {
            anyhow::bail!(
                "incident_ranker.min_score must be in [0,1) (got {})",
                resolved.incident_ranker.min_score
            );
        }

        check_unit_interval(
            "default_system_importance",
            resolved.default_system_importance,
        )?;
        for (system, value) in &resolved.system_importance {
            check_unit_interval(&format!("system_importance.{}", system), *value)?;
        }

        if resolved.relevance_divisor <= 0.0 {
            anyhow::bail!(
                "relevance_divisor must be positive (got {})",
                resolved.relevance_divisor
            );
        }

        Ok(())
    }

    /// Resolve config into concrete form ready for use
    pub fn resolve(&self) -> Result<ResolvedEngineConfig> {
        self.validate()?;
        Ok(self.resolve_unchecked())
    }

    fn resolve_unchecked(&self) -> ResolvedEngineConfig {
        let defaults = ResolvedEngineConfig::default();

        let risk_weights = match &self.risk_weights {
            Some(w) => RiskWeights {
                sr_similarity: w.sr_similarity.unwrap_or(defaults.risk_weights.sr_similarity),
                incident_correlation: w
                    .incident_correlation
                    .unwrap_or(defaults.risk_weights.incident_correlation),
                system_importance: w
                    .system_importance
                    .unwrap_or(defaults.risk_weights.system_importance),
                time_sensitivity: w
                    .time_sensitivity
                    .unwrap_or(defaults.risk_weights.time_sensitivity),
                sr_complexity: w.sr_complexity.unwrap_or(defaults.risk_weights.sr_complexity),
            },
            None => defaults.risk_weights,
        };

        let risk_thresholds = match &self.risk_thresholds {
            Some(t) => RiskThresholds {
                critical: t.critical.unwrap_or(defaults.risk_thresholds.critical),
                high: t.high.unwrap_or(defaults.risk_thresholds.high),
                medium: t.medium.unwrap_or(defaults.risk_thresholds.medium),
                low: t.low.unwrap_or(defaults.risk_thresholds.low),
            },
            None => defaults.risk_thresholds,
        };

        let sr_ranker = match &self.sr_ranker {
            Some(w) => SrRankerWeights {
                text: w.text.unwrap_or(defaults.sr_ranker.text),
                system: w.system.unwrap_or(defaults.sr_ranker.system),
                components: w.components.unwrap_or(defaults.sr_ranker.components),
                category: w.category.unwrap_or(defaults.sr_ranker.category),
                priority: w.priority.unwrap_or(defaults.sr_ranker.priority),
            },
            None => defaults.sr_ranker,
        };

        let incident_ranker = match &self.incident_ranker {
            Some(w) => IncidentRankerWeights {
                system: w.system.unwrap_or(defaults.incident_ranker.system),
                components: w.components.unwrap_or(defaults.incident_ranker.components),
                text: w.text.unwrap_or(defaults.incident_ranker.text),
                severity_recency: w
                    .severity_recency
                    .unwrap_or(defaults.incident_ranker.severity_recency),
                min_score: w.min_score.unwrap_or(defaults.incident_ranker.min_score),
            },
            None => defaults.incident_ranker,
        };

        let severity_weights = match &self.severity_weights {
            Some(w) => SeverityWeights {
                critical: w.critical.unwrap_or(defaults.severity_weights.critical),
                high: w.high.unwrap_or(defaults.severity_weights.high),
                medium: w.medium.unwrap_or(defaults.severity_weights.medium),
                low: w.low.unwrap_or(defaults.severity_weights.low),
            },
            None => defaults.severity_weights,
        };

        ResolvedEngineConfig {
            risk_weights,
            risk_thresholds,
            sr_ranker,
            incident_ranker,
            severity_weights,
            decay_half_life_days: self
                .decay_half_life_days
                .unwrap_or(defaults.decay_half_life_days),
            domain_keywords: self
                .domain_keywords
                .clone()
                .unwrap_or(defaults.domain_keywords),
            system_importance: self
                .system_importance
                .clone()
                .unwrap_or(defaults.system_importance),
            default_system_importance: self
                .default_system_importance
                .unwrap_or(defaults.default_system_importance),
            protected_systems: self
                .protected_systems
                .clone()
                .unwrap_or(defaults.protected_systems),
            severe_impact_keywords: self
                .severe_impact_keywords
                .clone()
                .unwrap_or(defaults.severe_impact_keywords),
            moderate_impact_keywords: self
                .moderate_impact_keywords
                .clone()
                .unwrap_or(defaults.moderate_impact_keywords),
            relevance_divisor: self.relevance_divisor.unwrap_or(defaults.relevance_divisor),
            config_path: None,
        }
    }
}

/// Discover and load a config file from the project root
///
/// Search order:
/// 1. `.srnavrc.json`
/// 2. `srnav.config.json`
///
/// Returns `None` if no config file is found (use defaults).
pub fn discover_config(project_root: &Path) -> Result<Option<(EngineConfig, PathBuf)>> {
    let rc_path = project_root.join(".srnavrc.json");
    if rc_path.exists() {
        let config = load_config_file(&rc_path)?;
        return Ok(Some((config, rc_path)));
    }

    let config_path = project_root.join("srnav.config.json");
    if config_path.exists() {
        let config = load_config_file(&config_path)?;
        return Ok(Some((config, config_path)));
    }

    Ok(None)
}

/// Load config from an explicit file path
pub fn load_config_file(path: &Path) -> Result<EngineConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: EngineConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("invalid config in: {}", path.display()))?;

    Ok(config)
}

/// Load and resolve config for a project
///
/// If `config_path` is provided, loads from that file.
/// Otherwise, discovers config from the project root.
/// Returns default config if nothing is found.
pub fn load_and_resolve(
    project_root: &Path,
    config_path: Option<&Path>,
) -> Result<ResolvedEngineConfig> {
    let (config, source_path) = if let Some(path) = config_path {
        let config = load_config_file(path)?;
        (config, Some(path.to_path_buf()))
    } else {
        match discover_config(project_root)? {
            Some((config, path)) => (config, Some(path)),
            None => (EngineConfig::default(), None),
        }
    };

    let mut resolved = config.resolve()?;
    resolved.config_path = source_path;
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        config.validate().expect("default config should be valid");
        let resolved = config.resolve().expect("default config should resolve");
        assert_eq!(resolved.risk_weights.sr_similarity, 0.25);
        assert_eq!(resolved.risk_weights.sr_complexity, 0.10);
        assert_eq!(resolved.risk_thresholds.critical, 0.8);
        assert_eq!(resolved.decay_half_life_days, 30.0);
        assert_eq!(resolved.incident_ranker.min_score, 0.1);
    }

    #[test]
    fn test_parse_minimal_config() {
        let json = r#"{}"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            "risk_weights": {
                "sr_similarity": 0.3,
                "incident_correlation": 0.3,
                "system_importance": 0.2,
                "time_sensitivity": 0.1,
                "sr_complexity": 0.1
            },
            "risk_thresholds": {
                "critical": 0.85,
                "high": 0.65,
                "medium": 0.45,
                "low": 0.25
            },
            "decay_half_life_days": 45.0,
            "system_importance": {"PaymentGateway": 0.95},
            "domain_keywords": ["payment", "settlement"]
        }"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.risk_weights.sr_similarity, 0.3);
        assert_eq!(resolved.risk_thresholds.critical, 0.85);
        assert_eq!(resolved.decay_half_life_days, 45.0);
        assert_eq!(resolved.importance_of("PaymentGateway"), 0.95);
        assert_eq!(resolved.domain_keywords, vec!["payment", "settlement"]);
    }

    #[test]
    fn test_reject_unknown_fields() {
        let json = r#"{"unknown_field": true}"#;
        let result: Result<EngineConfig, _> = serde_json::from_str(json);
        assert!(result.is_err(), "unknown fields should be rejected");
    }

    #[test]
    fn test_reject_weights_not_summing_to_one() {
        let json = r#"{"risk_weights": {"sr_similarity": 0.5}}"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("sum to 1.0"), "got: {}", err);
    }

    #[test]
    fn test_reject_negative_weight() {
        let json = r#"{"risk_weights": {"sr_similarity": -0.25, "sr_complexity": 0.6}}"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reject_unordered_thresholds() {
        let json = r#"{"risk_thresholds": {"critical": 0.4, "high": 0.6}}"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reject_zero_half_life() {
        let json = r#"{"decay_half_life_days": 0.0}"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reject_importance_out_of_range() {
        let json = r#"{"system_importance": {"CoreLedger": 1.5}}"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_weights_use_defaults_for_rest() {
        // Overriding two weights while keeping the sum at 1.0
        let json = r#"{"risk_weights": {"sr_similarity": 0.30, "incident_correlation": 0.20}}"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.risk_weights.sr_similarity, 0.30);
        assert_eq!(resolved.risk_weights.incident_correlation, 0.20);
        assert_eq!(resolved.risk_weights.system_importance, 0.25); // default
    }

    #[test]
    fn test_unknown_system_gets_default_importance() {
        let resolved = EngineConfig::default().resolve().unwrap();
        assert_eq!(resolved.importance_of("UnknownSystem"), 0.5);
        assert_eq!(resolved.importance_of("BillingSystem"), 1.0);
    }

    #[test]
    fn test_protected_system_matching() {
        let resolved = EngineConfig::default().resolve().unwrap();
        assert!(resolved.is_protected_system("BillingSystem"));
        assert!(resolved.is_protected_system("core-billing-batch"));
        assert!(!resolved.is_protected_system("ReportingPortal"));
    }

    #[test]
    fn test_discover_srnavrc() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join(".srnavrc.json");
        fs::write(&config_path, r#"{"decay_half_life_days": 60.0}"#).unwrap();

        let result = discover_config(dir.path()).unwrap();
        assert!(result.is_some());
        let (config, path) = result.unwrap();
        assert_eq!(config.decay_half_life_days, Some(60.0));
        assert_eq!(path, config_path);
    }

    #[test]
    fn test_discover_priority_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".srnavrc.json"), r#"{"decay_half_life_days": 10.0}"#).unwrap();
        fs::write(
            dir.path().join("srnav.config.json"),
            r#"{"decay_half_life_days": 20.0}"#,
        )
        .unwrap();

        let (config, _) = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(
            config.decay_half_life_days,
            Some(10.0),
            ".srnavrc.json should take priority"
        );
    }

    #[test]
    fn test_no_config_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_config(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_load_and_resolve_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("custom.json");
        fs::write(&config_path, r#"{"default_system_importance": 0.7}"#).unwrap();

        let resolved = load_and_resolve(dir.path(), Some(&config_path)).unwrap();
        assert_eq!(resolved.default_system_importance, 0.7);
        assert_eq!(resolved.config_path, Some(config_path));
    }

    #[test]
    fn test_load_and_resolve_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = load_and_resolve(dir.path(), None).unwrap();
        assert!(resolved.config_path.is_none());
        assert_eq!(resolved.risk_weights, RiskWeights::default());
    }
}
