//! Domain records for SR risk analysis
//!
//! Global invariants enforced:
//! - Records are immutable once loaded
//! - Missing or malformed input fields degrade to empty/zero, never fail

use serde::{Deserialize, Deserializer, Serialize};

/// SR priority, ordinal: Critical > High > Medium > Low
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Priority {
    Critical,
    High,
    Medium,
    #[default]
    Low,
}

impl Priority {
    /// Ordinal rank used for priority-closeness (Critical=4 .. Low=1)
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Critical => 4,
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }

    /// Closeness in [0,1]: 1.0 for identical priorities, 0.0 for Critical vs Low
    pub fn closeness(&self, other: Priority) -> f64 {
        1.0 - (self.rank() as i8 - other.rank() as i8).unsigned_abs() as f64 / 3.0
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "Critical",
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "critical" => Some(Priority::Critical),
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }
}

/// Incident severity, ordinal: Critical > High > Medium > Low
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Severity {
    Critical,
    High,
    Medium,
    #[default]
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "critical" => Some(Severity::Critical),
            "high" => Some(Severity::High),
            "medium" => Some(Severity::Medium),
            "low" => Some(Severity::Low),
            _ => None,
        }
    }
}

/// Discrete risk tier derived from a scalar score via configured thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Critical,
    High,
    Medium,
    Low,
    Minimal,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Critical => "Critical",
            RiskLevel::High => "High",
            RiskLevel::Medium => "Medium",
            RiskLevel::Low => "Low",
            RiskLevel::Minimal => "Minimal",
        }
    }

    pub fn is_elevated(&self) -> bool {
        matches!(self, RiskLevel::Critical | RiskLevel::High)
    }
}

/// A proposed change record under risk evaluation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceRequest {
    pub id: String,
    pub title: String,
    pub description: String,
    pub system: String,
    #[serde(deserialize_with = "lenient_priority")]
    pub priority: Priority,
    pub category: String,
    pub requester: String,
    /// ISO date (%Y-%m-%d); kept as text, parsed leniently where needed
    pub created_date: String,
    pub target_date: String,
    pub business_impact: String,
    pub technical_requirements: Vec<String>,
    pub affected_components: Vec<String>,
}

impl ServiceRequest {
    /// Title and description only, for nearest-neighbor similarity
    pub fn core_text(&self) -> String {
        let mut parts = vec![self.title.as_str(), self.description.as_str()];
        parts.retain(|p| !p.is_empty());
        parts.join(" ")
    }

    /// Text blob used for plain SR-to-SR similarity
    pub fn similarity_text(&self) -> String {
        let mut parts = vec![
            self.title.as_str(),
            self.description.as_str(),
            self.category.as_str(),
            self.priority.as_str(),
        ];
        parts.extend(self.technical_requirements.iter().map(String::as_str));
        parts.retain(|p| !p.is_empty());
        parts.join(" ")
    }

    /// Text blob used when correlating against incident reports
    pub fn incident_query_text(&self) -> String {
        let mut parts = vec![self.title.as_str(), self.description.as_str()];
        parts.extend(self.technical_requirements.iter().map(String::as_str));
        parts.extend(self.affected_components.iter().map(String::as_str));
        parts.retain(|p| !p.is_empty());
        parts.join(" ")
    }
}

/// A historical incident record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IncidentReport {
    pub id: String,
    pub title: String,
    pub description: String,
    pub system: String,
    #[serde(deserialize_with = "lenient_severity")]
    pub severity: Severity,
    pub status: String,
    /// ISO date (%Y-%m-%d); kept as text, parsed leniently where needed
    pub reported_date: String,
    pub resolved_date: String,
    pub duration_minutes: u64,
    pub affected_users: u64,
    pub root_cause: String,
    pub resolution: String,
    pub impact: String,
    pub business_impact: String,
    pub related_components: Vec<String>,
}

impl IncidentReport {
    /// Text blob matched against an SR's query text
    pub fn correlation_text(&self) -> String {
        let mut parts = vec![
            self.title.as_str(),
            self.description.as_str(),
            self.root_cause.as_str(),
        ];
        parts.retain(|p| !p.is_empty());
        parts.join(" ")
    }
}

/// Derived per-incident facts attached to correlation results
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RiskFactorSnapshot {
    pub severity: Severity,
    pub affected_users: u64,
    pub duration_minutes: u64,
    pub has_resolution: bool,
}

impl RiskFactorSnapshot {
    pub fn from_incident(incident: &IncidentReport) -> Self {
        RiskFactorSnapshot {
            severity: incident.severity,
            affected_users: incident.affected_users,
            duration_minutes: incident.duration_minutes,
            has_resolution: !incident.resolution.is_empty(),
        }
    }
}

// Unknown labels fall back to the default rather than failing the record.
fn lenient_priority<'de, D>(deserializer: D) -> Result<Priority, D::Error>
where
    D: Deserializer<'de>,
{
    let label = String::deserialize(deserializer)?;
    Ok(Priority::from_label(&label).unwrap_or_default())
}

fn lenient_severity<'de, D>(deserializer: D) -> Result<Severity, D::Error>
where
    D: Deserializer<'de>,
{
    let label = String::deserialize(deserializer)?;
    Ok(Severity::from_label(&label).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_closeness_ordinal() {
        assert_eq!(Priority::High.closeness(Priority::High), 1.0);
        assert!(Priority::High.closeness(Priority::Low) < Priority::High.closeness(Priority::Medium));
        assert_eq!(Priority::Critical.closeness(Priority::Low), 0.0);
    }

    #[test]
    fn test_malformed_priority_defaults() {
        let sr: ServiceRequest =
            serde_json::from_str(r#"{"id": "SR-1", "priority": "urgent!!"}"#).unwrap();
        assert_eq!(sr.priority, Priority::Low);
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let sr: ServiceRequest = serde_json::from_str(r#"{"id": "SR-2"}"#).unwrap();
        assert!(sr.title.is_empty());
        assert!(sr.affected_components.is_empty());
        let incident: IncidentReport = serde_json::from_str(r#"{"id": "INC-1"}"#).unwrap();
        assert_eq!(incident.severity, Severity::Low);
        assert_eq!(incident.affected_users, 0);
    }

    #[test]
    fn test_severity_labels_case_insensitive() {
        let incident: IncidentReport =
            serde_json::from_str(r#"{"id": "INC-2", "severity": "critical"}"#).unwrap();
        assert_eq!(incident.severity, Severity::Critical);
    }

    #[test]
    fn test_similarity_text_skips_empty_parts() {
        let sr = ServiceRequest {
            id: "SR-3".into(),
            title: "Discount recalculation".into(),
            technical_requirements: vec!["batch rerate".into()],
            ..Default::default()
        };
        let text = sr.similarity_text();
        assert!(text.contains("Discount recalculation"));
        assert!(text.contains("batch rerate"));
        assert!(!text.contains("  "));
    }
}
