//! Historical data catalog: SR and incident corpora loaded from JSON
//!
//! Files live in one data directory:
//! - `service_requests.json`: array of SR records
//! - `incidents.json`: array of incident records
//!
//! A missing file is an error; a present file with lenient or missing
//! per-record fields loads with defaults.

use crate::model::{IncidentReport, ServiceRequest};
use crate::temporal::parse_date;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;

const SR_FILE: &str = "service_requests.json";
const INCIDENT_FILE: &str = "incidents.json";

/// In-memory corpus of historical SRs and incidents
#[derive(Debug, Clone, Default)]
pub struct DataCatalog {
    service_requests: Vec<ServiceRequest>,
    incidents: Vec<IncidentReport>,
}

/// Corpus overview for reporting
#[derive(Debug, Clone, Serialize)]
pub struct CatalogSummary {
    pub total_srs: usize,
    pub total_incidents: usize,
    pub systems: Vec<String>,
    pub recent_incidents: usize,
}

impl DataCatalog {
    pub fn new(service_requests: Vec<ServiceRequest>, incidents: Vec<IncidentReport>) -> Self {
        DataCatalog {
            service_requests,
            incidents,
        }
    }

    /// Load both corpora from a data directory.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let service_requests = load_json_array(&data_dir.join(SR_FILE))?;
        let incidents = load_json_array(&data_dir.join(INCIDENT_FILE))?;
        Ok(DataCatalog {
            service_requests,
            incidents,
        })
    }

    pub fn service_requests(&self) -> &[ServiceRequest] {
        &self.service_requests
    }

    pub fn incidents(&self) -> &[IncidentReport] {
        &self.incidents
    }

    pub fn sr_by_id(&self, id: &str) -> Option<&ServiceRequest> {
        self.service_requests.iter().find(|sr| sr.id == id)
    }

    pub fn incidents_for_system(&self, system: &str) -> Vec<&IncidentReport> {
        self.incidents
            .iter()
            .filter(|incident| incident.system == system)
            .collect()
    }

    /// Incidents reported within the last `days` days. Unparsable dates
    /// are excluded.
    pub fn recent_incidents(&self, days: i64, reference_date: NaiveDate) -> Vec<&IncidentReport> {
        let cutoff = reference_date - chrono::Duration::days(days);
        self.incidents
            .iter()
            .filter(|incident| {
                parse_date(&incident.reported_date).is_some_and(|date| date >= cutoff)
            })
            .collect()
    }

    pub fn summary(&self, reference_date: NaiveDate) -> CatalogSummary {
        let systems: BTreeSet<String> = self
            .service_requests
            .iter()
            .map(|sr| sr.system.clone())
            .filter(|s| !s.is_empty())
            .collect();
        CatalogSummary {
            total_srs: self.service_requests.len(),
            total_incidents: self.incidents.len(),
            systems: systems.into_iter().collect(),
            recent_incidents: self.recent_incidents(30, reference_date).len(),
        }
    }
}

fn load_json_array<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read data file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse data file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_catalog(dir: &Path, srs: &str, incidents: &str) {
        fs::write(dir.join(SR_FILE), srs).unwrap();
        fs::write(dir.join(INCIDENT_FILE), incidents).unwrap();
    }

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()
    }

    #[test]
    fn test_load_catalog_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        write_catalog(
            dir.path(),
            r#"[{"id": "SR-1", "system": "BillingSystem"},
                {"id": "SR-2", "system": "SalesSystem"}]"#,
            r#"[{"id": "INC-1", "system": "BillingSystem", "reported_date": "2026-05-20"}]"#,
        );

        let catalog = DataCatalog::load(dir.path()).unwrap();
        assert_eq!(catalog.service_requests().len(), 2);
        assert_eq!(catalog.incidents().len(), 1);
        assert_eq!(catalog.sr_by_id("SR-2").unwrap().system, "SalesSystem");
        assert!(catalog.sr_by_id("SR-404").is_none());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DataCatalog::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("failed to read data file"));
    }

    #[test]
    fn test_malformed_json_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        write_catalog(dir.path(), "not json", "[]");
        let err = DataCatalog::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains(SR_FILE));
    }

    #[test]
    fn test_incidents_for_system() {
        let dir = tempfile::tempdir().unwrap();
        write_catalog(
            dir.path(),
            "[]",
            r#"[{"id": "INC-1", "system": "BillingSystem"},
                {"id": "INC-2", "system": "SalesSystem"},
                {"id": "INC-3", "system": "BillingSystem"}]"#,
        );
        let catalog = DataCatalog::load(dir.path()).unwrap();
        let billing = catalog.incidents_for_system("BillingSystem");
        assert_eq!(billing.len(), 2);
    }

    #[test]
    fn test_recent_incidents_skip_unparsable_dates() {
        let dir = tempfile::tempdir().unwrap();
        write_catalog(
            dir.path(),
            "[]",
            r#"[{"id": "INC-1", "reported_date": "2026-05-25"},
                {"id": "INC-2", "reported_date": "2025-01-01"},
                {"id": "INC-3", "reported_date": "around easter"}]"#,
        );
        let catalog = DataCatalog::load(dir.path()).unwrap();
        let recent = catalog.recent_incidents(30, reference());
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, "INC-1");
    }

    #[test]
    fn test_summary_deduplicates_systems() {
        let dir = tempfile::tempdir().unwrap();
        write_catalog(
            dir.path(),
            r#"[{"id": "SR-1", "system": "BillingSystem"},
                {"id": "SR-2", "system": "BillingSystem"},
                {"id": "SR-3", "system": ""}]"#,
            "[]",
        );
        let catalog = DataCatalog::load(dir.path()).unwrap();
        let summary = catalog.summary(reference());
        assert_eq!(summary.total_srs, 3);
        assert_eq!(summary.systems, vec!["BillingSystem".to_string()]);
        assert_eq!(summary.recent_incidents, 0);
    }
}
