//! External provider seams: vector search and LLM completion
//!
//! The engine runs fully offline against the local corpus; providers are
//! optional accelerators. Every provider failure is typed and recoverable,
//! so callers can fall back to the rule-based path.

use crate::model::{IncidentReport, ServiceRequest};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Why a provider call failed
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider was never configured (missing endpoint or key)
    #[error("provider not configured")]
    Unconfigured,

    /// The remote call itself failed
    #[error("provider request failed: {0}")]
    Request(String),

    /// The provider answered, but the payload could not be interpreted
    #[error("provider response could not be parsed: {0}")]
    Parse(String),
}

/// One search hit carrying the provider's raw relevance score
#[derive(Debug, Clone)]
pub struct SearchHit<T> {
    pub record: T,
    /// Provider-native relevance, unbounded above
    pub raw_relevance: f64,
}

/// Server-side narrowing hints for a search call. Providers may apply
/// these as index filters; the engine re-applies `exclude_id` locally
/// since not every backend honors it.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    /// Restrict hits to records for this system
    pub system: Option<String>,
    /// Drop the record with this id (self-match suppression)
    pub exclude_id: Option<String>,
}

/// External similarity search over the historical corpus
pub trait SearchProvider {
    fn search_service_requests(
        &self,
        query: &str,
        top_k: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<SearchHit<ServiceRequest>>, ProviderError>;

    fn search_incidents(
        &self,
        query: &str,
        top_k: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<SearchHit<IncidentReport>>, ProviderError>;
}

/// External LLM completion used for narrative risk evaluation
pub trait LlmProvider {
    /// Run one completion and return the raw response text.
    fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, ProviderError>;
}

/// Normalize a provider-native relevance score to [0,1]: `min(raw/divisor, 1)`,
/// with negative raw scores floored at zero.
pub fn normalize_relevance(raw: f64, divisor: f64) -> f64 {
    if !raw.is_finite() || raw <= 0.0 {
        return 0.0;
    }
    (raw / divisor).min(1.0)
}

fn json_fence_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)```json\s*(.*?)\s*```").unwrap())
}

/// Extract the JSON payload from an LLM response. Prefers the content of a
/// ```` ```json ```` fence; falls back to the whole trimmed response.
pub fn extract_json_payload(content: &str) -> &str {
    match json_fence_pattern().captures(content) {
        Some(captures) => captures.get(1).map(|m| m.as_str()).unwrap_or(content),
        None => content.trim(),
    }
}
