//! Exponential freshness decay for event dates
//!
//! Freshness is a soft signal: a missing or unparsable date yields a fixed
//! low fallback weight instead of failing the caller.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Decay half-life policy knob, in days
pub const DEFAULT_HALF_LIFE_DAYS: f64 = 30.0;
/// Weight assigned when the event date cannot be parsed
pub const FALLBACK_WEIGHT: f64 = 0.1;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse an ISO calendar date (`%Y-%m-%d`); `None` for anything else.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).ok()
}

/// Freshness weight `exp(-days_elapsed / half_life)` in (0,1].
///
/// Days elapsed is floored at zero, so future-dated events weigh 1.0.
pub fn decay_weight(event_date: NaiveDate, reference_date: NaiveDate, half_life_days: f64) -> f64 {
    let days_elapsed = (reference_date - event_date).num_days().max(0) as f64;
    (-days_elapsed / half_life_days).exp()
}

/// Freshness weight for a textual date; unparsable input yields the
/// fixed fallback weight.
pub fn decay_weight_for(text: &str, reference_date: NaiveDate, half_life_days: f64) -> f64 {
    match parse_date(text) {
        Some(date) => decay_weight(date, reference_date, half_life_days),
        None => FALLBACK_WEIGHT,
    }
}

/// Coarse recency classification of an incident date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalBucket {
    /// Within the last 30 days
    Recent,
    /// 31-90 days ago
    MidTerm,
    /// 91-180 days ago
    LongTerm,
    /// Older than 180 days
    Historical,
    /// Date missing or unparsable
    Unknown,
}

impl TemporalBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemporalBucket::Recent => "recent",
            TemporalBucket::MidTerm => "mid_term",
            TemporalBucket::LongTerm => "long_term",
            TemporalBucket::Historical => "historical",
            TemporalBucket::Unknown => "unknown",
        }
    }

    pub fn classify(text: &str, reference_date: NaiveDate) -> Self {
        let Some(date) = parse_date(text) else {
            return TemporalBucket::Unknown;
        };
        let days = (reference_date - date).num_days().max(0);
        if days <= 30 {
            TemporalBucket::Recent
        } else if days <= 90 {
            TemporalBucket::MidTerm
        } else if days <= 180 {
            TemporalBucket::LongTerm
        } else {
            TemporalBucket::Historical
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_decay_is_one_at_zero_days() {
        let today = date(2026, 3, 1);
        assert_eq!(decay_weight(today, today, DEFAULT_HALF_LIFE_DAYS), 1.0);
    }

    #[test]
    fn test_decay_strictly_decreasing() {
        let reference = date(2026, 3, 1);
        let mut previous = f64::INFINITY;
        for days_back in [0, 1, 7, 30, 90, 365] {
            let event = reference - chrono::Duration::days(days_back);
            let weight = decay_weight(event, reference, DEFAULT_HALF_LIFE_DAYS);
            assert!(weight < previous, "weight must fall as events age");
            assert!(weight > 0.0 && weight <= 1.0);
            previous = weight;
        }
    }

    #[test]
    fn test_future_dates_floor_at_full_weight() {
        let reference = date(2026, 3, 1);
        let tomorrow = date(2026, 3, 2);
        assert_eq!(decay_weight(tomorrow, reference, DEFAULT_HALF_LIFE_DAYS), 1.0);
    }

    #[test]
    fn test_unparsable_date_falls_back() {
        let reference = date(2026, 3, 1);
        assert_eq!(
            decay_weight_for("not-a-date", reference, DEFAULT_HALF_LIFE_DAYS),
            FALLBACK_WEIGHT
        );
        assert_eq!(decay_weight_for("", reference, DEFAULT_HALF_LIFE_DAYS), FALLBACK_WEIGHT);
    }

    #[test]
    fn test_thirty_day_half_life_value() {
        let reference = date(2026, 3, 1);
        let event = reference - chrono::Duration::days(30);
        let weight = decay_weight(event, reference, DEFAULT_HALF_LIFE_DAYS);
        assert!((weight - (-1.0f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_temporal_buckets() {
        let reference = date(2026, 7, 1);
        assert_eq!(TemporalBucket::classify("2026-06-20", reference), TemporalBucket::Recent);
        assert_eq!(TemporalBucket::classify("2026-05-01", reference), TemporalBucket::MidTerm);
        assert_eq!(TemporalBucket::classify("2026-02-01", reference), TemporalBucket::LongTerm);
        assert_eq!(TemporalBucket::classify("2024-01-01", reference), TemporalBucket::Historical);
        assert_eq!(TemporalBucket::classify("soon", reference), TemporalBucket::Unknown);
    }
}
