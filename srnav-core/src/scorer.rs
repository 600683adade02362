//! Parameterized weighted multi-factor scorer
//!
//! One abstraction behind SR ranking, incident ranking, and aggregate risk:
//! a list of named (signal, weight) pairs evaluated over a (query, candidate)
//! pair. Keeping the weighting in one place makes each policy centrally
//! testable instead of re-implementing the linear combination per call site.
//!
//! Global invariants enforced:
//! - Signal values and totals are clamped to [0,1]
//! - A signal that produces a non-finite value contributes zero

/// One named, weighted signal over a (query, candidate) pair
pub struct Signal<Q: ?Sized, C: ?Sized> {
    pub name: &'static str,
    pub weight: f64,
    eval: Box<dyn Fn(&Q, &C) -> f64 + Send + Sync>,
}

/// Per-signal contribution to a score
#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    pub name: &'static str,
    /// Raw signal value, clamped to [0,1]
    pub value: f64,
    /// Value scaled by the signal weight
    pub weighted: f64,
}

/// Result of scoring one candidate against a query
#[derive(Debug, Clone)]
pub struct ScoreBreakdown {
    /// Weighted sum of all signals, clamped to [0,1]
    pub total: f64,
    pub contributions: Vec<Contribution>,
}

impl ScoreBreakdown {
    /// Raw value of a named signal, if present
    pub fn value_of(&self, name: &str) -> Option<f64> {
        self.contributions.iter().find(|c| c.name == name).map(|c| c.value)
    }
}

/// A fixed linear scoring policy over (query, candidate) pairs
pub struct WeightedScorer<Q: ?Sized, C: ?Sized> {
    signals: Vec<Signal<Q, C>>,
}

impl<Q: ?Sized, C: ?Sized> WeightedScorer<Q, C> {
    pub fn new() -> Self {
        WeightedScorer { signals: Vec::new() }
    }

    /// Add a named signal with its weight. Signals are evaluated in
    /// insertion order, so contribution order is deterministic.
    pub fn signal<F>(mut self, name: &'static str, weight: f64, eval: F) -> Self
    where
        F: Fn(&Q, &C) -> f64 + Send + Sync + 'static,
    {
        self.signals.push(Signal {
            name,
            weight,
            eval: Box::new(eval),
        });
        self
    }

    pub fn total_weight(&self) -> f64 {
        self.signals.iter().map(|s| s.weight).sum()
    }

    /// Evaluate all signals against one candidate.
    pub fn score(&self, query: &Q, candidate: &C) -> ScoreBreakdown {
        let mut contributions = Vec::with_capacity(self.signals.len());
        let mut total = 0.0;
        for signal in &self.signals {
            let raw = (signal.eval)(query, candidate);
            let value = if raw.is_finite() { raw.clamp(0.0, 1.0) } else { 0.0 };
            let weighted = value * signal.weight;
            total += weighted;
            contributions.push(Contribution {
                name: signal.name,
                value,
                weighted,
            });
        }
        ScoreBreakdown {
            total: total.clamp(0.0, 1.0),
            contributions,
        }
    }
}

impl<Q: ?Sized, C: ?Sized> Default for WeightedScorer<Q, C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_sum_and_breakdown() {
        let scorer: WeightedScorer<f64, f64> = WeightedScorer::new()
            .signal("query", 0.6, |q, _| *q)
            .signal("candidate", 0.4, |_, c| *c);
        let breakdown = scorer.score(&1.0, &0.5);
        assert!((breakdown.total - 0.8).abs() < 1e-12);
        assert_eq!(breakdown.value_of("query"), Some(1.0));
        assert_eq!(breakdown.value_of("candidate"), Some(0.5));
    }

    #[test]
    fn test_signal_values_clamped() {
        let scorer: WeightedScorer<(), f64> = WeightedScorer::new()
            .signal("hot", 0.5, |_, c| *c);
        assert_eq!(scorer.score(&(), &7.0).total, 0.5);
        assert_eq!(scorer.score(&(), &-3.0).total, 0.0);
    }

    #[test]
    fn test_non_finite_signal_contributes_zero() {
        let scorer: WeightedScorer<(), ()> = WeightedScorer::new()
            .signal("bad", 1.0, |_, _| f64::NAN)
            .signal("good", 0.5, |_, _| 1.0);
        let breakdown = scorer.score(&(), &());
        assert_eq!(breakdown.value_of("bad"), Some(0.0));
        assert_eq!(breakdown.total, 0.5);
    }

    #[test]
    fn test_total_clamped_to_one() {
        let scorer: WeightedScorer<(), ()> = WeightedScorer::new()
            .signal("a", 0.8, |_, _| 1.0)
            .signal("b", 0.8, |_, _| 1.0);
        assert_eq!(scorer.score(&(), &()).total, 1.0);
    }

    #[test]
    fn test_total_weight() {
        let scorer: WeightedScorer<(), ()> = WeightedScorer::new()
            .signal("a", 0.25, |_, _| 0.0)
            .signal("b", 0.75, |_, _| 0.0);
        assert!((scorer.total_weight() - 1.0).abs() < 1e-12);
    }
}
