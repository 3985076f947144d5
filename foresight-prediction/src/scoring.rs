//! Transition scoring.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use foresight_core::config::PredictionConfig;
use foresight_core::models::{PredictionScore, RouteStats};

/// Tunable scoring parameters.
#[derive(Debug, Clone)]
pub struct ScoreWeights {
    pub transition: f64,
    pub visit: f64,
    pub recency: f64,
    pub visit_cap: u64,
    pub recency_window: Duration,
    pub max_age: Duration,
}

impl From<&PredictionConfig> for ScoreWeights {
    fn from(config: &PredictionConfig) -> Self {
        Self {
            transition: config.transition_weight,
            visit: config.visit_weight,
            recency: config.recency_weight,
            visit_cap: config.visit_cap.max(1),
            recency_window: config.recency_window(),
            max_age: config.max_age(),
        }
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self::from(&PredictionConfig::default())
    }
}

impl ScoreWeights {
    /// Score one destination given its base transition probability.
    pub fn score(&self, base: f64, target: &RouteStats, now: DateTime<Utc>) -> f64 {
        let age = now - target.last_visit;
        let recent = age >= Duration::zero() && age <= self.recency_window;
        let score = if recent {
            let visit_boost = target.visits.min(self.visit_cap) as f64 / self.visit_cap as f64;
            let window = self.recency_window.num_milliseconds().max(1) as f64;
            let recency_boost = 1.0 - age.num_milliseconds() as f64 / window;
            base * self.transition + visit_boost * self.visit + recency_boost * self.recency
        } else {
            base
        };
        score.clamp(0.0, 1.0)
    }
}

/// Score every outgoing transition of `source`, best first.
///
/// Skips the source itself, destinations without stats, and destinations
/// older than `max_age`. Ties are broken by path for determinism.
pub fn score_transitions(
    source: &RouteStats,
    routes: &HashMap<String, RouteStats>,
    now: DateTime<Utc>,
    weights: &ScoreWeights,
) -> Vec<PredictionScore> {
    let total = source.total_transitions();
    if total == 0 {
        return Vec::new();
    }

    let mut scores: Vec<PredictionScore> = source
        .transitions
        .iter()
        .filter(|(dest, _)| dest.as_str() != source.path)
        .filter_map(|(dest, count)| {
            let target = routes.get(dest)?;
            if target.is_stale(now, weights.max_age) {
                return None;
            }
            let base = *count as f64 / total as f64;
            Some(PredictionScore {
                path: dest.clone(),
                score: weights.score(base, target, now),
            })
        })
        .collect();

    scores.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.path.cmp(&b.path))
    });
    scores
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(path: &str, visits: u64, last_visit: DateTime<Utc>) -> RouteStats {
        RouteStats {
            path: path.to_string(),
            visits,
            last_visit,
            transitions: Default::default(),
        }
    }

    #[test]
    fn old_destinations_score_on_frequency_alone() {
        let weights = ScoreWeights::default();
        let now = Utc::now();
        let target = route("/b", 50, now - Duration::hours(3));
        assert!((weights.score(0.75, &target, now) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn recent_destinations_blend_components() {
        let weights = ScoreWeights::default();
        let now = Utc::now();
        // Visited just now, visits at the cap: 0.5*0.7 + 1.0*0.2 + 1.0*0.1
        let target = route("/b", 10, now);
        assert!((weights.score(0.5, &target, now) - 0.65).abs() < 1e-9);
    }

    #[test]
    fn popularity_boost_saturates_at_cap() {
        let weights = ScoreWeights::default();
        let now = Utc::now();
        let capped = weights.score(0.5, &route("/b", 10, now), now);
        let beyond = weights.score(0.5, &route("/b", 1_000, now), now);
        assert_eq!(capped, beyond);
    }

    #[test]
    fn scores_stay_in_unit_interval() {
        let weights = ScoreWeights {
            transition: 1.0,
            visit: 1.0,
            recency: 1.0,
            ..ScoreWeights::default()
        };
        let now = Utc::now();
        assert_eq!(weights.score(1.0, &route("/b", 10, now), now), 1.0);
    }
}
