mod level;
mod overlay;
mod progress;
mod rollup;

pub use level::MaturityLevel;
pub use overlay::{MergedAnswer, WhatIfOverlay};
pub use progress::{completion_percentage, ProgressStatistics};
pub use rollup::{MetricRollup, PillarRollup, ScoreRollup, TopicRollup};

use super::domain::AnsweredMetric;

/// Version tag reported alongside every computed score.
pub const ALGORITHM_VERSION: &str = "rollup-v1.0";

/// Score paired with the weight it carries at the next level up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedScore {
    pub score: f64,
    pub weight: f64,
}

impl WeightedScore {
    pub const fn new(score: f64, weight: f64) -> Self {
        Self { score, weight }
    }
}

/// Stateless aggregation rules for each level of the metric -> topic -> pillar -> overall tree.
pub struct MaturityCalculator;

impl MaturityCalculator {
    /// The stored value is already on the 1-5 level scale and is passed through unclamped.
    /// The metric's declared level travels with the row as metadata only.
    pub fn metric_score(answer: &AnsweredMetric) -> f64 {
        answer.value
    }

    /// Unweighted mean of the topic's metric scores; 0.0 for an empty topic.
    pub fn topic_score(metric_scores: &[f64]) -> f64 {
        if metric_scores.is_empty() {
            return 0.0;
        }

        metric_scores.iter().sum::<f64>() / metric_scores.len() as f64
    }

    pub fn pillar_score(topics: &[WeightedScore]) -> f64 {
        weighted_mean(topics)
    }

    pub fn overall_score(pillars: &[WeightedScore]) -> f64 {
        weighted_mean(pillars)
    }
}

/// `Σ(score·weight) / Σ(weight)`, or 0.0 when the total weight is not positive.
pub fn weighted_mean(entries: &[WeightedScore]) -> f64 {
    let total_weight: f64 = entries.iter().map(|entry| entry.weight).sum();
    if total_weight <= 0.0 {
        return 0.0;
    }

    let weighted_sum: f64 = entries.iter().map(|entry| entry.score * entry.weight).sum();
    weighted_sum / total_weight
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_mean_honors_weights() {
        let score = MaturityCalculator::pillar_score(&[
            WeightedScore::new(4.0, 2.0),
            WeightedScore::new(2.0, 1.0),
        ]);
        assert_eq!(round_to(score, 2), 3.33);
    }

    #[test]
    fn zero_total_weight_is_guarded() {
        assert_eq!(MaturityCalculator::pillar_score(&[]), 0.0);
        assert_eq!(
            MaturityCalculator::overall_score(&[
                WeightedScore::new(4.0, 0.0),
                WeightedScore::new(3.0, 0.0),
            ]),
            0.0
        );
    }

    #[test]
    fn topic_score_is_plain_mean() {
        assert_eq!(MaturityCalculator::topic_score(&[]), 0.0);
        assert_eq!(MaturityCalculator::topic_score(&[1.0, 2.0, 4.5]), 2.5);
    }

    #[test]
    fn rounding_keeps_requested_precision() {
        assert_eq!(round_to(2.345_1, 2), 2.35);
        assert_eq!(round_to(33.333, 1), 33.3);
        assert_eq!(round_to(0.0, 2), 0.0);
    }

    #[test]
    fn exact_halves_round_to_even() {
        assert_eq!(round_to(6.25, 1), 6.2);
        assert_eq!(round_to(6.75, 1), 6.8);
        assert_eq!(round_to(3.375, 2), 3.38);
        assert_eq!(round_to(0.125, 2), 0.12);
    }
}
