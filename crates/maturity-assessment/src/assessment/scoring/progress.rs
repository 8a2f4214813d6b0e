use serde::{Deserialize, Serialize};

use super::round_to;

/// Completion counters for a session; independent of any score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressStatistics {
    pub total_metrics: usize,
    pub answered_metrics: usize,
    pub remaining_metrics: usize,
    pub completion_percentage: f64,
}

impl ProgressStatistics {
    pub fn compute(total_metrics: usize, answered_metrics: usize) -> Self {
        Self {
            total_metrics,
            answered_metrics,
            remaining_metrics: total_metrics.saturating_sub(answered_metrics),
            completion_percentage: completion_percentage(answered_metrics, total_metrics),
        }
    }
}

/// `answered / total * 100` rounded to one decimal; zero when nothing is active.
pub fn completion_percentage(answered: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }

    round_to(answered as f64 / total as f64 * 100.0, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_complete() {
        let stats = ProgressStatistics::compute(20, 5);
        assert_eq!(
            stats,
            ProgressStatistics {
                total_metrics: 20,
                answered_metrics: 5,
                remaining_metrics: 15,
                completion_percentage: 25.0,
            }
        );
    }

    #[test]
    fn no_active_metrics_yields_zero_percent() {
        let stats = ProgressStatistics::compute(0, 0);
        assert_eq!(stats.completion_percentage, 0.0);
        assert_eq!(stats.remaining_metrics, 0);
    }

    #[test]
    fn rounds_to_one_decimal() {
        assert_eq!(completion_percentage(1, 3), 33.3);
        assert_eq!(completion_percentage(2, 3), 66.7);
        assert_eq!(completion_percentage(1, 16), 6.2);
        assert_eq!(completion_percentage(3, 16), 18.8);
    }

    #[test]
    fn remaining_never_underflows() {
        let stats = ProgressStatistics::compute(2, 3);
        assert_eq!(stats.remaining_metrics, 0);
        assert_eq!(stats.completion_percentage, 150.0);
    }
}
