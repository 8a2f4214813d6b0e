use std::collections::HashSet;

use super::super::domain::{AnsweredMetric, HypotheticalOverride, MetricId};

/// Answer row after the what-if overlay, flagged when its value is hypothetical.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedAnswer {
    pub answer: AnsweredMetric,
    pub hypothetical: bool,
}

/// Hypothetical answers evaluated on a private copy of the stored answer set.
///
/// Overrides are kept in first-seen order; a later override for the same metric replaces
/// the earlier value.
#[derive(Debug, Clone, Default)]
pub struct WhatIfOverlay {
    overrides: Vec<HypotheticalOverride>,
}

impl WhatIfOverlay {
    pub fn new<I>(overrides: I) -> Self
    where
        I: IntoIterator<Item = HypotheticalOverride>,
    {
        let mut merged: Vec<HypotheticalOverride> = Vec::new();
        for candidate in overrides {
            match merged
                .iter_mut()
                .find(|existing| existing.metric_id == candidate.metric_id)
            {
                Some(existing) => existing.value = candidate.value,
                None => merged.push(candidate),
            }
        }

        Self { overrides: merged }
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    fn value_for(&self, metric_id: &MetricId) -> Option<f64> {
        self.overrides
            .iter()
            .find(|candidate| &candidate.metric_id == metric_id)
            .map(|candidate| candidate.value)
    }

    /// Overridden metrics with no stored answer; these need placement metadata.
    pub fn unanswered<'a>(&'a self, base: &[AnsweredMetric]) -> Vec<&'a MetricId> {
        let answered: HashSet<&MetricId> = base.iter().map(|row| &row.metric_id).collect();
        self.overrides
            .iter()
            .map(|candidate| &candidate.metric_id)
            .filter(|metric_id| !answered.contains(metric_id))
            .collect()
    }

    /// Builds the merged answer set.
    ///
    /// Overridden values are swapped into stored rows. Overrides for previously unanswered
    /// metrics take their shape from the matching row in `placements`; overrides without a
    /// placement are skipped. The result is ordered by pillar, topic, and metric name, the
    /// same order stored answers load in.
    pub fn apply(
        &self,
        base: &[AnsweredMetric],
        placements: &[AnsweredMetric],
    ) -> Vec<MergedAnswer> {
        let mut merged: Vec<MergedAnswer> = base
            .iter()
            .map(|row| match self.value_for(&row.metric_id) {
                Some(value) => MergedAnswer {
                    answer: AnsweredMetric {
                        value,
                        ..row.clone()
                    },
                    hypothetical: true,
                },
                None => MergedAnswer {
                    answer: row.clone(),
                    hypothetical: false,
                },
            })
            .collect();

        for metric_id in self.unanswered(base) {
            let Some(placement) = placements.iter().find(|row| &row.metric_id == metric_id) else {
                continue;
            };
            let Some(value) = self.value_for(metric_id) else {
                continue;
            };
            merged.push(MergedAnswer {
                answer: AnsweredMetric {
                    value,
                    ..placement.clone()
                },
                hypothetical: true,
            });
        }

        merged.sort_by(|a, b| a.answer.hierarchy_key().cmp(&b.answer.hierarchy_key()));
        merged
    }
}

impl MergedAnswer {
    pub fn persisted(answer: AnsweredMetric) -> Self {
        Self {
            answer,
            hypothetical: false,
        }
    }
}
