use std::collections::HashMap;

use super::super::domain::{MetricId, PillarId, TopicId};
use super::overlay::MergedAnswer;
use super::{MaturityCalculator, WeightedScore};

#[derive(Debug, Clone, PartialEq)]
pub struct MetricRollup {
    pub id: MetricId,
    pub name: String,
    pub level: u8,
    pub weight: f64,
    pub score: f64,
    pub hypothetical: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopicRollup {
    pub id: TopicId,
    pub name: String,
    pub weight: f64,
    pub score: f64,
    pub metrics: Vec<MetricRollup>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PillarRollup {
    pub id: PillarId,
    pub name: String,
    pub weight: f64,
    pub score: f64,
    pub topics: Vec<TopicRollup>,
}

/// Answers grouped into the pillar -> topic -> metric tree with unrounded scores at each level.
///
/// Groups appear in the order their first answer was seen. Topics with no answers never
/// enter the tree, so they are excluded from their pillar's mean rather than counted as 0.0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreRollup {
    pub pillars: Vec<PillarRollup>,
}

impl ScoreRollup {
    pub fn from_answers(answers: &[MergedAnswer]) -> Self {
        let mut pillars: Vec<PillarRollup> = Vec::new();
        let mut pillar_index: HashMap<PillarId, usize> = HashMap::new();
        let mut topic_index: HashMap<(PillarId, TopicId), usize> = HashMap::new();

        for merged in answers {
            let row = &merged.answer;

            let p = *pillar_index.entry(row.pillar_id.clone()).or_insert_with(|| {
                pillars.push(PillarRollup {
                    id: row.pillar_id.clone(),
                    name: row.pillar_name.clone(),
                    weight: row.pillar_weight,
                    score: 0.0,
                    topics: Vec::new(),
                });
                pillars.len() - 1
            });

            let topics = &mut pillars[p].topics;
            let t = *topic_index
                .entry((row.pillar_id.clone(), row.topic_id.clone()))
                .or_insert_with(|| {
                    topics.push(TopicRollup {
                        id: row.topic_id.clone(),
                        name: row.topic_name.clone(),
                        weight: row.topic_weight,
                        score: 0.0,
                        metrics: Vec::new(),
                    });
                    topics.len() - 1
                });

            topics[t].metrics.push(MetricRollup {
                id: row.metric_id.clone(),
                name: row.metric_name.clone(),
                level: row.metric_level,
                weight: row.metric_weight,
                score: MaturityCalculator::metric_score(row),
                hypothetical: merged.hypothetical,
            });
        }

        for pillar in &mut pillars {
            for topic in &mut pillar.topics {
                let scores: Vec<f64> = topic.metrics.iter().map(|metric| metric.score).collect();
                topic.score = MaturityCalculator::topic_score(&scores);
            }

            let weighted: Vec<WeightedScore> = pillar
                .topics
                .iter()
                .map(|topic| WeightedScore::new(topic.score, topic.weight))
                .collect();
            pillar.score = MaturityCalculator::pillar_score(&weighted);
        }

        Self { pillars }
    }

    /// Overall score from unrounded pillar scores.
    pub fn overall_score(&self) -> f64 {
        let weighted: Vec<WeightedScore> = self
            .pillars
            .iter()
            .map(|pillar| WeightedScore::new(pillar.score, pillar.weight))
            .collect();
        MaturityCalculator::overall_score(&weighted)
    }

    pub fn is_empty(&self) -> bool {
        self.pillars.is_empty()
    }

    pub fn topics(&self) -> impl Iterator<Item = (&PillarRollup, &TopicRollup)> {
        self.pillars
            .iter()
            .flat_map(|pillar| pillar.topics.iter().map(move |topic| (pillar, topic)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::domain::AnsweredMetric;

    fn answer(pillar: (&str, f64), topic: (&str, f64), metric: &str, value: f64) -> MergedAnswer {
        MergedAnswer::persisted(AnsweredMetric {
            metric_id: MetricId::from(metric),
            value,
            metric_name: metric.to_uppercase(),
            metric_level: 2,
            metric_weight: 1.0,
            topic_id: TopicId::from(topic.0),
            topic_name: format!("Topic {}", topic.0),
            topic_weight: topic.1,
            pillar_id: PillarId::from(pillar.0),
            pillar_name: format!("Pillar {}", pillar.0),
            pillar_weight: pillar.1,
        })
    }

    #[test]
    fn groups_preserve_first_seen_order() {
        let rollup = ScoreRollup::from_answers(&[
            answer(("p2", 1.0), ("t3", 1.0), "m1", 3.0),
            answer(("p1", 1.0), ("t1", 1.0), "m2", 2.0),
            answer(("p2", 1.0), ("t2", 1.0), "m3", 4.0),
        ]);

        let pillar_ids: Vec<&str> = rollup.pillars.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(pillar_ids, vec!["p2", "p1"]);
        let topic_ids: Vec<&str> = rollup.topics().map(|(_, t)| t.id.as_str()).collect();
        assert_eq!(topic_ids, vec!["t3", "t2", "t1"]);
    }

    #[test]
    fn pillar_uses_weighted_topic_mean() {
        let rollup = ScoreRollup::from_answers(&[
            answer(("p1", 1.0), ("strong", 2.0), "m1", 4.0),
            answer(("p1", 1.0), ("weak", 1.0), "m2", 2.0),
        ]);

        let pillar = &rollup.pillars[0];
        assert!((pillar.score - 10.0 / 3.0).abs() < 1e-9);
        assert!((rollup.overall_score() - 10.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn topic_uses_unweighted_metric_mean() {
        let rollup = ScoreRollup::from_answers(&[
            answer(("p1", 1.0), ("t1", 1.0), "m1", 1.0),
            answer(("p1", 1.0), ("t1", 1.0), "m2", 4.0),
        ]);
        assert_eq!(rollup.pillars[0].topics[0].score, 2.5);
        assert_eq!(rollup.pillars[0].topics[0].metrics.len(), 2);
    }

    #[test]
    fn zero_weight_pillars_do_not_divide_by_zero() {
        let rollup = ScoreRollup::from_answers(&[
            answer(("p1", 0.0), ("t1", 0.0), "m1", 4.0),
            answer(("p2", 0.0), ("t2", 1.0), "m2", 3.0),
        ]);

        assert_eq!(rollup.pillars[0].score, 0.0);
        assert_eq!(rollup.pillars[1].score, 3.0);
        assert_eq!(rollup.overall_score(), 0.0);
    }

    #[test]
    fn out_of_range_values_pass_through() {
        let rollup = ScoreRollup::from_answers(&[answer(("p1", 1.0), ("t1", 1.0), "m1", 7.5)]);
        assert_eq!(rollup.pillars[0].topics[0].metrics[0].score, 7.5);
        assert_eq!(rollup.overall_score(), 7.5);
    }

    #[test]
    fn empty_answers_produce_empty_tree() {
        let rollup = ScoreRollup::from_answers(&[]);
        assert!(rollup.is_empty());
        assert_eq!(rollup.overall_score(), 0.0);
    }
}
