use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    AssessmentSession, AssessmentTarget, Metric, MetricId, Organization, Pillar, PillarId,
    PillarProgressRow, PillarRef, RecentAnswer, SessionId, Topic, TopicId,
};
use super::scoring::{
    completion_percentage, round_to, MaturityLevel, ProgressStatistics, ScoreRollup,
    ALGORITHM_VERSION,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PillarScore {
    pub id: PillarId,
    pub name: String,
    pub score: f64,
    pub weight: f64,
    pub topic_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicScore {
    pub id: TopicId,
    pub pillar_id: PillarId,
    pub name: String,
    pub score: f64,
    pub weight: f64,
    pub metric_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricScore {
    pub id: MetricId,
    pub name: String,
    pub level: u8,
    pub weight: f64,
    pub score: f64,
    pub hypothetical: bool,
}

/// Result of one score calculation. Rollup scores are rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub session_id: SessionId,
    pub overall_score: f64,
    pub maturity_level: MaturityLevel,
    pub pillar_scores: Vec<PillarScore>,
    pub topic_scores: Vec<TopicScore>,
    pub metric_scores: Vec<MetricScore>,
    pub statistics: ProgressStatistics,
    pub applied_overrides: usize,
    pub algorithm_version: String,
}

impl ScoreReport {
    /// All-zero report for a session without answers.
    pub fn empty(session_id: SessionId, statistics: ProgressStatistics) -> Self {
        Self {
            session_id,
            overall_score: 0.0,
            maturity_level: MaturityLevel::Initial,
            pillar_scores: Vec::new(),
            topic_scores: Vec::new(),
            metric_scores: Vec::new(),
            statistics,
            applied_overrides: 0,
            algorithm_version: ALGORITHM_VERSION.to_string(),
        }
    }

    /// Flattens a rollup into display rows.
    ///
    /// The level is classified from the unrounded overall score; only the reported
    /// numbers are rounded.
    pub fn from_rollup(
        session_id: SessionId,
        rollup: &ScoreRollup,
        statistics: ProgressStatistics,
        applied_overrides: usize,
    ) -> Self {
        let overall = rollup.overall_score();

        let pillar_scores = rollup
            .pillars
            .iter()
            .map(|pillar| PillarScore {
                id: pillar.id.clone(),
                name: pillar.name.clone(),
                score: round_to(pillar.score, 2),
                weight: pillar.weight,
                topic_count: pillar.topics.len(),
            })
            .collect();

        let topic_scores = rollup
            .topics()
            .map(|(pillar, topic)| TopicScore {
                id: topic.id.clone(),
                pillar_id: pillar.id.clone(),
                name: topic.name.clone(),
                score: round_to(topic.score, 2),
                weight: topic.weight,
                metric_count: topic.metrics.len(),
            })
            .collect();

        let metric_scores = rollup
            .topics()
            .flat_map(|(_, topic)| topic.metrics.iter())
            .map(|metric| MetricScore {
                id: metric.id.clone(),
                name: metric.name.clone(),
                level: metric.level,
                weight: metric.weight,
                score: metric.score,
                hypothetical: metric.hypothetical,
            })
            .collect();

        Self {
            session_id,
            overall_score: round_to(overall, 2),
            maturity_level: MaturityLevel::classify(overall),
            pillar_scores,
            topic_scores,
            metric_scores,
            statistics,
            applied_overrides,
            algorithm_version: ALGORITHM_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionProgress {
    #[serde(flatten)]
    pub statistics: ProgressStatistics,
    pub first_answer_at: Option<DateTime<Utc>>,
    pub last_answer_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PillarProgress {
    pub pillar_id: PillarId,
    pub pillar_name: String,
    pub answered: usize,
    pub total: usize,
    pub completion_percentage: f64,
}

impl From<PillarProgressRow> for PillarProgress {
    fn from(row: PillarProgressRow) -> Self {
        Self {
            completion_percentage: completion_percentage(row.answered, row.total),
            pillar_id: row.pillar_id,
            pillar_name: row.pillar_name,
            answered: row.answered,
            total: row.total,
        }
    }
}

/// Everything a caller needs to orient itself within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    pub session: AssessmentSession,
    pub target: AssessmentTarget,
    pub current_pillar: Option<PillarRef>,
    pub organization: Option<Organization>,
    pub progress: SessionProgress,
    pub recent_activity: Vec<RecentAnswer>,
    pub pillar_progress: Vec<PillarProgress>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricGuidance {
    pub recommendation: String,
}

impl MetricGuidance {
    pub fn for_level(level: u8) -> Self {
        Self {
            recommendation: format!("Focus on Level {level} requirements"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDetail {
    pub metric: Metric,
    pub topic: Topic,
    pub pillar: Pillar,
    pub guidance: MetricGuidance,
}
