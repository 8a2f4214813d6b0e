use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Blank or whitespace-only identifiers count as absent.
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

identifier!(
    /// Identifier wrapper for assessment sessions.
    SessionId
);
identifier!(
    /// Identifier wrapper for leaf-level metrics.
    MetricId
);
identifier!(TopicId);
identifier!(PillarId);
identifier!(TargetId);
identifier!(OrganizationId);

fn active_by_default() -> bool {
    true
}

/// Top-level maturity category, weighted against its sibling pillars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pillar {
    pub id: PillarId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub weight: f64,
    #[serde(default = "active_by_default")]
    pub active: bool,
}

/// Subdivision of a pillar; its weight is relative to the other topics of the same pillar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: TopicId,
    pub pillar_id: PillarId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub weight: f64,
}

/// Single assessable attribute targeting one assessment level (1-5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub id: MetricId,
    pub topic_id: TopicId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub level: u8,
    #[serde(default, rename = "type")]
    pub metric_type: String,
    pub min_value: f64,
    pub max_value: f64,
    pub weight: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "active_by_default")]
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
}

/// The system or team under assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentTarget {
    pub id: TargetId,
    pub name: String,
    #[serde(rename = "type")]
    pub target_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<OrganizationId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Paused,
    Completed,
}

impl SessionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::InProgress => "In Progress",
            Self::Paused => "Paused",
            Self::Completed => "Completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentSession {
    pub id: SessionId,
    pub target_id: TargetId,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub last_modified: DateTime<Utc>,
    #[serde(default)]
    pub current_pillar_id: Option<PillarId>,
}

/// Recorded answer for one (session, metric) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub session_id: SessionId,
    pub metric_id: MetricId,
    pub value: f64,
    pub assessed_at: DateTime<Utc>,
}

/// One answered metric joined with its topic and pillar metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnsweredMetric {
    pub metric_id: MetricId,
    pub value: f64,
    pub metric_name: String,
    pub metric_level: u8,
    pub metric_weight: f64,
    pub topic_id: TopicId,
    pub topic_name: String,
    pub topic_weight: f64,
    pub pillar_id: PillarId,
    pub pillar_name: String,
    pub pillar_weight: f64,
}

impl AnsweredMetric {
    /// Sort key for answer sets: pillar name, then topic name, then metric name.
    pub fn hierarchy_key(&self) -> (&str, &str, &str) {
        (
            self.pillar_name.as_str(),
            self.topic_name.as_str(),
            self.metric_name.as_str(),
        )
    }
}

/// Transient what-if answer; supersedes the stored value for a single calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypotheticalOverride {
    pub metric_id: MetricId,
    pub value: f64,
}

impl HypotheticalOverride {
    pub fn new(metric_id: impl Into<String>, value: f64) -> Self {
        Self {
            metric_id: MetricId(metric_id.into()),
            value,
        }
    }
}

/// An active metric together with its owning topic and pillar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPlacement {
    pub metric: Metric,
    pub topic: Topic,
    pub pillar: Pillar,
}

impl MetricPlacement {
    /// Shapes the placement like a loaded answer row carrying `value`.
    pub fn answer_with(&self, value: f64) -> AnsweredMetric {
        AnsweredMetric {
            metric_id: self.metric.id.clone(),
            value,
            metric_name: self.metric.name.clone(),
            metric_level: self.metric.level,
            metric_weight: self.metric.weight,
            topic_id: self.topic.id.clone(),
            topic_name: self.topic.name.clone(),
            topic_weight: self.topic.weight,
            pillar_id: self.pillar.id.clone(),
            pillar_name: self.pillar.name.clone(),
            pillar_weight: self.pillar.weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PillarRef {
    pub id: PillarId,
    pub name: String,
}

/// Session joined with its target and the optional pillar/organization lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session: AssessmentSession,
    pub target: AssessmentTarget,
    pub current_pillar: Option<PillarRef>,
    pub organization: Option<Organization>,
}

/// Answered count and the first/last answer timestamps for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSpan {
    pub answered: usize,
    pub first_answer_at: Option<DateTime<Utc>>,
    pub last_answer_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentAnswer {
    pub metric_id: MetricId,
    pub value: f64,
    pub assessed_at: DateTime<Utc>,
    pub metric_name: String,
    pub topic_name: String,
    pub pillar_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PillarProgressRow {
    pub pillar_id: PillarId,
    pub pillar_name: String,
    pub answered: usize,
    pub total: usize,
}
