//! Maturity assessment scoring: stored answers roll up from metrics through topics and
//! pillars into one overall score, which is classified into a maturity level.

pub mod domain;
pub mod import;
pub mod loader;
pub mod router;
pub mod scoring;
pub mod service;
pub mod store;
pub mod views;

#[cfg(test)]
pub(crate) mod tests;

pub use domain::{
    AnsweredMetric, AssessmentResult, AssessmentSession, AssessmentTarget, HypotheticalOverride,
    Metric, MetricId, Organization, Pillar, PillarId, SessionId, SessionStatus, Topic, TopicId,
};
pub use import::{AnswerImportError, AnswerImporter};
pub use loader::{HierarchyLoader, LoaderError};
pub use router::{assessment_router, ScoreRequest};
pub use scoring::{MaturityLevel, ProgressStatistics, ALGORITHM_VERSION};
pub use service::{AssessmentService, EntityKind, ServiceError, DEFAULT_RECENT_ACTIVITY_LIMIT};
pub use store::{AssessmentDataset, InMemoryAssessmentStore};
pub use views::{
    MetricDetail, MetricScore, PillarProgress, PillarScore, ScoreReport, SessionContext,
    TopicScore,
};
