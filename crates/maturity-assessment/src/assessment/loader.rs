use super::domain::{
    AnswerSpan, AnsweredMetric, MetricId, MetricPlacement, PillarProgressRow, RecentAnswer,
    SessionId, SessionRecord,
};

/// Read-only access to the stored hierarchy and answers.
///
/// The scoring engine never writes through this trait; implementations may be backed by a
/// database, a file, or memory.
pub trait HierarchyLoader: Send + Sync {
    /// Answered active metrics joined with topic and pillar metadata, ordered by pillar,
    /// topic, and metric name.
    fn fetch_answered_metrics(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<AnsweredMetric>, LoaderError>;

    fn count_active_metrics(&self) -> Result<usize, LoaderError>;

    fn fetch_session_context(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<SessionRecord>, LoaderError>;

    fn fetch_answer_span(&self, session_id: &SessionId) -> Result<AnswerSpan, LoaderError>;

    /// Most recent first.
    fn fetch_recent_answers(
        &self,
        session_id: &SessionId,
        limit: usize,
    ) -> Result<Vec<RecentAnswer>, LoaderError>;

    fn fetch_pillar_progress(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<PillarProgressRow>, LoaderError>;

    fn fetch_metric(&self, metric_id: &MetricId) -> Result<Option<MetricPlacement>, LoaderError>;
}

/// Failure reported by the data-access collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoaderError {
    #[error("assessment store unavailable: {0}")]
    Unavailable(String),
    #[error("malformed assessment data: {0}")]
    Malformed(String),
}
