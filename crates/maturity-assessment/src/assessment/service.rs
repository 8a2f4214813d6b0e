use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::domain::{HypotheticalOverride, MetricId, SessionId};
use super::loader::{HierarchyLoader, LoaderError};
use super::scoring::{ProgressStatistics, ScoreRollup, WhatIfOverlay};
use super::views::{
    MetricDetail, MetricGuidance, PillarProgress, ScoreReport, SessionContext, SessionProgress,
};

pub const DEFAULT_RECENT_ACTIVITY_LIMIT: usize = 5;

/// Entry point for score calculation, session context, and metric lookups.
///
/// Holds no mutable state; every call reads a fresh snapshot through the loader.
pub struct AssessmentService<L> {
    loader: Arc<L>,
    recent_activity_limit: usize,
}

impl<L> AssessmentService<L>
where
    L: HierarchyLoader + 'static,
{
    pub fn new(loader: Arc<L>) -> Self {
        Self {
            loader,
            recent_activity_limit: DEFAULT_RECENT_ACTIVITY_LIMIT,
        }
    }

    pub fn with_recent_activity_limit(mut self, limit: usize) -> Self {
        self.recent_activity_limit = limit;
        self
    }

    /// Scores a session, optionally with what-if overrides applied on top of stored answers.
    ///
    /// Statistics always describe stored completion; overrides only affect scores.
    pub fn calculate_scores(
        &self,
        session_id: &SessionId,
        overrides: &[HypotheticalOverride],
    ) -> Result<ScoreReport, ServiceError> {
        require_session_id(session_id)?;
        for candidate in overrides {
            if candidate.metric_id.is_blank() {
                return Err(ServiceError::MissingRequiredInput { field: "metric_id" });
            }
            if !candidate.value.is_finite() {
                return Err(ServiceError::InvalidOverride {
                    metric_id: candidate.metric_id.clone(),
                });
            }
        }

        if self.loader.fetch_session_context(session_id)?.is_none() {
            return Err(ServiceError::not_found(EntityKind::Session, session_id.as_str()));
        }

        let stored = self.loader.fetch_answered_metrics(session_id)?;
        let total = self.loader.count_active_metrics()?;
        let statistics = ProgressStatistics::compute(total, stored.len());
        debug!(
            session_id = %session_id,
            answered = stored.len(),
            total,
            overrides = overrides.len(),
            "loaded assessment answers"
        );

        let overlay = WhatIfOverlay::new(overrides.iter().cloned());
        let mut placements = Vec::new();
        for metric_id in overlay.unanswered(&stored) {
            let placement = self
                .loader
                .fetch_metric(metric_id)?
                .ok_or_else(|| ServiceError::not_found(EntityKind::Metric, metric_id.as_str()))?;
            placements.push(placement.answer_with(0.0));
        }
        let merged = overlay.apply(&stored, &placements);

        if merged.is_empty() {
            info!(session_id = %session_id, "no answers recorded; returning empty score report");
            return Ok(ScoreReport::empty(session_id.clone(), statistics));
        }

        let rollup = ScoreRollup::from_answers(&merged);
        let report =
            ScoreReport::from_rollup(session_id.clone(), &rollup, statistics, overlay.len());

        info!(
            session_id = %session_id,
            overall_score = report.overall_score,
            maturity_level = report.maturity_level.label(),
            what_if = !overlay.is_empty(),
            "calculated maturity scores"
        );
        Ok(report)
    }

    /// Session, target, progress, and recent activity for a session.
    ///
    /// The recent-activity and pillar-progress listings degrade to empty lists when the
    /// loader fails on them.
    pub fn session_context(&self, session_id: &SessionId) -> Result<SessionContext, ServiceError> {
        require_session_id(session_id)?;

        let record = self
            .loader
            .fetch_session_context(session_id)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Session, session_id.as_str()))?;

        let span = self.loader.fetch_answer_span(session_id)?;
        let total = self.loader.count_active_metrics()?;
        let progress = SessionProgress {
            statistics: ProgressStatistics::compute(total, span.answered),
            first_answer_at: span.first_answer_at,
            last_answer_at: span.last_answer_at,
        };

        let recent_activity = self
            .loader
            .fetch_recent_answers(session_id, self.recent_activity_limit)
            .unwrap_or_else(|err| {
                warn!(session_id = %session_id, error = %err, "recent activity unavailable");
                Vec::new()
            });

        let pillar_progress = self
            .loader
            .fetch_pillar_progress(session_id)
            .map(|rows| rows.into_iter().map(PillarProgress::from).collect())
            .unwrap_or_else(|err| {
                warn!(session_id = %session_id, error = %err, "pillar progress unavailable");
                Vec::new()
            });

        debug!(
            session_id = %session_id,
            completion = progress.statistics.completion_percentage,
            "assembled session context"
        );

        Ok(SessionContext {
            session: record.session,
            target: record.target,
            current_pillar: record.current_pillar,
            organization: record.organization,
            progress,
            recent_activity,
            pillar_progress,
        })
    }

    pub fn metric_details(&self, metric_id: &MetricId) -> Result<MetricDetail, ServiceError> {
        if metric_id.is_blank() {
            return Err(ServiceError::MissingRequiredInput { field: "metric_id" });
        }

        let placement = self
            .loader
            .fetch_metric(metric_id)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Metric, metric_id.as_str()))?;

        Ok(MetricDetail {
            guidance: MetricGuidance::for_level(placement.metric.level),
            metric: placement.metric,
            topic: placement.topic,
            pillar: placement.pillar,
        })
    }
}

fn require_session_id(session_id: &SessionId) -> Result<(), ServiceError> {
    if session_id.is_blank() {
        return Err(ServiceError::MissingRequiredInput {
            field: "session_id",
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Session,
    Metric,
}

impl EntityKind {
    /// Response field that echoes the requested identifier.
    pub const fn id_field(self) -> &'static str {
        match self {
            Self::Session => "session_id",
            Self::Metric => "metric_id",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session => f.write_str("assessment session"),
            Self::Metric => f.write_str("metric"),
        }
    }
}

/// Error raised by the assessment service.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ServiceError {
    #[error("{field} parameter is required")]
    MissingRequiredInput { field: &'static str },
    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityKind, id: String },
    #[error("hypothetical value for metric {metric_id} must be a finite number")]
    InvalidOverride { metric_id: MetricId },
    #[error(transparent)]
    UpstreamDataUnavailable(#[from] LoaderError),
}

impl ServiceError {
    fn not_found(entity: EntityKind, id: &str) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingRequiredInput { .. } => "MISSING_REQUIRED_INPUT",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::InvalidOverride { .. } => "INVALID_OVERRIDE",
            Self::UpstreamDataUnavailable(_) => "UPSTREAM_DATA_UNAVAILABLE",
        }
    }
}
