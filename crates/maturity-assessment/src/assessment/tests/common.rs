use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::assessment::domain::{
    AnswerSpan, AnsweredMetric, AssessmentResult, AssessmentSession, AssessmentTarget, Metric,
    MetricId, MetricPlacement, Organization, OrganizationId, Pillar, PillarId, PillarProgressRow,
    RecentAnswer, SessionId, SessionRecord, SessionStatus, TargetId, Topic, TopicId,
};
use crate::assessment::loader::{HierarchyLoader, LoaderError};
use crate::assessment::store::{AssessmentDataset, InMemoryAssessmentStore};
use crate::assessment::{assessment_router, AssessmentService};

pub(crate) fn timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

fn pillar(id: &str, name: &str, weight: f64, active: bool) -> Pillar {
    Pillar {
        id: PillarId::from(id),
        name: name.to_string(),
        description: format!("{name} practices"),
        category: "technical".to_string(),
        weight,
        active,
    }
}

fn topic(id: &str, pillar_id: &str, name: &str, weight: f64) -> Topic {
    Topic {
        id: TopicId::from(id),
        pillar_id: PillarId::from(pillar_id),
        name: name.to_string(),
        description: String::new(),
        weight,
    }
}

fn metric(id: &str, topic_id: &str, name: &str, level: u8, active: bool) -> Metric {
    Metric {
        id: MetricId::from(id),
        topic_id: TopicId::from(topic_id),
        name: name.to_string(),
        description: format!("{name} maturity"),
        level,
        metric_type: "scale".to_string(),
        min_value: 1.0,
        max_value: 5.0,
        weight: 1.0,
        tags: vec!["core".to_string()],
        active,
    }
}

fn session(id: &str, status: SessionStatus, current_pillar: Option<&str>) -> AssessmentSession {
    AssessmentSession {
        id: SessionId::from(id),
        target_id: TargetId::from("target-payments"),
        status,
        started_at: timestamp("2025-02-01T08:00:00Z"),
        completed_at: None,
        last_modified: timestamp("2025-02-01T08:00:00Z"),
        current_pillar_id: current_pillar.map(PillarId::from),
    }
}

fn answer(metric_id: &str, value: f64, hour: u32) -> AssessmentResult {
    AssessmentResult {
        session_id: SessionId::from("session-main"),
        metric_id: MetricId::from(metric_id),
        value,
        assessed_at: timestamp(&format!("2025-02-01T{hour:02}:00:00Z")),
    }
}

/// Two scored pillars (Security weight 2, Reliability weight 1), one pillar without
/// answers, and one inactive pillar.
///
/// `session-main` scores Security 3.0 and Reliability 1.5 for an overall 2.5 (DEFINED),
/// with 5 of 7 active metrics answered. `session-empty` has no answers.
pub(crate) fn sample_dataset() -> AssessmentDataset {
    AssessmentDataset {
        organizations: vec![Organization {
            id: OrganizationId::from("org-acme"),
            name: "Acme Corp".to_string(),
        }],
        targets: vec![AssessmentTarget {
            id: TargetId::from("target-payments"),
            name: "Payments Platform".to_string(),
            target_type: "system".to_string(),
            description: "Card processing services".to_string(),
            organization_id: Some(OrganizationId::from("org-acme")),
        }],
        pillars: vec![
            pillar("pil-sec", "Security", 2.0, true),
            pillar("pil-rel", "Reliability", 1.0, true),
            pillar("pil-ops", "Operations", 1.0, true),
            pillar("pil-legacy", "Legacy", 1.0, false),
        ],
        topics: vec![
            topic("top-iam", "pil-sec", "Identity & Access", 2.0),
            topic("top-vuln", "pil-sec", "Vulnerability Management", 1.0),
            topic("top-obs", "pil-rel", "Observability", 1.0),
            topic("top-dr", "pil-rel", "Disaster Recovery", 1.0),
            topic("top-change", "pil-ops", "Change Management", 1.0),
        ],
        metrics: vec![
            metric("sec-iam-mfa", "top-iam", "MFA Coverage", 2, true),
            metric("sec-iam-review", "top-iam", "Access Reviews", 3, true),
            metric("sec-vuln-scan", "top-vuln", "Dependency Scanning", 2, true),
            metric("sec-legacy-audit", "top-vuln", "Manual Audit", 1, false),
            metric("rel-obs-alerts", "top-obs", "Alert Routing", 2, true),
            metric("rel-obs-slo", "top-obs", "SLO Coverage", 4, true),
            metric("rel-dr-backups", "top-dr", "Backup Restores", 3, true),
            metric("ops-change-review", "top-change", "Change Review", 2, true),
        ],
        sessions: vec![
            session("session-main", SessionStatus::InProgress, Some("pil-rel")),
            session("session-empty", SessionStatus::InProgress, None),
        ],
        results: vec![
            answer("sec-iam-mfa", 4.0, 9),
            answer("sec-iam-review", 3.0, 10),
            answer("sec-vuln-scan", 2.0, 11),
            answer("rel-obs-alerts", 2.0, 12),
            answer("rel-obs-slo", 1.0, 13),
            answer("sec-legacy-audit", 5.0, 14),
        ],
    }
}

pub(crate) fn sample_store() -> InMemoryAssessmentStore {
    InMemoryAssessmentStore::new(sample_dataset())
}

pub(crate) fn build_service() -> (
    AssessmentService<InMemoryAssessmentStore>,
    Arc<InMemoryAssessmentStore>,
) {
    let store = Arc::new(sample_store());
    let service = AssessmentService::new(store.clone());
    (service, store)
}

pub(crate) fn router_with_sample_data() -> axum::Router {
    let (service, _) = build_service();
    assessment_router(Arc::new(service))
}

pub(crate) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Loader whose every call fails as if the database were offline.
pub(crate) struct UnavailableLoader;

fn offline<T>() -> Result<T, LoaderError> {
    Err(LoaderError::Unavailable("database offline".to_string()))
}

impl HierarchyLoader for UnavailableLoader {
    fn fetch_answered_metrics(&self, _: &SessionId) -> Result<Vec<AnsweredMetric>, LoaderError> {
        offline()
    }

    fn count_active_metrics(&self) -> Result<usize, LoaderError> {
        offline()
    }

    fn fetch_session_context(&self, _: &SessionId) -> Result<Option<SessionRecord>, LoaderError> {
        offline()
    }

    fn fetch_answer_span(&self, _: &SessionId) -> Result<AnswerSpan, LoaderError> {
        offline()
    }

    fn fetch_recent_answers(
        &self,
        _: &SessionId,
        _: usize,
    ) -> Result<Vec<RecentAnswer>, LoaderError> {
        offline()
    }

    fn fetch_pillar_progress(&self, _: &SessionId) -> Result<Vec<PillarProgressRow>, LoaderError> {
        offline()
    }

    fn fetch_metric(&self, _: &MetricId) -> Result<Option<MetricPlacement>, LoaderError> {
        offline()
    }
}

/// Delegates to the sample store but fails the listing queries used by session context.
pub(crate) struct FlakyListingLoader {
    pub(crate) inner: InMemoryAssessmentStore,
}

impl HierarchyLoader for FlakyListingLoader {
    fn fetch_answered_metrics(&self, id: &SessionId) -> Result<Vec<AnsweredMetric>, LoaderError> {
        self.inner.fetch_answered_metrics(id)
    }

    fn count_active_metrics(&self) -> Result<usize, LoaderError> {
        self.inner.count_active_metrics()
    }

    fn fetch_session_context(&self, id: &SessionId) -> Result<Option<SessionRecord>, LoaderError> {
        self.inner.fetch_session_context(id)
    }

    fn fetch_answer_span(&self, id: &SessionId) -> Result<AnswerSpan, LoaderError> {
        self.inner.fetch_answer_span(id)
    }

    fn fetch_recent_answers(
        &self,
        _: &SessionId,
        _: usize,
    ) -> Result<Vec<RecentAnswer>, LoaderError> {
        Err(LoaderError::Malformed("join on metrics failed".to_string()))
    }

    fn fetch_pillar_progress(&self, _: &SessionId) -> Result<Vec<PillarProgressRow>, LoaderError> {
        Err(LoaderError::Malformed("join on topics failed".to_string()))
    }

    fn fetch_metric(&self, id: &MetricId) -> Result<Option<MetricPlacement>, LoaderError> {
        self.inner.fetch_metric(id)
    }
}
