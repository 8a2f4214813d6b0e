use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::domain::{HypotheticalOverride, MetricId, SessionId};
use super::loader::HierarchyLoader;
use super::service::{AssessmentService, ServiceError};

/// Optional what-if payload for the score endpoint.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ScoreRequest {
    #[serde(default)]
    pub answers: Vec<HypotheticalOverride>,
}

/// Router builder exposing score, context, and metric lookups.
pub fn assessment_router<L>(service: Arc<AssessmentService<L>>) -> Router
where
    L: HierarchyLoader + 'static,
{
    Router::new()
        .route(
            "/api/v1/sessions/:session_id/scores",
            post(scores_handler::<L>),
        )
        .route(
            "/api/v1/sessions/:session_id/context",
            get(context_handler::<L>),
        )
        .route("/api/v1/metrics/:metric_id", get(metric_handler::<L>))
        .with_state(service)
}

pub(crate) async fn scores_handler<L>(
    State(service): State<Arc<AssessmentService<L>>>,
    Path(session_id): Path<String>,
    body: Bytes,
) -> Response
where
    L: HierarchyLoader + 'static,
{
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        ScoreRequest::default()
    } else {
        match serde_json::from_slice::<ScoreRequest>(&body) {
            Ok(request) => request,
            Err(err) => {
                let payload = json!({
                    "error": format!("invalid score request: {err}"),
                    "code": "INVALID_REQUEST",
                });
                return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
            }
        }
    };

    match service.calculate_scores(&SessionId(session_id), &request.answers) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn context_handler<L>(
    State(service): State<Arc<AssessmentService<L>>>,
    Path(session_id): Path<String>,
) -> Response
where
    L: HierarchyLoader + 'static,
{
    match service.session_context(&SessionId(session_id)) {
        Ok(context) => (StatusCode::OK, Json(context)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn metric_handler<L>(
    State(service): State<Arc<AssessmentService<L>>>,
    Path(metric_id): Path<String>,
) -> Response
where
    L: HierarchyLoader + 'static,
{
    match service.metric_details(&MetricId(metric_id)) {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(err) => err.into_response(),
    }
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::MissingRequiredInput { .. } | ServiceError::InvalidOverride { .. } => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::UpstreamDataUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let mut payload = Map::new();
        payload.insert("error".to_string(), Value::String(self.to_string()));
        payload.insert("code".to_string(), Value::String(self.code().to_string()));
        match &self {
            ServiceError::NotFound { entity, id } => {
                payload.insert(entity.id_field().to_string(), Value::String(id.clone()));
            }
            ServiceError::InvalidOverride { metric_id } => {
                payload.insert("metric_id".to_string(), Value::String(metric_id.to_string()));
            }
            _ => {}
        }

        (self.status_code(), Json(Value::Object(payload))).into_response()
    }
}
