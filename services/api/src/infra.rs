use maturity_assessment::assessment::{HypotheticalOverride, InMemoryAssessmentStore, LoaderError};
use metrics_exporter_prometheus::PrometheusHandle;
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

const DEMO_DATASET: &str = include_str!("../data/demo_assessment.json");

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Loads the dataset at `path`, or the bundled demo dataset when none is configured.
pub(crate) fn load_store(path: Option<&Path>) -> Result<InMemoryAssessmentStore, LoaderError> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "loading assessment dataset");
            InMemoryAssessmentStore::from_path(path)
        }
        None => {
            info!("no dataset configured; using bundled demo dataset");
            demo_store()
        }
    }
}

pub(crate) fn demo_store() -> Result<InMemoryAssessmentStore, LoaderError> {
    InMemoryAssessmentStore::from_reader(Cursor::new(DEMO_DATASET))
}

/// Parses `METRIC=VALUE` into a what-if answer.
pub(crate) fn parse_override(raw: &str) -> Result<HypotheticalOverride, String> {
    let (metric_id, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected METRIC=VALUE, got '{raw}'"))?;
    let metric_id = metric_id.trim();
    if metric_id.is_empty() {
        return Err(format!("missing metric id in '{raw}'"));
    }
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|err| format!("failed to parse '{value}' as a number ({err})"))?;

    Ok(HypotheticalOverride::new(metric_id, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use maturity_assessment::assessment::{HierarchyLoader, SessionId};

    #[test]
    fn demo_dataset_parses() {
        let store = demo_store().expect("demo dataset loads");
        let session = SessionId::from("demo-session");

        assert_eq!(store.count_active_metrics().expect("count"), 7);
        assert_eq!(
            store
                .fetch_answered_metrics(&session)
                .expect("answers")
                .len(),
            5
        );
    }

    #[test]
    fn missing_dataset_file_is_unavailable() {
        let result = load_store(Some(Path::new("/nonexistent/assessment.json")));
        assert!(matches!(result, Err(LoaderError::Unavailable(_))));
    }

    #[test]
    fn parse_override_splits_metric_and_value() {
        let parsed = parse_override(" rel-slo = 4.5 ").expect("override parses");
        assert_eq!(parsed.metric_id.as_str(), "rel-slo");
        assert_eq!(parsed.value, 4.5);
    }

    #[test]
    fn parse_override_rejects_bad_input() {
        assert!(parse_override("rel-slo").is_err());
        assert!(parse_override("=3").is_err());
        assert!(parse_override("rel-slo=high").is_err());
    }
}
