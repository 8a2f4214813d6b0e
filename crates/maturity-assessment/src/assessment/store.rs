use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    AnswerSpan, AnsweredMetric, AssessmentResult, AssessmentSession, AssessmentTarget, Metric,
    MetricId, MetricPlacement, Organization, Pillar, PillarId, PillarProgressRow, PillarRef,
    RecentAnswer, SessionId, SessionRecord, Topic, TopicId,
};
use super::loader::{HierarchyLoader, LoaderError};

/// Serializable snapshot of reference data, sessions, and recorded answers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssessmentDataset {
    #[serde(default)]
    pub organizations: Vec<Organization>,
    #[serde(default)]
    pub targets: Vec<AssessmentTarget>,
    pub pillars: Vec<Pillar>,
    pub topics: Vec<Topic>,
    pub metrics: Vec<Metric>,
    #[serde(default)]
    pub sessions: Vec<AssessmentSession>,
    #[serde(default)]
    pub results: Vec<AssessmentResult>,
}

/// Loader backed by an in-process dataset.
#[derive(Debug, Default, Clone)]
pub struct InMemoryAssessmentStore {
    data: Arc<RwLock<AssessmentDataset>>,
}

impl InMemoryAssessmentStore {
    pub fn new(dataset: AssessmentDataset) -> Self {
        Self {
            data: Arc::new(RwLock::new(dataset)),
        }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LoaderError> {
        let dataset: AssessmentDataset = serde_json::from_reader(reader)
            .map_err(|err| LoaderError::Malformed(format!("invalid dataset JSON: {err}")))?;
        Ok(Self::new(dataset))
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, LoaderError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|err| {
            LoaderError::Unavailable(format!("cannot open {}: {err}", path.display()))
        })?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn snapshot(&self) -> Result<AssessmentDataset, LoaderError> {
        Ok(self.read()?.clone())
    }

    /// Stores `value` as the current answer for (session, metric), replacing any earlier one.
    pub fn record_answer(
        &self,
        session_id: &SessionId,
        metric_id: &MetricId,
        value: f64,
        assessed_at: DateTime<Utc>,
    ) -> Result<(), LoaderError> {
        if !value.is_finite() {
            return Err(LoaderError::Malformed(format!(
                "answer for metric {metric_id} must be a finite number"
            )));
        }
        let mut data = self.write()?;

        if !data.metrics.iter().any(|metric| &metric.id == metric_id) {
            return Err(LoaderError::Malformed(format!("unknown metric {metric_id}")));
        }
        let Some(session) = data
            .sessions
            .iter_mut()
            .find(|session| &session.id == session_id)
        else {
            return Err(LoaderError::Malformed(format!(
                "unknown session {session_id}"
            )));
        };
        if assessed_at > session.last_modified {
            session.last_modified = assessed_at;
        }

        match data
            .results
            .iter_mut()
            .find(|result| &result.session_id == session_id && &result.metric_id == metric_id)
        {
            Some(existing) => {
                existing.value = value;
                existing.assessed_at = assessed_at;
            }
            None => data.results.push(AssessmentResult {
                session_id: session_id.clone(),
                metric_id: metric_id.clone(),
                value,
                assessed_at,
            }),
        }

        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, AssessmentDataset>, LoaderError> {
        self.data
            .read()
            .map_err(|_| LoaderError::Unavailable("assessment store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, AssessmentDataset>, LoaderError> {
        self.data
            .write()
            .map_err(|_| LoaderError::Unavailable("assessment store lock poisoned".to_string()))
    }
}

/// Borrowed lookup tables over one locked dataset.
struct Joins<'a> {
    data: &'a AssessmentDataset,
    metrics: HashMap<&'a MetricId, &'a Metric>,
    topics: HashMap<&'a TopicId, &'a Topic>,
    pillars: HashMap<&'a PillarId, &'a Pillar>,
}

impl<'a> Joins<'a> {
    fn new(data: &'a AssessmentDataset) -> Self {
        Self {
            data,
            metrics: data.metrics.iter().map(|m| (&m.id, m)).collect(),
            topics: data.topics.iter().map(|t| (&t.id, t)).collect(),
            pillars: data.pillars.iter().map(|p| (&p.id, p)).collect(),
        }
    }

    /// Active metric with its topic and pillar; `None` for unknown or inactive metrics.
    fn placement(
        &self,
        metric_id: &MetricId,
    ) -> Result<Option<(&'a Metric, &'a Topic, &'a Pillar)>, LoaderError> {
        let Some(metric) = self.metrics.get(metric_id).copied() else {
            return Ok(None);
        };
        if !metric.active {
            return Ok(None);
        }

        let topic = self.topics.get(&metric.topic_id).copied().ok_or_else(|| {
            LoaderError::Malformed(format!(
                "metric {} references unknown topic {}",
                metric.id, metric.topic_id
            ))
        })?;
        let pillar = self.pillars.get(&topic.pillar_id).copied().ok_or_else(|| {
            LoaderError::Malformed(format!(
                "topic {} references unknown pillar {}",
                topic.id, topic.pillar_id
            ))
        })?;

        Ok(Some((metric, topic, pillar)))
    }

    fn session_results(
        &self,
        session_id: &'a SessionId,
    ) -> impl Iterator<Item = &'a AssessmentResult> + 'a {
        let data: &'a AssessmentDataset = self.data;
        data.results
            .iter()
            .filter(move |result| &result.session_id == session_id)
    }
}

impl HierarchyLoader for InMemoryAssessmentStore {
    fn fetch_answered_metrics(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<AnsweredMetric>, LoaderError> {
        let data = self.read()?;
        let joins = Joins::new(&data);

        let mut rows = Vec::new();
        for result in joins.session_results(session_id) {
            if let Some((metric, topic, pillar)) = joins.placement(&result.metric_id)? {
                rows.push(AnsweredMetric {
                    metric_id: metric.id.clone(),
                    value: result.value,
                    metric_name: metric.name.clone(),
                    metric_level: metric.level,
                    metric_weight: metric.weight,
                    topic_id: topic.id.clone(),
                    topic_name: topic.name.clone(),
                    topic_weight: topic.weight,
                    pillar_id: pillar.id.clone(),
                    pillar_name: pillar.name.clone(),
                    pillar_weight: pillar.weight,
                });
            }
        }

        rows.sort_by(|a, b| a.hierarchy_key().cmp(&b.hierarchy_key()));
        Ok(rows)
    }

    fn count_active_metrics(&self) -> Result<usize, LoaderError> {
        let data = self.read()?;
        Ok(data.metrics.iter().filter(|metric| metric.active).count())
    }

    fn fetch_session_context(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<SessionRecord>, LoaderError> {
        let data = self.read()?;
        let Some(session) = data.sessions.iter().find(|session| &session.id == session_id) else {
            return Ok(None);
        };

        let target = data
            .targets
            .iter()
            .find(|target| target.id == session.target_id)
            .ok_or_else(|| {
                LoaderError::Malformed(format!(
                    "session {} references unknown target {}",
                    session.id, session.target_id
                ))
            })?;

        let current_pillar = session.current_pillar_id.as_ref().and_then(|pillar_id| {
            data.pillars
                .iter()
                .find(|pillar| &pillar.id == pillar_id)
                .map(|pillar| PillarRef {
                    id: pillar.id.clone(),
                    name: pillar.name.clone(),
                })
        });

        let organization = target.organization_id.as_ref().and_then(|org_id| {
            data.organizations
                .iter()
                .find(|org| &org.id == org_id)
                .cloned()
        });

        Ok(Some(SessionRecord {
            session: session.clone(),
            target: target.clone(),
            current_pillar,
            organization,
        }))
    }

    fn fetch_answer_span(&self, session_id: &SessionId) -> Result<AnswerSpan, LoaderError> {
        let data = self.read()?;
        let joins = Joins::new(&data);

        let mut span = AnswerSpan::default();
        for result in joins.session_results(session_id) {
            if joins.placement(&result.metric_id)?.is_none() {
                continue;
            }
            span.answered += 1;
            span.first_answer_at = Some(match span.first_answer_at {
                Some(first) => first.min(result.assessed_at),
                None => result.assessed_at,
            });
            span.last_answer_at = Some(match span.last_answer_at {
                Some(last) => last.max(result.assessed_at),
                None => result.assessed_at,
            });
        }

        Ok(span)
    }

    fn fetch_recent_answers(
        &self,
        session_id: &SessionId,
        limit: usize,
    ) -> Result<Vec<RecentAnswer>, LoaderError> {
        let data = self.read()?;
        let joins = Joins::new(&data);

        let mut recent = Vec::new();
        for result in joins.session_results(session_id) {
            if let Some((metric, topic, pillar)) = joins.placement(&result.metric_id)? {
                recent.push(RecentAnswer {
                    metric_id: metric.id.clone(),
                    value: result.value,
                    assessed_at: result.assessed_at,
                    metric_name: metric.name.clone(),
                    topic_name: topic.name.clone(),
                    pillar_name: pillar.name.clone(),
                });
            }
        }

        recent.sort_by(|a, b| b.assessed_at.cmp(&a.assessed_at));
        recent.truncate(limit);
        Ok(recent)
    }

    fn fetch_pillar_progress(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<PillarProgressRow>, LoaderError> {
        let data = self.read()?;
        let joins = Joins::new(&data);

        let mut pillars: Vec<&Pillar> = data.pillars.iter().filter(|p| p.active).collect();
        pillars.sort_by(|a, b| a.name.cmp(&b.name));

        let mut rows = Vec::with_capacity(pillars.len());
        for pillar in pillars {
            let metric_ids: Vec<&MetricId> = data
                .metrics
                .iter()
                .filter(|metric| metric.active)
                .filter(|metric| {
                    joins
                        .topics
                        .get(&metric.topic_id)
                        .map(|topic| topic.pillar_id == pillar.id)
                        .unwrap_or(false)
                })
                .map(|metric| &metric.id)
                .collect();

            let answered = joins
                .session_results(session_id)
                .filter(|result| metric_ids.contains(&&result.metric_id))
                .count();

            rows.push(PillarProgressRow {
                pillar_id: pillar.id.clone(),
                pillar_name: pillar.name.clone(),
                answered,
                total: metric_ids.len(),
            });
        }

        Ok(rows)
    }

    fn fetch_metric(&self, metric_id: &MetricId) -> Result<Option<MetricPlacement>, LoaderError> {
        let data = self.read()?;
        let joins = Joins::new(&data);

        Ok(joins
            .placement(metric_id)?
            .map(|(metric, topic, pillar)| MetricPlacement {
                metric: metric.clone(),
                topic: topic.clone(),
                pillar: pillar.clone(),
            }))
    }
}
