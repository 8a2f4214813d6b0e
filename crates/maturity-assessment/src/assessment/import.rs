use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};

use super::domain::{MetricId, SessionId};
use super::loader::LoaderError;
use super::store::InMemoryAssessmentStore;

#[derive(Debug)]
pub enum AnswerImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Store(LoaderError),
}

impl std::fmt::Display for AnswerImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnswerImportError::Io(err) => write!(f, "failed to read answer export: {}", err),
            AnswerImportError::Csv(err) => write!(f, "invalid answer CSV data: {}", err),
            AnswerImportError::Store(err) => {
                write!(f, "could not record imported answer: {}", err)
            }
        }
    }
}

impl std::error::Error for AnswerImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AnswerImportError::Io(err) => Some(err),
            AnswerImportError::Csv(err) => Some(err),
            AnswerImportError::Store(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for AnswerImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for AnswerImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<LoaderError> for AnswerImportError {
    fn from(err: LoaderError) -> Self {
        Self::Store(err)
    }
}

/// Records answers from a `Metric ID,Value,Assessed At` CSV export into a store.
pub struct AnswerImporter;

impl AnswerImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        store: &InMemoryAssessmentStore,
        session_id: &SessionId,
        imported_at: DateTime<Utc>,
    ) -> Result<usize, AnswerImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, store, session_id, imported_at)
    }

    /// Returns the number of rows applied. Rows without a timestamp use `imported_at`;
    /// a later row for the same metric overwrites an earlier one.
    pub fn from_reader<R: Read>(
        reader: R,
        store: &InMemoryAssessmentStore,
        session_id: &SessionId,
        imported_at: DateTime<Utc>,
    ) -> Result<usize, AnswerImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut applied = 0;

        for record in csv_reader.deserialize::<AnswerRow>() {
            let row = record?;
            let assessed_at = row
                .assessed_at
                .as_deref()
                .and_then(parse_timestamp)
                .unwrap_or(imported_at);

            store.record_answer(session_id, &MetricId(row.metric_id), row.value, assessed_at)?;
            applied += 1;
        }

        Ok(applied)
    }
}

#[derive(Debug, Deserialize)]
struct AnswerRow {
    #[serde(rename = "Metric ID")]
    metric_id: String,
    #[serde(rename = "Value")]
    value: f64,
    #[serde(
        rename = "Assessed At",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    assessed_at: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::tests::common::{sample_store, timestamp};
    use crate::assessment::HierarchyLoader;
    use std::io::Cursor;

    #[test]
    fn imports_rows_and_overwrites_repeats() {
        let store = sample_store();
        let session = SessionId::from("session-empty");
        let csv = "Metric ID,Value,Assessed At\n\
                   sec-iam-mfa,2,2025-03-01T09:00:00Z\n\
                   sec-iam-mfa,4,2025-03-02\n\
                   rel-obs-alerts,3,\n";

        let applied = AnswerImporter::from_reader(
            Cursor::new(csv),
            &store,
            &session,
            timestamp("2025-03-05T00:00:00Z"),
        )
        .expect("import succeeds");

        assert_eq!(applied, 3);
        let answers = store
            .fetch_answered_metrics(&session)
            .expect("answers load");
        assert_eq!(answers.len(), 2);
        let mfa = answers
            .iter()
            .find(|row| row.metric_id.as_str() == "sec-iam-mfa")
            .expect("mfa answered");
        assert_eq!(mfa.value, 4.0);

        let recent = store
            .fetch_recent_answers(&session, 1)
            .expect("recent answers load");
        assert_eq!(recent[0].metric_id.as_str(), "rel-obs-alerts");
    }

    #[test]
    fn unknown_metric_is_rejected() {
        let store = sample_store();
        let csv = "Metric ID,Value,Assessed At\nnope,2,\n";

        let result = AnswerImporter::from_reader(
            Cursor::new(csv),
            &store,
            &SessionId::from("session-empty"),
            timestamp("2025-03-05T00:00:00Z"),
        );

        assert!(matches!(
            result,
            Err(AnswerImportError::Store(LoaderError::Malformed(_)))
        ));
    }

    #[test]
    fn non_numeric_value_is_a_csv_error() {
        let store = sample_store();
        let csv = "Metric ID,Value,Assessed At\nsec-iam-mfa,high,\n";

        let result = AnswerImporter::from_reader(
            Cursor::new(csv),
            &store,
            &SessionId::from("session-empty"),
            timestamp("2025-03-05T00:00:00Z"),
        );

        assert!(matches!(result, Err(AnswerImportError::Csv(_))));
    }

    #[test]
    fn non_finite_value_is_rejected_by_the_store() {
        let store = sample_store();
        let session = SessionId::from("session-empty");
        let csv = "Metric ID,Value,Assessed At\n\
                   sec-iam-mfa,4,\n\
                   sec-iam-review,NaN,\n";

        let result = AnswerImporter::from_reader(
            Cursor::new(csv),
            &store,
            &session,
            timestamp("2025-03-05T00:00:00Z"),
        );

        assert!(matches!(
            result,
            Err(AnswerImportError::Store(LoaderError::Malformed(_)))
        ));
        let answers = store
            .fetch_answered_metrics(&session)
            .expect("answers load");
        assert!(answers.iter().all(|row| row.value.is_finite()));
        assert!(answers
            .iter()
            .all(|row| row.metric_id.as_str() != "sec-iam-review"));
    }

    #[test]
    fn parses_dates_and_rfc3339() {
        assert_eq!(
            parse_timestamp("2025-03-02"),
            Some(timestamp("2025-03-02T00:00:00Z"))
        );
        assert_eq!(
            parse_timestamp("2025-03-02T10:30:00+02:00"),
            Some(timestamp("2025-03-02T08:30:00Z"))
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
