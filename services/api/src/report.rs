use crate::infra::{load_store, parse_override};
use chrono::Utc;
use clap::Args;
use maturity_assessment::assessment::{
    AnswerImporter, AssessmentService, HypotheticalOverride, InMemoryAssessmentStore,
    MetricDetail, MetricId, ScoreReport, SessionContext, SessionId,
};
use maturity_assessment::config::AppConfig;
use maturity_assessment::error::AppError;
use maturity_assessment::telemetry::{self, LogSink};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Args, Debug, Default)]
pub(crate) struct DataArgs {
    /// Assessment dataset (JSON). Defaults to ASSESSMENT_DATA_PATH, then the bundled demo.
    #[arg(long)]
    pub(crate) data: Option<PathBuf>,
    /// Print the raw JSON payload instead of the text summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Session to score
    #[arg(long)]
    pub(crate) session: String,
    /// CSV export of answers to record before scoring (Metric ID,Value,Assessed At)
    #[arg(long)]
    pub(crate) answers: Option<PathBuf>,
    /// Hypothetical answer applied to this calculation only (METRIC=VALUE, repeatable)
    #[arg(long = "what-if", value_parser = parse_override)]
    pub(crate) what_if: Vec<HypotheticalOverride>,
    #[command(flatten)]
    pub(crate) data: DataArgs,
}

#[derive(Args, Debug)]
pub(crate) struct ContextArgs {
    /// Session to describe
    #[arg(long)]
    pub(crate) session: String,
    #[command(flatten)]
    pub(crate) data: DataArgs,
}

#[derive(Args, Debug)]
pub(crate) struct MetricArgs {
    /// Metric to look up
    #[arg(long)]
    pub(crate) id: String,
    #[command(flatten)]
    pub(crate) data: DataArgs,
}

struct CommandContext {
    config: AppConfig,
    store: Arc<InMemoryAssessmentStore>,
}

impl CommandContext {
    fn prepare(data: &DataArgs) -> Result<Self, AppError> {
        let config = AppConfig::load()?;
        telemetry::init(&config.telemetry, LogSink::Stderr)?;

        let path = data
            .data
            .clone()
            .or_else(|| config.assessment.data_path.clone());
        let store = Arc::new(load_store(path.as_deref())?);

        Ok(Self { config, store })
    }

    fn service(&self) -> AssessmentService<InMemoryAssessmentStore> {
        AssessmentService::new(self.store.clone())
            .with_recent_activity_limit(self.config.assessment.recent_activity_limit)
    }
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs {
        session,
        answers,
        what_if,
        data,
    } = args;

    let context = CommandContext::prepare(&data)?;
    let session_id = SessionId::new(session);

    if let Some(path) = answers {
        let imported = AnswerImporter::from_path(&path, &context.store, &session_id, Utc::now())?;
        info!(path = %path.display(), imported, "recorded answers from csv");
    }

    let report = context.service().calculate_scores(&session_id, &what_if)?;
    if data.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_score_report(&report));
    }
    Ok(())
}

pub(crate) fn run_context(args: ContextArgs) -> Result<(), AppError> {
    let context = CommandContext::prepare(&args.data)?;
    let session_context = context
        .service()
        .session_context(&SessionId::new(args.session))?;

    if args.data.json {
        println!("{}", serde_json::to_string_pretty(&session_context)?);
    } else {
        print!("{}", render_session_context(&session_context));
    }
    Ok(())
}

pub(crate) fn run_metric(args: MetricArgs) -> Result<(), AppError> {
    let context = CommandContext::prepare(&args.data)?;
    let detail = context.service().metric_details(&MetricId::new(args.id))?;

    if args.data.json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
    } else {
        print!("{}", render_metric_detail(&detail));
    }
    Ok(())
}

pub(crate) fn render_score_report(report: &ScoreReport) -> String {
    let mut out = String::new();
    let stats = &report.statistics;

    let _ = writeln!(out, "Maturity scores for session {}", report.session_id);
    let _ = writeln!(
        out,
        "- Overall {:.2} ({})",
        report.overall_score,
        report.maturity_level.label()
    );
    let _ = writeln!(
        out,
        "- {} of {} metrics answered ({:.1}% complete, {} remaining)",
        stats.answered_metrics,
        stats.total_metrics,
        stats.completion_percentage,
        stats.remaining_metrics
    );
    if report.applied_overrides > 0 {
        let _ = writeln!(
            out,
            "- {} what-if answer(s) applied; stored answers unchanged",
            report.applied_overrides
        );
    }

    if report.pillar_scores.is_empty() {
        let _ = writeln!(out, "No answers recorded yet.");
        return out;
    }

    let _ = writeln!(out, "Pillars:");
    for pillar in &report.pillar_scores {
        let _ = writeln!(
            out,
            "  - {}: {:.2} (weight {}, {} topic(s))",
            pillar.name, pillar.score, pillar.weight, pillar.topic_count
        );
        for topic in report
            .topic_scores
            .iter()
            .filter(|topic| topic.pillar_id == pillar.id)
        {
            let _ = writeln!(
                out,
                "      {}: {:.2} ({} metric(s))",
                topic.name, topic.score, topic.metric_count
            );
        }
    }

    let hypothetical: Vec<_> = report
        .metric_scores
        .iter()
        .filter(|metric| metric.hypothetical)
        .collect();
    if !hypothetical.is_empty() {
        let _ = writeln!(out, "What-if metrics:");
        for metric in hypothetical {
            let _ = writeln!(out, "  - {} ({}): {}", metric.name, metric.id, metric.score);
        }
    }

    out
}

pub(crate) fn render_session_context(context: &SessionContext) -> String {
    let mut out = String::new();
    let progress = &context.progress;

    let _ = writeln!(
        out,
        "Session {} for {} ({})",
        context.session.id,
        context.target.name,
        context.session.status.label()
    );
    if let Some(organization) = &context.organization {
        let _ = writeln!(out, "- Organization: {}", organization.name);
    }
    if let Some(pillar) = &context.current_pillar {
        let _ = writeln!(out, "- Current pillar: {}", pillar.name);
    }
    let _ = writeln!(
        out,
        "- {} of {} metrics answered ({:.1}% complete)",
        progress.statistics.answered_metrics,
        progress.statistics.total_metrics,
        progress.statistics.completion_percentage
    );
    if let (Some(first), Some(last)) = (progress.first_answer_at, progress.last_answer_at) {
        let _ = writeln!(
            out,
            "- Answers recorded between {} and {}",
            first.format("%Y-%m-%d %H:%M"),
            last.format("%Y-%m-%d %H:%M")
        );
    }

    if !context.pillar_progress.is_empty() {
        let _ = writeln!(out, "Pillar progress:");
        for pillar in &context.pillar_progress {
            let _ = writeln!(
                out,
                "  - {}: {}/{} ({:.1}%)",
                pillar.pillar_name, pillar.answered, pillar.total, pillar.completion_percentage
            );
        }
    }

    if !context.recent_activity.is_empty() {
        let _ = writeln!(out, "Recent activity:");
        for answer in &context.recent_activity {
            let _ = writeln!(
                out,
                "  - {} {} / {} / {} = {}",
                answer.assessed_at.format("%Y-%m-%d %H:%M"),
                answer.pillar_name,
                answer.topic_name,
                answer.metric_name,
                answer.value
            );
        }
    }

    out
}

pub(crate) fn render_metric_detail(detail: &MetricDetail) -> String {
    let mut out = String::new();
    let metric = &detail.metric;

    let _ = writeln!(out, "{} ({})", metric.name, metric.id);
    let _ = writeln!(out, "- {} / {}", detail.pillar.name, detail.topic.name);
    let _ = writeln!(
        out,
        "- Level {} | range {}-{} | weight {}",
        metric.level, metric.min_value, metric.max_value, metric.weight
    );
    if !metric.description.is_empty() {
        let _ = writeln!(out, "- {}", metric.description);
    }
    let _ = writeln!(out, "Guidance: {}", detail.guidance.recommendation);

    out
}
