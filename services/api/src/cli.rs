use crate::report::{run_context, run_metric, run_score, ContextArgs, MetricArgs, ScoreArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use maturity_assessment::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Maturity Assessment",
    about = "Score maturity assessments over HTTP or from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Calculate scores for a session, optionally with what-if answers
    Score(ScoreArgs),
    /// Show progress and recent activity for a session
    Context(ContextArgs),
    /// Look up a metric with its topic, pillar, and guidance
    Metric(MetricArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score(args),
        Command::Context(args) => run_context(args),
        Command::Metric(args) => run_metric(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn score_collects_repeated_what_if_answers() {
        let cli = Cli::try_parse_from([
            "maturity-assessment-api",
            "score",
            "--session",
            "demo-session",
            "--what-if",
            "rel-slo=4",
            "--what-if",
            "del-peer-review=2.5",
            "--json",
        ])
        .expect("arguments parse");

        let Some(Command::Score(args)) = cli.command else {
            panic!("expected score command");
        };
        assert_eq!(args.session, "demo-session");
        assert!(args.data.json);
        assert_eq!(args.what_if.len(), 2);
        assert_eq!(args.what_if[1].metric_id.as_str(), "del-peer-review");
        assert_eq!(args.what_if[1].value, 2.5);
    }

    #[test]
    fn malformed_what_if_is_rejected() {
        let result = Cli::try_parse_from([
            "maturity-assessment-api",
            "score",
            "--session",
            "demo-session",
            "--what-if",
            "rel-slo",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn no_subcommand_defaults_to_serve() {
        let cli = Cli::try_parse_from(["maturity-assessment-api"]).expect("arguments parse");
        assert!(cli.command.is_none());
    }
}
