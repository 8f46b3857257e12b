mod config;
mod github;
mod jira;
mod report;
mod retry;
mod store;
mod sync;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, info_span};
use tracing_subscriber::EnvFilter;

use crate::report::RunSummary;
use crate::retry::RetryPolicy;

/// Heatmap — maps Jira bugs to the GitHub PRs that fixed them and records
/// which files those PRs touched, so the most bug-prone files stand out.
#[derive(Parser, Debug)]
#[command(name = "heatmap", version, about)]
struct Cli {
    /// Config file (default: ./.heatmap.toml, then $HOME/.heatmap.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Optional output file path for a markdown run summary
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Map every not-yet-seen bug in the project to its merged GitHub PRs
    Backfill {
        /// Jira project key, overriding jira.project from the config
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Fetch per-file diff stats for mapped PRs that have none yet
    CollectDiffs,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("loading configuration");
    let config = config::Config::load(cli.config.as_deref())?;
    let retry = RetryPolicy::from(&config.retry);

    let summary = match cli.command {
        Command::Backfill { project } => {
            let project = config.project(project.as_deref())?;
            let _span = info_span!("backfill", project = %project).entered();

            let jira = jira::JiraClient::new(config.jira_settings()?, retry);
            let store = store::MongoStore::connect(&config.mongo_settings()?).await?;

            RunSummary::Backfill(sync::run_backfill(&jira, &store, &project).await?)
        }
        Command::CollectDiffs => {
            let _span = info_span!("collect_diffs").entered();

            let github = github::GitHubClient::new(&config.github.api_url, config.github_token()?, retry);
            let store = store::MongoStore::connect(&config.mongo_settings()?).await?;

            RunSummary::Enrich(sync::run_enrichment(&github, &store).await?)
        }
    };

    report::output(&summary, cli.output.as_deref())?;
    info!(stage = summary.title(), inserted = summary.inserted(), "done");

    Ok(())
}
