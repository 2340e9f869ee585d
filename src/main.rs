//! Reportsmith CLI entry point.
//!
//! Provides `generate` for turning a Jira ticket into a report
//! configuration, and `inspect` for dry-running the schedule parser and
//! query builder on literal text without touching the network.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing::info;

use reportsmith::config::ReportsmithConfig;
use reportsmith::credentials::{load_credentials, load_env_credentials, resolve_jira_auth};
use reportsmith::jira::JiraClient;
use reportsmith::query::{ColumnMapping, ColumnRequest, DateFilter, QueryBuilder};
use reportsmith::report::{humanize_alias, ReportGenerator};
use reportsmith::schedule::ScheduleParser;

/// Reportsmith — recurring-report configuration generator.
#[derive(Parser)]
#[command(name = "reportsmith", version, about)]
struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Fetch a ticket and write its report configuration as JSON.
    Generate {
        /// Ticket key, e.g. AD-378.
        #[arg(long)]
        ticket: String,
        /// Output directory; defaults to the configured config_dir.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Credentials file; defaults to the process environment plus ./.env.
        #[arg(long)]
        env_file: Option<PathBuf>,
        /// Reference date for range resolution (ISO-8601); defaults to today.
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Parse schedule text and column names offline and print the result.
    Inspect {
        /// Free-text schedule description, e.g. "Every Monday at 8 AM CST".
        #[arg(long)]
        schedule: String,
        /// Comma-separated semantic column names.
        #[arg(long)]
        columns: String,
        /// Reference date for range resolution (ISO-8601); defaults to today.
        #[arg(long)]
        today: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Generate {
            ticket,
            out,
            env_file,
            today,
        } => handle_generate(&ticket, out.as_deref(), env_file.as_deref(), today).await,
        Command::Inspect {
            schedule,
            columns,
            today,
        } => handle_inspect(&schedule, &columns, today),
    }
}

/// Fetch one ticket, assemble its configuration, and write it to disk.
async fn handle_generate(
    ticket: &str,
    out: Option<&Path>,
    env_file: Option<&Path>,
    today: Option<NaiveDate>,
) -> anyhow::Result<()> {
    let config = ReportsmithConfig::load().context("failed to load configuration")?;

    let out_dir = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&config.output.config_dir));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let _logging_guard = reportsmith::logging::init_production(&out_dir.join("logs"))?;

    let credentials = match env_file {
        Some(path) => load_credentials(path)?,
        None => load_env_credentials()?,
    };
    let auth = resolve_jira_auth(&credentials)?;

    let client = JiraClient::new(config.jira.base_url.clone(), config.jira.fields.clone(), auth);
    let generator = ReportGenerator::from_config(&config);

    let today = today.unwrap_or_else(|| Utc::now().date_naive());
    let report = generator.generate(&client, ticket, today).await?;

    let path = out_dir.join(format!("{}.json", report.ticket));
    report.write_to(&path)?;

    info!(ticket = %report.ticket, path = %path.display(), "generation complete");
    println!("{}", path.display());
    Ok(())
}

/// Dry-run the parser and builder on literal inputs, no network.
fn handle_inspect(schedule: &str, columns: &str, today: Option<NaiveDate>) -> anyhow::Result<()> {
    reportsmith::logging::init_cli();

    let config = ReportsmithConfig::load().context("failed to load configuration")?;
    let today = today.unwrap_or_else(|| Utc::now().date_naive());

    let parser = ScheduleParser::new(config.schedule.default_timezone.clone());
    let parsed = parser.parse(schedule, today)?;

    if let Some(recurrence) = &parsed.recurrence {
        println!(
            "recurrence: {:?} at {} ({})",
            recurrence.frequency, recurrence.time, recurrence.timezone
        );
        if let Some(day) = recurrence.day_of_week {
            println!("weekday:    {day}");
        }
    }
    if let Some(cron) = &parsed.cron {
        println!("cron:       {cron}");
        let schedule = cron.schedule()?;
        for fire in schedule.upcoming(Utc).take(3) {
            println!("fires:      {fire}");
        }
    }
    if let Some(range) = &parsed.range {
        println!("range:      {} .. {} ({:?})", range.start, range.end, range.mode);
    }

    let requests: Vec<ColumnRequest> = columns
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ColumnRequest::new)
        .collect();
    if requests.is_empty() {
        return Ok(());
    }

    let mapping = ColumnMapping::with_overrides(config.query.columns.iter());
    let builder = QueryBuilder::new(mapping, config.query.source_table.clone());
    let spec = builder.build(&requests)?;

    let filter = DateFilter {
        column: config.query.date_column.clone(),
    };
    println!("sql:        {}", spec.render_sql(Some(&filter)));
    for alias in spec.aliases() {
        println!("column:     {} ({})", alias, humanize_alias(alias));
    }

    Ok(())
}
