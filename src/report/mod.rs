//! Report configuration assembly.
//!
//! The orchestrator: fetches ticket fields through a [`TicketSource`],
//! runs the schedule parser and query builder, and merges their outputs
//! into an immutable [`ReportConfig`] that is serialized to the output
//! boundary and discarded. Pure sequencing — all real decisions live in
//! `schedule` and `query`.

use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ReportsmithConfig;
use crate::jira::{FetchError, TicketFields, TicketSource};
use crate::query::{BuildError, ColumnMapping, ColumnRequest, DateFilter, QueryBuilder, QuerySpec};
use crate::schedule::{
    CronExpression, DateRange, ParseError, RangeMode, RecurrenceSpec, ScheduleParser,
};

pub mod preview;

// ---------------------------------------------------------------------------
// Output object
// ---------------------------------------------------------------------------

/// One select-list column as exposed to stakeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnHeader {
    /// SQL output alias (preview header).
    pub alias: String,
    /// Human-readable label ("campaign name" → "Campaign Name").
    pub label: String,
}

/// The assembled report configuration.
///
/// Created once per generation run, immutable after assembly, serialized to
/// JSON and discarded — the system holds no state across runs. Field order
/// is not significant but the document round-trips losslessly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Originating ticket key.
    pub ticket: String,
    /// Report name derived from the ticket summary.
    pub report_name: String,
    /// Canonical recurrence.
    pub schedule: RecurrenceSpec,
    /// Derived 5-field cron expression.
    pub cron: CronExpression,
    /// Range resolution policy.
    pub range_mode: RangeMode,
    /// First covered day, inclusive (ISO-8601).
    pub start_date: NaiveDate,
    /// Last covered day, inclusive (ISO-8601).
    pub end_date: NaiveDate,
    /// Rendered SQL text.
    pub query: String,
    /// Select-list columns in order.
    pub columns: Vec<ColumnHeader>,
    /// Report recipients.
    pub recipients: Vec<String>,
    /// Assembly timestamp.
    pub generated_at: DateTime<Utc>,
}

impl ReportConfig {
    /// Serialize the configuration as pretty JSON to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error when serialization or the write fails.
    pub fn write_to(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize config")?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write config to {}", path.display()))?;
        info!(ticket = %self.ticket, path = %path.display(), "report config written");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that fail a generation run.
///
/// Each carries the offending ticket so the caller can report it; none is
/// recoverable by retry, since the inputs are deterministic text.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// Ticket fields could not be fetched.
    #[error("ticket fetch failed: {0}")]
    Fetch(#[from] FetchError),
    /// The schedule description did not parse.
    #[error("ticket {ticket}: {source}")]
    Schedule {
        /// Offending ticket key.
        ticket: String,
        /// Underlying parse error.
        #[source]
        source: ParseError,
    },
    /// The requested columns did not build.
    #[error("ticket {ticket}: {source}")]
    Query {
        /// Offending ticket key.
        ticket: String,
        /// Underlying build error.
        #[source]
        source: BuildError,
    },
    /// The ticket carries a range but no recognizable cadence phrase.
    #[error("ticket {ticket} has no recognizable cadence phrase")]
    MissingCadence {
        /// Offending ticket key.
        ticket: String,
    },
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// Ties the schedule parser and query builder together for one ticket.
pub struct ReportGenerator {
    parser: ScheduleParser,
    builder: QueryBuilder,
    date_column: String,
}

impl ReportGenerator {
    /// Build a generator from loaded configuration.
    pub fn from_config(config: &ReportsmithConfig) -> Self {
        let mapping = ColumnMapping::with_overrides(config.query.columns.iter());
        Self {
            parser: ScheduleParser::new(config.schedule.default_timezone.clone()),
            builder: QueryBuilder::new(mapping, config.query.source_table.clone()),
            date_column: config.query.date_column.clone(),
        }
    }

    /// Build a generator from explicit parts (for testing with alternative
    /// mappings).
    pub fn new(parser: ScheduleParser, builder: QueryBuilder, date_column: impl Into<String>) -> Self {
        Self {
            parser,
            builder,
            date_column: date_column.into(),
        }
    }

    /// Generate the report configuration for one ticket.
    ///
    /// The cadence is parsed from the ticket's schedule field; the range
    /// comes from the dedicated time-window field when present, else from
    /// whatever range descriptor the schedule field carries, else it
    /// defaults to the prior complete day.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError`] naming the ticket and the specific failure;
    /// nothing is guessed or silently dropped.
    pub async fn generate(
        &self,
        source: &dyn TicketSource,
        ticket_key: &str,
        today: NaiveDate,
    ) -> Result<ReportConfig, GenerateError> {
        let fields = source.fetch(ticket_key).await?;
        info!(ticket = %fields.key, summary = %fields.summary, "ticket fetched");

        let schedule_err = |source| GenerateError::Schedule {
            ticket: fields.key.clone(),
            source,
        };

        let parsed = self
            .parser
            .parse(&fields.schedule_description, today)
            .map_err(schedule_err)?;

        let recurrence = parsed.recurrence.ok_or_else(|| GenerateError::MissingCadence {
            ticket: fields.key.clone(),
        })?;

        let range = match &fields.time_window {
            Some(window) => self
                .parser
                .parse(window, today)
                .map_err(schedule_err)?
                .range,
            None => None,
        };
        let range = range
            .or(parsed.range)
            .unwrap_or_else(|| DateRange::last_days(1, today));

        let requests: Vec<ColumnRequest> = fields
            .requested_columns
            .iter()
            .map(ColumnRequest::new)
            .collect();
        let spec = self.builder.build(&requests).map_err(|source| GenerateError::Query {
            ticket: fields.key.clone(),
            source,
        })?;

        Ok(assemble(&fields, recurrence, range, &spec, &self.date_column))
    }
}

/// Merge parsed and built parts into the final configuration.
///
/// Pure except for the `generated_at` timestamp.
pub fn assemble(
    fields: &TicketFields,
    recurrence: RecurrenceSpec,
    range: DateRange,
    spec: &QuerySpec,
    date_column: &str,
) -> ReportConfig {
    let cron = CronExpression::from_recurrence(&recurrence);
    let filter = DateFilter {
        column: date_column.to_owned(),
    };
    let columns = spec
        .select_list
        .iter()
        .map(|item| ColumnHeader {
            alias: item.alias.clone(),
            label: humanize_alias(&item.alias),
        })
        .collect();

    ReportConfig {
        ticket: fields.key.clone(),
        report_name: report_name(&fields.summary),
        schedule: recurrence,
        cron,
        range_mode: range.mode,
        start_date: range.start,
        end_date: range.end,
        query: spec.render_sql(Some(&filter)),
        columns,
        recipients: fields.recipients.clone(),
        generated_at: Utc::now(),
    }
}

/// Derive a filesystem- and subject-line-friendly report name from a ticket
/// summary: title-cased words joined by underscores, punctuation dropped.
pub fn report_name(summary: &str) -> String {
    summary
        .split_whitespace()
        .map(|word| {
            let cleaned: String = word
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect();
            let mut chars = cleaned.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => cleaned,
            }
        })
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Turn a SQL alias into a stakeholder-facing label:
/// `campaign_name` → `Campaign Name`.
pub fn humanize_alias(alias: &str) -> String {
    alias
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
