//! Configuration loading and management.
//!
//! Loads reportsmith configuration from `./reportsmith.toml` (or
//! `$REPORTSMITH_CONFIG_PATH`). Environment variables override file values;
//! file values override defaults.
//!
//! Precedence: env vars > config file > defaults.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::query::ColumnOverride;

// ── Top-level config ────────────────────────────────────────────

/// Top-level reportsmith configuration loaded from TOML.
///
/// Path: `./reportsmith.toml` or `$REPORTSMITH_CONFIG_PATH`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReportsmithConfig {
    /// Schedule parsing settings (`[schedule]`).
    pub schedule: ScheduleConfig,
    /// Query building settings (`[query]`).
    pub query: QueryConfig,
    /// Jira ticket source settings (`[jira]`).
    pub jira: JiraConfig,
    /// Output locations (`[output]`).
    pub output: OutputConfig,
}

impl ReportsmithConfig {
    /// Load configuration with precedence: env vars > TOML file > defaults.
    ///
    /// If the file does not exist, returns defaults.
    ///
    /// # Errors
    ///
    /// Returns an error when the config file exists but cannot be read or
    /// parsed.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from_file()?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from TOML file only, no env overrides.
    fn load_from_file() -> Result<Self> {
        let path = Self::config_path_with(|key| std::env::var(key).ok());
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                tracing::info!(path = %path.display(), "loading config from file");
                let config: ReportsmithConfig =
                    toml::from_str(&contents).context("failed to parse config TOML")?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("no config file found, using defaults");
                Ok(ReportsmithConfig::default())
            }
            Err(e) => Err(anyhow::anyhow!("failed to read config file: {e}")),
        }
    }

    /// Resolve config path using a custom env resolver (for testing).
    fn config_path_with(env: impl Fn(&str) -> Option<String>) -> PathBuf {
        if let Some(p) = env("REPORTSMITH_CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("reportsmith.toml")
    }

    /// Apply environment variable overrides (env > config > defaults).
    ///
    /// Takes a resolver function for testability.
    fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("REPORTSMITH_DEFAULT_TIMEZONE") {
            self.schedule.default_timezone = v;
        }
        if let Some(v) = env("REPORTSMITH_SOURCE_TABLE") {
            self.query.source_table = v;
        }
        if let Some(v) = env("REPORTSMITH_DATE_COLUMN") {
            self.query.date_column = v;
        }
        if let Some(v) = env("REPORTSMITH_JIRA_URL") {
            self.jira.base_url = v;
        }
        if let Some(v) = env("REPORTSMITH_OUTPUT_DIR") {
            self.output.config_dir = v.clone();
            self.output.preview_dir = v;
        }
    }

    /// Parse a TOML string into config (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error when the TOML does not parse.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: ReportsmithConfig =
            toml::from_str(toml_str).context("failed to parse config TOML")?;
        Ok(config)
    }
}

// ── Schedule config ─────────────────────────────────────────────

/// Schedule parsing settings (`[schedule]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Zone applied when a cadence phrase omits a timezone token.
    ///
    /// This is a documented, overridable policy — the parser never guesses a
    /// zone from ticket content.
    pub default_timezone: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            default_timezone: "America/Los_Angeles".to_string(),
        }
    }
}

// ── Query config ────────────────────────────────────────────────

/// Query building settings (`[query]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Table the generated query reads from.
    pub source_table: String,
    /// Date column the range filter applies to.
    pub date_column: String,
    /// Additional or replacement column mappings
    /// (`[query.columns.<name>]`).
    pub columns: BTreeMap<String, ColumnOverride>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            source_table: "ad_event_view".to_string(),
            date_column: "event_date".to_string(),
            columns: BTreeMap::new(),
        }
    }
}

// ── Jira config ─────────────────────────────────────────────────

/// Jira ticket source settings (`[jira]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JiraConfig {
    /// Jira Cloud base URL.
    pub base_url: String,
    /// Custom field ids the report-request ticket type uses.
    pub fields: JiraFieldsConfig,
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            base_url: "https://example.atlassian.net".to_string(),
            fields: JiraFieldsConfig::default(),
        }
    }
}

/// Custom field ids on the report-request issue type
/// (`[jira.fields]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JiraFieldsConfig {
    /// Frequency and time of day.
    pub schedule: String,
    /// Look-back period.
    pub time_window: String,
    /// Stakeholder-requested columns.
    pub columns: String,
    /// Recipient list.
    pub recipients: String,
    /// Delivery method (only email is accepted today).
    pub delivery: String,
}

impl Default for JiraFieldsConfig {
    fn default() -> Self {
        Self {
            schedule: "customfield_10095".to_string(),
            time_window: "customfield_10093".to_string(),
            columns: "customfield_10094".to_string(),
            recipients: "customfield_10098".to_string(),
            delivery: "customfield_10097".to_string(),
        }
    }
}

// ── Output config ───────────────────────────────────────────────

/// Output locations (`[output]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the generated JSON configuration is written to.
    pub config_dir: String,
    /// Directory the sample preview CSV is written to.
    pub preview_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            config_dir: "./out".to_string(),
            preview_dir: "./out".to_string(),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────
