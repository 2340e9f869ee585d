//! The semantic-column mapping table.
//!
//! Maps stable, whitelisted user-facing column names ("clicks",
//! "campaign name") to validated SQL expressions. Built once at startup from
//! the builtin table plus optional config overrides, then passed explicitly
//! into the builder — never reached as a global.

use std::collections::BTreeMap;

use serde::Deserialize;

/// One mapped column: the SQL expression emitted for it, the alias used when
/// the caller does not override one, and whether the expression aggregates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    /// SQL expression emitted into the select list.
    pub sql_expression: String,
    /// Alias applied when the request carries no override.
    pub default_alias: String,
    /// Whether the expression is an aggregate (excluded from GROUP BY).
    pub is_aggregate: bool,
}

/// A column override as written in the TOML config.
///
/// `alias` defaults to the semantic name with underscores; `aggregate`
/// defaults to keyword detection on the expression.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnOverride {
    /// SQL expression for the column.
    pub expression: String,
    /// Optional alias override.
    pub alias: Option<String>,
    /// Optional explicit aggregate flag.
    pub aggregate: Option<bool>,
}

/// Read-only semantic-name → column-definition table.
///
/// Lookup is case-insensitive on the trimmed semantic name. Immutable after
/// construction, so unsynchronized concurrent reads are safe.
#[derive(Debug, Clone, Default)]
pub struct ColumnMapping {
    entries: BTreeMap<String, ColumnDef>,
}

impl ColumnMapping {
    /// The builtin table of reportable dimensions and metrics.
    pub fn builtin() -> Self {
        let mut mapping = Self::default();
        for (name, expression) in DIMENSIONS {
            mapping.insert(name, expression, false);
        }
        for (name, expression) in METRICS {
            mapping.insert(name, expression, true);
        }
        mapping
    }

    /// Builtin table overlaid with config-supplied entries.
    ///
    /// Overrides win over builtin definitions of the same name.
    pub fn with_overrides<'a>(
        overrides: impl IntoIterator<Item = (&'a String, &'a ColumnOverride)>,
    ) -> Self {
        let mut mapping = Self::builtin();
        for (name, def) in overrides {
            let key = normalize_name(name);
            let alias = def
                .alias
                .clone()
                .unwrap_or_else(|| key.replace(' ', "_"));
            let is_aggregate = def
                .aggregate
                .unwrap_or_else(|| looks_aggregate(&def.expression));
            mapping.entries.insert(
                key,
                ColumnDef {
                    sql_expression: def.expression.clone(),
                    default_alias: alias,
                    is_aggregate,
                },
            );
        }
        mapping
    }

    /// Look up a semantic name (case- and whitespace-insensitive).
    pub fn get(&self, name: &str) -> Option<&ColumnDef> {
        self.entries.get(&normalize_name(name))
    }

    /// All known semantic names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of mapped names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, name: &str, expression: &str, is_aggregate: bool) {
        let key = normalize_name(name);
        let default_alias = key.replace(' ', "_");
        self.entries.insert(
            key,
            ColumnDef {
                sql_expression: expression.to_owned(),
                default_alias,
                is_aggregate,
            },
        );
    }
}

/// Canonical lookup key: trimmed, lowercased, underscores folded to spaces,
/// inner whitespace collapsed. Ticket authors write "campaign name" and
/// "campaign_name" interchangeably.
pub(crate) fn normalize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keyword heuristic used when a config override omits the aggregate flag.
fn looks_aggregate(expression: &str) -> bool {
    let lowered = expression.to_lowercase();
    ["sum(", "count(", "min(", "max(", "avg("]
        .iter()
        .any(|kw| lowered.contains(kw))
}

/// Non-aggregated dimensions.
const DIMENSIONS: &[(&str, &str)] = &[
    ("date", "event_date"),
    ("partner id", "partner_id"),
    ("campaign", "campaign_name"),
    ("campaign name", "campaign_name"),
    ("ad group", "adgroup_name"),
    ("ad group name", "adgroup_name"),
    ("adgroup", "adgroup_name"),
    ("adgroup name", "adgroup_name"),
    ("advertiser", "advertiser_name"),
    ("advertiser name", "advertiser_name"),
    ("keyword", "viewed_text"),
    ("publisher", "affiliate_account_name"),
    ("publisher name", "affiliate_account_name"),
    ("pub name", "affiliate_account_name"),
    ("source", "traffic_source_name"),
    ("source name", "traffic_source_name"),
];

/// Aggregated metrics. Expressions are COALESCE-wrapped so empty groups
/// render as zero instead of NULL in delivered reports.
const METRICS: &[(&str, &str)] = &[
    ("clicks", "COALESCE(SUM(paid_clicks), 0)"),
    ("impressions", "ROUND(COALESCE(SUM(impressions), 0), 0)"),
    ("imps", "ROUND(COALESCE(SUM(impressions), 0), 0)"),
    ("conversions", "COALESCE(SUM(event_fires), 0)"),
    ("actions", "COALESCE(SUM(actions_worth), 0)"),
    ("spend", "ROUND(COALESCE(SUM(revenue), 0), 2)"),
    ("cost", "ROUND(COALESCE(SUM(revenue), 0), 2)"),
    ("revenue", "ROUND(COALESCE(SUM(dollars_worth), 0), 2)"),
    ("conversion value", "ROUND(COALESCE(SUM(dollars_worth), 0), 2)"),
    ("ctr", "COALESCE(ROUND(SUM(paid_clicks) / SUM(impressions), 6), 0)"),
    ("cvr", "COALESCE(ROUND(SUM(actions_worth) / SUM(paid_clicks), 6), 0)"),
    ("cpc", "COALESCE(ROUND(SUM(revenue) / SUM(paid_clicks), 2), 0)"),
    ("cpa", "COALESCE(ROUND(SUM(revenue) / SUM(actions_worth), 2), 0)"),
    (
        "conversion rate",
        "COALESCE(ROUND(SUM(actions_worth) / SUM(paid_clicks), 4), 0)",
    ),
];
