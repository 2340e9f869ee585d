//! Query clause building.
//!
//! Maps an ordered list of semantic column names to a validated
//! [`QuerySpec`] and renders it as SQL text. Unknown names are rejected
//! outright — semantic names originate in free-text ticket fields and are
//! never interpolated into SQL; the only strings that reach the emitted
//! query are the fixed expressions already present in the [`ColumnMapping`].

use serde::{Deserialize, Serialize};

pub mod mapping;

pub use mapping::{ColumnDef, ColumnMapping, ColumnOverride};

use mapping::normalize_name;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// One requested column: a semantic name plus an optional alias override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRequest {
    /// Semantic column name as written in the ticket.
    pub name: String,
    /// Alias override; when `None` the mapping's default alias applies.
    pub alias: Option<String>,
}

impl ColumnRequest {
    /// Request a column under its default alias.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    /// Request a column under a caller-chosen alias.
    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }
}

impl<T: Into<String>> From<T> for ColumnRequest {
    fn from(name: T) -> Self {
        Self::new(name)
    }
}

// ---------------------------------------------------------------------------
// Query spec
// ---------------------------------------------------------------------------

/// One rendered select-list entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectItem {
    /// Validated SQL expression from the mapping.
    pub expression: String,
    /// Unique output alias.
    pub alias: String,
    /// Whether the expression aggregates.
    pub is_aggregate: bool,
}

/// A validated, renderable query.
///
/// Invariants: every alias in `select_list` is unique, and `group_by` holds
/// exactly the non-aggregate expressions of `select_list` in
/// first-occurrence order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    /// Ordered select list.
    pub select_list: Vec<SelectItem>,
    /// Derived grouping expressions.
    pub group_by: Vec<String>,
    /// Table the query reads from.
    pub source_table: String,
}

/// A parameterized date filter rendered into the WHERE clause.
///
/// The column name comes from configuration, and the bounds render as the
/// fixed `:start_date` / `:end_date` placeholders — concrete dates are bound
/// by the executing system, never spliced into the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFilter {
    /// Date column the range applies to.
    pub column: String,
}

impl QuerySpec {
    /// Output aliases in select order (these become preview headers).
    pub fn aliases(&self) -> Vec<&str> {
        self.select_list.iter().map(|item| item.alias.as_str()).collect()
    }

    /// Render the query as SQL text.
    ///
    /// Pure, deterministic formatting; no untrusted input is concatenated
    /// anywhere in this path.
    pub fn render_sql(&self, filter: Option<&DateFilter>) -> String {
        let selects = self
            .select_list
            .iter()
            .map(|item| format!("{} AS {}", item.expression, item.alias))
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!("SELECT {selects} FROM {}", self.source_table);

        if let Some(filter) = filter {
            sql.push_str(&format!(
                " WHERE {} BETWEEN :start_date AND :end_date",
                filter.column
            ));
        }

        if !self.group_by.is_empty() {
            sql.push_str(&format!(" GROUP BY {}", self.group_by.join(", ")));
        }

        sql
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while building a query.
///
/// All are caller-input problems and terminal for the generation attempt —
/// an unknown column silently dropped would produce a plausible-looking but
/// wrong report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// A requested name is not in the mapping table.
    #[error("unknown column: {0:?}")]
    UnknownColumn(String),
    /// An alias override is not a valid identifier.
    #[error("invalid alias {alias:?} for column {column:?}")]
    InvalidAlias {
        /// Column the override was supplied for.
        column: String,
        /// The rejected alias.
        alias: String,
    },
    /// Two select-list entries resolved to the same alias.
    #[error("duplicate alias: {0:?}")]
    DuplicateAlias(String),
    /// No columns were requested.
    #[error("empty column selection")]
    EmptySelection,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builds validated [`QuerySpec`] values from semantic column requests.
///
/// The mapping is injected at construction, which keeps the builder
/// trivially testable with alternative tables.
pub struct QueryBuilder {
    mapping: ColumnMapping,
    source_table: String,
}

impl QueryBuilder {
    /// Create a builder over a mapping and source table.
    pub fn new(mapping: ColumnMapping, source_table: impl Into<String>) -> Self {
        Self {
            mapping,
            source_table: source_table.into(),
        }
    }

    /// The injected mapping table.
    pub fn mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    /// Build a query spec from an ordered column request list.
    ///
    /// Duplicate semantic names collapse to their first occurrence, so the
    /// build is idempotent over repeated columns. `group_by` is derived, not
    /// caller-specified: exactly the non-aggregate expressions in
    /// first-occurrence order.
    ///
    /// # Errors
    ///
    /// [`BuildError::EmptySelection`] for an empty request list,
    /// [`BuildError::UnknownColumn`] for names outside the mapping,
    /// [`BuildError::InvalidAlias`] for malformed overrides, and
    /// [`BuildError::DuplicateAlias`] for alias collisions.
    pub fn build(&self, columns: &[ColumnRequest]) -> Result<QuerySpec, BuildError> {
        if columns.is_empty() {
            return Err(BuildError::EmptySelection);
        }

        let mut select_list: Vec<SelectItem> = Vec::new();
        let mut seen_names: Vec<String> = Vec::new();

        for request in columns {
            let key = normalize_name(&request.name);
            if seen_names.iter().any(|n| n == &key) {
                continue;
            }

            let def = self
                .mapping
                .get(&request.name)
                .ok_or_else(|| BuildError::UnknownColumn(request.name.clone()))?;

            let alias = match &request.alias {
                Some(alias) => {
                    if !is_identifier(alias) {
                        return Err(BuildError::InvalidAlias {
                            column: request.name.clone(),
                            alias: alias.clone(),
                        });
                    }
                    alias.clone()
                }
                None => def.default_alias.clone(),
            };

            if select_list.iter().any(|item| item.alias == alias) {
                return Err(BuildError::DuplicateAlias(alias));
            }

            seen_names.push(key);
            select_list.push(SelectItem {
                expression: def.sql_expression.clone(),
                alias,
                is_aggregate: def.is_aggregate,
            });
        }

        // Set semantics, first-occurrence order: two semantic names may map
        // to the same underlying expression.
        let mut group_by: Vec<String> = Vec::new();
        for item in select_list.iter().filter(|item| !item.is_aggregate) {
            if !group_by.contains(&item.expression) {
                group_by.push(item.expression.clone());
            }
        }

        Ok(QuerySpec {
            select_list,
            group_by,
            source_table: self.source_table.clone(),
        })
    }
}

/// Alias overrides must be bare identifiers: alphanumeric plus underscore,
/// not starting with a digit.
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
