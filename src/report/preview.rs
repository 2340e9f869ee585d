//! Sample preview rendering.
//!
//! Runs the generated query through a [`QueryExecutor`] seam and formats the
//! rows as a small table: CSV for the ticket attachment, aligned text for
//! the terminal. Headers are the select-list aliases, in select order.

use async_trait::async_trait;

use crate::query::QuerySpec;
use crate::schedule::DateRange;

/// Executes a rendered query against the reporting store.
///
/// The preview path depends on this seam rather than a concrete client, so
/// tests can substitute canned rows. Implementations bind the range to the
/// `:start_date` / `:end_date` placeholders themselves.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run `sql` over `range`, returning rows of stringified cells in
    /// select-list order.
    ///
    /// # Errors
    ///
    /// Returns any transport or query failure from the store.
    async fn run(&self, sql: &str, range: &DateRange) -> anyhow::Result<Vec<Vec<String>>>;
}

/// A small formatted result sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewTable {
    /// Column headers (the select-list aliases, in order).
    pub headers: Vec<String>,
    /// Data rows; each row has one cell per header.
    pub rows: Vec<Vec<String>>,
}

impl PreviewTable {
    /// Assemble a preview from a query spec and fetched rows.
    ///
    /// Rows shorter than the header count are padded with empty cells so the
    /// formatting never panics on a ragged result set.
    pub fn from_query(spec: &QuerySpec, rows: Vec<Vec<String>>) -> Self {
        let headers: Vec<String> = spec.aliases().iter().map(|a| (*a).to_owned()).collect();
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { headers, rows }
    }

    /// Fetch sample rows through `executor` and build the preview.
    ///
    /// # Errors
    ///
    /// Propagates executor failures.
    pub async fn fetch(
        spec: &QuerySpec,
        range: &DateRange,
        executor: &dyn QueryExecutor,
    ) -> anyhow::Result<Self> {
        let sql = spec.render_sql(None);
        let rows = executor.run(&sql, range).await?;
        tracing::debug!(rows = rows.len(), "fetched preview rows");
        Ok(Self::from_query(spec, rows))
    }

    /// Render as CSV: header row first, RFC-4180 quoting where needed.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        out.push_str(&csv_line(&self.headers));
        for row in &self.rows {
            out.push_str(&csv_line(row));
        }
        out
    }

    /// Render as an aligned text table for terminal output.
    pub fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(String::len).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.len());
                }
            }
        }

        let format_row = |cells: &[String]| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, w)| format!("{cell:<width$}", width = *w))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_owned()
        };

        let mut lines = vec![format_row(&self.headers)];
        lines.push(
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("  "),
        );
        for row in &self.rows {
            lines.push(format_row(row));
        }
        lines.join("\n")
    }

    /// Write the CSV form to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error when the write fails.
    pub fn write_csv(&self, path: &std::path::Path) -> anyhow::Result<()> {
        std::fs::write(path, self.to_csv()).map_err(|e| {
            anyhow::anyhow!("failed to write preview to {}: {e}", path.display())
        })
    }
}

fn csv_line(cells: &[String]) -> String {
    let mut line = cells
        .iter()
        .map(|cell| csv_field(cell))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

fn csv_field(cell: &str) -> String {
    if cell.contains([',', '"', '\n']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_owned()
    }
}
