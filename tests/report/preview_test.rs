//! Tests for preview formatting.

use async_trait::async_trait;
use chrono::NaiveDate;
use reportsmith::query::{ColumnMapping, ColumnRequest, QueryBuilder, QuerySpec};
use reportsmith::report::preview::{PreviewTable, QueryExecutor};
use reportsmith::schedule::DateRange;

fn spec(names: &[&str]) -> QuerySpec {
    let requests: Vec<ColumnRequest> =
        names.iter().map(|name| ColumnRequest::new(*name)).collect();
    QueryBuilder::new(ColumnMapping::builtin(), "ad_event_view")
        .build(&requests)
        .expect("should build")
}

fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
    data.iter()
        .map(|row| row.iter().map(|cell| (*cell).to_string()).collect())
        .collect()
}

#[test]
fn test_headers_are_aliases_in_select_order() {
    let table = PreviewTable::from_query(&spec(&["date", "campaign", "clicks"]), vec![]);
    assert_eq!(table.headers, vec!["date", "campaign", "clicks"]);
    assert!(table.rows.is_empty());
}

#[test]
fn test_ragged_rows_are_padded() {
    let table = PreviewTable::from_query(
        &spec(&["date", "campaign", "clicks"]),
        rows(&[&["2024-03-01", "Spring Sale"]]),
    );

    assert_eq!(table.rows[0], vec!["2024-03-01", "Spring Sale", ""]);
}

#[test]
fn test_csv_output() {
    let table = PreviewTable::from_query(
        &spec(&["date", "campaign", "clicks"]),
        rows(&[
            &["2024-03-01", "Spring Sale", "120"],
            &["2024-03-01", "Brand, US", "48"],
        ]),
    );

    let csv = table.to_csv();
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines[0], "date,campaign,clicks");
    assert_eq!(lines[1], "2024-03-01,Spring Sale,120");
    // Embedded comma forces quoting.
    assert_eq!(lines[2], "2024-03-01,\"Brand, US\",48");
}

#[test]
fn test_csv_escapes_embedded_quotes() {
    let table = PreviewTable::from_query(
        &spec(&["campaign"]),
        rows(&[&[r#"The "Best" Offer"#]]),
    );

    assert_eq!(
        table.to_csv().lines().nth(1).expect("data line"),
        r#""The ""Best"" Offer""#
    );
}

#[test]
fn test_render_aligns_columns() {
    let table = PreviewTable::from_query(
        &spec(&["campaign", "clicks"]),
        rows(&[&["Spring Sale", "120"], &["B", "7"]]),
    );

    let rendered = table.render();
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines[0], "campaign     clicks");
    assert_eq!(lines[1], "-----------  ------");
    assert_eq!(lines[2], "Spring Sale  120");
    assert_eq!(lines[3], "B            7");
}

/// Executor returning canned rows and recording the SQL it was handed.
struct CannedExecutor {
    rows: Vec<Vec<String>>,
}

#[async_trait]
impl QueryExecutor for CannedExecutor {
    async fn run(&self, sql: &str, _range: &DateRange) -> anyhow::Result<Vec<Vec<String>>> {
        assert!(sql.starts_with("SELECT"));
        Ok(self.rows.clone())
    }
}

#[tokio::test]
async fn test_fetch_through_executor_seam() {
    let spec = spec(&["date", "clicks"]);
    let executor = CannedExecutor {
        rows: rows(&[&["2024-03-09", "42"]]),
    };
    let range = DateRange::last_days(1, NaiveDate::from_ymd_opt(2024, 3, 10).expect("valid date"));

    let table = PreviewTable::fetch(&spec, &range, &executor)
        .await
        .expect("should fetch");

    assert_eq!(table.headers, vec!["date", "clicks"]);
    assert_eq!(table.rows, rows(&[&["2024-03-09", "42"]]));
}
