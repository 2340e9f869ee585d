//! Tests for SQL rendering.

use reportsmith::query::{ColumnMapping, ColumnRequest, DateFilter, QueryBuilder};

fn builder() -> QueryBuilder {
    QueryBuilder::new(ColumnMapping::builtin(), "ad_event_view")
}

fn requests(names: &[&str]) -> Vec<ColumnRequest> {
    names.iter().map(|name| ColumnRequest::new(*name)).collect()
}

#[test]
fn test_full_query_shape() {
    let spec = builder()
        .build(&requests(&["date", "campaign", "clicks", "spend"]))
        .expect("should build");

    let filter = DateFilter {
        column: "event_date".to_string(),
    };
    let sql = spec.render_sql(Some(&filter));

    assert_eq!(
        sql,
        "SELECT event_date AS date, campaign_name AS campaign, \
         COALESCE(SUM(paid_clicks), 0) AS clicks, \
         ROUND(COALESCE(SUM(revenue), 0), 2) AS spend \
         FROM ad_event_view \
         WHERE event_date BETWEEN :start_date AND :end_date \
         GROUP BY event_date, campaign_name"
    );
}

#[test]
fn test_render_without_filter_omits_where() {
    let spec = builder()
        .build(&requests(&["date", "clicks"]))
        .expect("should build");

    let sql = spec.render_sql(None);
    assert!(!sql.contains("WHERE"));
    assert!(sql.starts_with("SELECT event_date AS date"));
    assert!(sql.ends_with("GROUP BY event_date"));
}

#[test]
fn test_render_without_dimensions_omits_group_by() {
    let spec = builder()
        .build(&requests(&["clicks", "ctr"]))
        .expect("should build");

    let sql = spec.render_sql(None);
    assert!(!sql.contains("GROUP BY"));
}

#[test]
fn test_date_bounds_render_as_placeholders() {
    // Concrete dates are bound by the executing system, never spliced into
    // the text.
    let spec = builder().build(&requests(&["date"])).expect("should build");
    let filter = DateFilter {
        column: "event_date".to_string(),
    };

    let sql = spec.render_sql(Some(&filter));
    assert!(sql.contains(":start_date"));
    assert!(sql.contains(":end_date"));
    assert!(!sql.contains("2024"));
}

#[test]
fn test_aliases_are_the_preview_headers() {
    let spec = builder()
        .build(&requests(&["publisher", "imps"]))
        .expect("should build");

    assert_eq!(spec.aliases(), vec!["publisher", "imps"]);
}
