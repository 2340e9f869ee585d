//! Tests for the semantic-column mapping table.

use std::collections::BTreeMap;

use reportsmith::query::{ColumnMapping, ColumnOverride};

#[test]
fn test_builtin_table_covers_dimensions_and_metrics() {
    let mapping = ColumnMapping::builtin();

    let date = mapping.get("date").expect("builtin dimension");
    assert_eq!(date.sql_expression, "event_date");
    assert!(!date.is_aggregate);

    let clicks = mapping.get("clicks").expect("builtin metric");
    assert_eq!(clicks.sql_expression, "COALESCE(SUM(paid_clicks), 0)");
    assert!(clicks.is_aggregate);
}

#[test]
fn test_lookup_normalizes_case_and_whitespace() {
    let mapping = ColumnMapping::builtin();

    let a = mapping.get("campaign name").expect("exists");
    let b = mapping.get("  Campaign   NAME ").expect("exists");
    assert_eq!(a, b);
}

#[test]
fn test_unknown_name_is_absent() {
    let mapping = ColumnMapping::builtin();
    assert!(mapping.get("password").is_none());
    assert!(mapping.get("").is_none());
}

#[test]
fn test_synonyms_share_an_expression() {
    let mapping = ColumnMapping::builtin();

    let spend = mapping.get("spend").expect("exists");
    let cost = mapping.get("cost").expect("exists");
    assert_eq!(spend.sql_expression, cost.sql_expression);
}

#[test]
fn test_override_adds_a_new_column() {
    let mut overrides = BTreeMap::new();
    overrides.insert(
        "sessions".to_string(),
        ColumnOverride {
            expression: "COALESCE(SUM(sessions), 0)".to_string(),
            alias: None,
            aggregate: None,
        },
    );

    let mapping = ColumnMapping::with_overrides(overrides.iter());
    let sessions = mapping.get("sessions").expect("override applied");

    assert_eq!(sessions.sql_expression, "COALESCE(SUM(sessions), 0)");
    assert_eq!(sessions.default_alias, "sessions");
    // Aggregate flag falls back to keyword detection on the expression.
    assert!(sessions.is_aggregate);
}

#[test]
fn test_override_replaces_a_builtin_definition() {
    let mut overrides = BTreeMap::new();
    overrides.insert(
        "clicks".to_string(),
        ColumnOverride {
            expression: "SUM(organic_clicks + paid_clicks)".to_string(),
            alias: Some("all_clicks".to_string()),
            aggregate: Some(true),
        },
    );

    let mapping = ColumnMapping::with_overrides(overrides.iter());
    let clicks = mapping.get("clicks").expect("exists");

    assert_eq!(clicks.sql_expression, "SUM(organic_clicks + paid_clicks)");
    assert_eq!(clicks.default_alias, "all_clicks");
}

#[test]
fn test_override_default_alias_underscores_the_name() {
    let mut overrides = BTreeMap::new();
    overrides.insert(
        "Bid Amount".to_string(),
        ColumnOverride {
            expression: "bid_amount".to_string(),
            alias: None,
            aggregate: Some(false),
        },
    );

    let mapping = ColumnMapping::with_overrides(overrides.iter());
    let def = mapping.get("bid amount").expect("exists");
    assert_eq!(def.default_alias, "bid_amount");
    assert!(!def.is_aggregate);
}

#[test]
fn test_plain_expression_is_not_detected_as_aggregate() {
    let mut overrides = BTreeMap::new();
    overrides.insert(
        "region".to_string(),
        ColumnOverride {
            expression: "geo_region".to_string(),
            alias: None,
            aggregate: None,
        },
    );

    let mapping = ColumnMapping::with_overrides(overrides.iter());
    assert!(!mapping.get("region").expect("exists").is_aggregate);
}
