//! Tests for Jira request building and response parsing.

use reportsmith::config::JiraFieldsConfig;
use reportsmith::jira::{
    parse_search_response, search_url, split_recipients, split_requested_columns, FetchError,
};

fn fields_config() -> JiraFieldsConfig {
    JiraFieldsConfig::default()
}

fn search_body(schedule: &str, columns: &str) -> String {
    format!(
        r#"{{
            "issues": [
                {{
                    "key": "AD-378",
                    "fields": {{
                        "summary": "Weekly spend report",
                        "customfield_10095": "{schedule}",
                        "customfield_10093": "Last 7 days",
                        "customfield_10094": "{columns}",
                        "customfield_10098": "Ops@example.com; finance@example.com",
                        "customfield_10097": "Email"
                    }}
                }}
            ]
        }}"#
    )
}

#[test]
fn test_search_url_targets_the_search_endpoint() {
    let url = search_url("https://acme.atlassian.net", "AD-378").expect("valid url");

    assert_eq!(url.path(), "/rest/api/2/search");
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    assert!(pairs.contains(&("jql".to_string(), "key = \"AD-378\"".to_string())));
    assert!(pairs.contains(&("maxResults".to_string(), "1".to_string())));
}

#[test]
fn test_search_url_rejects_invalid_base() {
    let err = search_url("not a url", "AD-378").expect_err("should fail");
    assert!(matches!(err, FetchError::Parse(_)));
}

#[test]
fn test_parse_full_response() {
    let body = search_body("Every Monday at 8 AM CST", "Date, Campaign, Clicks and Spend");
    let ticket = parse_search_response(&body, "AD-378", &fields_config()).expect("should parse");

    assert_eq!(ticket.key, "AD-378");
    assert_eq!(ticket.summary, "Weekly spend report");
    assert_eq!(ticket.schedule_description, "Every Monday at 8 AM CST");
    assert_eq!(ticket.time_window.as_deref(), Some("Last 7 days"));
    assert_eq!(
        ticket.requested_columns,
        vec!["Date", "Campaign", "Clicks", "Spend"]
    );
    assert_eq!(
        ticket.recipients,
        vec!["ops@example.com", "finance@example.com"]
    );
    assert_eq!(ticket.delivery_method.as_deref(), Some("email"));
}

#[test]
fn test_empty_search_is_not_found() {
    let err = parse_search_response(r#"{"issues": []}"#, "AD-999", &fields_config())
        .expect_err("should fail");

    assert!(matches!(err, FetchError::NotFound(key) if key == "AD-999"));
}

#[test]
fn test_missing_schedule_field() {
    let body = r#"{
        "issues": [
            {
                "key": "AD-378",
                "fields": {
                    "summary": "Weekly spend report",
                    "customfield_10094": "Date, Clicks",
                    "customfield_10098": "ops@example.com"
                }
            }
        ]
    }"#;

    let err = parse_search_response(body, "AD-378", &fields_config()).expect_err("should fail");
    assert!(matches!(
        err,
        FetchError::MissingField { ticket, field: "schedule" } if ticket == "AD-378"
    ));
}

#[test]
fn test_blank_field_counts_as_missing() {
    let body = search_body("Every Monday at 8 AM CST", "   ");
    let err = parse_search_response(&body, "AD-378", &fields_config()).expect_err("should fail");

    assert!(matches!(err, FetchError::MissingField { field: "columns", .. }));
}

#[test]
fn test_unparsable_body_is_a_parse_error() {
    let err = parse_search_response("<html>busy</html>", "AD-378", &fields_config())
        .expect_err("should fail");
    assert!(matches!(err, FetchError::Parse(_)));
}

#[test]
fn test_split_requested_columns_handles_prose_lists() {
    assert_eq!(
        split_requested_columns("Date, Campaign, Clicks, and Spend"),
        vec!["Date", "Campaign", "Clicks", "Spend"]
    );
    assert_eq!(
        split_requested_columns("Date\nCampaign\nClicks"),
        vec!["Date", "Campaign", "Clicks"]
    );
    assert_eq!(split_requested_columns("Clicks and Spend"), vec!["Clicks", "Spend"]);
}

#[test]
fn test_column_name_containing_and_survives_mid_list() {
    // A bare "and" separates only in the final position; a name that
    // contains the word keeps its shape when another item follows it.
    assert_eq!(
        split_requested_columns("Date, brand and generic terms, Clicks"),
        vec!["Date", "brand and generic terms", "Clicks"]
    );
    assert_eq!(
        split_requested_columns("brand and generic terms\nClicks and Spend"),
        vec!["brand and generic terms", "Clicks", "Spend"]
    );
}

#[test]
fn test_split_recipients_normalizes_separators_and_case() {
    assert_eq!(
        split_recipients("Alice@Example.com; bob@example.com\ncarol@example.com"),
        vec!["alice@example.com", "bob@example.com", "carol@example.com"]
    );
    assert_eq!(split_recipients("  "), Vec::<String>::new());
}
