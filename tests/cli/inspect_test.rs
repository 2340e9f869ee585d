//! Tests for the offline `inspect` subcommand.

use assert_cmd::Command;

fn inspect(args: &[&str]) -> std::process::Output {
    let dir = tempfile::tempdir().expect("temp dir");
    Command::cargo_bin("reportsmith")
        .expect("binary builds")
        .current_dir(dir.path())
        .args(["inspect"])
        .args(args)
        .output()
        .expect("command runs")
}

#[test]
fn test_inspect_prints_cron_and_sql() {
    let output = inspect(&[
        "--schedule",
        "Daily at 5 PM",
        "--columns",
        "date,campaign,clicks",
        "--today",
        "2024-03-10",
    ]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("0 17 * * *"), "stdout: {stdout}");
    assert!(stdout.contains("FROM ad_event_view"), "stdout: {stdout}");
    assert!(stdout.contains("GROUP BY event_date, campaign_name"), "stdout: {stdout}");
}

#[test]
fn test_inspect_resolves_ranges_against_today() {
    let output = inspect(&[
        "--schedule",
        "Every Monday at 8 AM CST, last 7 days",
        "--columns",
        "date,clicks",
        "--today",
        "2024-03-10",
    ]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("0 8 * * 1"), "stdout: {stdout}");
    assert!(stdout.contains("2024-03-03 .. 2024-03-09"), "stdout: {stdout}");
}

#[test]
fn test_inspect_fails_on_unknown_column() {
    let output = inspect(&["--schedule", "Daily at 5 PM", "--columns", "date,password"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown column"), "stderr: {stderr}");
}

#[test]
fn test_inspect_fails_on_unrecognized_schedule() {
    let output = inspect(&["--schedule", "whenever convenient", "--columns", "clicks"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unrecognized cadence"), "stderr: {stderr}");
}
