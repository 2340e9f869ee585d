//! Tests for cron derivation and decoding.

use chrono::Weekday;
use reportsmith::schedule::{CronExpression, Frequency, ParseError, RecurrenceSpec, TimeOfDay};

fn spec(frequency: Frequency, hour: u8, minute: u8, day: Option<Weekday>) -> RecurrenceSpec {
    RecurrenceSpec {
        frequency,
        time: TimeOfDay::new(hour, minute).expect("valid time"),
        day_of_week: day,
        timezone: "America/Los_Angeles".to_string(),
    }
}

#[test]
fn test_daily_derivation() {
    let cron = CronExpression::from_recurrence(&spec(Frequency::Daily, 17, 0, None));
    assert_eq!(cron.as_str(), "0 17 * * *");
}

#[test]
fn test_weekly_derivation_uses_sunday_zero_numbering() {
    let sunday = CronExpression::from_recurrence(&spec(
        Frequency::Weekly,
        9,
        0,
        Some(Weekday::Sun),
    ));
    assert_eq!(sunday.as_str(), "0 9 * * 0");

    let saturday = CronExpression::from_recurrence(&spec(
        Frequency::Weekly,
        9,
        0,
        Some(Weekday::Sat),
    ));
    assert_eq!(saturday.as_str(), "0 9 * * 6");
}

#[test]
fn test_monthly_derivation_fires_on_the_first() {
    let cron = CronExpression::from_recurrence(&spec(Frequency::Monthly, 6, 30, None));
    assert_eq!(cron.as_str(), "30 6 1 * *");
}

#[test]
fn test_derivation_is_deterministic() {
    let a = CronExpression::from_recurrence(&spec(Frequency::Weekly, 8, 0, Some(Weekday::Mon)));
    let b = CronExpression::from_recurrence(&spec(Frequency::Weekly, 8, 0, Some(Weekday::Mon)));
    assert_eq!(a, b);
    assert_eq!(a.as_str(), b.as_str());
}

#[test]
fn test_decode_inverts_derivation() {
    let originals = [
        spec(Frequency::Daily, 17, 0, None),
        spec(Frequency::Weekly, 8, 15, Some(Weekday::Mon)),
        spec(Frequency::Monthly, 0, 0, None),
    ];

    for original in originals {
        let cron = CronExpression::from_recurrence(&original);
        let decoded = cron
            .decode("America/Los_Angeles")
            .expect("producible expression decodes");
        assert_eq!(decoded, original);
    }
}

#[test]
fn test_decode_rejects_foreign_expressions() {
    let cases = [
        "0 17 * *",      // four fields
        "0 17 * * * *",  // six fields
        "a b * * *",     // non-numeric time
        "0 8 * * 9",     // day-of-week out of range
        "0 8 2 * *",     // day-of-month outside the producible set
        "*/5 * * * *",   // step expressions are never produced
    ];

    for raw in cases {
        let err = CronExpression::new(raw)
            .decode("UTC")
            .expect_err("foreign expression must not decode");
        assert!(matches!(err, ParseError::MalformedCron(_)), "case: {raw}");
    }
}

#[test]
fn test_schedule_bridge_yields_fire_times() {
    let cron = CronExpression::from_recurrence(&spec(Frequency::Daily, 17, 0, None));
    let schedule = cron.schedule().expect("valid schedule");

    let fires: Vec<_> = schedule.upcoming(chrono::Utc).take(2).collect();
    assert_eq!(fires.len(), 2);
    for fire in fires {
        assert_eq!(fire.format("%H:%M:%S").to_string(), "17:00:00");
    }
}

#[test]
fn test_schedule_bridge_honors_weekday_numbering() {
    // Stored form numbers Sunday as 0; fire times must land on the named
    // weekday, not on the cron crate's 1-based reading of the same digit.
    let cron = CronExpression::from_recurrence(&spec(
        Frequency::Weekly,
        8,
        0,
        Some(Weekday::Mon),
    ));
    assert_eq!(cron.as_str(), "0 8 * * 1");

    let schedule = cron.schedule().expect("valid schedule");
    for fire in schedule.upcoming(chrono::Utc).take(3) {
        assert_eq!(chrono::Datelike::weekday(&fire), Weekday::Mon);
    }
}

#[test]
fn test_display_matches_raw_form() {
    let cron = CronExpression::from_recurrence(&spec(Frequency::Daily, 5, 45, None));
    assert_eq!(cron.to_string(), "45 5 * * *");
}
