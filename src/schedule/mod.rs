//! Schedule expression parsing.
//!
//! Converts free-text cadence phrases ("Every Monday at 8 AM CST",
//! "Daily at 5 PM") and range descriptors ("Last 7 days", "month to date")
//! into a canonical [`RecurrenceSpec`] / [`DateRange`] pair plus a derived
//! 5-field [`CronExpression`].
//!
//! The grammar is a closed, ordered set of templates — see
//! [`matchers`] for the template list and [`parser::ScheduleParser`] for the
//! entry point. Matching is first-match-wins; unmatched input is an error,
//! never a silently guessed default.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

pub mod matchers;
pub mod parser;

pub use parser::{ParsedSchedule, ScheduleParser};

// ---------------------------------------------------------------------------
// Core types
// ---------------------------------------------------------------------------

/// How often a report recurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Every day.
    Daily,
    /// Once a week on a fixed weekday.
    Weekly,
    /// Once a month on the first day.
    Monthly,
}

/// A time of day, normalized to 24-hour form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeOfDay {
    /// Hour, 0–23.
    pub hour: u8,
    /// Minute, 0–59.
    pub minute: u8,
}

impl TimeOfDay {
    /// Construct a time of day, validating bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MalformedTime`] when hour > 23 or minute > 59.
    pub fn new(hour: u8, minute: u8) -> Result<Self, ParseError> {
        if hour > 23 || minute > 59 {
            return Err(ParseError::MalformedTime(format!("{hour}:{minute:02}")));
        }
        Ok(Self { hour, minute })
    }
}

impl fmt::Display for TimeOfDay {
    /// Zero-padded 24-hour form, e.g. `08:00`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Canonical recurring-schedule representation.
///
/// Invariant: `day_of_week` is present iff `frequency` is [`Frequency::Weekly`].
/// The time is the stated local time in `timezone`; no cross-zone shifting
/// is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceSpec {
    /// Recurrence cadence.
    pub frequency: Frequency,
    /// Time of day the report fires.
    pub time: TimeOfDay,
    /// Weekday for weekly schedules; `None` otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<Weekday>,
    /// IANA zone identifier the time is stated in.
    pub timezone: String,
}

// ---------------------------------------------------------------------------
// Cron
// ---------------------------------------------------------------------------

/// Weekday numbering used in the day-of-week cron field (Sunday = 0).
///
/// Fixed table, no locale dependency.
fn weekday_number(day: Weekday) -> u8 {
    match day {
        Weekday::Sun => 0,
        Weekday::Mon => 1,
        Weekday::Tue => 2,
        Weekday::Wed => 3,
        Weekday::Thu => 4,
        Weekday::Fri => 5,
        Weekday::Sat => 6,
    }
}

fn weekday_from_number(n: u8) -> Option<Weekday> {
    match n {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

/// A derived 5-field cron expression (minute, hour, day-of-month, month,
/// day-of-week).
///
/// Derivation from a [`RecurrenceSpec`] is deterministic: semantically equal
/// specs always produce byte-identical expressions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CronExpression(String);

impl CronExpression {
    /// Wrap a raw 5-field expression, e.g. one read back from a stored
    /// configuration. Validation happens in [`CronExpression::decode`] and
    /// [`CronExpression::schedule`].
    pub fn new(expr: impl Into<String>) -> Self {
        Self(expr.into())
    }

    /// Derive the cron expression for a recurrence.
    ///
    /// Minute/hour come from the stated time. Day-of-month and month are
    /// wildcards except for monthly schedules, which fire on the 1st.
    pub fn from_recurrence(spec: &RecurrenceSpec) -> Self {
        let minute = spec.time.minute;
        let hour = spec.time.hour;
        let expr = match spec.frequency {
            Frequency::Daily => format!("{minute} {hour} * * *"),
            Frequency::Weekly => {
                let dow = spec.day_of_week.map_or(0, weekday_number);
                format!("{minute} {hour} * * {dow}")
            }
            Frequency::Monthly => format!("{minute} {hour} 1 * *"),
        };
        Self(expr)
    }

    /// The raw 5-field expression string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the expression back into an equivalent [`RecurrenceSpec`].
    ///
    /// Inverse of [`CronExpression::from_recurrence`] for every expression
    /// that function can produce. The timezone is supplied by the caller
    /// since the cron string does not carry one.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MalformedCron`] for expressions outside the
    /// producible set (wrong field count, non-numeric time fields, or an
    /// out-of-range day-of-week).
    pub fn decode(&self, timezone: &str) -> Result<RecurrenceSpec, ParseError> {
        let malformed = || ParseError::MalformedCron(self.0.clone());

        let fields: Vec<&str> = self.0.split_whitespace().collect();
        let [minute, hour, dom, _month, dow] = fields.as_slice() else {
            return Err(malformed());
        };

        let minute: u8 = minute.parse().map_err(|_| malformed())?;
        let hour: u8 = hour.parse().map_err(|_| malformed())?;
        let time = TimeOfDay::new(hour, minute).map_err(|_| malformed())?;

        let (frequency, day_of_week) = match (*dom, *dow) {
            ("*", "*") => (Frequency::Daily, None),
            ("*", dow) => {
                let n: u8 = dow.parse().map_err(|_| malformed())?;
                let day = weekday_from_number(n).ok_or_else(malformed)?;
                (Frequency::Weekly, Some(day))
            }
            ("1", "*") => (Frequency::Monthly, None),
            _ => return Err(malformed()),
        };

        Ok(RecurrenceSpec {
            frequency,
            time,
            day_of_week,
            timezone: timezone.to_owned(),
        })
    }

    /// Bridge to the `cron` crate for fire-time evaluation.
    ///
    /// The `cron` crate expects a seconds field, so one is prepended, and it
    /// numbers weekdays 1–7 (Sunday = 1) where the stored form uses 0–6
    /// (Sunday = 0) — the day-of-week field is rewritten to a named day to
    /// sidestep the mismatch.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MalformedCron`] when the expression does not
    /// parse as a schedule.
    pub fn schedule(&self) -> Result<cron::Schedule, ParseError> {
        let malformed = || ParseError::MalformedCron(self.0.clone());

        let fields: Vec<&str> = self.0.split_whitespace().collect();
        let [minute, hour, dom, month, dow] = fields.as_slice() else {
            return Err(malformed());
        };

        let dow = match *dow {
            "*" => "*".to_owned(),
            numeric => {
                let n: u8 = numeric.parse().map_err(|_| malformed())?;
                weekday_from_number(n).ok_or_else(malformed)?.to_string()
            }
        };

        cron::Schedule::from_str(&format!("0 {minute} {hour} {dom} {month} {dow}"))
            .map_err(|_| malformed())
    }
}

impl fmt::Display for CronExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Date ranges
// ---------------------------------------------------------------------------

/// The policy used to resolve a time window into concrete dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RangeMode {
    /// The last N complete days ending yesterday.
    LastDays(u32),
    /// From the first of the current month through yesterday.
    MonthToDate,
    /// From January 1st of the current year through yesterday.
    YearToDate,
    /// Literal start/end dates supplied in the request.
    Explicit,
}

/// A resolved, immutable date range.
///
/// Invariant: `start <= end`, always.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First day covered, inclusive.
    pub start: NaiveDate,
    /// Last day covered, inclusive.
    pub end: NaiveDate,
    /// The resolution policy this range was produced by.
    pub mode: RangeMode,
}

impl DateRange {
    /// The last `days` complete days relative to `today`: `[today − days,
    /// today − 1]`. A zero count is treated as one day.
    pub fn last_days(days: u32, today: NaiveDate) -> Self {
        matchers::resolve_last_days(days, today)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while parsing a schedule description.
///
/// All of these are caller-input problems, terminal for the current
/// generation attempt — a wrong schedule silently accepted would corrupt
/// downstream automation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// No cadence or range template matched the input.
    #[error("unrecognized cadence phrase: {0:?}")]
    UnrecognizedCadence(String),
    /// A time token was present but unparsable (e.g. hour 25).
    #[error("malformed time token: {0:?}")]
    MalformedTime(String),
    /// A date token was present but not a real calendar date.
    #[error("malformed date token: {0:?}")]
    MalformedDate(String),
    /// An explicit range had start after end.
    #[error("invalid range: start {start} is after end {end}")]
    InvalidRange {
        /// Requested start date.
        start: NaiveDate,
        /// Requested end date.
        end: NaiveDate,
    },
    /// A cron expression could not be decoded.
    #[error("malformed cron expression: {0:?}")]
    MalformedCron(String),
}
