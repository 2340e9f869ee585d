//! Cadence and range templates.
//!
//! Each recognized phrasing is a typed matcher object. The parser iterates
//! its matcher lists in priority order and takes the first match — more
//! specific templates (those naming a weekday) come before the bare-time
//! fallback, or "Every Monday at 8 AM" would be swallowed by the generic
//! time-only rule.
//!
//! Matchers receive pre-normalized text (lowercased, whitespace collapsed).

use chrono::{Datelike, Days, NaiveDate, Weekday};
use regex::Regex;

use super::{DateRange, Frequency, ParseError, RangeMode, RecurrenceSpec, TimeOfDay};

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// A single cadence template.
///
/// `try_match` returns `None` when the template does not apply, and
/// `Some(Err(..))` when it applies but carries a malformed token — a matched
/// template never falls through to a later, laxer one.
pub trait CadenceMatcher: Send + Sync {
    /// Template name, for logging.
    fn name(&self) -> &'static str;

    /// Attempt to extract a recurrence from normalized text.
    fn try_match(
        &self,
        text: &str,
        default_timezone: &str,
    ) -> Option<Result<RecurrenceSpec, ParseError>>;
}

/// A single range-descriptor template, matched independently of cadence
/// phrases (a ticket may mix both in the same free-text field).
pub trait RangeMatcher: Send + Sync {
    /// Template name, for logging.
    fn name(&self) -> &'static str;

    /// Attempt to resolve a date range from normalized text, relative to
    /// `today`.
    fn try_match(&self, text: &str, today: NaiveDate) -> Option<Result<DateRange, ParseError>>;
}

// ---------------------------------------------------------------------------
// Shared token handling
// ---------------------------------------------------------------------------

/// Timezone abbreviation fragment shared by the cadence regexes.
const TZ_FRAGMENT: &str = r"(?:\s*(pt|pst|pdt|mt|mst|mdt|ct|cst|cdt|et|est|edt|utc|gmt)\b)?";

/// Compile a hard-coded template pattern.
///
/// The patterns are compile-time constants; a failure here is a programming
/// error, not an input condition, and must not shrink the grammar silently.
fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("hard-coded template pattern compiles")
}

/// Map a recognized zone abbreviation to its IANA identifier.
///
/// Closed table; the parser only ever passes abbreviations captured by
/// [`TZ_FRAGMENT`]. A missing token resolves to the configured default zone
/// rather than failing, since ticket authors frequently omit it.
pub(super) fn resolve_zone(token: Option<&str>, default_timezone: &str) -> String {
    match token {
        Some("pt" | "pst" | "pdt") => "America/Los_Angeles".to_owned(),
        Some("mt" | "mst" | "mdt") => "America/Denver".to_owned(),
        Some("ct" | "cst" | "cdt") => "America/Chicago".to_owned(),
        Some("et" | "est" | "edt") => "America/New_York".to_owned(),
        Some("utc" | "gmt") => "UTC".to_owned(),
        _ => default_timezone.to_owned(),
    }
}

/// Normalize a captured time token to 24-hour form.
///
/// Accepts 12-hour with meridiem ("8 am", "10:30pm") or 24-hour ("17:00").
pub(super) fn parse_time_parts(
    hour: &str,
    minute: Option<&str>,
    meridiem: Option<&str>,
) -> Result<TimeOfDay, ParseError> {
    let raw = || {
        let minute = minute.map(|m| format!(":{m}")).unwrap_or_default();
        let meridiem = meridiem.map(|m| format!(" {m}")).unwrap_or_default();
        format!("{hour}{minute}{meridiem}")
    };

    let hour_value: u8 = hour
        .parse()
        .map_err(|_| ParseError::MalformedTime(raw()))?;
    let minute_value: u8 = match minute {
        Some(m) => m.parse().map_err(|_| ParseError::MalformedTime(raw()))?,
        None => 0,
    };

    let hour_value = match meridiem {
        Some(m) => {
            if hour_value == 0 || hour_value > 12 {
                return Err(ParseError::MalformedTime(raw()));
            }
            match (m, hour_value) {
                ("am", 12) => 0,
                ("am", h) => h,
                ("pm", 12) => 12,
                ("pm", h) => h.saturating_add(12),
                _ => return Err(ParseError::MalformedTime(raw())),
            }
        }
        None => hour_value,
    };

    TimeOfDay::new(hour_value, minute_value).map_err(|_| ParseError::MalformedTime(raw()))
}

fn weekday_from_name(name: &str) -> Option<Weekday> {
    match name {
        "sunday" => Some(Weekday::Sun),
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        _ => None,
    }
}

fn yesterday(today: NaiveDate) -> NaiveDate {
    today.checked_sub_days(Days::new(1)).unwrap_or(today)
}

// ---------------------------------------------------------------------------
// Cadence matchers
// ---------------------------------------------------------------------------

/// `"every <WEEKDAY> at <TIME> <TZ>?"` → weekly recurrence.
pub struct WeeklyMatcher {
    pattern: Regex,
}

impl WeeklyMatcher {
    /// Compile the weekly template.
    pub fn new() -> Self {
        Self {
            pattern: pattern(&format!(
                r"\bevery\s+(sunday|monday|tuesday|wednesday|thursday|friday|saturday)s?\b\s*(?:at\s+)?(\d{{1,2}})(?::(\d{{2}}))?\s*(am|pm)?{TZ_FRAGMENT}"
            )),
        }
    }
}

impl CadenceMatcher for WeeklyMatcher {
    fn name(&self) -> &'static str {
        "weekly"
    }

    fn try_match(
        &self,
        text: &str,
        default_timezone: &str,
    ) -> Option<Result<RecurrenceSpec, ParseError>> {
        let caps = self.pattern.captures(text)?;
        let day_of_week = weekday_from_name(caps.get(1)?.as_str())?;
        let time = parse_time_parts(
            caps.get(2)?.as_str(),
            caps.get(3).map(|m| m.as_str()),
            caps.get(4).map(|m| m.as_str()),
        );
        Some(time.map(|time| RecurrenceSpec {
            frequency: Frequency::Weekly,
            time,
            day_of_week: Some(day_of_week),
            timezone: resolve_zone(caps.get(5).map(|m| m.as_str()), default_timezone),
        }))
    }
}

/// `"daily at <TIME> <TZ>?"` (also "every day", "each day") → daily
/// recurrence.
pub struct DailyMatcher {
    pattern: Regex,
}

impl DailyMatcher {
    /// Compile the daily template.
    pub fn new() -> Self {
        Self {
            pattern: pattern(&format!(
                r"\b(?:daily|every\s+day|each\s+day)\b,?\s*(?:at\s+)?(\d{{1,2}})(?::(\d{{2}}))?\s*(am|pm)?{TZ_FRAGMENT}"
            )),
        }
    }
}

impl CadenceMatcher for DailyMatcher {
    fn name(&self) -> &'static str {
        "daily"
    }

    fn try_match(
        &self,
        text: &str,
        default_timezone: &str,
    ) -> Option<Result<RecurrenceSpec, ParseError>> {
        let caps = self.pattern.captures(text)?;
        let time = parse_time_parts(
            caps.get(1)?.as_str(),
            caps.get(2).map(|m| m.as_str()),
            caps.get(3).map(|m| m.as_str()),
        );
        Some(time.map(|time| RecurrenceSpec {
            frequency: Frequency::Daily,
            time,
            day_of_week: None,
            timezone: resolve_zone(caps.get(4).map(|m| m.as_str()), default_timezone),
        }))
    }
}

/// `"monthly at <TIME> <TZ>?"` (also "every month", "each month") →
/// monthly recurrence firing on the 1st.
pub struct MonthlyMatcher {
    pattern: Regex,
}

impl MonthlyMatcher {
    /// Compile the monthly template.
    pub fn new() -> Self {
        Self {
            pattern: pattern(&format!(
                r"\b(?:monthly|every\s+month|each\s+month)\b,?\s*(?:at\s+)?(\d{{1,2}})(?::(\d{{2}}))?\s*(am|pm)?{TZ_FRAGMENT}"
            )),
        }
    }
}

impl CadenceMatcher for MonthlyMatcher {
    fn name(&self) -> &'static str {
        "monthly"
    }

    fn try_match(
        &self,
        text: &str,
        default_timezone: &str,
    ) -> Option<Result<RecurrenceSpec, ParseError>> {
        let caps = self.pattern.captures(text)?;
        let time = parse_time_parts(
            caps.get(1)?.as_str(),
            caps.get(2).map(|m| m.as_str()),
            caps.get(3).map(|m| m.as_str()),
        );
        Some(time.map(|time| RecurrenceSpec {
            frequency: Frequency::Monthly,
            time,
            day_of_week: None,
            timezone: resolve_zone(caps.get(4).map(|m| m.as_str()), default_timezone),
        }))
    }
}

/// `"<TIME> <TZ>?"` with no cadence word → implicit daily recurrence.
///
/// The time token must carry a meridiem or a minute component so that bare
/// numerals in range descriptors ("last 7 days") are not mistaken for times.
/// The fallback declines entirely when the text still carries a cadence word
/// no earlier template consumed ("every other tuesday", "biweekly") — an
/// out-of-grammar interval must fail, not degrade to daily.
pub struct BareTimeMatcher {
    meridiem_form: Regex,
    clock_form: Regex,
    cadence_guard: Regex,
}

impl BareTimeMatcher {
    /// Compile the bare-time fallback templates.
    pub fn new() -> Self {
        Self {
            meridiem_form: pattern(&format!(
                r"\b(\d{{1,2}})(?::(\d{{2}}))?\s*(am|pm)\b{TZ_FRAGMENT}"
            )),
            clock_form: pattern(&format!(r"\b(\d{{1,2}}):(\d{{2}})\b{TZ_FRAGMENT}")),
            cadence_guard: pattern(
                r"\b(?:every|each|daily|weekly|biweekly|monthly|quarterly|yearly|annually|hourly)\b",
            ),
        }
    }
}

impl CadenceMatcher for BareTimeMatcher {
    fn name(&self) -> &'static str {
        "bare-time"
    }

    fn try_match(
        &self,
        text: &str,
        default_timezone: &str,
    ) -> Option<Result<RecurrenceSpec, ParseError>> {
        if self.cadence_guard.is_match(text) {
            return None;
        }
        let (time, zone) = if let Some(caps) = self.meridiem_form.captures(text) {
            (
                parse_time_parts(
                    caps.get(1)?.as_str(),
                    caps.get(2).map(|m| m.as_str()),
                    caps.get(3).map(|m| m.as_str()),
                ),
                caps.get(4).map(|m| m.as_str().to_owned()),
            )
        } else if let Some(caps) = self.clock_form.captures(text) {
            (
                parse_time_parts(caps.get(1)?.as_str(), caps.get(2).map(|m| m.as_str()), None),
                caps.get(3).map(|m| m.as_str().to_owned()),
            )
        } else {
            return None;
        };
        Some(time.map(|time| RecurrenceSpec {
            frequency: Frequency::Daily,
            time,
            day_of_week: None,
            timezone: resolve_zone(zone.as_deref(), default_timezone),
        }))
    }
}

// ---------------------------------------------------------------------------
// Range matchers
// ---------------------------------------------------------------------------

/// `"YYYY-MM-DD to YYYY-MM-DD"` → explicit literal range.
pub struct ExplicitRangeMatcher {
    pattern: Regex,
}

impl ExplicitRangeMatcher {
    /// Compile the explicit-range template.
    pub fn new() -> Self {
        Self {
            pattern: pattern(
                r"(\d{4}-\d{2}-\d{2})\s*(?:to|through|until|-)\s*(\d{4}-\d{2}-\d{2})",
            ),
        }
    }
}

impl RangeMatcher for ExplicitRangeMatcher {
    fn name(&self) -> &'static str {
        "explicit"
    }

    fn try_match(&self, text: &str, _today: NaiveDate) -> Option<Result<DateRange, ParseError>> {
        let caps = self.pattern.captures(text)?;
        let raw_start = caps.get(1)?.as_str();
        let raw_end = caps.get(2)?.as_str();
        let start = NaiveDate::parse_from_str(raw_start, "%Y-%m-%d")
            .map_err(|_| ParseError::MalformedDate(raw_start.to_owned()));
        let end = NaiveDate::parse_from_str(raw_end, "%Y-%m-%d")
            .map_err(|_| ParseError::MalformedDate(raw_end.to_owned()));
        Some(match (start, end) {
            (Ok(start), Ok(end)) if start <= end => Ok(DateRange {
                start,
                end,
                mode: RangeMode::Explicit,
            }),
            (Ok(start), Ok(end)) => Err(ParseError::InvalidRange { start, end }),
            (Err(e), _) | (_, Err(e)) => Err(e),
        })
    }
}

/// `"since <DATE>"` / `"starting <DATE>"` → explicit range ending yesterday.
pub struct SinceMatcher {
    pattern: Regex,
}

impl SinceMatcher {
    /// Compile the open-start template.
    pub fn new() -> Self {
        Self {
            pattern: pattern(r"\b(?:since|starting|ongoing\s+from)\s+(\d{4}-\d{2}-\d{2})"),
        }
    }
}

impl RangeMatcher for SinceMatcher {
    fn name(&self) -> &'static str {
        "since"
    }

    fn try_match(&self, text: &str, today: NaiveDate) -> Option<Result<DateRange, ParseError>> {
        let caps = self.pattern.captures(text)?;
        let raw = caps.get(1)?.as_str();
        let start = match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(d) => d,
            Err(_) => return Some(Err(ParseError::MalformedDate(raw.to_owned()))),
        };
        let end = yesterday(today);
        Some(if start <= end {
            Ok(DateRange {
                start,
                end,
                mode: RangeMode::Explicit,
            })
        } else {
            Err(ParseError::InvalidRange { start, end })
        })
    }
}

/// `"last <N> days"`, `"prior day"`, `"yesterday"` → last N complete days.
pub struct LastDaysMatcher {
    counted: Regex,
    single: Regex,
}

impl LastDaysMatcher {
    /// Compile the relative-lookback templates.
    pub fn new() -> Self {
        Self {
            // [1-9]\d* so "last 0 days" falls through instead of producing
            // an empty window.
            counted: pattern(r"\b(?:last|past|previous)\s+([1-9]\d*)\s+days?\b"),
            single: pattern(r"\b(?:prior|previous)\s+day\b|\byesterday\b"),
        }
    }
}

impl RangeMatcher for LastDaysMatcher {
    fn name(&self) -> &'static str {
        "last-days"
    }

    fn try_match(&self, text: &str, today: NaiveDate) -> Option<Result<DateRange, ParseError>> {
        let days: u32 = if let Some(caps) = self.counted.captures(text) {
            caps.get(1)?.as_str().parse().ok()?
        } else if self.single.is_match(text) {
            1
        } else {
            return None;
        };
        Some(Ok(resolve_last_days(days, today)))
    }
}

/// `"month to date"` / `"mtd"` and `"year to date"` / `"ytd"`.
pub struct ToDateMatcher {
    month: Regex,
    year: Regex,
}

impl ToDateMatcher {
    /// Compile the to-date templates.
    pub fn new() -> Self {
        Self {
            month: pattern(r"\bmonth\s+to\s+date\b|\bmtd\b"),
            year: pattern(r"\byear\s+to\s+date\b|\bytd\b"),
        }
    }
}

impl RangeMatcher for ToDateMatcher {
    fn name(&self) -> &'static str {
        "to-date"
    }

    fn try_match(&self, text: &str, today: NaiveDate) -> Option<Result<DateRange, ParseError>> {
        if self.month.is_match(text) {
            Some(Ok(resolve_to_date(today, RangeMode::MonthToDate)))
        } else if self.year.is_match(text) {
            Some(Ok(resolve_to_date(today, RangeMode::YearToDate)))
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Range resolution
// ---------------------------------------------------------------------------

/// `[today − n, today − 1]` — the last `n` complete days.
pub(super) fn resolve_last_days(days: u32, today: NaiveDate) -> DateRange {
    let days = days.max(1);
    let start = today
        .checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(today);
    DateRange {
        start,
        end: yesterday(today),
        mode: RangeMode::LastDays(days),
    }
}

/// Month- or year-to-date through yesterday.
///
/// On the first day of the period `today − 1` would precede the period
/// start; the end is clamped so `start <= end` holds unconditionally.
pub(super) fn resolve_to_date(today: NaiveDate, mode: RangeMode) -> DateRange {
    let start = match mode {
        RangeMode::YearToDate => NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
        _ => today.with_day(1).unwrap_or(today),
    };
    DateRange {
        start,
        end: yesterday(today).max(start),
        mode,
    }
}
