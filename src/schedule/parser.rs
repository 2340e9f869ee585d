//! The schedule parser entry point.
//!
//! Normalizes free text and runs it through the ordered cadence and range
//! matcher lists. Pure: for a fixed input and reference date, repeated calls
//! yield identical results.

use chrono::NaiveDate;
use tracing::debug;

use super::matchers::{
    BareTimeMatcher, CadenceMatcher, DailyMatcher, ExplicitRangeMatcher, LastDaysMatcher,
    MonthlyMatcher, RangeMatcher, SinceMatcher, ToDateMatcher, WeeklyMatcher,
};
use super::{CronExpression, DateRange, ParseError, RecurrenceSpec};

/// The outcome of parsing one schedule description.
///
/// A ticket may carry only a cadence ("Daily at 5 PM"), only a range
/// ("Last 7 days"), or both mixed in one field; parsing succeeds when at
/// least one template matched. The caller decides which parts it requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSchedule {
    /// Recognized recurrence, if a cadence template matched.
    pub recurrence: Option<RecurrenceSpec>,
    /// Cron expression derived from `recurrence`.
    pub cron: Option<CronExpression>,
    /// Resolved date range, if a range template matched.
    pub range: Option<DateRange>,
}

/// Free-text schedule parser over a closed, ordered template set.
///
/// Construct once (the templates compile their regexes up front) and reuse;
/// parsing holds no mutable state and is safe to share across threads.
pub struct ScheduleParser {
    cadence_matchers: Vec<Box<dyn CadenceMatcher>>,
    range_matchers: Vec<Box<dyn RangeMatcher>>,
    default_timezone: String,
}

impl ScheduleParser {
    /// Build a parser with the full template set.
    ///
    /// `default_timezone` is the documented fallback zone applied when a
    /// cadence phrase omits a zone token.
    pub fn new(default_timezone: impl Into<String>) -> Self {
        // Priority order is part of the grammar: templates naming a cadence
        // word must precede the bare-time fallback.
        let cadence_matchers: Vec<Box<dyn CadenceMatcher>> = vec![
            Box::new(WeeklyMatcher::new()),
            Box::new(MonthlyMatcher::new()),
            Box::new(DailyMatcher::new()),
            Box::new(BareTimeMatcher::new()),
        ];

        let range_matchers: Vec<Box<dyn RangeMatcher>> = vec![
            Box::new(ExplicitRangeMatcher::new()),
            Box::new(SinceMatcher::new()),
            Box::new(LastDaysMatcher::new()),
            Box::new(ToDateMatcher::new()),
        ];

        Self {
            cadence_matchers,
            range_matchers,
            default_timezone: default_timezone.into(),
        }
    }

    /// The configured fallback zone.
    pub fn default_timezone(&self) -> &str {
        &self.default_timezone
    }

    /// Parse a schedule description against the reference date `today`.
    ///
    /// # Errors
    ///
    /// [`ParseError::UnrecognizedCadence`] when no template matches at all;
    /// any error from a matched template (malformed time/date token,
    /// inverted explicit range) propagates unchanged.
    pub fn parse(&self, text: &str, today: NaiveDate) -> Result<ParsedSchedule, ParseError> {
        let normalized = normalize(text);

        let recurrence = self.match_cadence(&normalized)?;
        let range = self.match_range(&normalized, today)?;

        if recurrence.is_none() && range.is_none() {
            return Err(ParseError::UnrecognizedCadence(text.trim().to_owned()));
        }

        let cron = recurrence.as_ref().map(CronExpression::from_recurrence);
        Ok(ParsedSchedule {
            recurrence,
            cron,
            range,
        })
    }

    /// Run the cadence templates in priority order; first match wins.
    fn match_cadence(&self, normalized: &str) -> Result<Option<RecurrenceSpec>, ParseError> {
        for matcher in &self.cadence_matchers {
            if let Some(result) = matcher.try_match(normalized, &self.default_timezone) {
                debug!(template = matcher.name(), "cadence template matched");
                return result.map(Some);
            }
        }
        Ok(None)
    }

    /// Run the range templates in priority order; first match wins.
    fn match_range(
        &self,
        normalized: &str,
        today: NaiveDate,
    ) -> Result<Option<DateRange>, ParseError> {
        for matcher in &self.range_matchers {
            if let Some(result) = matcher.try_match(normalized, today) {
                debug!(template = matcher.name(), "range template matched");
                return result.map(Some);
            }
        }
        Ok(None)
    }
}

/// Case-fold and collapse whitespace before template matching.
fn normalize(text: &str) -> String {
    text.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}
