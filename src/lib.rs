//! Reportsmith — recurring-report configuration generator.
//!
//! Takes a semi-structured report request (a Jira ticket carrying a cadence
//! phrase, a time window, and a list of desired columns) and produces a
//! machine-readable report configuration (cron schedule, resolved date range,
//! rendered SQL, recipients) plus a sample preview table.
//!
//! See `DESIGN.md` for full architecture documentation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod credentials;
pub mod jira;
pub mod logging;
pub mod query;
pub mod report;
pub mod schedule;
