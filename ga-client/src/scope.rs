//! Report scope: which profile and date range a report covers

use crate::error::AnalyticsError;
use chrono::{Local, Months, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

/// Profile ids look like `ga:12345`; only the prefix is checked.
static PROFILE_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ga:[0-9]{1,10}").unwrap());

/// A `YYYY-MM-DD` date anywhere in the input.
static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{4}-[0-9]{2}-[0-9]{2}").unwrap());

/// Profile id and date range applied to every report request
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReportScope {
    profile_id: Option<String>,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl ReportScope {
    /// Create a scope with no profile and a range of one month ending at `today`
    pub fn new(today: NaiveDate) -> Self {
        // Month arithmetic clamps to the end of shorter months (Mar 31 -> Feb 29)
        let start_date = today.checked_sub_months(Months::new(1)).unwrap_or(today);
        Self {
            profile_id: None,
            start_date,
            end_date: today,
        }
    }

    /// Select the profile that reports are fetched for
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::Validation` if `id` does not start with `ga:`
    /// followed by one to ten digits.
    pub fn set_profile(&mut self, id: &str) -> Result<(), AnalyticsError> {
        if !PROFILE_ID_PATTERN.is_match(id) {
            return Err(AnalyticsError::Validation(format!(
                "invalid profile id {id:?}: expected ga:XXXXXX where XXXXXX is the profile number"
            )));
        }
        self.profile_id = Some(id.to_string());
        Ok(())
    }

    /// Replace the report date range
    ///
    /// Each argument must contain a `YYYY-MM-DD` date, and the start must not be
    /// after the end. The range is left untouched when validation fails.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::Validation` for a missing or impossible date, or
    /// an inverted range.
    pub fn set_date_range(&mut self, start: &str, end: &str) -> Result<(), AnalyticsError> {
        let start_date = parse_date("start", start)?;
        let end_date = parse_date("end", end)?;
        if start_date > end_date {
            return Err(AnalyticsError::Validation(format!(
                "invalid date range: start date {start_date} is after end date {end_date}"
            )));
        }
        self.start_date = start_date;
        self.end_date = end_date;
        Ok(())
    }

    /// Currently selected profile id, if any
    pub fn profile_id(&self) -> Option<&str> {
        self.profile_id.as_deref()
    }

    /// Inclusive `(start, end)` date range
    pub fn date_range(&self) -> (NaiveDate, NaiveDate) {
        (self.start_date, self.end_date)
    }

    /// Query parameters that pin a report to this scope
    pub(crate) fn query_params(&self) -> Result<[(&'static str, String); 3], AnalyticsError> {
        let profile_id = self.profile_id.as_ref().ok_or_else(|| {
            AnalyticsError::Validation("no profile selected; call set_profile first".to_string())
        })?;
        Ok([
            ("ids", profile_id.clone()),
            ("start-date", self.start_date.format("%Y-%m-%d").to_string()),
            ("end-date", self.end_date.format("%Y-%m-%d").to_string()),
        ])
    }
}

impl Default for ReportScope {
    fn default() -> Self {
        Self::new(Local::now().date_naive())
    }
}

fn parse_date(which: &str, value: &str) -> Result<NaiveDate, AnalyticsError> {
    let found = DATE_PATTERN.find(value).ok_or_else(|| {
        AnalyticsError::Validation(format!(
            "invalid {which} date {value:?}: expecting YYYY-MM-DD format"
        ))
    })?;
    NaiveDate::parse_from_str(found.as_str(), "%Y-%m-%d").map_err(|e| {
        AnalyticsError::Validation(format!("invalid {which} date {value:?}: {e}"))
    })
}
