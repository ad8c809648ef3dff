//! Gregorian ordinal day numbers.
//!
//! AnnAGNPS stamps its daily output with the proleptic Gregorian ordinal,
//! where 0001-01-01 is day 1 (2016-05-20 is day 736104).

use chrono::{Datelike, NaiveDate};

use crate::{CoreError, CoreResult};

pub type GregorianDay = i64;

pub fn gregorian_day(date: NaiveDate) -> GregorianDay {
    GregorianDay::from(date.num_days_from_ce())
}

pub fn date_from_gregorian_day(day: GregorianDay) -> Option<NaiveDate> {
    i32::try_from(day)
        .ok()
        .and_then(NaiveDate::from_num_days_from_ce_opt)
}

/// Parse an ISO `YYYY-MM-DD` date into its ordinal day.
pub fn parse_gregorian_day(text: &str) -> CoreResult<GregorianDay> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map(gregorian_day)
        .map_err(|_| CoreError::InvalidDate {
            text: text.to_string(),
        })
}
