// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Month-granular date arithmetic shared by every recurrence in the engine.
//!
//! Stepping by months keeps end-of-month dates anchored to the end of the
//! target month and clamps other days to the target month's length, so
//! `Jan 31 + 1 month` is the last day of February while `Jan 30 + 1 month`
//! is `Feb 29` in a leap year and `Feb 28` otherwise.

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::errors::{ForecastError, Result};
use crate::models::{Cycle, MONTH_FORMAT};

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ => {
            if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
                29
            } else {
                28
            }
        }
    }
}

pub fn is_end_of_month(date: NaiveDate) -> bool {
    date.day() == days_in_month(date.year(), date.month())
}

pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    let last = days_in_month(date.year(), date.month());
    date.with_day(last).unwrap_or(date)
}

fn shift_month(date: NaiveDate, months: i32) -> Option<(i32, u32)> {
    let total = date
        .year()
        .checked_mul(12)?
        .checked_add(date.month0() as i32)?
        .checked_add(months)?;
    Some((total.div_euclid(12), total.rem_euclid(12) as u32 + 1))
}

/// Shifts `date` by a signed number of calendar months, or `None` when the
/// result falls outside chrono's calendar.
pub fn add_months(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let (year, month) = shift_month(date, months)?;
    let last = days_in_month(year, month);
    let day = if is_end_of_month(date) {
        last
    } else {
        date.day().min(last)
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Like [`add_months`] but without end-of-month anchoring: the day is only
/// clamped to the target month's length.
pub fn add_months_clamped(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let (year, month) = shift_month(date, months)?;
    NaiveDate::from_ymd_opt(year, month, date.day().min(days_in_month(year, month)))
}

/// Adds `offset` steps of `cycle`. Cycles without a month length leave the
/// date untouched.
pub fn add_cycle(date: NaiveDate, cycle: Cycle, offset: i64) -> Option<NaiveDate> {
    let Some(step) = cycle.months() else {
        return Some(date);
    };
    let months = i64::from(step).checked_mul(offset)?;
    add_months(date, i32::try_from(months).ok()?)
}

pub fn subtract_cycle(date: NaiveDate, cycle: Cycle, offset: i64) -> Option<NaiveDate> {
    add_cycle(date, cycle, offset.checked_neg()?)
}

pub fn add_cycle_at(at: NaiveDateTime, cycle: Cycle, offset: i64) -> Option<NaiveDateTime> {
    add_cycle(at.date(), cycle, offset).map(|date| date.and_time(at.time()))
}

/// Dates `anchor + k * months` for k = 0, 1, ... up to and including `until`.
///
/// Every step is computed from the anchor, so a clamped month never drags
/// later occurrences to an earlier day.
pub fn anchored_steps(
    anchor: NaiveDate,
    months: i32,
    until: NaiveDate,
) -> impl Iterator<Item = NaiveDate> {
    let months = months.max(1);
    (0i32..)
        .map_while(move |k| add_months(anchor, k.checked_mul(months)?))
        .take_while(move |date| *date <= until)
}

pub fn month_key(date: NaiveDate) -> String {
    date.format(MONTH_FORMAT).to_string()
}

pub fn parse_month_key(month: &str) -> Result<NaiveDate> {
    let trimmed = month.trim();
    if trimmed.len() != 7 {
        return Err(ForecastError::InvalidMonth(month.to_string()));
    }
    NaiveDate::parse_from_str(&format!("{}-01", trimmed), "%Y-%m-%d")
        .map_err(|_| ForecastError::InvalidMonth(month.to_string()))
}

/// Last day of the month `years` after `today`; the whole final month is in range.
pub fn horizon_end(today: NaiveDate, years: u32) -> NaiveDate {
    i32::try_from(years.saturating_mul(12))
        .ok()
        .and_then(|months| add_months(today, months))
        .map_or(NaiveDate::MAX, end_of_month)
}
