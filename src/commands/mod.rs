// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod categories;
pub mod costs;
pub mod doctor;
pub mod employees;
pub mod exporter;
pub mod forecast;
pub mod fx;
pub mod salaries;
pub mod transactions;
pub mod vat;

use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::Connection;

use crate::db::DEFAULT_USER_ID;
use crate::forecast::ForecastOptions;
use crate::models::MonthlyForecast;
use crate::utils::{parse_date, today_utc};

/// Value of the global `--user` flag.
pub fn user_id(m: &clap::ArgMatches) -> i64 {
    m.get_one::<i64>("user").copied().unwrap_or(DEFAULT_USER_ID)
}

/// Value of the global `--today` flag, or the current UTC date.
pub fn today(m: &clap::ArgMatches) -> Result<NaiveDate> {
    match m.get_one::<String>("today") {
        Some(s) => parse_date(s),
        None => Ok(today_utc()),
    }
}

pub fn forecast_options(conn: &Connection, m: &clap::ArgMatches) -> Result<ForecastOptions> {
    Ok(ForecastOptions::load(conn, today(m)?)?)
}

fn report_refresh(forecasts: &[MonthlyForecast]) {
    match (forecasts.first(), forecasts.last()) {
        (Some(first), Some(last)) => println!(
            "Forecast updated: {} months ({} .. {})",
            forecasts.len(),
            first.month,
            last.month
        ),
        _ => println!("Forecast updated: no months"),
    }
}
