// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Recalculation entry points for data mutations.
//!
//! Cost postings and the forecast are derived state: every change to a
//! transaction, salary or salary cost must run the matching hook.

use rusqlite::Connection;

use super::aggregate::calculate_forecast;
use super::cost_details::{
    materialize_cost_details, refresh_all_cost_details, refresh_salary_cost_details,
};
use super::ForecastOptions;
use crate::errors::Result;
use crate::models::MonthlyForecast;

pub fn after_transaction_change(
    conn: &mut Connection,
    user_id: i64,
    opts: &ForecastOptions,
) -> Result<Vec<MonthlyForecast>> {
    calculate_forecast(conn, user_id, opts)
}

pub fn after_salary_change(
    conn: &mut Connection,
    user_id: i64,
    salary_id: i64,
    opts: &ForecastOptions,
) -> Result<Vec<MonthlyForecast>> {
    refresh_salary_cost_details(conn, user_id, salary_id, opts)?;
    calculate_forecast(conn, user_id, opts)
}

pub fn after_cost_change(
    conn: &mut Connection,
    user_id: i64,
    cost_id: i64,
    opts: &ForecastOptions,
) -> Result<Vec<MonthlyForecast>> {
    materialize_cost_details(conn, user_id, cost_id, opts)?;
    calculate_forecast(conn, user_id, opts)
}

pub fn rebuild_all(
    conn: &mut Connection,
    user_id: i64,
    opts: &ForecastOptions,
) -> Result<Vec<MonthlyForecast>> {
    refresh_all_cost_details(conn, user_id, opts)?;
    calculate_forecast(conn, user_id, opts)
}
