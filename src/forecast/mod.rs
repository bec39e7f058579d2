// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod aggregate;
pub mod calendar;
pub mod cost_dates;
pub mod cost_details;
pub mod detail;
pub mod payroll;
pub mod recurrence;
pub mod refresh;
pub mod vat;

use chrono::NaiveDate;
use rusqlite::Connection;

use crate::errors::Result;
use crate::store;

/// Clock and horizon for one engine run. The engine never reads the system
/// clock itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastOptions {
    pub today: NaiveDate,
    pub max_years: u32,
}

impl ForecastOptions {
    pub fn new(today: NaiveDate, max_years: u32) -> Self {
        ForecastOptions { today, max_years }
    }

    pub fn load(conn: &Connection, today: NaiveDate) -> Result<Self> {
        Ok(ForecastOptions::new(today, store::max_forecast_years(conn)?))
    }

    pub fn horizon(&self) -> NaiveDate {
        calendar::horizon_end(self.today, self.max_years)
    }

    pub fn month_limit(&self) -> usize {
        self.max_years as usize * 12 + 1
    }
}
