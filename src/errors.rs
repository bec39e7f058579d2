// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use thiserror::Error;

/// Failures surfaced by the forecast engine and its store.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("invalid cycle '{0}'")]
    InvalidCycle(String),
    #[error("cycle '{0}' is not allowed for salary costs")]
    InvalidCostCycle(String),
    #[error("invalid amount type '{0}'")]
    InvalidAmountType(String),
    #[error("invalid distribution type '{0}'")]
    InvalidDistributionType(String),
    #[error("invalid transaction type '{0}'")]
    InvalidTransactionKind(String),
    #[error("relative offset must be positive, got {0}")]
    InvalidRelativeOffset(i64),
    #[error("repeating transaction {0} has no cycle")]
    MissingCycle(i64),
    #[error("end date {to} is before start date {from}")]
    InvalidWindow { from: NaiveDate, to: NaiveDate },
    #[error("invalid month '{0}', expected YYYY-MM")]
    InvalidMonth(String),
    #[error("forecast horizon must be between 1 and 10 years, got {0}")]
    InvalidHorizon(i64),
    #[error("user {0} does not belong to an organisation")]
    UnknownUser(i64),
    #[error("employee {0} not found")]
    EmployeeNotFound(i64),
    #[error("transaction {0} not found")]
    TransactionNotFound(i64),
    #[error("salary {0} not found")]
    SalaryNotFound(i64),
    #[error("salary cost {0} not found")]
    SalaryCostNotFound(i64),
    #[error("no fiat rate from {base} to {target}")]
    MissingFiatRate { base: String, target: String },
    #[error("fiat rate {base}/{target} must be positive")]
    InvalidFiatRate { base: String, target: String },
    #[error("base cost {base_cost} does not belong to salary {salary}")]
    ForeignBaseCost { base_cost: i64, salary: i64 },
    #[error("circular base cost reference at cost {0}")]
    CircularBaseCost(i64),
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ForecastError>;
