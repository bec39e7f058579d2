// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::errors::{ForecastError, Result};

/// Fixed-point scale for percentages: 100% == 100_000.
pub const PERCENT_SCALE: u64 = 100_000;
pub const DEFAULT_MAX_FORECAST_YEARS: u32 = 3;
pub const MONTH_FORMAT: &str = "%Y-%m";

pub const TRANSACTIONS_TABLE: &str = "transactions";
pub const SALARIES_TABLE: &str = "salaries";
pub const SALARY_COSTS_TABLE: &str = "salary_costs";
pub const VAT_SETTLEMENT_TABLE: &str = "vat_settlement";

pub const SALARIES_CATEGORY: &str = "Salaries";
pub const SALARY_COSTS_CATEGORY: &str = "Salary Costs";
pub const VAT_CATEGORY: &str = "VAT";
pub const NO_LABEL: &str = "<no label>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cycle {
    Once,
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Biannually,
    Yearly,
}

impl Cycle {
    /// Length of one cycle step in calendar months, if the cycle is month based.
    pub fn months(self) -> Option<i32> {
        match self {
            Cycle::Monthly => Some(1),
            Cycle::Quarterly => Some(3),
            Cycle::Biannually => Some(6),
            Cycle::Yearly => Some(12),
            Cycle::Once | Cycle::Daily | Cycle::Weekly => None,
        }
    }

    /// Salary costs are either one-off or month based.
    pub fn is_cost_cycle(self) -> bool {
        self == Cycle::Once || self.months().is_some()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Cycle::Once => "once",
            Cycle::Daily => "daily",
            Cycle::Weekly => "weekly",
            Cycle::Monthly => "monthly",
            Cycle::Quarterly => "quarterly",
            Cycle::Biannually => "biannually",
            Cycle::Yearly => "yearly",
        }
    }
}

impl FromStr for Cycle {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "once" => Ok(Cycle::Once),
            "daily" => Ok(Cycle::Daily),
            "weekly" => Ok(Cycle::Weekly),
            "monthly" => Ok(Cycle::Monthly),
            "quarterly" => Ok(Cycle::Quarterly),
            "biannually" => Ok(Cycle::Biannually),
            "yearly" => Ok(Cycle::Yearly),
            _ => Err(ForecastError::InvalidCycle(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Single,
    Repeating,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Single => "single",
            TransactionKind::Repeating => "repeating",
        }
    }
}

impl FromStr for TransactionKind {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "single" => Ok(TransactionKind::Single),
            "repeating" => Ok(TransactionKind::Repeating),
            _ => Err(ForecastError::InvalidTransactionKind(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmountType {
    Fixed,
    Percentage,
}

impl AmountType {
    pub fn as_str(self) -> &'static str {
        match self {
            AmountType::Fixed => "fixed",
            AmountType::Percentage => "percentage",
        }
    }
}

impl FromStr for AmountType {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "fixed" => Ok(AmountType::Fixed),
            "percentage" => Ok(AmountType::Percentage),
            _ => Err(ForecastError::InvalidAmountType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionType {
    Employee,
    Employer,
    Both,
}

impl DistributionType {
    /// A cost borne by both parties is counted once per side.
    pub fn multiplier(self) -> u64 {
        match self {
            DistributionType::Employee | DistributionType::Employer => 1,
            DistributionType::Both => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DistributionType::Employee => "employee",
            DistributionType::Employer => "employer",
            DistributionType::Both => "both",
        }
    }
}

impl FromStr for DistributionType {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "employee" => Ok(DistributionType::Employee),
            "employer" => Ok(DistributionType::Employer),
            "both" => Ok(DistributionType::Both),
            _ => Err(ForecastError::InvalidDistributionType(s.to_string())),
        }
    }
}

// Enums are stored as lowercase TEXT columns.
macro_rules! sql_text_enum {
    ($($ty:ty),* $(,)?) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: ForecastError| FromSqlError::Other(Box::new(e)))
            }
        }
    )*};
}

sql_text_enum!(Cycle, TransactionKind, AmountType, DistributionType);

/// Rounds to whole minor units, ties away from zero.
pub fn round_minor(value: Decimal) -> i64 {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(if value.is_sign_negative() { i64::MIN } else { i64::MAX })
}

/// Inclusive date range; an open end runs to the forecast horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: Option<NaiveDate>,
}

impl DateWindow {
    pub fn new(from: NaiveDate, to: Option<NaiveDate>) -> Result<Self> {
        if let Some(to) = to {
            if to < from {
                return Err(ForecastError::InvalidWindow { from, to });
            }
        }
        Ok(DateWindow { from, to })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub name: String,
    pub amount: i64,
    pub currency: String,
    pub kind: TransactionKind,
    pub cycle: Option<Cycle>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub category: String,
    /// VAT rate on the `PERCENT_SCALE` fixed-point scale.
    pub vat_rate: Option<u64>,
    pub vat_included: bool,
    pub is_disabled: bool,
}

impl Transaction {
    pub fn validate(&self) -> Result<()> {
        DateWindow::new(self.start_date, self.end_date)?;
        if self.kind == TransactionKind::Repeating && self.cycle.is_none() {
            return Err(ForecastError::MissingCycle(self.id));
        }
        Ok(())
    }

    /// VAT portion of the stated amount, signed like the amount.
    pub fn vat_amount(&self) -> i64 {
        let Some(rate) = self.vat_rate else {
            return 0;
        };
        let amount = Decimal::from(self.amount);
        let rate = Decimal::from(rate);
        let scale = Decimal::from(PERCENT_SCALE);
        if self.vat_included {
            round_minor(amount - amount * scale / (scale + rate))
        } else {
            round_minor(amount * rate / scale)
        }
    }

    /// Amount the forecast books: VAT is added on top unless already included.
    pub fn gross_amount(&self) -> i64 {
        if self.vat_rate.is_some() && !self.vat_included {
            self.amount + self.vat_amount()
        } else {
            self.amount
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: i64,
    pub name: String,
    pub is_disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Salary {
    pub id: i64,
    pub employee_id: i64,
    pub amount: u64,
    pub currency: String,
    pub cycle: Cycle,
    pub from_date: NaiveDate,
    pub to_date: Option<NaiveDate>,
    pub is_termination: bool,
    pub is_disabled: bool,
}

impl Salary {
    pub fn validate(&self) -> Result<()> {
        DateWindow::new(self.from_date, self.to_date)?;
        if self.cycle.months().is_none() {
            return Err(ForecastError::InvalidCycle(self.cycle.to_string()));
        }
        Ok(())
    }

    pub fn window(&self) -> DateWindow {
        DateWindow {
            from: self.from_date,
            to: self.to_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryCost {
    pub id: i64,
    pub salary_id: i64,
    pub label: Option<String>,
    pub cycle: Cycle,
    pub amount_type: AmountType,
    /// Minor units for fixed costs, `PERCENT_SCALE` fixed-point for percentages.
    pub amount: u64,
    pub distribution_type: DistributionType,
    pub relative_offset: NonZeroU32,
    pub target_date: Option<NaiveDate>,
    pub base_cost_ids: Vec<i64>,
}

impl SalaryCost {
    pub fn validate(&self) -> Result<()> {
        if !self.cycle.is_cost_cycle() {
            return Err(ForecastError::InvalidCostCycle(self.cycle.to_string()));
        }
        Ok(())
    }

    pub fn label_name(&self) -> &str {
        self.label.as_deref().unwrap_or(NO_LABEL)
    }
}

pub fn relative_offset(value: i64) -> Result<NonZeroU32> {
    u32::try_from(value)
        .ok()
        .and_then(NonZeroU32::new)
        .ok_or(ForecastError::InvalidRelativeOffset(value))
}

/// One materialised cost posting: `amount` covers `divider` calendar months.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryCostDetail {
    pub month: String,
    pub amount: u64,
    pub divider: u32,
    pub cost_id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CostSchedule {
    pub next_execution_date: Option<NaiveDate>,
    pub previous_execution_date: Option<NaiveDate>,
    pub next_cost: u64,
    pub amount_per_month: u64,
    pub details: Vec<SalaryCostDetail>,
}

#[derive(Debug, Clone)]
pub struct ScheduledCost {
    pub cost: SalaryCost,
    pub schedule: CostSchedule,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiatRate {
    pub base: String,
    pub target: String,
    pub rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VatSetting {
    pub enabled: bool,
    pub billing_date: NaiveDate,
    pub transaction_month_offset: i32,
    pub interval: Cycle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyForecast {
    pub month: String,
    pub revenue: i64,
    pub expense: i64,
    pub cashflow: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDetailEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_table: Option<String>,
    #[serde(default)]
    pub is_excluded: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ForecastDetailEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastDetailRecord {
    pub month: String,
    pub revenue: Vec<ForecastDetailEntry>,
    pub expense: Vec<ForecastDetailEntry>,
}
