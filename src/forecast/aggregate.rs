// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::calendar::{add_months, anchored_steps, month_key};
use super::detail::{DetailTree, Related, Side};
use super::payroll::{load_scheduled_costs, net_amount};
use super::vat::settlements;
use super::ForecastOptions;
use crate::errors::{ForecastError, Result};
use crate::models::{
    round_minor, Cycle, Employee, FiatRate, ForecastDetailRecord, MonthlyForecast, Salary,
    ScheduledCost, Transaction, TransactionKind, VatSetting, SALARIES_CATEGORY, SALARIES_TABLE,
    SALARY_COSTS_CATEGORY, SALARY_COSTS_TABLE, TRANSACTIONS_TABLE, VAT_CATEGORY,
    VAT_SETTLEMENT_TABLE,
};
use crate::store;

pub fn rate_for(rates: &[FiatRate], base: &str, currency: &str) -> Result<Decimal> {
    if base == currency {
        return Ok(Decimal::ONE);
    }
    let rate = rates
        .iter()
        .find(|r| r.base == base && r.target == currency)
        .ok_or_else(|| ForecastError::MissingFiatRate {
            base: base.to_string(),
            target: currency.to_string(),
        })?;
    if rate.rate <= Decimal::ZERO {
        return Err(ForecastError::InvalidFiatRate {
            base: base.to_string(),
            target: currency.to_string(),
        });
    }
    Ok(rate.rate)
}

/// `amount / rate`, rounded half away from zero.
pub fn convert_to_base(amount: i64, rate: Decimal) -> i64 {
    if rate == Decimal::ONE {
        return amount;
    }
    round_minor(Decimal::from(amount) / rate)
}

#[derive(Debug, Clone, Default)]
pub struct Exclusions {
    by_source: HashMap<(String, i64), HashMap<String, bool>>,
}

impl Exclusions {
    pub fn insert(&mut self, table: &str, related_id: i64, months: HashMap<String, bool>) {
        if !months.is_empty() {
            self.by_source.insert((table.to_string(), related_id), months);
        }
    }

    pub fn is_excluded(&self, table: &str, related_id: i64, month: &str) -> bool {
        self.by_source
            .get(&(table.to_string(), related_id))
            .and_then(|months| months.get(month))
            .copied()
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone)]
pub struct SalaryInput {
    pub salary: Salary,
    pub costs: Vec<ScheduledCost>,
}

#[derive(Debug, Clone)]
pub struct EmployeeInput {
    pub employee: Employee,
    pub salaries: Vec<SalaryInput>,
}

#[derive(Debug, Clone, Default)]
pub struct ForecastInput {
    pub base_currency: String,
    pub rates: Vec<FiatRate>,
    pub transactions: Vec<Transaction>,
    pub employees: Vec<EmployeeInput>,
    pub exclusions: Exclusions,
    pub vat: Option<VatSetting>,
}

impl ForecastInput {
    pub fn load(conn: &Connection, user_id: i64, today: NaiveDate) -> Result<Self> {
        let base_currency = store::organisation_base_currency(conn, user_id)?;
        let rates = store::list_fiat_rates(conn, &base_currency)?;
        let transactions = store::list_transactions(conn, user_id)?;

        let mut exclusions = Exclusions::default();
        for tx in &transactions {
            let months = store::list_forecast_exclusions(conn, user_id, tx.id, TRANSACTIONS_TABLE)?;
            exclusions.insert(TRANSACTIONS_TABLE, tx.id, months);
        }

        let mut employees = Vec::new();
        for employee in store::list_employees(conn, user_id)? {
            let mut salaries = Vec::new();
            for salary in store::list_salaries(conn, user_id, employee.id)? {
                let months =
                    store::list_forecast_exclusions(conn, user_id, salary.id, SALARIES_TABLE)?;
                exclusions.insert(SALARIES_TABLE, salary.id, months);

                let costs = load_scheduled_costs(conn, user_id, salary.id, today, false)?;
                for scheduled in &costs {
                    let id = scheduled.cost.id;
                    let months =
                        store::list_forecast_exclusions(conn, user_id, id, SALARY_COSTS_TABLE)?;
                    exclusions.insert(SALARY_COSTS_TABLE, id, months);
                }
                salaries.push(SalaryInput { salary, costs });
            }
            employees.push(EmployeeInput { employee, salaries });
        }

        let vat = store::vat_setting(conn, user_id)?;
        Ok(ForecastInput {
            base_currency,
            rates,
            transactions,
            employees,
            exclusions,
            vat,
        })
    }

    fn rate(&self, currency: &str) -> Result<Decimal> {
        rate_for(&self.rates, &self.base_currency, currency)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct MonthEntry {
    revenue: i64,
    expense: i64,
    details: DetailTree,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForecastLedger {
    months: BTreeMap<String, MonthEntry>,
}

impl ForecastLedger {
    fn touch(&mut self, month: &str) -> &mut MonthEntry {
        self.months.entry(month.to_string()).or_default()
    }

    /// Books `amount` unless the source is excluded for the month, in which
    /// case a zero leaf flagged as excluded is recorded instead.
    fn post(
        &mut self,
        month: &str,
        side: Side,
        amount: i64,
        path: &[&str],
        related: Related<'_>,
        is_excluded: bool,
    ) {
        let booked = if is_excluded { 0 } else { amount };
        let entry = self.touch(month);
        match side {
            Side::Revenue => entry.revenue += booked,
            Side::Expense => entry.expense += booked,
        }
        entry.details.record(side, path, booked, related, is_excluded);
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    pub fn forecasts(&self) -> Vec<MonthlyForecast> {
        self.months
            .iter()
            .map(|(month, entry)| MonthlyForecast {
                month: month.clone(),
                revenue: entry.revenue,
                expense: entry.expense,
                cashflow: entry.revenue + entry.expense,
            })
            .collect()
    }

    pub fn detail_records(&self) -> Vec<ForecastDetailRecord> {
        self.months
            .iter()
            .map(|(month, entry)| {
                let (revenue, expense) = entry.details.flatten();
                ForecastDetailRecord {
                    month: month.clone(),
                    revenue,
                    expense,
                }
            })
            .collect()
    }

    pub fn get(&self, month: &str) -> Option<MonthlyForecast> {
        self.months.get(month).map(|entry| MonthlyForecast {
            month: month.to_string(),
            revenue: entry.revenue,
            expense: entry.expense,
            cashflow: entry.revenue + entry.expense,
        })
    }
}

/// First date `anchor + k * months` (k >= 0) strictly after `date`.
fn step_after(anchor: NaiveDate, months: i32, date: NaiveDate) -> NaiveDate {
    let months = months.max(1);
    let taken = anchored_steps(anchor, months, date).count();
    i32::try_from(taken)
        .ok()
        .and_then(|taken| taken.checked_mul(months))
        .and_then(|shift| add_months(anchor, shift))
        .unwrap_or(NaiveDate::MAX)
}

/// Occurrence dates of a transaction within the horizon, past ones included.
fn transaction_dates(tx: &Transaction, horizon: NaiveDate) -> Vec<NaiveDate> {
    let single = || {
        if tx.start_date <= horizon {
            vec![tx.start_date]
        } else {
            Vec::new()
        }
    };
    match (tx.kind, tx.cycle) {
        (TransactionKind::Single, _) | (TransactionKind::Repeating, Some(Cycle::Once)) => single(),
        (TransactionKind::Repeating, Some(cycle)) => match cycle.months() {
            Some(months) => {
                let until = tx.end_date.map_or(horizon, |end| end.min(horizon));
                anchored_steps(tx.start_date, months, until).collect()
            }
            None => {
                warn!(transaction = tx.id, cycle = %cycle, "cycle has no monthly meaning, skipped");
                Vec::new()
            }
        },
        (TransactionKind::Repeating, None) => Vec::new(),
    }
}

fn add_transactions(
    ledger: &mut ForecastLedger,
    input: &ForecastInput,
    opts: &ForecastOptions,
) -> Result<()> {
    let horizon = opts.horizon();
    for tx in input.transactions.iter().filter(|t| !t.is_disabled) {
        tx.validate()?;
        let amount = convert_to_base(tx.gross_amount(), input.rate(&tx.currency)?);
        let side = if amount > 0 { Side::Revenue } else { Side::Expense };
        let related = Related {
            id: Some(tx.id),
            table: TRANSACTIONS_TABLE,
        };

        for date in transaction_dates(tx, horizon) {
            if date < opts.today {
                continue;
            }
            let month = month_key(date);
            if amount == 0 {
                ledger.touch(&month);
                continue;
            }
            let excluded = input.exclusions.is_excluded(TRANSACTIONS_TABLE, tx.id, &month);
            ledger.post(&month, side, amount, &[&tx.category, &tx.name], related, excluded);
        }
    }
    Ok(())
}

fn add_salary(
    ledger: &mut ForecastLedger,
    input: &ForecastInput,
    opts: &ForecastOptions,
    employee: &Employee,
    salary: &SalaryInput,
) -> Result<()> {
    let SalaryInput { salary, costs } = salary;
    salary.validate()?;
    let horizon = opts.horizon();
    let rate = input.rate(&salary.currency)?;

    let net = i64::try_from(net_amount(salary, costs)).unwrap_or(i64::MAX);
    let amount = -convert_to_base(net, rate);
    let months = salary.cycle.months().unwrap_or(1);
    let until = salary.to_date.map_or(horizon, |to| to.min(horizon));
    let related = Related {
        id: Some(salary.id),
        table: SALARIES_TABLE,
    };
    for date in anchored_steps(salary.from_date, months, until) {
        if date < opts.today {
            continue;
        }
        let month = month_key(date);
        let excluded = input.exclusions.is_excluded(SALARIES_TABLE, salary.id, &month);
        ledger.post(
            &month,
            Side::Expense,
            amount,
            &[SALARIES_CATEGORY, &employee.name],
            related,
            excluded,
        );
    }

    let today_month = month_key(opts.today);
    for scheduled in costs {
        let cost = &scheduled.cost;
        let Some(first) = scheduled.schedule.next_execution_date else {
            continue;
        };
        let multiplier = cost.distribution_type.multiplier();
        let to_expense = |amount: u64| -> i64 {
            let gross = i64::try_from(amount.saturating_mul(multiplier)).unwrap_or(i64::MAX);
            -convert_to_base(gross, rate)
        };
        let next_cost = to_expense(scheduled.schedule.next_cost);
        let path = [SALARY_COSTS_CATEGORY, cost.label_name()];
        let related = Related {
            id: Some(cost.id),
            table: SALARY_COSTS_TABLE,
        };
        let mut book = |date: NaiveDate, amount: i64| {
            let month = month_key(date);
            if month < today_month || date > horizon {
                return;
            }
            let excluded = input.exclusions.is_excluded(SALARY_COSTS_TABLE, cost.id, &month);
            ledger.post(&month, Side::Expense, amount, &path, related, excluded);
        };

        let step = i64::from(cost.relative_offset.get());
        match cost.cycle {
            Cycle::Once => book(first, next_cost),
            Cycle::Monthly => {
                let stride = i32::try_from(step).unwrap_or(i32::MAX);
                for date in anchored_steps(first, stride, horizon) {
                    let month = month_key(date);
                    let Some(detail) = scheduled.schedule.details.iter().find(|d| d.month == month)
                    else {
                        break;
                    };
                    book(date, to_expense(detail.amount));
                }
            }
            cycle => {
                let Some(cycle_months) = cycle.months() else {
                    warn!(cost = cost.id, cycle = %cycle, "cycle has no monthly meaning, skipped");
                    continue;
                };
                let stride = i32::try_from(i64::from(cycle_months) * step).unwrap_or(i32::MAX);
                let salary_end = salary.to_date.unwrap_or(horizon);
                let until = step_after(first, stride, salary_end).min(horizon);
                for date in anchored_steps(first, stride, until) {
                    book(date, next_cost);
                }
            }
        }
    }
    Ok(())
}

fn add_vat_settlements(
    ledger: &mut ForecastLedger,
    input: &ForecastInput,
    opts: &ForecastOptions,
) -> Result<()> {
    let Some(setting) = input.vat.as_ref().filter(|s| s.enabled) else {
        return Ok(());
    };
    let horizon = opts.horizon();
    let mut collected: BTreeMap<String, i64> = BTreeMap::new();
    for tx in input.transactions.iter().filter(|t| !t.is_disabled) {
        let rate = input.rate(&tx.currency)?;
        let vat = tx.vat_amount();
        if tx.vat_rate.is_none() || vat == 0 || convert_to_base(tx.amount, rate) <= 0 {
            continue;
        }
        let vat = convert_to_base(vat, rate);
        for date in transaction_dates(tx, horizon) {
            *collected.entry(month_key(date)).or_insert(0) += vat;
        }
    }

    let related = Related {
        id: None,
        table: VAT_SETTLEMENT_TABLE,
    };
    for (month, total) in settlements(setting, &collected, opts.today, horizon)? {
        ledger.post(&month, Side::Expense, -total, &[VAT_CATEGORY, VAT_CATEGORY], related, false);
    }
    Ok(())
}

pub fn build_forecast(input: &ForecastInput, opts: &ForecastOptions) -> Result<ForecastLedger> {
    let mut ledger = ForecastLedger::default();
    add_transactions(&mut ledger, input, opts)?;
    for entry in input.employees.iter().filter(|e| !e.employee.is_disabled) {
        for salary in &entry.salaries {
            if salary.salary.is_disabled || salary.salary.is_termination {
                continue;
            }
            add_salary(&mut ledger, input, opts, &entry.employee, salary)?;
        }
    }
    add_vat_settlements(&mut ledger, input, opts)?;
    Ok(ledger)
}

/// Clears and rewrites the stored forecast inside one transaction.
pub fn calculate_forecast(
    conn: &mut Connection,
    user_id: i64,
    opts: &ForecastOptions,
) -> Result<Vec<MonthlyForecast>> {
    let started = Instant::now();
    let tx = conn.transaction()?;

    let input = ForecastInput::load(&tx, user_id, opts.today)?;
    let ledger = build_forecast(&input, opts)?;

    store::clear_forecasts(&tx, user_id)?;
    for (forecast, record) in ledger.forecasts().iter().zip(ledger.detail_records()) {
        let forecast_id = store::upsert_forecast(&tx, forecast, user_id)?;
        store::upsert_forecast_detail(&tx, &record, user_id, forecast_id)?;
    }
    let forecasts = store::list_forecasts(&tx, user_id, opts.month_limit())?;
    tx.commit()?;

    info!(
        user_id,
        months = ledger.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "forecast rebuilt"
    );
    Ok(forecasts)
}
