// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! SQLite persistence for the forecast engine.
//!
//! Every query is scoped to the organisation of the requesting user.

use std::collections::HashMap;
use std::num::NonZeroU32;

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;

use crate::errors::{ForecastError, Result};
use crate::models::{
    relative_offset, Category, Employee, FiatRate, ForecastDetailRecord, MonthlyForecast, Salary,
    SalaryCost, SalaryCostDetail, Transaction, VatSetting, DEFAULT_MAX_FORECAST_YEARS,
};

const MAX_FORECAST_YEARS_KEY: &str = "max_forecast_years";
const MAX_FORECAST_YEARS_LIMIT: u32 = 10;

fn conversion_error<E>(idx: usize, ty: Type, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(err))
}

fn unsigned(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    let v: i64 = row.get(idx)?;
    u64::try_from(v).map_err(|e| conversion_error(idx, Type::Integer, e))
}

fn offset_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NonZeroU32> {
    let v: i64 = row.get(idx)?;
    relative_offset(v).map_err(|e| conversion_error(idx, Type::Integer, e))
}

fn decimal_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let s: String = row.get(idx)?;
    s.parse::<Decimal>()
        .map_err(|e| conversion_error(idx, Type::Text, e))
}

pub fn organisation_id(conn: &Connection, user_id: i64) -> Result<i64> {
    conn.query_row(
        "SELECT organisation_id FROM users WHERE id=?1",
        params![user_id],
        |r| r.get(0),
    )
    .optional()?
    .ok_or(ForecastError::UnknownUser(user_id))
}

// Settings

pub fn max_forecast_years(conn: &Connection) -> Result<u32> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key=?1",
            params![MAX_FORECAST_YEARS_KEY],
            |r| r.get(0),
        )
        .optional()?;
    let Some(v) = v else {
        return Ok(DEFAULT_MAX_FORECAST_YEARS);
    };
    let years: i64 = v.trim().parse().map_err(|_| ForecastError::InvalidHorizon(-1))?;
    match u32::try_from(years) {
        Ok(y) if (1..=MAX_FORECAST_YEARS_LIMIT).contains(&y) => Ok(y),
        _ => Err(ForecastError::InvalidHorizon(years)),
    }
}

pub fn set_max_forecast_years(conn: &Connection, years: i64) -> Result<()> {
    if !(1..=i64::from(MAX_FORECAST_YEARS_LIMIT)).contains(&years) {
        return Err(ForecastError::InvalidHorizon(years));
    }
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![MAX_FORECAST_YEARS_KEY, years.to_string()],
    )?;
    Ok(())
}

pub fn organisation_base_currency(conn: &Connection, user_id: i64) -> Result<String> {
    conn.query_row(
        "SELECT o.base_currency FROM users u JOIN organisations o ON o.id=u.organisation_id
         WHERE u.id=?1",
        params![user_id],
        |r| r.get(0),
    )
    .optional()?
    .ok_or(ForecastError::UnknownUser(user_id))
}

pub fn set_base_currency(conn: &Connection, user_id: i64, currency: &str) -> Result<()> {
    let org = organisation_id(conn, user_id)?;
    conn.execute(
        "UPDATE organisations SET base_currency=?1 WHERE id=?2",
        params![currency, org],
    )?;
    Ok(())
}

// Fiat rates

pub fn list_fiat_rates(conn: &Connection, base: &str) -> Result<Vec<FiatRate>> {
    let mut stmt =
        conn.prepare("SELECT base, target, rate FROM fiat_rates WHERE base=?1 ORDER BY target")?;
    let rows = stmt.query_map(params![base], |r| {
        Ok(FiatRate {
            base: r.get(0)?,
            target: r.get(1)?,
            rate: decimal_column(r, 2)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn upsert_fiat_rate(conn: &Connection, base: &str, target: &str, rate: Decimal) -> Result<()> {
    conn.execute(
        "INSERT INTO fiat_rates(base, target, rate) VALUES (?1, ?2, ?3)
         ON CONFLICT(base, target) DO UPDATE SET rate=excluded.rate, updated_at=datetime('now')",
        params![base, target, rate.to_string()],
    )?;
    Ok(())
}

// Categories

pub fn list_categories(conn: &Connection, user_id: i64) -> Result<Vec<Category>> {
    let org = organisation_id(conn, user_id)?;
    let mut stmt =
        conn.prepare("SELECT id, name FROM categories WHERE organisation_id=?1 ORDER BY name")?;
    let rows = stmt.query_map(params![org], |r| {
        Ok(Category {
            id: r.get(0)?,
            name: r.get(1)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Returns the id of the named category, creating it when missing.
pub fn ensure_category(conn: &Connection, user_id: i64, name: &str) -> Result<i64> {
    let org = organisation_id(conn, user_id)?;
    conn.execute(
        "INSERT OR IGNORE INTO categories(organisation_id, name) VALUES (?1, ?2)",
        params![org, name],
    )?;
    Ok(conn.query_row(
        "SELECT id FROM categories WHERE organisation_id=?1 AND name=?2",
        params![org, name],
        |r| r.get(0),
    )?)
}

// Transactions

fn transaction_from_row(r: &Row<'_>) -> rusqlite::Result<Transaction> {
    let vat_rate: Option<i64> = r.get(9)?;
    Ok(Transaction {
        id: r.get(0)?,
        name: r.get(1)?,
        amount: r.get(2)?,
        currency: r.get(3)?,
        kind: r.get(4)?,
        cycle: r.get(5)?,
        start_date: r.get(6)?,
        end_date: r.get(7)?,
        category: r.get(8)?,
        vat_rate: match vat_rate {
            Some(v) => Some(u64::try_from(v).map_err(|e| conversion_error(9, Type::Integer, e))?),
            None => None,
        },
        vat_included: r.get(10)?,
        is_disabled: r.get(11)?,
    })
}

pub fn list_transactions(conn: &Connection, user_id: i64) -> Result<Vec<Transaction>> {
    let org = organisation_id(conn, user_id)?;
    let mut stmt = conn.prepare(
        "SELECT t.id, t.name, t.amount, t.currency, t.type, t.cycle, t.start_date, t.end_date,
                c.name, t.vat_rate, t.vat_included, t.is_disabled
         FROM transactions t JOIN categories c ON c.id=t.category_id
         WHERE t.organisation_id=?1
         ORDER BY t.start_date, t.id",
    )?;
    let rows = stmt.query_map(params![org], transaction_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Inserts `tx` (its `id` is ignored) and returns the new id.
pub fn insert_transaction(conn: &Connection, user_id: i64, tx: &Transaction) -> Result<i64> {
    tx.validate()?;
    let org = organisation_id(conn, user_id)?;
    let category_id = ensure_category(conn, user_id, &tx.category)?;
    let vat_rate = tx.vat_rate.map(|v| v as i64);
    conn.execute(
        "INSERT INTO transactions(organisation_id, name, amount, currency, type, cycle,
                                  start_date, end_date, category_id, vat_rate, vat_included,
                                  is_disabled)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            org,
            tx.name,
            tx.amount,
            tx.currency,
            tx.kind,
            tx.cycle,
            tx.start_date,
            tx.end_date,
            category_id,
            vat_rate,
            tx.vat_included,
            tx.is_disabled
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn set_transaction_disabled(
    conn: &Connection,
    user_id: i64,
    transaction_id: i64,
    disabled: bool,
) -> Result<()> {
    let org = organisation_id(conn, user_id)?;
    let changed = conn.execute(
        "UPDATE transactions SET is_disabled=?1 WHERE id=?2 AND organisation_id=?3",
        params![disabled, transaction_id, org],
    )?;
    if changed == 0 {
        return Err(ForecastError::TransactionNotFound(transaction_id));
    }
    Ok(())
}

// Employees and salaries

pub fn list_employees(conn: &Connection, user_id: i64) -> Result<Vec<Employee>> {
    let org = organisation_id(conn, user_id)?;
    let mut stmt = conn.prepare(
        "SELECT id, name, is_disabled FROM employees WHERE organisation_id=?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![org], |r| {
        Ok(Employee {
            id: r.get(0)?,
            name: r.get(1)?,
            is_disabled: r.get(2)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn insert_employee(conn: &Connection, user_id: i64, name: &str) -> Result<i64> {
    let org = organisation_id(conn, user_id)?;
    conn.execute(
        "INSERT INTO employees(organisation_id, name) VALUES (?1, ?2)",
        params![org, name],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn set_employee_disabled(
    conn: &Connection,
    user_id: i64,
    employee_id: i64,
    disabled: bool,
) -> Result<()> {
    let org = organisation_id(conn, user_id)?;
    let changed = conn.execute(
        "UPDATE employees SET is_disabled=?1 WHERE id=?2 AND organisation_id=?3",
        params![disabled, employee_id, org],
    )?;
    if changed == 0 {
        return Err(ForecastError::EmployeeNotFound(employee_id));
    }
    Ok(())
}

const SALARY_COLUMNS: &str = "s.id, s.employee_id, s.amount, s.currency, s.cycle, s.from_date,
     s.to_date, s.is_termination, s.is_disabled";

fn salary_from_row(r: &Row<'_>) -> rusqlite::Result<Salary> {
    Ok(Salary {
        id: r.get(0)?,
        employee_id: r.get(1)?,
        amount: unsigned(r, 2)?,
        currency: r.get(3)?,
        cycle: r.get(4)?,
        from_date: r.get(5)?,
        to_date: r.get(6)?,
        is_termination: r.get(7)?,
        is_disabled: r.get(8)?,
    })
}

pub fn list_salaries(conn: &Connection, user_id: i64, employee_id: i64) -> Result<Vec<Salary>> {
    let org = organisation_id(conn, user_id)?;
    let sql = format!(
        "SELECT {SALARY_COLUMNS} FROM salaries s JOIN employees e ON e.id=s.employee_id
         WHERE e.organisation_id=?1 AND s.employee_id=?2
         ORDER BY s.from_date, s.id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![org, employee_id], salary_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn get_salary(conn: &Connection, user_id: i64, salary_id: i64) -> Result<Salary> {
    let org = organisation_id(conn, user_id)?;
    let sql = format!(
        "SELECT {SALARY_COLUMNS} FROM salaries s JOIN employees e ON e.id=s.employee_id
         WHERE e.organisation_id=?1 AND s.id=?2"
    );
    conn.query_row(&sql, params![org, salary_id], salary_from_row)
        .optional()?
        .ok_or(ForecastError::SalaryNotFound(salary_id))
}

/// Inserts `salary` (its `id` is ignored) for an employee of the user's
/// organisation and returns the new id.
pub fn insert_salary(conn: &Connection, user_id: i64, salary: &Salary) -> Result<i64> {
    salary.validate()?;
    let org = organisation_id(conn, user_id)?;
    let owned: Option<i64> = conn
        .query_row(
            "SELECT id FROM employees WHERE id=?1 AND organisation_id=?2",
            params![salary.employee_id, org],
            |r| r.get(0),
        )
        .optional()?;
    if owned.is_none() {
        return Err(ForecastError::EmployeeNotFound(salary.employee_id));
    }
    conn.execute(
        "INSERT INTO salaries(employee_id, amount, currency, cycle, from_date, to_date,
                              is_termination, is_disabled)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            salary.employee_id,
            salary.amount as i64,
            salary.currency,
            salary.cycle,
            salary.from_date,
            salary.to_date,
            salary.is_termination,
            salary.is_disabled
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

// Salary costs

const COST_COLUMNS: &str = "c.id, c.salary_id, c.label, c.cycle, c.amount_type, c.amount,
     c.distribution_type, c.relative_offset, c.target_date";

fn cost_from_row(r: &Row<'_>) -> rusqlite::Result<SalaryCost> {
    Ok(SalaryCost {
        id: r.get(0)?,
        salary_id: r.get(1)?,
        label: r.get(2)?,
        cycle: r.get(3)?,
        amount_type: r.get(4)?,
        amount: unsigned(r, 5)?,
        distribution_type: r.get(6)?,
        relative_offset: offset_column(r, 7)?,
        target_date: r.get(8)?,
        base_cost_ids: Vec::new(),
    })
}

fn attach_base_links(conn: &Connection, costs: &mut [SalaryCost]) -> Result<()> {
    let mut stmt = conn.prepare(
        "SELECT base_cost_id FROM salary_cost_base_links WHERE cost_id=?1 ORDER BY base_cost_id",
    )?;
    for cost in costs.iter_mut() {
        let ids = stmt.query_map(params![cost.id], |r| r.get::<_, i64>(0))?;
        cost.base_cost_ids = ids.collect::<rusqlite::Result<Vec<_>>>()?;
    }
    Ok(())
}

fn query_costs(conn: &Connection, filter: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<SalaryCost>> {
    let sql = format!(
        "SELECT {COST_COLUMNS} FROM salary_costs c
         JOIN salaries s ON s.id=c.salary_id
         JOIN employees e ON e.id=s.employee_id
         WHERE {filter}
         ORDER BY c.id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(args, cost_from_row)?;
    let mut costs = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    attach_base_links(conn, &mut costs)?;
    Ok(costs)
}

pub fn list_salary_costs(conn: &Connection, user_id: i64, salary_id: i64) -> Result<Vec<SalaryCost>> {
    let org = organisation_id(conn, user_id)?;
    query_costs(conn, "e.organisation_id=?1 AND c.salary_id=?2", params![org, salary_id])
}

pub fn list_user_salary_costs(conn: &Connection, user_id: i64) -> Result<Vec<SalaryCost>> {
    let org = organisation_id(conn, user_id)?;
    query_costs(conn, "e.organisation_id=?1", params![org])
}

pub fn get_salary_cost(conn: &Connection, user_id: i64, cost_id: i64) -> Result<SalaryCost> {
    let org = organisation_id(conn, user_id)?;
    query_costs(conn, "e.organisation_id=?1 AND c.id=?2", params![org, cost_id])?
        .into_iter()
        .next()
        .ok_or(ForecastError::SalaryCostNotFound(cost_id))
}

/// Inserts `cost` with its base cost links and returns the new id.
pub fn insert_salary_cost(conn: &Connection, user_id: i64, cost: &SalaryCost) -> Result<i64> {
    cost.validate()?;
    get_salary(conn, user_id, cost.salary_id)?;
    for base in &cost.base_cost_ids {
        let base_cost = get_salary_cost(conn, user_id, *base)?;
        if base_cost.salary_id != cost.salary_id {
            return Err(ForecastError::ForeignBaseCost {
                base_cost: *base,
                salary: cost.salary_id,
            });
        }
    }
    conn.execute(
        "INSERT INTO salary_costs(salary_id, label, cycle, amount_type, amount,
                                  distribution_type, relative_offset, target_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            cost.salary_id,
            cost.label,
            cost.cycle,
            cost.amount_type,
            cost.amount as i64,
            cost.distribution_type,
            cost.relative_offset.get(),
            cost.target_date
        ],
    )?;
    let id = conn.last_insert_rowid();
    for base in &cost.base_cost_ids {
        conn.execute(
            "INSERT OR IGNORE INTO salary_cost_base_links(cost_id, base_cost_id) VALUES (?1, ?2)",
            params![id, base],
        )?;
    }
    Ok(id)
}

pub fn list_salary_cost_details(conn: &Connection, cost_id: i64) -> Result<Vec<SalaryCostDetail>> {
    let mut stmt = conn.prepare(
        "SELECT month, amount, divider, cost_id FROM salary_cost_details
         WHERE cost_id=?1 ORDER BY month",
    )?;
    let rows = stmt.query_map(params![cost_id], |r| {
        Ok(SalaryCostDetail {
            month: r.get(0)?,
            amount: unsigned(r, 1)?,
            divider: r.get(2)?,
            cost_id: r.get(3)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn clear_salary_cost_details(conn: &Connection, cost_id: i64) -> Result<()> {
    conn.execute(
        "DELETE FROM salary_cost_details WHERE cost_id=?1",
        params![cost_id],
    )?;
    Ok(())
}

pub fn upsert_salary_cost_detail(conn: &Connection, detail: &SalaryCostDetail) -> Result<()> {
    conn.execute(
        "INSERT INTO salary_cost_details(month, amount, divider, cost_id) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(month, cost_id) DO UPDATE SET amount=excluded.amount, divider=excluded.divider",
        params![detail.month, detail.amount as i64, detail.divider, detail.cost_id],
    )?;
    Ok(())
}

// Exclusions

/// Months in which the given source is excluded from the forecast.
pub fn list_forecast_exclusions(
    conn: &Connection,
    user_id: i64,
    related_id: i64,
    related_table: &str,
) -> Result<HashMap<String, bool>> {
    let org = organisation_id(conn, user_id)?;
    let mut stmt = conn.prepare(
        "SELECT month FROM forecast_exclusions
         WHERE organisation_id=?1 AND related_id=?2 AND related_table=?3",
    )?;
    let rows = stmt.query_map(params![org, related_id, related_table], |r| {
        r.get::<_, String>(0)
    })?;
    let mut out = HashMap::new();
    for month in rows {
        out.insert(month?, true);
    }
    Ok(out)
}

pub fn set_forecast_exclusion(
    conn: &Connection,
    user_id: i64,
    month: &str,
    related_id: i64,
    related_table: &str,
    excluded: bool,
) -> Result<()> {
    let org = organisation_id(conn, user_id)?;
    if excluded {
        conn.execute(
            "INSERT OR IGNORE INTO forecast_exclusions(organisation_id, month, related_id, related_table)
             VALUES (?1, ?2, ?3, ?4)",
            params![org, month, related_id, related_table],
        )?;
    } else {
        conn.execute(
            "DELETE FROM forecast_exclusions
             WHERE organisation_id=?1 AND month=?2 AND related_id=?3 AND related_table=?4",
            params![org, month, related_id, related_table],
        )?;
    }
    Ok(())
}

// VAT

pub fn vat_setting(conn: &Connection, user_id: i64) -> Result<Option<VatSetting>> {
    let org = organisation_id(conn, user_id)?;
    Ok(conn
        .query_row(
            "SELECT enabled, billing_date, transaction_month_offset, interval
             FROM vat_settings WHERE organisation_id=?1",
            params![org],
            |r| {
                Ok(VatSetting {
                    enabled: r.get(0)?,
                    billing_date: r.get(1)?,
                    transaction_month_offset: r.get(2)?,
                    interval: r.get(3)?,
                })
            },
        )
        .optional()?)
}

pub fn set_vat_setting(conn: &Connection, user_id: i64, setting: &VatSetting) -> Result<()> {
    if setting.interval.months().is_none() {
        return Err(ForecastError::InvalidCycle(setting.interval.to_string()));
    }
    let org = organisation_id(conn, user_id)?;
    conn.execute(
        "INSERT INTO vat_settings(organisation_id, enabled, billing_date,
                                  transaction_month_offset, interval)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(organisation_id) DO UPDATE SET
            enabled=excluded.enabled,
            billing_date=excluded.billing_date,
            transaction_month_offset=excluded.transaction_month_offset,
            interval=excluded.interval",
        params![
            org,
            setting.enabled,
            setting.billing_date,
            setting.transaction_month_offset,
            setting.interval
        ],
    )?;
    Ok(())
}

// Forecasts

pub fn clear_forecasts(conn: &Connection, user_id: i64) -> Result<()> {
    let org = organisation_id(conn, user_id)?;
    conn.execute(
        "DELETE FROM forecast_details WHERE organisation_id=?1",
        params![org],
    )?;
    conn.execute("DELETE FROM forecasts WHERE organisation_id=?1", params![org])?;
    Ok(())
}

/// Writes one month and returns the row id.
pub fn upsert_forecast(conn: &Connection, forecast: &MonthlyForecast, user_id: i64) -> Result<i64> {
    let org = organisation_id(conn, user_id)?;
    Ok(conn.query_row(
        "INSERT INTO forecasts(organisation_id, month, revenue, expense, cashflow)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(organisation_id, month) DO UPDATE SET
            revenue=excluded.revenue, expense=excluded.expense, cashflow=excluded.cashflow
         RETURNING id",
        params![
            org,
            forecast.month,
            forecast.revenue,
            forecast.expense,
            forecast.cashflow
        ],
        |r| r.get(0),
    )?)
}

pub fn upsert_forecast_detail(
    conn: &Connection,
    record: &ForecastDetailRecord,
    user_id: i64,
    forecast_id: i64,
) -> Result<()> {
    let org = organisation_id(conn, user_id)?;
    let revenue = serde_json::to_string(&record.revenue)?;
    let expense = serde_json::to_string(&record.expense)?;
    conn.execute(
        "INSERT INTO forecast_details(organisation_id, forecast_id, month, revenue, expense)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(forecast_id) DO UPDATE SET
            month=excluded.month, revenue=excluded.revenue, expense=excluded.expense",
        params![org, forecast_id, record.month, revenue, expense],
    )?;
    Ok(())
}

/// Stored forecast months in ascending order, at most `limit` rows.
pub fn list_forecasts(conn: &Connection, user_id: i64, limit: usize) -> Result<Vec<MonthlyForecast>> {
    let org = organisation_id(conn, user_id)?;
    let mut stmt = conn.prepare(
        "SELECT month, revenue, expense, cashflow FROM forecasts
         WHERE organisation_id=?1 ORDER BY month LIMIT ?2",
    )?;
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows = stmt.query_map(params![org, limit], |r| {
        Ok(MonthlyForecast {
            month: r.get(0)?,
            revenue: r.get(1)?,
            expense: r.get(2)?,
            cashflow: r.get(3)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn list_forecast_details(
    conn: &Connection,
    user_id: i64,
    limit: usize,
) -> Result<Vec<ForecastDetailRecord>> {
    let org = organisation_id(conn, user_id)?;
    let mut stmt = conn.prepare(
        "SELECT month, revenue, expense FROM forecast_details
         WHERE organisation_id=?1 ORDER BY month LIMIT ?2",
    )?;
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows = stmt.query_map(params![org, limit], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (month, revenue, expense) = row?;
        out.push(ForecastDetailRecord {
            month,
            revenue: serde_json::from_str(&revenue)?,
            expense: serde_json::from_str(&expense)?,
        });
    }
    Ok(out)
}
