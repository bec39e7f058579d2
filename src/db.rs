// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

static APP: Lazy<(&str, &str, &str)> = Lazy::new(|| ("com.cashcast", "Cashcast", "cashcast"));

pub const DEFAULT_ORGANISATION_ID: i64 = 1;
pub const DEFAULT_USER_ID: i64 = 1;

pub fn db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("cashcast.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    let mut conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&mut conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS organisations(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        base_currency TEXT NOT NULL DEFAULT 'CHF'
    );

    CREATE TABLE IF NOT EXISTS users(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        organisation_id INTEGER NOT NULL,
        FOREIGN KEY(organisation_id) REFERENCES organisations(id) ON DELETE CASCADE
    );

    INSERT OR IGNORE INTO organisations(id, name, base_currency) VALUES (1, 'Default', 'CHF');
    INSERT OR IGNORE INTO users(id, name, organisation_id) VALUES (1, 'owner', 1);

    CREATE TABLE IF NOT EXISTS categories(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        organisation_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        UNIQUE(organisation_id, name),
        FOREIGN KEY(organisation_id) REFERENCES organisations(id) ON DELETE CASCADE
    );

    -- amounts are signed minor units; vat_rate uses the 100000 = 100% scale
    CREATE TABLE IF NOT EXISTS transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        organisation_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        amount INTEGER NOT NULL,
        currency TEXT NOT NULL,
        type TEXT NOT NULL CHECK(type IN ('single','repeating')),
        cycle TEXT CHECK(cycle IN ('once','daily','weekly','monthly','quarterly','biannually','yearly')),
        start_date TEXT NOT NULL,
        end_date TEXT,
        category_id INTEGER NOT NULL,
        vat_rate INTEGER,
        vat_included INTEGER NOT NULL DEFAULT 0,
        is_disabled INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        CHECK(end_date IS NULL OR end_date >= start_date),
        FOREIGN KEY(organisation_id) REFERENCES organisations(id) ON DELETE CASCADE,
        FOREIGN KEY(category_id) REFERENCES categories(id)
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_org ON transactions(organisation_id);

    CREATE TABLE IF NOT EXISTS employees(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        organisation_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        is_disabled INTEGER NOT NULL DEFAULT 0,
        FOREIGN KEY(organisation_id) REFERENCES organisations(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS salaries(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        employee_id INTEGER NOT NULL,
        amount INTEGER NOT NULL CHECK(amount >= 0),
        currency TEXT NOT NULL,
        cycle TEXT NOT NULL CHECK(cycle IN ('monthly','quarterly','biannually','yearly')),
        from_date TEXT NOT NULL,
        to_date TEXT,
        is_termination INTEGER NOT NULL DEFAULT 0,
        is_disabled INTEGER NOT NULL DEFAULT 0,
        CHECK(to_date IS NULL OR to_date >= from_date),
        FOREIGN KEY(employee_id) REFERENCES employees(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS salary_costs(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        salary_id INTEGER NOT NULL,
        label TEXT,
        cycle TEXT NOT NULL CHECK(cycle IN ('once','monthly','quarterly','biannually','yearly')),
        amount_type TEXT NOT NULL CHECK(amount_type IN ('fixed','percentage')),
        amount INTEGER NOT NULL CHECK(amount >= 0),
        distribution_type TEXT NOT NULL CHECK(distribution_type IN ('employee','employer','both')),
        relative_offset INTEGER NOT NULL CHECK(relative_offset > 0),
        target_date TEXT,
        FOREIGN KEY(salary_id) REFERENCES salaries(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS salary_cost_base_links(
        cost_id INTEGER NOT NULL,
        base_cost_id INTEGER NOT NULL,
        PRIMARY KEY(cost_id, base_cost_id),
        FOREIGN KEY(cost_id) REFERENCES salary_costs(id) ON DELETE CASCADE,
        FOREIGN KEY(base_cost_id) REFERENCES salary_costs(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS salary_cost_details(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        month TEXT NOT NULL,
        amount INTEGER NOT NULL,
        divider INTEGER NOT NULL CHECK(divider > 0),
        cost_id INTEGER NOT NULL,
        UNIQUE(month, cost_id),
        FOREIGN KEY(cost_id) REFERENCES salary_costs(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS forecast_exclusions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        organisation_id INTEGER NOT NULL,
        month TEXT NOT NULL,
        related_id INTEGER NOT NULL,
        related_table TEXT NOT NULL,
        UNIQUE(organisation_id, month, related_id, related_table),
        FOREIGN KEY(organisation_id) REFERENCES organisations(id) ON DELETE CASCADE
    );

    -- 1 base = rate target; amounts convert target -> base by division
    CREATE TABLE IF NOT EXISTS fiat_rates(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        base TEXT NOT NULL,
        target TEXT NOT NULL,
        rate TEXT NOT NULL,
        updated_at TEXT NOT NULL DEFAULT (datetime('now')),
        UNIQUE(base, target)
    );

    CREATE TABLE IF NOT EXISTS vat_settings(
        organisation_id INTEGER PRIMARY KEY,
        enabled INTEGER NOT NULL DEFAULT 0,
        billing_date TEXT NOT NULL,
        transaction_month_offset INTEGER NOT NULL DEFAULT 0
            CHECK(transaction_month_offset BETWEEN 0 AND 12),
        interval TEXT NOT NULL DEFAULT 'quarterly'
            CHECK(interval IN ('monthly','quarterly','biannually','yearly')),
        FOREIGN KEY(organisation_id) REFERENCES organisations(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS forecasts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        organisation_id INTEGER NOT NULL,
        month TEXT NOT NULL,
        revenue INTEGER NOT NULL,
        expense INTEGER NOT NULL,
        cashflow INTEGER NOT NULL,
        UNIQUE(organisation_id, month),
        FOREIGN KEY(organisation_id) REFERENCES organisations(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS forecast_details(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        organisation_id INTEGER NOT NULL,
        forecast_id INTEGER NOT NULL UNIQUE,
        month TEXT NOT NULL,
        revenue TEXT NOT NULL, -- JSON
        expense TEXT NOT NULL, -- JSON
        FOREIGN KEY(organisation_id) REFERENCES organisations(id) ON DELETE CASCADE,
        FOREIGN KEY(forecast_id) REFERENCES forecasts(id) ON DELETE CASCADE
    );
    "#,
    )?;
    Ok(())
}
