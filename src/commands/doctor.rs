// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{fx::distinct_currencies, user_id};
use crate::forecast::aggregate::rate_for;
use crate::models::{Cycle, TransactionKind};
use crate::store;
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::Connection;

/// Lists data the forecast would reject or silently skip.
pub fn issues(conn: &Connection, user_id: i64) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();

    // 1) Currencies without a usable rate to the base
    let base = store::organisation_base_currency(conn, user_id)?;
    let rates = store::list_fiat_rates(conn, &base)?;
    for ccy in distinct_currencies(conn, user_id)? {
        if let Err(e) = rate_for(&rates, &base, &ccy) {
            rows.push(vec!["missing_fx".into(), e.to_string()]);
        }
    }

    // 2) Transactions the forecast cannot place
    for tx in store::list_transactions(conn, user_id)? {
        if tx.is_disabled || tx.kind != TransactionKind::Repeating {
            continue;
        }
        match tx.cycle {
            None => rows.push(vec![
                "missing_cycle".into(),
                format!("transaction #{} '{}'", tx.id, tx.name),
            ]),
            Some(c @ (Cycle::Daily | Cycle::Weekly)) => rows.push(vec![
                "unsupported_cycle".into(),
                format!("transaction #{} '{}' is {}", tx.id, tx.name, c),
            ]),
            _ => {}
        }
    }

    // 3) Salary costs with no materialised postings
    for cost in store::list_user_salary_costs(conn, user_id)? {
        if store::list_salary_cost_details(conn, cost.id)?.is_empty() {
            rows.push(vec![
                "no_cost_postings".into(),
                format!("cost #{} '{}' of salary #{}", cost.id, cost.label_name(), cost.salary_id),
            ]);
        }
    }
    Ok(rows)
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let rows = issues(conn, user_id(m))?;
    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
