// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::user_id;
use crate::forecast::aggregate::{convert_to_base, rate_for};
use crate::store;
use crate::utils::{fmt_minor, http_client, maybe_print_json, parse_amount, parse_decimal, pretty_table};
use anyhow::{bail, Result};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set-base", sub)) => {
            let ccy = sub.get_one::<String>("currency").unwrap().to_uppercase();
            store::set_base_currency(conn, user_id(sub), &ccy)?;
            println!("Base currency set to {}", ccy);
        }
        Some(("set-rate", sub)) => {
            let base = store::organisation_base_currency(conn, user_id(sub))?;
            let target = sub.get_one::<String>("target").unwrap().to_uppercase();
            let rate = parse_decimal(sub.get_one::<String>("rate").unwrap())?;
            if rate <= Decimal::ZERO {
                bail!("Rate must be positive");
            }
            store::upsert_fiat_rate(conn, &base, &target, rate)?;
            println!("1 {} = {} {}", base, rate, target);
        }
        Some(("fetch", sub)) => fetch_rates(conn, user_id(sub))?,
        Some(("list", sub)) => list_rates(conn, sub)?,
        Some(("convert", sub)) => convert_amount(conn, sub)?,
        _ => {}
    }
    Ok(())
}

/// Currencies referenced by transactions and salaries of the organisation.
pub fn distinct_currencies(conn: &Connection, user_id: i64) -> Result<Vec<String>> {
    let mut out = Vec::<String>::new();
    let push = |out: &mut Vec<String>, c: String| {
        if !c.is_empty() && !out.contains(&c) {
            out.push(c);
        }
    };
    for tx in store::list_transactions(conn, user_id)? {
        push(&mut out, tx.currency);
    }
    for employee in store::list_employees(conn, user_id)? {
        for salary in store::list_salaries(conn, user_id, employee.id)? {
            push(&mut out, salary.currency);
        }
    }
    out.sort();
    Ok(out)
}

#[derive(Debug, Deserialize)]
struct Latest {
    rates: HashMap<String, f64>,
    #[serde(rename = "base")]
    _base: String,
}

fn fetch_rates(conn: &Connection, user_id: i64) -> Result<()> {
    let base = store::organisation_base_currency(conn, user_id)?;
    let targets: Vec<String> = distinct_currencies(conn, user_id)?
        .into_iter()
        .filter(|c| c != &base)
        .collect();
    if targets.is_empty() {
        println!("No non-base currencies found; nothing to fetch.");
        return Ok(());
    }
    let to_param = targets.join(",");
    let url = format!("https://api.frankfurter.dev/v1/latest?from={base}&to={to_param}");
    let client = http_client()?;
    let resp = client.get(url).send()?.error_for_status()?;
    let latest: Latest = resp.json()?;
    for (target, rate) in latest.rates {
        let rate = parse_decimal(&rate.to_string())?;
        store::upsert_fiat_rate(conn, &base, &target, rate)?;
    }
    println!("FX rates fetched via Frankfurter (ECB).");
    Ok(())
}

fn list_rates(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let base = store::organisation_base_currency(conn, user_id(sub))?;
    let rates = store::list_fiat_rates(conn, &base)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rates)? {
        let data = rates
            .into_iter()
            .map(|r| vec![r.base, r.target, r.rate.to_string()])
            .collect();
        println!("{}", pretty_table(&["Base", "Target", "Rate"], data));
    }
    Ok(())
}

/// Converts minor units of `from` into the organisation's base currency.
pub fn convert(conn: &Connection, user_id: i64, amount: i64, from: &str) -> Result<i64> {
    let base = store::organisation_base_currency(conn, user_id)?;
    let rates = store::list_fiat_rates(conn, &base)?;
    let rate = rate_for(&rates, &base, from)?;
    Ok(convert_to_base(amount, rate))
}

fn convert_amount(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = user_id(sub);
    let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
    let from = sub.get_one::<String>("from").unwrap().to_uppercase();
    let res = convert(conn, user, amount, &from)?;
    let base = store::organisation_base_currency(conn, user)?;
    println!("{} {} -> {} {}", fmt_minor(amount), from, fmt_minor(res), base);
    Ok(())
}
