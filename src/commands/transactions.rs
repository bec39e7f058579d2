// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{forecast_options, report_refresh, user_id};
use crate::forecast::refresh;
use crate::models::{Cycle, Transaction, TransactionKind};
use crate::store;
use crate::utils::{
    fmt_minor, fmt_percent, maybe_print_json, parse_amount, parse_date, parse_percent,
    pretty_table,
};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("disable", sub)) => set_disabled(conn, sub, true)?,
        Some(("enable", sub)) => set_disabled(conn, sub, false)?,
        _ => {}
    }
    Ok(())
}

pub fn transaction_from_args(sub: &clap::ArgMatches) -> Result<Transaction> {
    let kind: TransactionKind = sub.get_one::<String>("type").unwrap().parse()?;
    let cycle = match sub.get_one::<String>("cycle") {
        Some(c) => Some(c.parse::<Cycle>()?),
        None => None,
    };
    let end_date = match sub.get_one::<String>("end") {
        Some(s) => Some(parse_date(s)?),
        None => None,
    };
    let vat_rate = match sub.get_one::<String>("vat-rate") {
        Some(s) => Some(parse_percent(s)?),
        None => None,
    };
    let tx = Transaction {
        id: 0,
        name: sub.get_one::<String>("name").unwrap().to_string(),
        amount: parse_amount(sub.get_one::<String>("amount").unwrap())?,
        currency: sub.get_one::<String>("currency").unwrap().to_uppercase(),
        kind,
        cycle,
        start_date: parse_date(sub.get_one::<String>("start").unwrap())?,
        end_date,
        category: sub.get_one::<String>("category").unwrap().to_string(),
        vat_rate,
        vat_included: sub.get_flag("vat-included"),
        is_disabled: false,
    };
    tx.validate()?;
    Ok(tx)
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = user_id(sub);
    let tx = transaction_from_args(sub)?;
    let id = store::insert_transaction(conn, user, &tx)?;
    println!(
        "Recorded #{} '{}' {} {} from {}",
        id,
        tx.name,
        fmt_minor(tx.amount),
        tx.currency,
        tx.start_date
    );
    let opts = forecast_options(conn, sub)?;
    report_refresh(&refresh::after_transaction_change(conn, user, &opts)?);
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = store::list_transactions(conn, user_id(sub))?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|t| {
                vec![
                    t.id.to_string(),
                    t.name.clone(),
                    fmt_minor(t.amount),
                    t.currency.clone(),
                    t.kind.to_string(),
                    t.cycle.map(|c| c.to_string()).unwrap_or_default(),
                    t.start_date.to_string(),
                    t.end_date.map(|d| d.to_string()).unwrap_or_default(),
                    t.category.clone(),
                    t.vat_rate.map(fmt_percent).unwrap_or_default(),
                    if t.is_disabled { "yes".into() } else { String::new() },
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &[
                    "ID", "Name", "Amount", "CCY", "Type", "Cycle", "Start", "End", "Category",
                    "VAT", "Disabled"
                ],
                rows,
            )
        );
    }
    Ok(())
}

fn set_disabled(conn: &mut Connection, sub: &clap::ArgMatches, disabled: bool) -> Result<()> {
    let user = user_id(sub);
    let id = *sub.get_one::<i64>("id").unwrap();
    store::set_transaction_disabled(conn, user, id, disabled)?;
    println!(
        "Transaction #{} {}",
        id,
        if disabled { "disabled" } else { "enabled" }
    );
    let opts = forecast_options(conn, sub)?;
    report_refresh(&refresh::after_transaction_change(conn, user, &opts)?);
    Ok(())
}
