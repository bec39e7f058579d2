// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{forecast_options, report_refresh, user_id};
use crate::forecast::aggregate::calculate_forecast;
use crate::forecast::refresh;
use crate::models::{ForecastDetailEntry, MonthlyForecast};
use crate::store;
use crate::utils::{fmt_minor, maybe_print_json, parse_month, pretty_table};
use anyhow::{bail, Result};
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("run", sub)) => {
            let opts = forecast_options(conn, sub)?;
            let forecasts = refresh::rebuild_all(conn, user_id(sub), &opts)?;
            print_forecasts(sub, &forecasts)?;
        }
        Some(("list", sub)) => {
            let limit = match sub.get_one::<usize>("limit") {
                Some(l) => *l,
                None => forecast_options(conn, sub)?.month_limit(),
            };
            let forecasts = store::list_forecasts(conn, user_id(sub), limit)?;
            print_forecasts(sub, &forecasts)?;
        }
        Some(("detail", sub)) => detail(conn, sub)?,
        Some(("exclude", sub)) => exclude(conn, sub)?,
        Some(("horizon", sub)) => match sub.get_one::<i64>("years") {
            Some(years) => {
                store::set_max_forecast_years(conn, *years)?;
                println!("Forecast horizon set to {} years", years);
            }
            None => println!(
                "Forecast horizon: {} years",
                store::max_forecast_years(conn)?
            ),
        },
        _ => {}
    }
    Ok(())
}

fn print_forecasts(sub: &clap::ArgMatches, forecasts: &[MonthlyForecast]) -> Result<()> {
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &forecasts)? {
        let rows = forecasts
            .iter()
            .map(|f| {
                vec![
                    f.month.clone(),
                    fmt_minor(f.revenue),
                    fmt_minor(f.expense),
                    fmt_minor(f.cashflow),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Month", "Revenue", "Expense", "Cashflow"], rows)
        );
    }
    Ok(())
}

fn flatten_rows(side: &str, entries: &[ForecastDetailEntry], depth: usize, out: &mut Vec<Vec<String>>) {
    for entry in entries {
        let name = format!("{}{}", "  ".repeat(depth), entry.name);
        let amount = entry.amount.map(fmt_minor).unwrap_or_default();
        let source = match (&entry.related_table, entry.related_id) {
            (Some(table), Some(id)) => format!("{}#{}", table, id),
            (Some(table), None) => table.clone(),
            _ => String::new(),
        };
        let excluded = if entry.is_excluded { "yes" } else { "" };
        out.push(vec![
            side.to_string(),
            name,
            amount,
            source,
            excluded.to_string(),
        ]);
        flatten_rows(side, &entry.children, depth + 1, out);
    }
}

fn detail(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let month = parse_month(sub.get_one::<String>("month").unwrap())?;
    let record = store::list_forecast_details(conn, user_id(sub), usize::MAX)?
        .into_iter()
        .find(|r| r.month == month);
    let Some(record) = record else {
        bail!("No forecast stored for {}", month);
    };
    if sub.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }
    let mut rows = Vec::new();
    flatten_rows("revenue", &record.revenue, 0, &mut rows);
    flatten_rows("expense", &record.expense, 0, &mut rows);
    println!(
        "{}",
        pretty_table(&["Side", "Name", "Amount", "Source", "Excluded"], rows)
    );
    Ok(())
}

fn exclude(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = user_id(sub);
    let table = sub.get_one::<String>("table").unwrap();
    let related_id = *sub.get_one::<i64>("id").unwrap();
    let excluded = !sub.get_flag("include");
    let months = sub
        .get_many::<String>("month")
        .map(|ms| ms.map(|m| parse_month(m)).collect::<Result<Vec<_>>>())
        .transpose()?
        .unwrap_or_default();

    let tx = conn.transaction()?;
    for month in &months {
        store::set_forecast_exclusion(&tx, user, month, related_id, table, excluded)?;
    }
    tx.commit()?;
    println!(
        "{} {}#{} for {} month(s)",
        if excluded { "Excluded" } else { "Included" },
        table,
        related_id,
        months.len()
    );

    let opts = forecast_options(conn, sub)?;
    report_refresh(&calculate_forecast(conn, user, &opts)?);
    Ok(())
}
