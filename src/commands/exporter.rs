// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::user_id;
use crate::store;
use crate::utils::fmt_minor;
use anyhow::{bail, Result};
use rusqlite::Connection;
use serde_json::json;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("forecast", sub)) => export_forecast(conn, sub),
        _ => Ok(()),
    }
}

fn export_forecast(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap();
    if fmt != "csv" && fmt != "json" {
        bail!("Unknown format: {} (use csv|json)", fmt);
    }

    let user = user_id(sub);
    let forecasts = store::list_forecasts(conn, user, usize::MAX)?;
    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record(["month", "revenue", "expense", "cashflow"])?;
            for f in &forecasts {
                wtr.write_record([
                    f.month.clone(),
                    fmt_minor(f.revenue),
                    fmt_minor(f.expense),
                    fmt_minor(f.cashflow),
                ])?;
            }
            wtr.flush()?;
        }
        _ => {
            let details = store::list_forecast_details(conn, user, usize::MAX)?;
            let mut items = Vec::new();
            for f in &forecasts {
                let detail = details.iter().find(|d| d.month == f.month);
                items.push(json!({
                    "month": f.month,
                    "revenue": f.revenue,
                    "expense": f.expense,
                    "cashflow": f.cashflow,
                    "detail": detail.map(|d| json!({"revenue": d.revenue, "expense": d.expense})),
                }));
            }
            std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
        }
    }
    println!("Exported {} forecast months to {}", forecasts.len(), out);
    Ok(())
}
