// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{forecast_options, report_refresh, today, user_id};
use crate::forecast::payroll::load_scheduled_costs;
use crate::forecast::refresh;
use crate::models::{relative_offset, AmountType, SalaryCost};
use crate::store;
use crate::utils::{
    fmt_minor, fmt_percent, maybe_print_json, parse_amount, parse_date, parse_percent,
    pretty_table,
};
use anyhow::{bail, Result};
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("details", sub)) => details(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = user_id(sub);
    let amount_type: AmountType = sub.get_one::<String>("amount-type").unwrap().parse()?;
    let raw_amount = sub.get_one::<String>("amount").unwrap();
    let amount = match amount_type {
        AmountType::Fixed => {
            let minor = parse_amount(raw_amount)?;
            if minor < 0 {
                bail!("Cost amount must not be negative");
            }
            minor as u64
        }
        AmountType::Percentage => parse_percent(raw_amount)?,
    };
    let target_date = match sub.get_one::<String>("target") {
        Some(s) => Some(parse_date(s)?),
        None => None,
    };
    let base_cost_ids: Vec<i64> = sub
        .get_many::<i64>("base")
        .map(|ids| ids.copied().collect())
        .unwrap_or_default();
    if !base_cost_ids.is_empty() && amount_type != AmountType::Percentage {
        bail!("--base only applies to percentage costs");
    }
    let cost = SalaryCost {
        id: 0,
        salary_id: *sub.get_one::<i64>("salary").unwrap(),
        label: sub.get_one::<String>("label").cloned(),
        cycle: sub.get_one::<String>("cycle").unwrap().parse()?,
        amount_type,
        amount,
        distribution_type: sub.get_one::<String>("distribution").unwrap().parse()?,
        relative_offset: relative_offset(*sub.get_one::<i64>("offset").unwrap())?,
        target_date,
        base_cost_ids,
    };
    let id = store::insert_salary_cost(conn, user, &cost)?;
    println!(
        "Added cost #{} '{}' to salary #{}",
        id,
        cost.label_name(),
        cost.salary_id
    );
    let opts = forecast_options(conn, sub)?;
    report_refresh(&refresh::after_cost_change(conn, user, id, &opts)?);
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let salary_id = *sub.get_one::<i64>("salary").unwrap();
    let costs = load_scheduled_costs(conn, user_id(sub), salary_id, today(sub)?, true)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &costs_json(&costs))? {
        let rows: Vec<Vec<String>> = costs
            .iter()
            .map(|s| {
                let c = &s.cost;
                let amount = match c.amount_type {
                    AmountType::Fixed => fmt_minor(c.amount as i64),
                    AmountType::Percentage => fmt_percent(c.amount),
                };
                vec![
                    c.id.to_string(),
                    c.label_name().to_string(),
                    c.cycle.to_string(),
                    amount,
                    c.distribution_type.to_string(),
                    c.relative_offset.to_string(),
                    s.schedule
                        .next_execution_date
                        .map(|d| d.format("%Y-%m").to_string())
                        .unwrap_or_default(),
                    fmt_minor(s.schedule.next_cost as i64),
                    fmt_minor(s.schedule.amount_per_month as i64),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &[
                    "ID", "Label", "Cycle", "Amount", "Paid by", "Offset", "Next", "Next cost",
                    "Per month"
                ],
                rows,
            )
        );
    }
    Ok(())
}

fn costs_json(costs: &[crate::models::ScheduledCost]) -> Vec<serde_json::Value> {
    costs
        .iter()
        .map(|s| {
            serde_json::json!({
                "cost": s.cost,
                "schedule": s.schedule,
            })
        })
        .collect()
}

fn details(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let cost_id = *sub.get_one::<i64>("cost").unwrap();
    store::get_salary_cost(conn, user_id(sub), cost_id)?;
    let details = store::list_salary_cost_details(conn, cost_id)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &details)? {
        let rows = details
            .into_iter()
            .map(|d| {
                vec![
                    d.month,
                    fmt_minor(d.amount as i64),
                    d.divider.to_string(),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Month", "Amount", "Months covered"], rows));
    }
    Ok(())
}
