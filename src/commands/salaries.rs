// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{forecast_options, report_refresh, today, user_id};
use crate::forecast::payroll::salary_next_execution;
use crate::forecast::refresh;
use crate::models::{Cycle, Salary};
use crate::store;
use crate::utils::{fmt_minor, maybe_print_json, parse_amount, parse_date, pretty_table};
use anyhow::{bail, Result};
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = user_id(sub);
    let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
    if amount < 0 {
        bail!("Salary amount must not be negative");
    }
    let to_date = match sub.get_one::<String>("to") {
        Some(s) => Some(parse_date(s)?),
        None => None,
    };
    let salary = Salary {
        id: 0,
        employee_id: *sub.get_one::<i64>("employee").unwrap(),
        amount: amount as u64,
        currency: sub.get_one::<String>("currency").unwrap().to_uppercase(),
        cycle: sub.get_one::<String>("cycle").unwrap().parse::<Cycle>()?,
        from_date: parse_date(sub.get_one::<String>("from").unwrap())?,
        to_date,
        is_termination: sub.get_flag("termination"),
        is_disabled: false,
    };
    let id = store::insert_salary(conn, user, &salary)?;
    println!(
        "Added salary #{} for employee #{}: {} {} {}",
        id,
        salary.employee_id,
        fmt_minor(amount),
        salary.currency,
        salary.cycle
    );
    let opts = forecast_options(conn, sub)?;
    report_refresh(&refresh::after_salary_change(conn, user, id, &opts)?);
    Ok(())
}

#[derive(Serialize)]
struct SalaryRow {
    #[serde(flatten)]
    salary: Salary,
    next_execution_date: Option<chrono::NaiveDate>,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let employee_id = *sub.get_one::<i64>("employee").unwrap();
    let reference = today(sub)?;
    let data: Vec<SalaryRow> = store::list_salaries(conn, user_id(sub), employee_id)?
        .into_iter()
        .map(|salary| SalaryRow {
            next_execution_date: salary_next_execution(&salary, reference),
            salary,
        })
        .collect();
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                let s = &r.salary;
                vec![
                    s.id.to_string(),
                    fmt_minor(s.amount as i64),
                    s.currency.clone(),
                    s.cycle.to_string(),
                    s.from_date.to_string(),
                    s.to_date.map(|d| d.to_string()).unwrap_or_default(),
                    r.next_execution_date
                        .map(|d| d.to_string())
                        .unwrap_or_default(),
                    if s.is_termination { "yes".into() } else { String::new() },
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Amount", "CCY", "Cycle", "From", "To", "Next", "Termination"],
                rows,
            )
        );
    }
    Ok(())
}
