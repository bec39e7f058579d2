// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{forecast_options, report_refresh, user_id};
use crate::forecast::aggregate::calculate_forecast;
use crate::store;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let id = store::insert_employee(conn, user_id(sub), name)?;
            println!("Added employee #{} '{}'", id, name);
        }
        Some(("list", sub)) => {
            let employees = store::list_employees(conn, user_id(sub))?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &employees)? {
                let data = employees
                    .into_iter()
                    .map(|e| {
                        vec![
                            e.id.to_string(),
                            e.name,
                            if e.is_disabled { "yes".into() } else { String::new() },
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["ID", "Name", "Disabled"], data));
            }
        }
        Some(("disable", sub)) => set_disabled(conn, sub, true)?,
        Some(("enable", sub)) => set_disabled(conn, sub, false)?,
        _ => {}
    }
    Ok(())
}

fn set_disabled(conn: &mut Connection, sub: &clap::ArgMatches, disabled: bool) -> Result<()> {
    let user = user_id(sub);
    let id = *sub.get_one::<i64>("id").unwrap();
    store::set_employee_disabled(conn, user, id, disabled)?;
    println!(
        "Employee #{} {}",
        id,
        if disabled { "disabled" } else { "enabled" }
    );
    let opts = forecast_options(conn, sub)?;
    report_refresh(&calculate_forecast(conn, user, &opts)?);
    Ok(())
}
