// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{forecast_options, report_refresh, user_id};
use crate::forecast::aggregate::calculate_forecast;
use crate::models::VatSetting;
use crate::store;
use crate::utils::{maybe_print_json, parse_date, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            let user = user_id(sub);
            let setting = VatSetting {
                enabled: !sub.get_flag("disabled"),
                billing_date: parse_date(sub.get_one::<String>("billing-date").unwrap())?,
                transaction_month_offset: *sub.get_one::<i32>("offset").unwrap(),
                interval: sub.get_one::<String>("interval").unwrap().parse()?,
            };
            store::set_vat_setting(conn, user, &setting)?;
            println!(
                "VAT settlement {} ({}, billing {}, +{} months)",
                if setting.enabled { "enabled" } else { "disabled" },
                setting.interval,
                setting.billing_date,
                setting.transaction_month_offset
            );
            let opts = forecast_options(conn, sub)?;
            report_refresh(&calculate_forecast(conn, user, &opts)?);
        }
        Some(("show", sub)) => {
            let setting = store::vat_setting(conn, user_id(sub))?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &setting)? {
                match setting {
                    Some(s) => println!(
                        "{}",
                        pretty_table(
                            &["Enabled", "Billing date", "Interval", "Offset (months)"],
                            vec![vec![
                                s.enabled.to_string(),
                                s.billing_date.to_string(),
                                s.interval.to_string(),
                                s.transaction_month_offset.to_string(),
                            ]],
                        )
                    ),
                    None => println!("VAT settlement is not configured."),
                }
            }
        }
        _ => {}
    }
    Ok(())
}
