// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::user_id;
use crate::store;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let id = store::ensure_category(conn, user_id(sub), name)?;
            println!("Category '{}' has id {}", name, id);
        }
        Some(("list", sub)) => {
            let categories = store::list_categories(conn, user_id(sub))?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &categories)? {
                let data = categories
                    .into_iter()
                    .map(|c| vec![c.id.to_string(), c.name])
                    .collect();
                println!("{}", pretty_table(&["ID", "Category"], data));
            }
        }
        _ => {}
    }
    Ok(())
}
