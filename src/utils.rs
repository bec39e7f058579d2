// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::forecast::calendar::{month_key, parse_month_key};
use crate::models::PERCENT_SCALE;

const UA: &str = concat!(
    "cashcast/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/alphavelocity/cashcast)"
);

pub fn http_client() -> Result<reqwest::blocking::Client> {
    let c = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .user_agent(UA)
        .build()?;
    Ok(c)
}

pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_month(s: &str) -> Result<String> {
    let first = parse_month_key(s)
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", s))?;
    Ok(month_key(first))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

/// "12.34" -> 1234 minor units. More than two decimals is rejected.
pub fn parse_amount(s: &str) -> Result<i64> {
    let d = parse_decimal(s)?;
    if d.scale() > 2 && d.round_dp(2) != d {
        bail!("Amount '{}' has more than two decimals", s);
    }
    (d * Decimal::ONE_HUNDRED)
        .to_i64()
        .with_context(|| format!("Amount '{}' is out of range", s))
}

/// "8.1" (percent) -> 8100 on the fixed-point percent scale.
pub fn parse_percent(s: &str) -> Result<u64> {
    let d = parse_decimal(s)?;
    if d.is_sign_negative() {
        bail!("Percentage '{}' must not be negative", s);
    }
    let scaled = d * Decimal::from(PERCENT_SCALE) / Decimal::ONE_HUNDRED;
    if scaled.fract() != Decimal::ZERO {
        bail!("Percentage '{}' has too many decimals", s);
    }
    scaled
        .to_u64()
        .with_context(|| format!("Percentage '{}' is out of range", s))
}

pub fn fmt_minor(amount: i64) -> String {
    Decimal::new(amount, 2).to_string()
}

pub fn fmt_percent(value: u64) -> String {
    let d = Decimal::from(value) * Decimal::ONE_HUNDRED / Decimal::from(PERCENT_SCALE);
    format!("{}%", d.normalize())
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}
