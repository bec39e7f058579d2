// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use super::calendar::{add_months_clamped, month_key, parse_month_key};
use crate::errors::Result;
use crate::models::VatSetting;

const DEFAULT_INTERVAL_MONTHS: i32 = 3;

fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32
}

/// Groups collected VAT (month key → amount) into settlement postings that
/// fall after `today` and no later than `horizon`.
pub fn settlements(
    setting: &VatSetting,
    collected: &BTreeMap<String, i64>,
    today: NaiveDate,
    horizon: NaiveDate,
) -> Result<BTreeMap<String, i64>> {
    let mut out = BTreeMap::new();
    if !setting.enabled {
        return Ok(out);
    }
    let interval = setting.interval.months().unwrap_or(DEFAULT_INTERVAL_MONTHS);
    let billing = setting.billing_date;
    let billing_month = billing.with_day(1).unwrap_or(billing);
    let Some(first_period_start) = add_months_clamped(billing_month, -interval) else {
        return Ok(out);
    };

    for (key, amount) in collected {
        let month = parse_month_key(key)?;
        let since = months_between(first_period_start, month);
        if since < 0 {
            continue;
        }
        let period = since / interval;
        let settles_on = period
            .checked_mul(interval)
            .and_then(|shift| add_months_clamped(billing, shift))
            .and_then(|period_billing| {
                add_months_clamped(period_billing, setting.transaction_month_offset)
            });
        let Some(settles_on) = settles_on else {
            continue;
        };
        if settles_on > today && settles_on <= horizon {
            *out.entry(month_key(settles_on)).or_insert(0) += amount;
        }
    }
    Ok(out)
}
