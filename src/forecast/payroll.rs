// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::num::NonZeroU32;

use chrono::NaiveDate;
use rusqlite::Connection;

use super::cost_details::schedule_from_details;
use super::recurrence::next_occurrence;
use crate::errors::Result;
use crate::models::{Cycle, DistributionType, Salary, ScheduledCost};
use crate::store;

pub fn load_scheduled_costs(
    conn: &Connection,
    user_id: i64,
    salary_id: i64,
    reference: NaiveDate,
    skip_previous: bool,
) -> Result<Vec<ScheduledCost>> {
    let costs = store::list_salary_costs(conn, user_id, salary_id)?;
    let mut scheduled = Vec::with_capacity(costs.len());
    for cost in costs {
        let details = store::list_salary_cost_details(conn, cost.id)?;
        let schedule = schedule_from_details(&details, reference, skip_previous)?;
        scheduled.push(ScheduledCost { cost, schedule });
    }
    Ok(scheduled)
}

fn scale_to_salary(amount: u64, salary_cycle: Cycle, cost_months: i32) -> u64 {
    let salary_months = salary_cycle.months().unwrap_or(1);
    let cost_months = u64::try_from(cost_months.max(1)).unwrap_or(1);
    let salary_months = u64::try_from(salary_months).unwrap_or(1);
    amount.saturating_mul(salary_months) / cost_months
}

pub fn salary_adjustment(
    salary_cycle: Cycle,
    distribution: DistributionType,
    costs: &[ScheduledCost],
) -> u64 {
    costs
        .iter()
        .filter(|c| c.cost.distribution_type == distribution)
        .map(|c| {
            let amount = c.schedule.amount_per_month;
            match c.cost.cycle.months() {
                Some(months) => scale_to_salary(amount, salary_cycle, months),
                None => amount,
            }
        })
        .fold(0u64, u64::saturating_add)
}

pub fn employee_deductions(salary: &Salary, costs: &[ScheduledCost]) -> u64 {
    salary_adjustment(salary.cycle, DistributionType::Employee, costs)
}

pub fn employer_costs(salary: &Salary, costs: &[ScheduledCost]) -> u64 {
    salary_adjustment(salary.cycle, DistributionType::Employer, costs)
}

/// Net payout after employee-borne costs, never below zero.
pub fn net_amount(salary: &Salary, costs: &[ScheduledCost]) -> u64 {
    salary.amount.saturating_sub(employee_deductions(salary, costs))
}

pub fn salary_next_execution(salary: &Salary, reference: NaiveDate) -> Option<NaiveDate> {
    next_occurrence(&salary.window(), Some(salary.cycle), reference, NonZeroU32::MIN)
}
