// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashSet;

use chrono::NaiveDate;
use rusqlite::Connection;
use tracing::debug;

use super::calendar::{add_cycle, end_of_month, month_key, parse_month_key};
use super::cost_dates::cost_execution_date;
use super::recurrence::Direction;
use super::ForecastOptions;
use crate::errors::{ForecastError, Result};
use crate::models::{
    AmountType, CostSchedule, Cycle, PERCENT_SCALE, Salary, SalaryCost, SalaryCostDetail,
};
use crate::store;

fn percent_of(base: u64, percent: u64) -> u64 {
    let value = u128::from(base) * u128::from(percent) / u128::from(PERCENT_SCALE);
    u64::try_from(value).unwrap_or(u64::MAX)
}

/// `known` must hold every cost a base reference can point to.
pub fn amount_per_month(cost: &SalaryCost, salary: &Salary, known: &[SalaryCost]) -> Result<u64> {
    let mut visiting = HashSet::new();
    resolve_amount(cost, salary, known, &mut visiting)
}

fn resolve_amount(
    cost: &SalaryCost,
    salary: &Salary,
    known: &[SalaryCost],
    visiting: &mut HashSet<i64>,
) -> Result<u64> {
    if !visiting.insert(cost.id) {
        return Err(ForecastError::CircularBaseCost(cost.id));
    }
    let amount = match cost.amount_type {
        AmountType::Fixed => cost.amount,
        AmountType::Percentage if cost.base_cost_ids.is_empty() => {
            percent_of(salary.amount, cost.amount)
        }
        AmountType::Percentage => {
            let mut seen = HashSet::new();
            let mut base: u64 = 0;
            for id in cost.base_cost_ids.iter().copied() {
                if !seen.insert(id) {
                    continue;
                }
                let base_cost = known
                    .iter()
                    .find(|c| c.id == id)
                    .ok_or(ForecastError::SalaryCostNotFound(id))?;
                if base_cost.salary_id != cost.salary_id {
                    return Err(ForecastError::ForeignBaseCost {
                        base_cost: id,
                        salary: cost.salary_id,
                    });
                }
                let part = resolve_amount(base_cost, salary, known, visiting)?;
                base = base.saturating_add(
                    part.saturating_mul(base_cost.distribution_type.multiplier()),
                );
            }
            percent_of(base, cost.amount)
        }
    };
    visiting.remove(&cost.id);
    Ok(amount)
}

pub fn build_cost_details(
    cost: &SalaryCost,
    salary: &Salary,
    known: &[SalaryCost],
    opts: &ForecastOptions,
) -> Result<Vec<SalaryCostDetail>> {
    let Some(mut next) = cost_execution_date(salary, cost, opts.today, Direction::Next) else {
        return Ok(Vec::new());
    };

    let per_month = amount_per_month(cost, salary, known)?;
    let horizon = opts.horizon();
    let start = salary.from_date;
    let end = salary
        .to_date
        .map_or(horizon, |to| end_of_month(to).min(horizon));
    let step = i64::from(cost.relative_offset.get());

    let mut details = Vec::new();
    loop {
        let mut valid: u32 = 0;
        let mut has_ended = false;
        for i in (1..=step).rev() {
            let Some(month) = add_cycle(next, cost.cycle, -i) else {
                continue;
            };
            if month < start {
                continue;
            }
            if month > end {
                has_ended = true;
                continue;
            }
            valid += 1;
        }

        let total = per_month.saturating_mul(u64::from(valid));
        if total > 0 {
            details.push(SalaryCostDetail {
                month: month_key(next),
                amount: total,
                divider: valid,
                cost_id: cost.id,
            });
        }

        if has_ended || cost.cycle == Cycle::Once {
            break;
        }
        match add_cycle(next, cost.cycle, step) {
            Some(following) if following > next => next = following,
            _ => break,
        }
    }
    Ok(details)
}

fn materialize_in(
    conn: &Connection,
    user_id: i64,
    cost: &SalaryCost,
    opts: &ForecastOptions,
) -> Result<Vec<SalaryCostDetail>> {
    let salary = store::get_salary(conn, user_id, cost.salary_id)?;
    let known = store::list_user_salary_costs(conn, user_id)?;
    let details = build_cost_details(cost, &salary, &known, opts)?;

    store::clear_salary_cost_details(conn, cost.id)?;
    for detail in &details {
        store::upsert_salary_cost_detail(conn, detail)?;
    }
    debug!(cost_id = cost.id, rows = details.len(), "materialised salary cost");
    Ok(details)
}

pub fn materialize_cost_details(
    conn: &mut Connection,
    user_id: i64,
    cost_id: i64,
    opts: &ForecastOptions,
) -> Result<Vec<SalaryCostDetail>> {
    let tx = conn.transaction()?;
    let cost = store::get_salary_cost(&tx, user_id, cost_id)?;
    let details = materialize_in(&tx, user_id, &cost, opts)?;
    tx.commit()?;
    Ok(details)
}

pub fn refresh_salary_cost_details(
    conn: &mut Connection,
    user_id: i64,
    salary_id: i64,
    opts: &ForecastOptions,
) -> Result<()> {
    let tx = conn.transaction()?;
    for cost in store::list_salary_costs(&tx, user_id, salary_id)? {
        materialize_in(&tx, user_id, &cost, opts)?;
    }
    tx.commit()?;
    Ok(())
}

pub fn refresh_all_cost_details(
    conn: &mut Connection,
    user_id: i64,
    opts: &ForecastOptions,
) -> Result<usize> {
    let tx = conn.transaction()?;
    let costs = store::list_user_salary_costs(&tx, user_id)?;
    for cost in &costs {
        materialize_in(&tx, user_id, cost, opts)?;
    }
    tx.commit()?;
    Ok(costs.len())
}

/// With `skip_previous == false` the most recent posting before the reference
/// month is reported as next when one exists.
pub fn schedule_from_details(
    details: &[SalaryCostDetail],
    reference: NaiveDate,
    skip_previous: bool,
) -> Result<CostSchedule> {
    let mut sorted = details.to_vec();
    sorted.sort_by(|a, b| a.month.cmp(&b.month));
    let current = month_key(reference);

    let upcoming = sorted.iter().position(|d| d.month >= current);
    let (next, previous) = match upcoming {
        Some(idx) if skip_previous || idx == 0 => (Some(idx), idx.checked_sub(1)),
        Some(idx) => (Some(idx - 1), idx.checked_sub(2)),
        None if !skip_previous && !sorted.is_empty() => {
            let last = sorted.len() - 1;
            (Some(last), last.checked_sub(1))
        }
        None => (None, None),
    };

    let mut schedule = CostSchedule::default();
    if let Some(idx) = previous {
        schedule.previous_execution_date = Some(parse_month_key(&sorted[idx].month)?);
    }
    if let Some(idx) = next {
        let detail = &sorted[idx];
        schedule.next_execution_date = Some(parse_month_key(&detail.month)?);
        schedule.next_cost = detail.amount;
        if detail.divider > 0 {
            schedule.amount_per_month = detail.amount / u64::from(detail.divider);
        }
    }
    schedule.details = sorted;
    Ok(schedule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DistributionType;
    use std::num::NonZeroU32;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn salary(from: NaiveDate, to: Option<NaiveDate>) -> Salary {
        Salary {
            id: 1,
            employee_id: 1,
            amount: 500_000,
            currency: "CHF".into(),
            cycle: Cycle::Monthly,
            from_date: from,
            to_date: to,
            is_termination: false,
            is_disabled: false,
        }
    }

    fn cost(id: i64, cycle: Cycle, amount_type: AmountType, amount: u64) -> SalaryCost {
        SalaryCost {
            id,
            salary_id: 1,
            label: None,
            cycle,
            amount_type,
            amount,
            distribution_type: DistributionType::Employer,
            relative_offset: NonZeroU32::new(1).unwrap(),
            target_date: None,
            base_cost_ids: Vec::new(),
        }
    }

    fn detail(month: &str, amount: u64, divider: u32) -> SalaryCostDetail {
        SalaryCostDetail {
            month: month.into(),
            amount,
            divider,
            cost_id: 1,
        }
    }

    #[test]
    fn percentage_of_salary_uses_fixed_point_scale() {
        let s = salary(d(2024, 1, 25), None);
        let c = cost(1, Cycle::Monthly, AmountType::Percentage, 5_300);
        // 5.3% of 5000.00
        assert_eq!(amount_per_month(&c, &s, &[]).unwrap(), 26_500);
    }

    #[test]
    fn percentage_of_base_costs_weights_distribution() {
        let s = salary(d(2024, 1, 25), None);
        let mut base = cost(1, Cycle::Monthly, AmountType::Fixed, 10_000);
        base.distribution_type = DistributionType::Both;
        let mut derived = cost(2, Cycle::Monthly, AmountType::Percentage, 50_000);
        derived.base_cost_ids = vec![1, 1];
        let known = vec![base, derived.clone()];
        assert_eq!(amount_per_month(&derived, &s, &known).unwrap(), 10_000);
    }

    #[test]
    fn circular_base_costs_are_rejected() {
        let s = salary(d(2024, 1, 25), None);
        let mut a = cost(1, Cycle::Monthly, AmountType::Percentage, 10_000);
        let mut b = cost(2, Cycle::Monthly, AmountType::Percentage, 10_000);
        a.base_cost_ids = vec![2];
        b.base_cost_ids = vec![1];
        let known = vec![a.clone(), b];
        assert!(matches!(
            amount_per_month(&a, &s, &known),
            Err(ForecastError::CircularBaseCost(1))
        ));
    }

    #[test]
    fn base_cost_of_another_salary_is_rejected() {
        let s = salary(d(2024, 1, 25), None);
        let mut foreign = cost(1, Cycle::Monthly, AmountType::Fixed, 10_000);
        foreign.salary_id = 9;
        let mut derived = cost(2, Cycle::Monthly, AmountType::Percentage, 10_000);
        derived.base_cost_ids = vec![1];
        let known = vec![foreign];
        assert!(matches!(
            amount_per_month(&derived, &s, &known),
            Err(ForecastError::ForeignBaseCost { base_cost: 1, salary: 1 })
        ));
    }

    #[test]
    fn quarterly_cycle_counts_one_step_per_offset() {
        let s = salary(d(2023, 1, 1), None);
        let c = cost(1, Cycle::Quarterly, AmountType::Fixed, 30_000);
        let opts = ForecastOptions::new(d(2024, 1, 1), 1);
        let details = build_cost_details(&c, &s, &[], &opts).unwrap();
        // Salary pays Jan 1; the cost executes one quarter later.
        assert_eq!(details[0].month, "2024-04");
        assert_eq!(details[0].divider, 1);
        assert_eq!(details[0].amount, 30_000);
    }

    #[test]
    fn relative_offset_accumulates_months_inside_the_window() {
        // Monthly cost posted every third month; the last posting only covers
        // the two months before the salary ends.
        let s = salary(d(2024, 2, 1), Some(d(2024, 9, 30)));
        let mut c = cost(1, Cycle::Monthly, AmountType::Fixed, 10_000);
        c.relative_offset = NonZeroU32::new(3).unwrap();
        let opts = ForecastOptions::new(d(2024, 1, 1), 3);
        let details = build_cost_details(&c, &s, &[], &opts).unwrap();
        assert_eq!(
            details,
            vec![
                SalaryCostDetail { month: "2024-05".into(), amount: 30_000, divider: 3, cost_id: 1 },
                SalaryCostDetail { month: "2024-08".into(), amount: 30_000, divider: 3, cost_id: 1 },
                SalaryCostDetail { month: "2024-11".into(), amount: 20_000, divider: 2, cost_id: 1 },
            ]
        );
    }

    #[test]
    fn once_cost_posts_a_single_row() {
        let s = salary(d(2024, 1, 25), None);
        let mut c = cost(1, Cycle::Once, AmountType::Fixed, 99_000);
        c.target_date = Some(d(2024, 6, 30));
        let opts = ForecastOptions::new(d(2024, 2, 1), 3);
        let details = build_cost_details(&c, &s, &[], &opts).unwrap();
        assert_eq!(details, vec![detail("2024-06", 99_000, 1)]);
    }

    #[test]
    fn offset_past_the_calendar_posts_nothing() {
        let s = salary(d(2024, 1, 1), None);
        let mut c = cost(1, Cycle::Monthly, AmountType::Fixed, 10_000);
        c.relative_offset = NonZeroU32::new(3_200_000).unwrap();
        let opts = ForecastOptions::new(d(2024, 1, 1), 3);
        assert!(build_cost_details(&c, &s, &[], &opts).unwrap().is_empty());
    }

    #[test]
    fn open_salary_stops_at_the_horizon() {
        let s = salary(d(2024, 1, 25), None);
        let c = cost(1, Cycle::Monthly, AmountType::Fixed, 1_000);
        let opts = ForecastOptions::new(d(2024, 1, 1), 1);
        let details = build_cost_details(&c, &s, &[], &opts).unwrap();
        let last = details.last().unwrap();
        assert!(last.month.as_str() <= "2025-02");
        assert!(details.iter().all(|row| row.divider == 1));
    }

    #[test]
    fn schedule_picks_first_upcoming_when_skipping_previous() {
        let rows = vec![
            detail("2024-01", 30_000, 3),
            detail("2024-04", 30_000, 3),
            detail("2024-07", 20_000, 2),
        ];
        let schedule = schedule_from_details(&rows, d(2024, 3, 15), true).unwrap();
        assert_eq!(schedule.next_execution_date, Some(d(2024, 4, 1)));
        assert_eq!(schedule.previous_execution_date, Some(d(2024, 1, 1)));
        assert_eq!(schedule.next_cost, 30_000);
        assert_eq!(schedule.amount_per_month, 10_000);
    }

    #[test]
    fn schedule_surfaces_latest_posting_when_keeping_previous() {
        let rows = vec![
            detail("2024-07", 20_000, 2),
            detail("2024-01", 30_000, 3),
            detail("2024-04", 30_000, 3),
        ];
        let schedule = schedule_from_details(&rows, d(2024, 6, 1), false).unwrap();
        assert_eq!(schedule.next_execution_date, Some(d(2024, 4, 1)));
        assert_eq!(schedule.previous_execution_date, Some(d(2024, 1, 1)));

        let after_all = schedule_from_details(&rows, d(2025, 1, 1), false).unwrap();
        assert_eq!(after_all.next_execution_date, Some(d(2024, 7, 1)));
        assert_eq!(after_all.amount_per_month, 10_000);

        let skipped = schedule_from_details(&rows, d(2025, 1, 1), true).unwrap();
        assert_eq!(skipped.next_execution_date, None);
        assert_eq!(skipped.next_cost, 0);
    }

    #[test]
    fn schedule_current_month_counts_as_upcoming() {
        let rows = vec![detail("2024-03", 5_000, 1)];
        let schedule = schedule_from_details(&rows, d(2024, 3, 31), false).unwrap();
        assert_eq!(schedule.next_execution_date, Some(d(2024, 3, 1)));
        assert_eq!(schedule.previous_execution_date, None);
    }
}
