// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::num::NonZeroU32;

use chrono::NaiveDate;

use super::calendar::{add_cycle, subtract_cycle};
use super::recurrence::{next_occurrence, previous_occurrence, Direction};
use crate::models::{Cycle, Salary, SalaryCost};

/// Salary payout the cost hangs off: the next one, or the last one if the
/// salary has already ended.
fn salary_anchor(salary: &Salary, reference: NaiveDate) -> Option<NaiveDate> {
    let window = salary.window();
    let single = NonZeroU32::MIN;
    next_occurrence(&window, Some(salary.cycle), reference, single)
        .or_else(|| previous_occurrence(&window, Some(salary.cycle), reference, single))
}

fn roll_target(
    mut target: NaiveDate,
    cycle: Cycle,
    offset: i64,
    reference: NaiveDate,
    limit: NaiveDate,
) -> NaiveDate {
    while target <= reference {
        match add_cycle(target, cycle, offset) {
            Some(next) if next <= limit && next > target => target = next,
            _ => break,
        }
    }
    target
}

pub fn cost_execution_date(
    salary: &Salary,
    cost: &SalaryCost,
    reference: NaiveDate,
    direction: Direction,
) -> Option<NaiveDate> {
    let anchor = salary_anchor(salary, reference)?;

    if cost.cycle == Cycle::Once {
        return match (direction, cost.target_date) {
            (Direction::Next, Some(target)) if reference <= target => Some(target),
            _ => None,
        };
    }

    let offset = i64::from(cost.relative_offset.get());

    if let Some(target) = cost.target_date {
        let limit = add_cycle(anchor, cost.cycle, offset).unwrap_or(NaiveDate::MAX);
        let target = if anchor >= target {
            roll_target(target, cost.cycle, offset, reference, limit)
        } else {
            target
        };
        return match direction {
            Direction::Next if reference > target => None,
            Direction::Next => Some(target),
            Direction::Previous => subtract_cycle(target, cost.cycle, offset),
        };
    }

    let cost_date = add_cycle(anchor, cost.cycle, offset)?;
    match direction {
        Direction::Next if reference > cost_date => None,
        Direction::Next => Some(cost_date),
        Direction::Previous if reference > cost_date => Some(cost_date),
        Direction::Previous => subtract_cycle(cost_date, cost.cycle, offset),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AmountType, DistributionType};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn salary(from: NaiveDate, to: Option<NaiveDate>) -> Salary {
        Salary {
            id: 1,
            employee_id: 1,
            amount: 600_000,
            currency: "CHF".into(),
            cycle: Cycle::Monthly,
            from_date: from,
            to_date: to,
            is_termination: false,
            is_disabled: false,
        }
    }

    fn cost(cycle: Cycle, offset: u32, target: Option<NaiveDate>) -> SalaryCost {
        SalaryCost {
            id: 7,
            salary_id: 1,
            label: None,
            cycle,
            amount_type: AmountType::Fixed,
            amount: 10_000,
            distribution_type: DistributionType::Employer,
            relative_offset: NonZeroU32::new(offset).unwrap(),
            target_date: target,
            base_cost_ids: Vec::new(),
        }
    }

    #[test]
    fn untargeted_cost_follows_the_salary_calendar() {
        let s = salary(d(2024, 1, 25), None);
        let c = cost(Cycle::Monthly, 1, None);
        // Next payout on or after Mar 10 is Mar 25; the cost lands one month later.
        assert_eq!(
            cost_execution_date(&s, &c, d(2024, 3, 10), Direction::Next),
            Some(d(2024, 4, 25))
        );
        assert_eq!(
            cost_execution_date(&s, &c, d(2024, 3, 10), Direction::Previous),
            Some(d(2024, 3, 25))
        );
    }

    #[test]
    fn quarterly_cost_is_offset_by_a_quarter() {
        let s = salary(d(2024, 1, 31), None);
        let c = cost(Cycle::Quarterly, 1, None);
        assert_eq!(
            cost_execution_date(&s, &c, d(2024, 2, 1), Direction::Next),
            Some(d(2024, 5, 31))
        );
    }

    #[test]
    fn ended_salary_falls_back_to_its_last_payout() {
        let s = salary(d(2024, 1, 25), Some(d(2024, 3, 31)));
        let c = cost(Cycle::Monthly, 1, None);
        let reference = d(2024, 6, 1);
        // The last payout collapses to the Mar 31 end date, so the cost date
        // is Apr 30 and already behind the reference.
        assert_eq!(cost_execution_date(&s, &c, reference, Direction::Next), None);
        assert_eq!(
            cost_execution_date(&s, &c, reference, Direction::Previous),
            Some(d(2024, 4, 30))
        );
    }

    #[test]
    fn once_cost_needs_a_pending_target() {
        let s = salary(d(2024, 1, 25), None);
        let pending = cost(Cycle::Once, 1, Some(d(2024, 12, 1)));
        let missing = cost(Cycle::Once, 1, None);
        let reference = d(2024, 6, 1);
        assert_eq!(
            cost_execution_date(&s, &pending, reference, Direction::Next),
            Some(d(2024, 12, 1))
        );
        assert_eq!(cost_execution_date(&s, &pending, reference, Direction::Previous), None);
        assert_eq!(cost_execution_date(&s, &missing, reference, Direction::Next), None);
        assert_eq!(
            cost_execution_date(&s, &pending, d(2024, 12, 2), Direction::Next),
            None
        );
    }

    #[test]
    fn stale_target_rolls_forward_within_the_salary_bound() {
        let s = salary(d(2024, 1, 25), None);
        let c = cost(Cycle::Quarterly, 1, Some(d(2024, 1, 31)));
        // Anchor is the May 25 payout, so the target may roll up to Aug 25.
        let reference = d(2024, 5, 20);
        assert_eq!(
            cost_execution_date(&s, &c, reference, Direction::Next),
            Some(d(2024, 7, 31))
        );
        assert_eq!(
            cost_execution_date(&s, &c, reference, Direction::Previous),
            Some(d(2024, 4, 30))
        );
    }

    #[test]
    fn offset_beyond_the_calendar_has_no_execution() {
        let s = salary(d(2024, 1, 1), None);
        let c = cost(Cycle::Monthly, 3_200_000, None);
        assert_eq!(cost_execution_date(&s, &c, d(2024, 2, 1), Direction::Next), None);
        assert_eq!(cost_execution_date(&s, &c, d(2024, 2, 1), Direction::Previous), None);
    }

    #[test]
    fn future_target_is_kept_as_is() {
        let s = salary(d(2024, 1, 25), None);
        let c = cost(Cycle::Yearly, 1, Some(d(2024, 12, 15)));
        assert_eq!(
            cost_execution_date(&s, &c, d(2024, 2, 1), Direction::Next),
            Some(d(2024, 12, 15))
        );
    }
}
