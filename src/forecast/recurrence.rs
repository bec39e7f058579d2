// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::num::NonZeroU32;

use chrono::NaiveDate;

use super::calendar::add_cycle;
use crate::models::{Cycle, DateWindow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

fn first_in_window(window: &DateWindow) -> NaiveDate {
    match window.to {
        Some(to) if window.from > to => to,
        _ => window.from,
    }
}

/// `Previous` collapses an occurrence past the end of the window to its end
/// date. Cycles without a month length are a one-off at the window start.
pub fn occurrence(
    window: &DateWindow,
    cycle: Option<Cycle>,
    reference: NaiveDate,
    relative_offset: NonZeroU32,
    direction: Direction,
) -> Option<NaiveDate> {
    let cycle = match cycle {
        Some(c) if c.months().is_some() => c,
        _ => return Some(first_in_window(window)),
    };
    if reference < window.from {
        return Some(first_in_window(window));
    }

    let step = i64::from(relative_offset.get());
    let mut offset = step;
    loop {
        // Searches past the end of the calendar find nothing.
        let exec = add_cycle(window.from, cycle, offset)?;
        match direction {
            Direction::Next => {
                if exec >= reference {
                    return match window.to {
                        Some(to) if exec > to => None,
                        _ => Some(exec),
                    };
                }
            }
            Direction::Previous => {
                let following = offset
                    .checked_add(step)
                    .and_then(|next| add_cycle(window.from, cycle, next));
                if following.is_none_or(|date| date > reference) {
                    return match window.to {
                        Some(to) if exec > to => Some(to),
                        _ => Some(exec),
                    };
                }
            }
        }
        offset = offset.checked_add(step)?;
    }
}

pub fn next_occurrence(
    window: &DateWindow,
    cycle: Option<Cycle>,
    reference: NaiveDate,
    relative_offset: NonZeroU32,
) -> Option<NaiveDate> {
    occurrence(window, cycle, reference, relative_offset, Direction::Next)
}

pub fn previous_occurrence(
    window: &DateWindow,
    cycle: Option<Cycle>,
    reference: NaiveDate,
    relative_offset: NonZeroU32,
) -> Option<NaiveDate> {
    occurrence(window, cycle, reference, relative_offset, Direction::Previous)
}
