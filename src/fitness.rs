use serde::Serialize;
use std::collections::HashSet;

use crate::data::{Section, TimeSlot};

/// Penalty points per idle minute between classes on the same day.
pub const GAP_WEIGHT: f64 = 0.08;
/// Penalty per unit of standard deviation of the classes-per-day vector.
pub const BALANCE_WEIGHT: f64 = 40.0;
/// Bonus (negative points) per day with no classes at all.
pub const FREE_DAY_BONUS: f64 = -20.0;

/// Per-component view of a schedule's quality score.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FitnessBreakdown {
    pub total: f64,
    pub gaps_penalty: f64,
    pub balance_penalty: f64,
    pub time_preference_penalty: f64,
    pub free_day_bonus: f64,
}

/// Scores a set of chosen sections. Lower is better. Pure and
/// deterministic: the result does not depend on iteration order.
pub fn score<'a>(sections: impl IntoIterator<Item = &'a Section>) -> f64 {
    breakdown(sections).total
}

/// Scores a set of chosen sections, keeping the individual components.
pub fn breakdown<'a>(sections: impl IntoIterator<Item = &'a Section>) -> FitnessBreakdown {
    let slots: Vec<TimeSlot> = sections
        .into_iter()
        .flat_map(|s| s.timeslots.iter().copied())
        .collect();

    let gaps_penalty = gaps_penalty(&slots);
    let balance_penalty = balance_penalty(&slots);
    let time_preference_penalty = time_preference_penalty(&slots);
    let free_day_bonus = free_day_bonus(&slots);

    FitnessBreakdown {
        total: gaps_penalty + balance_penalty + time_preference_penalty + free_day_bonus,
        gaps_penalty,
        balance_penalty,
        time_preference_penalty,
        free_day_bonus,
    }
}

/// Sums, per day, the idle minutes between consecutive classes.
fn gaps_penalty(slots: &[TimeSlot]) -> f64 {
    let mut total_gap_minutes: u32 = 0;
    for day in 0..7u8 {
        let mut day_slots: Vec<&TimeSlot> =
            slots.iter().filter(|s| s.day_of_week == day).collect();
        if day_slots.len() < 2 {
            continue;
        }
        day_slots.sort_by_key(|s| s.start_min);
        for pair in day_slots.windows(2) {
            // only positive differences count as idle time
            total_gap_minutes += u32::from(pair[1].start_min.saturating_sub(pair[0].end_min));
        }
    }
    f64::from(total_gap_minutes) * GAP_WEIGHT
}

/// Standard deviation of classes per day, over all 7 days.
fn balance_penalty(slots: &[TimeSlot]) -> f64 {
    let mut per_day = [0.0f64; 7];
    for slot in slots {
        per_day[slot.day_of_week as usize] += 1.0;
    }
    let mean = per_day.iter().sum::<f64>() / 7.0;
    if mean == 0.0 {
        return 0.0;
    }
    let variance = per_day.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / 7.0;
    variance.sqrt() * BALANCE_WEIGHT
}

/// Penalizes classes outside the preferred 8:00-18:00 band, graded by how
/// far outside the start hour falls.
fn time_preference_penalty(slots: &[TimeSlot]) -> f64 {
    slots
        .iter()
        .map(|slot| {
            let hour = slot.start_hour();
            if hour < 7 {
                20.0
            } else if hour > 18 {
                10.0
            } else if hour < 8 {
                5.0
            } else if hour > 17 {
                3.0
            } else {
                0.0
            }
        })
        .sum()
}

fn free_day_bonus(slots: &[TimeSlot]) -> f64 {
    let days_with_classes: HashSet<u8> = slots.iter().map(|s| s.day_of_week).collect();
    (7 - days_with_classes.len()) as f64 * FREE_DAY_BONUS
}
