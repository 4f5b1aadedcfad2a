//! Urgency
//!
//! Due dates are turned into a normalised urgency in `[0, 1]`. Overdue items occupy the upper
//! half of the range, proportionally to how overdue they are; items due within the horizon
//! occupy the lower half, nearer dates scoring higher. Items due beyond the horizon score zero.

use jiff::civil::Date;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::items::Item;

/// Urgency derived for every item of a problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrgencyProfile {
    /// Days from the planning date to each item's due date (negative when overdue)
    pub item_days: Vec<i32>,

    /// Normalised urgency per item, in `[0, 1]`
    pub normalized_urgencies: Vec<f64>,

    /// Largest number of days any item is overdue (0 when nothing is overdue)
    pub max_overdue_days: i32,

    /// Planning horizon in days
    pub horizon_days: u32,
}

impl UrgencyProfile {
    /// Compute urgencies for `items` relative to `today`.
    pub fn compute(items: &[Item], today: Date, horizon_days: u32) -> Self {
        let item_days: Vec<i32> = items
            .iter()
            .map(|item| days_until(today, item.due_date()))
            .collect();

        let max_overdue_days = item_days
            .iter()
            .map(|days| days.saturating_neg())
            .max()
            .unwrap_or(0)
            .max(0);

        let normalized_urgencies = item_days
            .iter()
            .map(|&days| urgency(days, max_overdue_days, horizon_days))
            .collect();

        Self {
            item_days,
            normalized_urgencies,
            max_overdue_days,
            horizon_days,
        }
    }

    /// Integer due-date values, `min(ceiling, round(scale × urgency))` per item.
    pub fn due_values(&self, scale: u32, ceiling: i64) -> Vec<i64> {
        self.normalized_urgencies
            .iter()
            .map(|u| {
                (f64::from(scale) * u)
                    .round()
                    .to_i64()
                    .map_or(ceiling, |value| value.clamp(0, ceiling))
            })
            .collect()
    }
}

/// Whole days from `today` to `due`, negative when `due` is in the past.
pub fn days_until(today: Date, due: Date) -> i32 {
    today.until(due).map_or(0, |span| span.get_days())
}

fn urgency(days: i32, max_overdue_days: i32, horizon_days: u32) -> f64 {
    if days < 0 && max_overdue_days > 0 {
        let overdue = f64::from(days.saturating_neg());

        return 0.5 + 0.5 * overdue / f64::from(max_overdue_days);
    }

    if horizon_days == 0 {
        return 0.0;
    }

    let horizon = f64::from(horizon_days);
    let remaining = (horizon - f64::from(days)).max(0.0);

    0.5 * remaining.min(horizon) / horizon
}
