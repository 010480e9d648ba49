use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::ticket::{Category, Priority};

/// Raw counts as read from the store.
#[derive(Debug, Clone, Default)]
pub struct TicketAggregates {
    pub total: i64,
    pub open: i64,
    pub oldest_created_at: Option<DateTime<Utc>>,
    pub by_priority: Vec<(Priority, i64)>,
    pub by_category: Vec<(Category, i64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketStats {
    pub total_tickets: i64,
    pub open_tickets: i64,
    pub avg_tickets_per_day: f64,
    pub priority_breakdown: BTreeMap<Priority, i64>,
    pub category_breakdown: BTreeMap<Category, i64>,
}

impl TicketStats {
    pub fn from_aggregates(aggregates: TicketAggregates, now: DateTime<Utc>) -> Self {
        let mut priority_breakdown: BTreeMap<Priority, i64> =
            Priority::ALL.iter().map(|p| (*p, 0)).collect();
        for (priority, count) in aggregates.by_priority {
            *priority_breakdown.entry(priority).or_default() += count;
        }

        let mut category_breakdown: BTreeMap<Category, i64> =
            Category::ALL.iter().map(|c| (*c, 0)).collect();
        for (category, count) in aggregates.by_category {
            *category_breakdown.entry(category).or_default() += count;
        }

        let avg_tickets_per_day = match aggregates.oldest_created_at {
            Some(oldest) if aggregates.total > 0 => {
                average_per_day(aggregates.total, oldest, now)
            }
            _ => 0.0,
        };

        Self {
            total_tickets: aggregates.total,
            open_tickets: aggregates.open,
            avg_tickets_per_day,
            priority_breakdown,
            category_breakdown,
        }
    }
}

/// Tickets per day over the inclusive span of whole days since `oldest`,
/// rounded to one decimal place.
pub fn average_per_day(total: i64, oldest: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    // A clock skewed into the future must not produce a zero or negative span.
    let days = ((now - oldest).num_days() + 1).max(1);
    round_one_decimal(total as f64 / days as f64)
}

/// Rounds the exact binary value half-to-even, so 0.25 becomes 0.2.
fn round_one_decimal(value: f64) -> f64 {
    format!("{value:.1}").parse().unwrap_or(value)
}
