//! Shared fixtures for unit tests.

use chrono::NaiveDate;

use crate::market_data::{Seat, VarietySnapshot};

/// The trading date most tests run against.
pub fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 15).unwrap()
}

pub fn seat(name: &str, long: u64, short: u64, long_chg: i64, short_chg: i64) -> Seat {
    Seat {
        name: name.to_string(),
        long_position: long,
        short_position: short,
        long_change: long_chg,
        short_change: short_chg,
    }
}

pub fn snapshot(variety: &str, seats: Vec<Seat>) -> VarietySnapshot {
    VarietySnapshot::new(variety, date(), seats)
}

/// `count` identical filler seats with no change.
pub fn filler_seats(prefix: &str, count: usize, long: u64, short: u64) -> Vec<Seat> {
    (0..count)
        .map(|i| seat(&format!("{prefix}{i:02}"), long, short, 0, 0))
        .collect()
}
