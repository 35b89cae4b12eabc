use chrono::{NaiveTime, Timelike};
use serde::Serialize;

/// Which commute the page puts in front.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    ToWork,
    ToHome,
}

impl Direction {
    pub fn label(&self) -> &'static str {
        match self {
            Direction::ToWork => "Home ➝ Work",
            Direction::ToHome => "Work ➝ Home",
        }
    }
}

/// Mornings up to and including 10:00:59 show the way to work; the rest of
/// the day shows the way home.
pub fn primary_direction(local_time: NaiveTime) -> Direction {
    if (local_time.hour(), local_time.minute()) <= (10, 0) {
        Direction::ToWork
    } else {
        Direction::ToHome
    }
}
