mod types;

pub use types::{Severity, Trend};

/// Ratio above which a commute counts as heavy traffic.
const HEAVY_RATIO: f64 = 1.33;
/// Ratio above which a commute counts as moderate traffic.
const MODERATE_RATIO: f64 = 1.10;

/// Compare a fresh duration against the one from the previous snapshot.
///
/// A zero on either side is a failed measurement, and the first cycle has
/// nothing real to compare against, so both report `Flat`.
pub fn trend(new_value: u32, previous_value: u32, is_first_cycle: bool) -> Trend {
    if is_first_cycle || new_value == 0 || previous_value == 0 {
        return Trend::Flat;
    }

    match new_value.cmp(&previous_value) {
        std::cmp::Ordering::Greater => Trend::Up,
        std::cmp::Ordering::Less => Trend::Down,
        std::cmp::Ordering::Equal => Trend::Flat,
    }
}

/// Classify a commute against the baseline. A zero baseline means none is
/// configured.
pub fn severity(current_minutes: u32, baseline_minutes: u32) -> Severity {
    if baseline_minutes == 0 {
        return Severity::None;
    }

    let ratio = f64::from(current_minutes) / f64::from(baseline_minutes);
    if ratio > HEAVY_RATIO {
        Severity::Heavy
    } else if ratio > MODERATE_RATIO {
        Severity::Moderate
    } else {
        Severity::None
    }
}
