use serde::{Deserialize, Serialize};

use crate::metrics::{self, Severity, Trend};

/// Travel time and distance for one origin/destination pair. The all-zero
/// value stands for a failed estimate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct RouteEstimate {
    pub duration_minutes: u32,
    pub distance_km: f64,
}

impl RouteEstimate {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        self.duration_minutes == 0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct DerivedCommuteMetric {
    pub value: RouteEstimate,
    pub trend: Trend,
    pub severity: Severity,
}

impl DerivedCommuteMetric {
    pub fn derive(
        value: RouteEstimate,
        previous_minutes: u32,
        is_first_cycle: bool,
        baseline_minutes: u32,
    ) -> Self {
        Self {
            value,
            trend: metrics::trend(value.duration_minutes, previous_minutes, is_first_cycle),
            severity: metrics::severity(value.duration_minutes, baseline_minutes),
        }
    }
}
