use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SchedulerState {
    /// Between cycles, waiting for the next tick.
    #[default]
    Idle,
    /// Running one cycle.
    Fetching,
}

/// Progress reported to observers after each transition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStatus {
    pub state: SchedulerState,
    pub cycles_completed: u64,
}

impl SchedulerStatus {
    pub fn begin_cycle(&mut self) {
        self.state = SchedulerState::Fetching;
    }

    pub fn finish_cycle(&mut self) {
        self.state = SchedulerState::Idle;
        self.cycles_completed = self.cycles_completed.saturating_add(1);
    }

    /// The next cycle is the first one ever run.
    pub fn is_first_cycle(&self) -> bool {
        self.cycles_completed == 0
    }
}
