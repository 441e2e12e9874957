use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::types::{ConsensusRoundIdentifier, RoundTimer};

// --- MockRoundTimer ---
#[derive(Default, Clone)]
pub struct MockRoundTimer {
    // Timers currently armed. Arming a round drops older rounds of the same height.
    active_round_timers: Arc<Mutex<HashSet<ConsensusRoundIdentifier>>>,
    armed: Arc<Mutex<Vec<(ConsensusRoundIdentifier, Duration)>>>,
}

impl MockRoundTimer {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn is_timer_active(&self, round: &ConsensusRoundIdentifier) -> bool {
        self.active_round_timers.lock().unwrap().contains(round)
    }

    pub fn get_active_timers(&self) -> HashSet<ConsensusRoundIdentifier> {
        self.active_round_timers.lock().unwrap().clone()
    }

    /// Every `timeout_for_round` call, in order.
    pub fn armed(&self) -> Vec<(ConsensusRoundIdentifier, Duration)> {
        self.armed.lock().unwrap().clone()
    }

    pub fn clear_timer(&self, round: &ConsensusRoundIdentifier) {
        self.active_round_timers.lock().unwrap().remove(round);
    }
}

impl RoundTimer for MockRoundTimer {
    fn timeout_for_round(&self, round: ConsensusRoundIdentifier, duration: Duration) {
        log::debug!("MockRoundTimer: Starting timer for round {} ({:?})", round, duration);
        let mut active = self.active_round_timers.lock().unwrap();
        active.retain(|armed| armed.height != round.height);
        active.insert(round);
        self.armed.lock().unwrap().push((round, duration));
    }

    fn cancel(&self, round: ConsensusRoundIdentifier) {
        log::debug!("MockRoundTimer: Cancelling timer for round {}", round);
        self.active_round_timers.lock().unwrap().remove(&round);
    }
}
