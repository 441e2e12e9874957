use neura_qbft::types::{ConsensusRoundIdentifier, Height, RoundTimer};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, trace, warn};

use crate::error::QbftServiceError;

type ActiveTimers = Arc<Mutex<HashMap<Height, (ConsensusRoundIdentifier, AbortHandle)>>>;

/// Round timer backed by tokio tasks. At most one timer runs per height;
/// expiries are delivered on `round_event_tx`.
#[derive(Debug)]
pub struct TokioRoundTimer {
    round_event_tx: mpsc::Sender<ConsensusRoundIdentifier>,
    active_timers: ActiveTimers,
    handle: Handle,
}

impl TokioRoundTimer {
    /// Binds to the runtime of the calling context.
    pub fn new(round_event_tx: mpsc::Sender<ConsensusRoundIdentifier>) -> Result<Self, QbftServiceError> {
        let handle = Handle::try_current().map_err(|e| QbftServiceError::NoRuntime(e.to_string()))?;
        Ok(Self::with_handle(round_event_tx, handle))
    }

    pub fn with_handle(round_event_tx: mpsc::Sender<ConsensusRoundIdentifier>, handle: Handle) -> Self {
        Self { round_event_tx, active_timers: Arc::new(Mutex::new(HashMap::new())), handle }
    }

    pub fn is_active(&self, round: &ConsensusRoundIdentifier) -> bool {
        lock_timers(&self.active_timers)
            .get(&round.height)
            .is_some_and(|(armed, _)| armed == round)
    }

    pub fn active_count(&self) -> usize {
        lock_timers(&self.active_timers).len()
    }
}

// A panic while holding the map cannot leave it inconsistent, so poisoning is ignored.
fn lock_timers(timers: &ActiveTimers) -> MutexGuard<'_, HashMap<Height, (ConsensusRoundIdentifier, AbortHandle)>> {
    timers.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RoundTimer for TokioRoundTimer {
    fn timeout_for_round(&self, round: ConsensusRoundIdentifier, duration: Duration) {
        let mut active_timers = lock_timers(&self.active_timers);

        if let Some((replaced, existing)) = active_timers.remove(&round.height) {
            existing.abort();
            debug!(target: "consensus::qbft::timer", "Aborted timer for round {} before arming {}", replaced, round);
        }

        let tx = self.round_event_tx.clone();
        let timers = Arc::clone(&self.active_timers);
        let task = self.handle.spawn(async move {
            tokio::time::sleep(duration).await;

            {
                let mut guard = lock_timers(&timers);
                if guard.get(&round.height).is_some_and(|(armed, _)| *armed == round) {
                    guard.remove(&round.height);
                }
            }
            if let Err(e) = tx.send(round).await {
                warn!(target: "consensus::qbft::timer", "Failed to deliver timeout for round {}: {}", round, e);
            }
        });

        active_timers.insert(round.height, (round, task.abort_handle()));
        debug!(target: "consensus::qbft::timer", "Started timer for round {} with timeout {:?}", round, duration);
    }

    fn cancel(&self, round: ConsensusRoundIdentifier) {
        let mut active_timers = lock_timers(&self.active_timers);
        match active_timers.get(&round.height) {
            Some((armed, _)) if *armed == round => {
                if let Some((_, handle)) = active_timers.remove(&round.height) {
                    handle.abort();
                }
                debug!(target: "consensus::qbft::timer", "Cancelled timer for round {}", round);
            }
            _ => trace!(target: "consensus::qbft::timer", "No active timer to cancel for round {}", round),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, timeout};

    fn timer() -> (TokioRoundTimer, mpsc::Receiver<ConsensusRoundIdentifier>) {
        let (tx, rx) = mpsc::channel(10);
        (TokioRoundTimer::new(tx).unwrap(), rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_duration() {
        let (timer, mut rx) = timer();
        let round = ConsensusRoundIdentifier::new(1, 1);

        timer.timeout_for_round(round, Duration::from_millis(50));
        assert!(timer.is_active(&round));

        assert!(timeout(Duration::from_millis(40), rx.recv()).await.is_err());
        let fired = timeout(Duration::from_millis(20), rx.recv()).await.unwrap();
        assert_eq!(fired, Some(round));
        assert!(!timer.is_active(&round));
        assert_eq!(timer.active_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_does_not_fire() {
        let (timer, mut rx) = timer();
        let round = ConsensusRoundIdentifier::new(2, 1);

        timer.timeout_for_round(round, Duration::from_millis(100));
        sleep(Duration::from_millis(10)).await;
        timer.cancel(round);
        sleep(Duration::from_millis(200)).await;

        assert_eq!(rx.try_recv(), Err(mpsc::error::TryRecvError::Empty));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_for_other_round_keeps_timer() {
        let (timer, mut rx) = timer();
        let round = ConsensusRoundIdentifier::new(2, 3);

        timer.timeout_for_round(round, Duration::from_millis(30));
        timer.cancel(ConsensusRoundIdentifier::new(2, 2));

        let fired = timeout(Duration::from_millis(50), rx.recv()).await.unwrap();
        assert_eq!(fired, Some(round));
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_round_replaces_previous_round() {
        let (timer, mut rx) = timer();
        let first = ConsensusRoundIdentifier::new(3, 1);
        let second = ConsensusRoundIdentifier::new(3, 2);

        timer.timeout_for_round(first, Duration::from_millis(20));
        timer.timeout_for_round(second, Duration::from_millis(60));
        assert!(!timer.is_active(&first));
        assert_eq!(timer.active_count(), 1);

        let fired = timeout(Duration::from_millis(100), rx.recv()).await.unwrap();
        assert_eq!(fired, Some(second));
        sleep(Duration::from_millis(100)).await;
        assert_eq!(rx.try_recv(), Err(mpsc::error::TryRecvError::Empty));
    }

    #[tokio::test(start_paused = true)]
    async fn test_heights_run_independently() {
        let (timer, mut rx) = timer();
        let a = ConsensusRoundIdentifier::new(10, 1);
        let b = ConsensusRoundIdentifier::new(11, 1);

        timer.timeout_for_round(a, Duration::from_millis(60));
        timer.timeout_for_round(b, Duration::from_millis(30));

        assert_eq!(rx.recv().await, Some(b));
        assert_eq!(rx.recv().await, Some(a));
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_receiver_is_tolerated() {
        let (timer, rx) = timer();
        drop(rx);
        timer.timeout_for_round(ConsensusRoundIdentifier::new(30, 1), Duration::from_millis(20));
        sleep(Duration::from_millis(50)).await;
        assert_eq!(timer.active_count(), 0);
    }

    #[test]
    fn test_new_requires_runtime() {
        let (tx, _rx) = mpsc::channel(1);
        assert!(matches!(TokioRoundTimer::new(tx), Err(QbftServiceError::NoRuntime(_))));
    }
}
