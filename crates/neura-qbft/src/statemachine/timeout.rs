use crate::error::QbftError;
use crate::statemachine::instance::{Instance, Lifecycle};
use crate::types::{ConsensusRoundIdentifier, Round};

impl Instance {
    /// Round timer expiry. Moves to the next round and broadcasts a RoundChange
    /// carrying whatever this node has prepared. Expiries for a round other than
    /// the current one, or after the decision, are ignored.
    pub fn on_timeout(&self, round: Round) -> Result<(), QbftError> {
        let mut inner = self.lock()?;
        if inner.lifecycle != Lifecycle::Running {
            log::trace!("Ignoring timeout for round {} in {:?} instance", round, inner.lifecycle);
            return Ok(());
        }
        if round != inner.state.round {
            log::trace!("Ignoring stale timeout for round {} (current {})", round, inner.state.round);
            return Ok(());
        }

        let height = inner.state.height;
        let next_round = round + 1;
        let round_identifier = ConsensusRoundIdentifier::new(height, next_round);
        let data = self.round_change_data(&inner)?;
        let round_change = self.config.message_factory.create_round_change(&self.identifier, round_identifier, data)?;

        inner.state.round = next_round;
        inner.state.proposal_accepted_for_current_round = None;
        self.arm_round_timer(height, next_round);
        log::info!("Round {} timed out at height {}, moving to round {}", round, height, next_round);
        self.broadcast(&round_change);

        self.try_propose_after_round_change(&mut inner).map(|_| ())
    }
}
