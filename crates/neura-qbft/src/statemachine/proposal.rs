use alloy_primitives::keccak256;

use crate::error::QbftError;
use crate::messagewrappers::SignedMessage;
use crate::statemachine::instance::{Decision, Instance, InstanceInner};
use crate::types::ConsensusRoundIdentifier;
use crate::validation::validate_proposal;

impl Instance {
    pub(crate) fn upon_proposal(
        &self,
        inner: &mut InstanceInner,
        msg: &SignedMessage,
    ) -> Result<Option<Decision>, QbftError> {
        if inner.proposal_container.contains(msg) {
            log::trace!("Duplicate Proposal for {}", msg.message().round_identifier());
            return Ok(None);
        }
        let context = self.validation_context(&inner.state);
        let data = validate_proposal(msg, &context, inner.state.proposal_accepted_for_current_round.as_ref())?;

        let height = inner.state.height;
        let round = msg.round();
        let round_identifier = ConsensusRoundIdentifier::new(height, round);
        let digest = keccak256(&data.data);
        let prepare = self.config.message_factory.create_prepare(&self.identifier, round_identifier, digest)?;

        inner.proposal_container.add_if_doesnt_exist(msg.clone());
        let round_advanced = round > inner.state.round;
        inner.state.round = round;
        inner.state.proposal_accepted_for_current_round = Some(msg.clone());
        if round_advanced {
            self.arm_round_timer(height, round);
        }
        log::debug!("Accepted Proposal for {} from {:?}", round_identifier, msg.signers());
        self.broadcast(&prepare);

        // Prepares and commits may have arrived before the proposal.
        if let Some(decision) = self.try_prepare_quorum(inner)? {
            return Ok(Some(decision));
        }
        self.try_commit_quorum(inner, round, digest)
    }
}
