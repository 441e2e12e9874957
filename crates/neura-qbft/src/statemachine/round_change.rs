use alloy_primitives::keccak256;

use crate::error::QbftError;
use crate::messagewrappers::SignedMessage;
use crate::payload::RoundChangeData;
use crate::statemachine::instance::{Instance, InstanceInner};
use crate::types::{ConsensusRoundIdentifier, Round, FIRST_ROUND};
use crate::validation::message_validator::require_single_signer;
use crate::validation::{highest_prepared, is_proposal_justification, validate_round_change};

impl Instance {
    pub(crate) fn upon_round_change(&self, inner: &mut InstanceInner, msg: &SignedMessage) -> Result<(), QbftError> {
        if inner.round_change_container.contains(msg) {
            log::trace!("Duplicate RoundChange for {} from {:?}", msg.message().round_identifier(), msg.signers());
            return Ok(());
        }
        let context = self.validation_context(&inner.state);
        validate_round_change(msg, &context)?;
        if !Self::retain_round_change(inner, msg)? {
            return Ok(());
        }

        if self.try_propose_after_round_change(inner)? {
            return Ok(());
        }
        self.try_partial_quorum_jump(inner)
    }

    /// Stores a validated round change, keeping at most one per signer and round
    /// and only each signer's highest round above the current one. Returns
    /// whether the message was stored.
    fn retain_round_change(inner: &mut InstanceInner, msg: &SignedMessage) -> Result<bool, QbftError> {
        let signer = require_single_signer(msg)?;
        let round = msg.round();
        let current = inner.state.round;
        let container = &mut inner.round_change_container;
        if container.has_signer_in_round(round, signer) {
            log::debug!("Ignoring second RoundChange from {} for round {}", signer, round);
            return Ok(false);
        }
        if round > current {
            if let Some(highest) = container.highest_round_for_signer_above(current, signer) {
                if highest > round {
                    log::debug!("Ignoring RoundChange from {} for round {}, holds round {}", signer, round, highest);
                    return Ok(false);
                }
            }
            container.remove_signer_above(current, signer);
        }
        Ok(container.add_if_doesnt_exist(msg.clone()))
    }

    /// Proposes in the current round when this node leads it and a quorum of
    /// round changes justifies a proposal. Returns whether a proposal was sent.
    pub(crate) fn try_propose_after_round_change(&self, inner: &mut InstanceInner) -> Result<bool, QbftError> {
        let height = inner.state.height;
        let round = inner.state.round;
        if round <= FIRST_ROUND || inner.last_proposed_round >= round {
            return Ok(false);
        }
        if self.config.committee.proposer(height, round) != self.config.local_id() {
            return Ok(false);
        }
        let round_changes = inner.round_change_container.messages_for_round(round).to_vec();
        if !self.config.committee.has_quorum(&round_changes) {
            return Ok(false);
        }

        let (value, prepares) = match highest_prepared(&round_changes)? {
            Some(highest) => (highest.prepared_value, highest.round_change_justification),
            None => (inner.start_value.clone(), Vec::new()),
        };
        let context = self.validation_context(&inner.state);
        if let Err(e) = is_proposal_justification(&context, round, &round_changes, &prepares, &value) {
            log::warn!("Round change quorum for {} does not justify a proposal: {}", round, e);
            return Ok(false);
        }

        let round_identifier = ConsensusRoundIdentifier::new(height, round);
        let proposal =
            self.config
                .message_factory
                .create_proposal(&self.identifier, round_identifier, value, round_changes, prepares)?;
        inner.last_proposed_round = round;
        inner.state.proposal_accepted_for_current_round = None;
        log::debug!("Node {} re-proposing for {}", self.config.local_id(), round_identifier);
        self.broadcast(&proposal);
        Ok(true)
    }

    /// Jumps to the lowest future round that a partial quorum of distinct
    /// signers has already moved to.
    pub(crate) fn try_partial_quorum_jump(&self, inner: &mut InstanceInner) -> Result<(), QbftError> {
        let current = inner.state.round;
        let future: Vec<&SignedMessage> = inner
            .round_change_container
            .rounds_above(current)
            .flat_map(|(_, msgs)| msgs.iter())
            .collect();
        if !self.config.committee.has_partial_quorum(future.iter().copied()) {
            return Ok(());
        }
        let Some(target) = min_round(&future) else {
            return Ok(());
        };

        let height = inner.state.height;
        let round_identifier = ConsensusRoundIdentifier::new(height, target);
        let data = self.round_change_data(inner)?;
        let round_change = self.config.message_factory.create_round_change(&self.identifier, round_identifier, data)?;

        inner.state.round = target;
        inner.state.proposal_accepted_for_current_round = None;
        self.arm_round_timer(height, target);
        log::info!("Partial round change quorum, moving from round {} to {}", current, target);
        self.broadcast(&round_change);

        self.try_propose_after_round_change(inner).map(|_| ())
    }

    /// This node's round change payload: the last prepared round and value with
    /// the prepares that made it prepared, or nil.
    pub(crate) fn round_change_data(&self, inner: &InstanceInner) -> Result<RoundChangeData, QbftError> {
        let state = &inner.state;
        let Some(value) = state.last_prepared_value.as_ref().filter(|_| state.is_prepared()) else {
            return Ok(RoundChangeData::unprepared());
        };
        let digest = keccak256(value);
        let prepares = inner
            .prepare_container
            .messages_for_round(state.last_prepared_round)
            .iter()
            .filter(|prepare| prepare.message().prepare_data().is_ok_and(|data| data.digest == digest))
            .cloned()
            .collect();
        Ok(RoundChangeData::prepared(state.last_prepared_round, value.clone(), prepares))
    }
}

/// Lowest round among the given round changes.
pub(crate) fn min_round(round_changes: &[&SignedMessage]) -> Option<Round> {
    round_changes.iter().map(|rc| rc.round()).min()
}
