use alloy_primitives::{keccak256, Bytes, B256};
use std::collections::BTreeMap;

use crate::error::QbftError;
use crate::messagewrappers::{AggregateSignature, SignedMessage};
use crate::statemachine::instance::{Decision, Instance, InstanceInner, Lifecycle};
use crate::types::{ConsensusRoundIdentifier, OperatorId, Round};
use crate::validation::validate_commit;

impl Instance {
    pub(crate) fn upon_commit(
        &self,
        inner: &mut InstanceInner,
        msg: &SignedMessage,
    ) -> Result<Option<Decision>, QbftError> {
        if inner.commit_container.contains(msg) {
            log::trace!("Duplicate Commit for {} from {:?}", msg.message().round_identifier(), msg.signers());
            return Ok(None);
        }
        let context = self.validation_context(&inner.state);
        let data = validate_commit(msg, &context)?;
        inner.commit_container.add_if_doesnt_exist(msg.clone());
        self.try_commit_quorum(inner, msg.round(), data.digest)
    }

    /// Decides once the commits for (`round`, `digest`) reach a quorum and the
    /// value behind `digest` is known from a stored proposal.
    pub(crate) fn try_commit_quorum(
        &self,
        inner: &mut InstanceInner,
        round: Round,
        digest: B256,
    ) -> Result<Option<Decision>, QbftError> {
        if self.decided.get().is_some() {
            return Ok(None);
        }
        let matching: Vec<&SignedMessage> = inner
            .commit_container
            .messages_for_round(round)
            .iter()
            .filter(|commit| commit.message().commit_data().is_ok_and(|data| data.digest == digest))
            .collect();
        if !self.config.committee.has_quorum(matching.iter().copied()) {
            return Ok(None);
        }

        let Some(value) = Self::value_for_digest(inner, digest) else {
            log::warn!(
                "Commit quorum for {} reached but no stored proposal has digest {}",
                ConsensusRoundIdentifier::new(inner.state.height, round),
                digest
            );
            return Ok(None);
        };
        let aggregated_commit = aggregate_commits(&matching)?;

        let decision = Decision { value, aggregated_commit };
        if self.decided.set(decision.clone()).is_err() {
            return Ok(None);
        }
        inner.lifecycle = Lifecycle::Decided;
        self.config
            .round_timer
            .cancel(ConsensusRoundIdentifier::new(inner.state.height, inner.state.round));
        log::info!(
            "Decided height {} in round {} with signers {:?}",
            inner.state.height,
            round,
            decision.aggregated_commit.signers()
        );
        Ok(Some(decision))
    }

    fn value_for_digest(inner: &InstanceInner, digest: B256) -> Option<Bytes> {
        let accepted = inner.state.proposal_accepted_for_current_round.iter();
        accepted
            .chain(inner.proposal_container.iter())
            .filter_map(|proposal| proposal.message().proposal_data().ok())
            .map(|data| data.data)
            .find(|value| keccak256(value) == digest)
    }
}

// Matching commits share one message, so their signatures can be merged per
// signer even when some of them are already aggregates.
fn aggregate_commits(commits: &[&SignedMessage]) -> Result<SignedMessage, QbftError> {
    let mut per_signer: BTreeMap<OperatorId, SignedMessage> = BTreeMap::new();
    for commit in commits {
        for (signer, signature) in commit.signers().iter().zip(commit.signatures()) {
            per_signer.entry(*signer).or_insert_with(|| {
                SignedMessage::new(commit.message().clone(), vec![*signer], AggregateSignature(vec![signature.clone()]))
            });
        }
    }
    SignedMessage::aggregate_all(per_signer.values())
}
