use alloy_primitives::keccak256;

use crate::error::QbftError;
use crate::messagewrappers::SignedMessage;
use crate::statemachine::instance::{Decision, Instance, InstanceInner};
use crate::types::ConsensusRoundIdentifier;
use crate::validation::validate_prepare;

impl Instance {
    pub(crate) fn upon_prepare(
        &self,
        inner: &mut InstanceInner,
        msg: &SignedMessage,
    ) -> Result<Option<Decision>, QbftError> {
        if inner.prepare_container.contains(msg) {
            log::trace!("Duplicate Prepare for {} from {:?}", msg.message().round_identifier(), msg.signers());
            return Ok(None);
        }
        let context = self.validation_context(&inner.state);
        validate_prepare(msg, &context)?;
        inner.prepare_container.add_if_doesnt_exist(msg.clone());
        self.try_prepare_quorum(inner)
    }

    /// Once the accepted proposal's value has a prepare quorum in the current
    /// round, records it as prepared and broadcasts a Commit. Runs at most once
    /// per round.
    pub(crate) fn try_prepare_quorum(&self, inner: &mut InstanceInner) -> Result<Option<Decision>, QbftError> {
        let Some(proposal) = inner.state.proposal_accepted_for_current_round.as_ref() else {
            return Ok(None);
        };
        let round = inner.state.round;
        if inner.state.last_prepared_round == round {
            return Ok(None);
        }
        let value = proposal.message().proposal_data()?.data;
        let digest = keccak256(&value);

        let matching: Vec<&SignedMessage> = inner
            .prepare_container
            .messages_for_round(round)
            .iter()
            .filter(|prepare| prepare.message().prepare_data().is_ok_and(|data| data.digest == digest))
            .collect();
        if !self.config.committee.has_quorum(matching) {
            return Ok(None);
        }

        let height = inner.state.height;
        let round_identifier = ConsensusRoundIdentifier::new(height, round);
        let commit = self.config.message_factory.create_commit(&self.identifier, round_identifier, digest)?;

        inner.state.last_prepared_round = round;
        inner.state.last_prepared_value = Some(value);
        log::debug!("Prepared {} with digest {}", round_identifier, digest);
        self.broadcast(&commit);

        // A commit quorum may already be waiting for this value.
        self.try_commit_quorum(inner, round, digest)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::QbftError;
    use crate::messagedata::MessageType;
    use crate::testing::{signed_prepare, signed_proposal, TestCommittee, TestNode};
    use alloy_primitives::{keccak256, Bytes};

    const VALUE: &[u8] = &[1, 2, 3, 4];

    #[test]
    fn test_prepare_quorum_sets_last_prepared_and_commits() {
        let tc = TestCommittee::new(4);
        let node = TestNode::new(&tc, 1);
        let instance = node.instance();
        instance.start(Bytes::from_static(VALUE), 1).unwrap();
        instance.process_msg(&signed_proposal(&tc, 3, 1, 1, VALUE, vec![], vec![])).unwrap();

        for id in 1..=2 {
            instance.process_msg(&signed_prepare(&tc, id, 1, 1, keccak256(VALUE))).unwrap();
        }
        assert!(!instance.state_snapshot().unwrap().is_prepared());
        assert!(node.network.broadcasts_of(MessageType::Commit).is_empty());

        instance.process_msg(&signed_prepare(&tc, 3, 1, 1, keccak256(VALUE))).unwrap();
        let state = instance.state_snapshot().unwrap();
        assert_eq!(state.last_prepared_round, 1);
        assert_eq!(state.last_prepared_value.as_deref().map(|b| &b[..]), Some(VALUE));
        let commits = node.network.broadcasts_of(MessageType::Commit);
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].message().commit_data().unwrap().digest, keccak256(VALUE));

        // A fourth prepare does not commit again.
        instance.process_msg(&signed_prepare(&tc, 4, 1, 1, keccak256(VALUE))).unwrap();
        assert_eq!(node.network.broadcasts_of(MessageType::Commit).len(), 1);
    }

    #[test]
    fn test_prepares_before_proposal_are_counted() {
        let tc = TestCommittee::new(4);
        let node = TestNode::new(&tc, 1);
        let instance = node.instance();
        instance.start(Bytes::from_static(VALUE), 1).unwrap();

        for id in [1, 2, 4] {
            instance.process_msg(&signed_prepare(&tc, id, 1, 1, keccak256(VALUE))).unwrap();
        }
        assert!(!instance.state_snapshot().unwrap().is_prepared());

        instance.process_msg(&signed_proposal(&tc, 3, 1, 1, VALUE, vec![], vec![])).unwrap();
        assert!(instance.state_snapshot().unwrap().is_prepared());
        assert_eq!(node.network.broadcasts_of(MessageType::Commit).len(), 1);
    }

    #[test]
    fn test_prepares_for_other_value_do_not_count() {
        let tc = TestCommittee::new(4);
        let node = TestNode::new(&tc, 1);
        let instance = node.instance();
        instance.start(Bytes::from_static(VALUE), 1).unwrap();
        instance.process_msg(&signed_proposal(&tc, 3, 1, 1, VALUE, vec![], vec![])).unwrap();

        for id in 1..=3 {
            instance.process_msg(&signed_prepare(&tc, id, 1, 1, keccak256(b"other"))).unwrap();
        }
        assert!(!instance.state_snapshot().unwrap().is_prepared());
    }

    #[test]
    fn test_prepare_for_other_round_or_height_is_rejected() {
        let tc = TestCommittee::new(4);
        let node = TestNode::new(&tc, 1);
        let instance = node.instance();
        instance.start(Bytes::from_static(VALUE), 1).unwrap();

        assert_eq!(
            instance.process_msg(&signed_prepare(&tc, 2, 1, 2, keccak256(VALUE))),
            Err(QbftError::WrongRound { expected: 1, actual: 2 })
        );
        assert_eq!(
            instance.process_msg(&signed_prepare(&tc, 2, 5, 1, keccak256(VALUE))),
            Err(QbftError::WrongHeight { expected: 1, actual: 5 })
        );
    }
}
