//! Deterministic keys, committees and message builders shared by unit tests,
//! integration tests and conformance vectors.


use alloy_primitives::{Bytes, B256};
use rand::thread_rng;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::QbftError;
use crate::messagewrappers::SignedMessage;
use crate::mocks::{MockDecidedObserver, MockNetwork, MockRoundTimer, MockValueCheck};
use crate::payload::{MessageFactory, RoundChangeData};
use crate::statemachine::Instance;
use crate::types::{
    address_from_node_key, Committee, ConsensusRoundIdentifier, Height, Identifier, InstanceConfig, Node, NodeKey,
    OperatorId, QbftConfig, Round,
};

pub const TEST_IDENTIFIER: &[u8] = b"qbft-test-stream";

/// Key whose secret scalar is `seed` in the first byte. `seed` must be non-zero.
pub fn deterministic_node_key(seed: u8) -> Arc<NodeKey> {
    let mut bytes = [0u8; 32];
    bytes[0] = seed;
    let secret_key = k256::SecretKey::from_slice(&bytes).expect("Failed to create secret_key from slice");
    Arc::new(NodeKey::from(secret_key))
}

pub fn random_node_key() -> NodeKey {
    NodeKey::random(&mut thread_rng())
}

/// A committee of operators `1..=n` with deterministic keys.
pub struct TestCommittee {
    pub committee: Committee,
    pub keys: BTreeMap<OperatorId, Arc<NodeKey>>,
    pub identifier: Identifier,
}

impl TestCommittee {
    pub fn new(n: usize) -> Self {
        Self::with_identifier(n, Bytes::from_static(TEST_IDENTIFIER))
    }

    pub fn with_identifier(n: usize, identifier: Identifier) -> Self {
        assert!((1..=255).contains(&n), "test committees use one key byte per operator");
        let keys: BTreeMap<OperatorId, Arc<NodeKey>> =
            (1..=n as u64).map(|id| (id, deterministic_node_key(id as u8))).collect();
        let nodes = keys.iter().map(|(id, key)| Node::new(*id, address_from_node_key(key))).collect();
        let committee = Committee::new(nodes).expect("test committee is well formed");
        Self { committee, keys, identifier }
    }

    pub fn key(&self, id: OperatorId) -> &Arc<NodeKey> {
        self.keys.get(&id).unwrap_or_else(|| panic!("operator {} is not in the test committee", id))
    }

    pub fn factory(&self, id: OperatorId) -> MessageFactory {
        MessageFactory::new(id, self.key(id).clone())
    }
}

pub fn signed_proposal(
    tc: &TestCommittee,
    signer: OperatorId,
    height: Height,
    round: Round,
    value: &[u8],
    round_change_justification: Vec<SignedMessage>,
    prepare_justification: Vec<SignedMessage>,
) -> SignedMessage {
    tc.factory(signer)
        .create_proposal(
            &tc.identifier,
            ConsensusRoundIdentifier::new(height, round),
            Bytes::copy_from_slice(value),
            round_change_justification,
            prepare_justification,
        )
        .expect("Failed to sign proposal")
}

pub fn signed_prepare(
    tc: &TestCommittee,
    signer: OperatorId,
    height: Height,
    round: Round,
    digest: B256,
) -> SignedMessage {
    tc.factory(signer)
        .create_prepare(&tc.identifier, ConsensusRoundIdentifier::new(height, round), digest)
        .expect("Failed to sign prepare")
}

pub fn signed_commit(
    tc: &TestCommittee,
    signer: OperatorId,
    height: Height,
    round: Round,
    digest: B256,
) -> SignedMessage {
    tc.factory(signer)
        .create_commit(&tc.identifier, ConsensusRoundIdentifier::new(height, round), digest)
        .expect("Failed to sign commit")
}

pub fn signed_round_change(
    tc: &TestCommittee,
    signer: OperatorId,
    height: Height,
    round: Round,
    data: RoundChangeData,
) -> SignedMessage {
    tc.factory(signer)
        .create_round_change(&tc.identifier, ConsensusRoundIdentifier::new(height, round), data)
        .expect("Failed to sign round change")
}

/// One committee member wired to recording mocks.
pub struct TestNode {
    pub id: OperatorId,
    pub identifier: Identifier,
    pub config: Arc<InstanceConfig>,
    pub network: MockNetwork,
    pub timer: MockRoundTimer,
    pub value_check: MockValueCheck,
    pub observer: MockDecidedObserver,
}

impl TestNode {
    pub fn new(tc: &TestCommittee, id: OperatorId) -> Self {
        Self::try_with_config(tc, id, QbftConfig::default()).expect("Failed to build test node")
    }

    pub fn try_with_config(tc: &TestCommittee, id: OperatorId, qbft_config: QbftConfig) -> Result<Self, QbftError> {
        let network = MockNetwork::new();
        let timer = MockRoundTimer::new();
        let value_check = MockValueCheck::new();
        let observer = MockDecidedObserver::new();
        let config = InstanceConfig::new(
            tc.committee.clone(),
            Arc::new(tc.factory(id)),
            Arc::new(network.clone()),
            Arc::new(timer.clone()),
            Arc::new(value_check.clone()),
            qbft_config,
        )?
        .with_decided_observer(Arc::new(observer.clone()));
        Ok(Self {
            id,
            identifier: tc.identifier.clone(),
            config: Arc::new(config),
            network,
            timer,
            value_check,
            observer,
        })
    }

    /// A fresh, unstarted instance for this node.
    pub fn instance(&self) -> Instance {
        Instance::new(self.config.clone(), self.identifier.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_keys_are_stable_and_distinct() {
        let a = deterministic_node_key(1);
        let b = deterministic_node_key(1);
        let c = deterministic_node_key(2);
        assert_eq!(address_from_node_key(&a), address_from_node_key(&b));
        assert_ne!(address_from_node_key(&a), address_from_node_key(&c));
        assert_ne!(address_from_node_key(&random_node_key()), address_from_node_key(&a));
    }

    #[test]
    fn test_node_requires_membership() {
        let tc = TestCommittee::new(4);
        let outsider = MessageFactory::new(9, deterministic_node_key(9));
        let result = InstanceConfig::new(
            tc.committee.clone(),
            Arc::new(outsider),
            Arc::new(MockNetwork::new()),
            Arc::new(MockRoundTimer::new()),
            Arc::new(MockValueCheck::new()),
            QbftConfig::default(),
        );
        assert!(matches!(result, Err(QbftError::InvalidCommittee(_))));
    }

    #[test]
    fn mismatched_local_key_is_rejected() {
        let tc = TestCommittee::new(4);
        let factory = MessageFactory::new(1, deterministic_node_key(2));
        let result = InstanceConfig::new(
            tc.committee.clone(),
            Arc::new(factory),
            Arc::new(MockNetwork::new()),
            Arc::new(MockRoundTimer::new()),
            Arc::new(MockValueCheck::new()),
            QbftConfig::default(),
        );
        assert!(matches!(result, Err(QbftError::InvalidCommittee(_))));
    }
}
