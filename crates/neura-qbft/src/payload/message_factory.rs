use alloy_primitives::{Address, Bytes, B256};
use std::sync::Arc;

use crate::error::QbftError;
use crate::messagewrappers::{Message, SignedMessage};
use crate::payload::{CommitData, PrepareData, ProposalData, QbftPayload, RoundChangeData};
use crate::types::{address_from_node_key, ConsensusRoundIdentifier, Identifier, NodeKey, OperatorId};

/// Builds and signs outbound messages with the local node key.
pub struct MessageFactory {
    local_id: OperatorId,
    node_key: Arc<NodeKey>,
    local_address: Address,
}

impl MessageFactory {
    pub fn new(local_id: OperatorId, node_key: Arc<NodeKey>) -> Self {
        let local_address = address_from_node_key(&node_key);
        Self { local_id, node_key, local_address }
    }

    pub fn local_id(&self) -> OperatorId {
        self.local_id
    }

    pub fn local_address(&self) -> Address {
        self.local_address
    }

    fn sign_payload<P: QbftPayload>(
        &self,
        identifier: &Identifier,
        round_identifier: ConsensusRoundIdentifier,
        payload: &P,
    ) -> Result<SignedMessage, QbftError> {
        let message =
            Message::with_payload(round_identifier.height, round_identifier.round, identifier.clone(), payload);
        SignedMessage::sign(message, self.local_id, &self.node_key)
    }

    // --- Proposal ---
    pub fn create_proposal(
        &self,
        identifier: &Identifier,
        round_identifier: ConsensusRoundIdentifier,
        value: Bytes,
        round_change_justification: Vec<SignedMessage>,
        prepare_justification: Vec<SignedMessage>,
    ) -> Result<SignedMessage, QbftError> {
        let payload = ProposalData::new(value, round_change_justification, prepare_justification);
        self.sign_payload(identifier, round_identifier, &payload)
    }

    // --- Prepare ---
    pub fn create_prepare(
        &self,
        identifier: &Identifier,
        round_identifier: ConsensusRoundIdentifier,
        digest: B256,
    ) -> Result<SignedMessage, QbftError> {
        self.sign_payload(identifier, round_identifier, &PrepareData::new(digest))
    }

    // --- Commit ---
    pub fn create_commit(
        &self,
        identifier: &Identifier,
        round_identifier: ConsensusRoundIdentifier,
        digest: B256,
    ) -> Result<SignedMessage, QbftError> {
        self.sign_payload(identifier, round_identifier, &CommitData::new(digest))
    }

    // --- RoundChange ---
    pub fn create_round_change(
        &self,
        identifier: &Identifier,
        target_round_identifier: ConsensusRoundIdentifier,
        data: RoundChangeData,
    ) -> Result<SignedMessage, QbftError> {
        self.sign_payload(identifier, target_round_identifier, &data)
    }
}

impl std::fmt::Debug for MessageFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageFactory")
            .field("local_id", &self.local_id)
            .field("local_address", &self.local_address)
            .finish_non_exhaustive()
    }
}
