use alloy_primitives::Bytes;
use alloy_rlp::{RlpDecodable, RlpEncodable};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::messagedata::MessageType;
use crate::messagewrappers::SignedMessage;
use crate::payload::qbft_payload::QbftPayload;

/// Body of a Proposal: the proposed value plus, for rounds above the first,
/// the round changes (and prepares, if a value was prepared) that justify it.
#[derive(Debug, Clone, PartialEq, Eq, RlpEncodable, RlpDecodable)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProposalData {
    pub data: Bytes,
    pub round_change_justification: Vec<SignedMessage>,
    pub prepare_justification: Vec<SignedMessage>,
}

impl ProposalData {
    pub fn new(
        data: Bytes,
        round_change_justification: Vec<SignedMessage>,
        prepare_justification: Vec<SignedMessage>,
    ) -> Self {
        Self { data, round_change_justification, prepare_justification }
    }
}

impl QbftPayload for ProposalData {
    const MESSAGE_TYPE: MessageType = MessageType::Proposal;
}
