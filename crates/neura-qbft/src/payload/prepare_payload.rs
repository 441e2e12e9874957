use alloy_primitives::{keccak256, B256};
use alloy_rlp::{RlpDecodable, RlpEncodable};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::messagedata::MessageType;
use crate::payload::qbft_payload::QbftPayload;

/// Body of a Prepare: keccak256 of the proposed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, RlpEncodable, RlpDecodable)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PrepareData {
    pub digest: B256,
}

impl PrepareData {
    pub fn new(digest: B256) -> Self {
        Self { digest }
    }

    pub fn for_value(value: &[u8]) -> Self {
        Self { digest: keccak256(value) }
    }
}

impl QbftPayload for PrepareData {
    const MESSAGE_TYPE: MessageType = MessageType::Prepare;
}
