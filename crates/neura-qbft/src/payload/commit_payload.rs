use alloy_primitives::{keccak256, B256};
use alloy_rlp::{RlpDecodable, RlpEncodable};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::messagedata::MessageType;
use crate::payload::qbft_payload::QbftPayload;

/// Body of a Commit. Same shape as a Prepare, distinct type on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, RlpEncodable, RlpDecodable)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CommitData {
    pub digest: B256,
}

impl CommitData {
    pub fn new(digest: B256) -> Self {
        Self { digest }
    }

    pub fn for_value(value: &[u8]) -> Self {
        Self { digest: keccak256(value) }
    }
}

impl QbftPayload for CommitData {
    const MESSAGE_TYPE: MessageType = MessageType::Commit;
}
