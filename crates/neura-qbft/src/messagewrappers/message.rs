use alloy_primitives::{keccak256, Bytes, B256};
use alloy_rlp::{RlpDecodable, RlpEncodable};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::QbftError;
use crate::messagedata::MessageType;
use crate::payload::{CommitData, PrepareData, ProposalData, QbftPayload, RoundChangeData};
use crate::types::{ConsensusRoundIdentifier, Height, Identifier, Round};

/// An unsigned consensus message. `data` holds the RLP encoding of the payload
/// matching `msg_type`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, RlpEncodable, RlpDecodable)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Message {
    pub msg_type: MessageType,
    pub height: Height,
    pub round: Round,
    pub identifier: Identifier,
    pub data: Bytes,
}

impl Message {
    /// Builds a message around an already typed payload.
    pub fn with_payload<P: QbftPayload>(height: Height, round: Round, identifier: Identifier, payload: &P) -> Self {
        Self {
            msg_type: P::MESSAGE_TYPE,
            height,
            round,
            identifier,
            data: Bytes::from(alloy_rlp::encode(payload)),
        }
    }

    pub fn round_identifier(&self) -> ConsensusRoundIdentifier {
        ConsensusRoundIdentifier::new(self.height, self.round)
    }

    pub fn encode(&self) -> Bytes {
        Bytes::from(alloy_rlp::encode(self))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, QbftError> {
        Ok(alloy_rlp::decode_exact(bytes)?)
    }

    /// keccak256 of the RLP encoding. This is what signers sign.
    pub fn digest(&self) -> B256 {
        keccak256(alloy_rlp::encode(self))
    }

    /// Decodes `data` as `P`, failing if the message is of another type.
    pub fn payload<P: QbftPayload>(&self) -> Result<P, QbftError> {
        if self.msg_type != P::MESSAGE_TYPE {
            return Err(QbftError::UnexpectedMessageType { expected: P::MESSAGE_TYPE, actual: self.msg_type });
        }
        Ok(alloy_rlp::decode_exact(&self.data)?)
    }

    pub fn proposal_data(&self) -> Result<ProposalData, QbftError> {
        self.payload()
    }

    pub fn prepare_data(&self) -> Result<PrepareData, QbftError> {
        self.payload()
    }

    pub fn commit_data(&self) -> Result<CommitData, QbftError> {
        self.payload()
    }

    pub fn round_change_data(&self) -> Result<RoundChangeData, QbftError> {
        self.payload()
    }
}
