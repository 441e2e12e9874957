pub mod qbft_v1;

use alloy_rlp::{BufMut, Decodable, Encodable};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::QbftError;

/// The four QBFT message kinds. Encoded on the wire as a single-byte code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MessageType {
    Proposal,
    Prepare,
    Commit,
    RoundChange,
}

impl MessageType {
    pub const ALL: [MessageType; qbft_v1::MESSAGE_SPACE] =
        [MessageType::Proposal, MessageType::Prepare, MessageType::Commit, MessageType::RoundChange];

    pub fn code(self) -> u8 {
        match self {
            MessageType::Proposal => qbft_v1::PROPOSAL,
            MessageType::Prepare => qbft_v1::PREPARE,
            MessageType::Commit => qbft_v1::COMMIT,
            MessageType::RoundChange => qbft_v1::ROUND_CHANGE,
        }
    }

    pub fn name(self) -> &'static str {
        qbft_v1::message_name(self.code())
    }
}

impl TryFrom<u8> for MessageType {
    type Error = QbftError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            qbft_v1::PROPOSAL => Ok(MessageType::Proposal),
            qbft_v1::PREPARE => Ok(MessageType::Prepare),
            qbft_v1::COMMIT => Ok(MessageType::Commit),
            qbft_v1::ROUND_CHANGE => Ok(MessageType::RoundChange),
            other => Err(QbftError::InvalidMessageType(other)),
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Encodable for MessageType {
    fn encode(&self, out: &mut dyn BufMut) {
        self.code().encode(out)
    }

    fn length(&self) -> usize {
        self.code().length()
    }
}

impl Decodable for MessageType {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let code = u8::decode(buf)?;
        MessageType::try_from(code).map_err(|_| alloy_rlp::Error::Custom("unknown QBFT message code"))
    }
}
