use alloy_primitives::Bytes;
use alloy_rlp::{RlpDecodable, RlpEncodable};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::messagedata::MessageType;
use crate::messagewrappers::SignedMessage;
use crate::payload::qbft_payload::QbftPayload;
use crate::types::{Round, NO_ROUND};

/// Body of a RoundChange.
///
/// `prepared_round == NO_ROUND` with an empty `prepared_value` means nothing was
/// prepared. Otherwise `round_change_justification` holds the quorum of prepares
/// for (`prepared_round`, `prepared_value`).
#[derive(Debug, Clone, PartialEq, Eq, RlpEncodable, RlpDecodable)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RoundChangeData {
    pub prepared_round: Round,
    pub prepared_value: Bytes,
    pub round_change_justification: Vec<SignedMessage>,
    pub next_proposal_data: Bytes,
}

impl RoundChangeData {
    pub fn unprepared() -> Self {
        Self {
            prepared_round: NO_ROUND,
            prepared_value: Bytes::new(),
            round_change_justification: Vec::new(),
            next_proposal_data: Bytes::new(),
        }
    }

    pub fn prepared(prepared_round: Round, prepared_value: Bytes, prepares: Vec<SignedMessage>) -> Self {
        Self {
            prepared_round,
            prepared_value,
            round_change_justification: prepares,
            next_proposal_data: Bytes::new(),
        }
    }

    /// The prepared value, `None` when nil.
    pub fn prepared_value(&self) -> Option<&Bytes> {
        (!self.prepared_value.is_empty()).then_some(&self.prepared_value)
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared_round != NO_ROUND
    }
}

impl QbftPayload for RoundChangeData {
    const MESSAGE_TYPE: MessageType = MessageType::RoundChange;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unprepared_round_change_is_nil() {
        let data = RoundChangeData::unprepared();
        assert!(!data.is_prepared());
        assert!(data.prepared_value().is_none());
    }

    #[test]
    fn prepared_round_change_exposes_value() {
        let data = RoundChangeData::prepared(1, Bytes::from_static(&[1, 2, 3, 4]), vec![]);
        assert!(data.is_prepared());
        assert_eq!(data.prepared_value().map(|v| v.as_ref()), Some(&[1u8, 2, 3, 4][..]));
    }
}
