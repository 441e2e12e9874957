use alloy_primitives::{keccak256, Bytes, B256};
use alloy_rlp::{BufMut, Encodable, RlpEncodable};

use crate::messagewrappers::SignedMessage;
use crate::types::{Height, Identifier, Round, FIRST_HEIGHT, NO_ROUND};

/// Progress of one instance. Only the owning instance mutates it, under its lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub identifier: Identifier,
    pub height: Height,
    pub round: Round,
    pub last_prepared_round: Round,
    pub last_prepared_value: Option<Bytes>,
    pub proposal_accepted_for_current_round: Option<SignedMessage>,
}

// Canonical layout hashed by `State::get_root`. Absent values encode as empty strings.
#[derive(RlpEncodable)]
struct StateRlp {
    identifier: Bytes,
    height: Height,
    round: Round,
    last_prepared_round: Round,
    last_prepared_value: Bytes,
    proposal_accepted_for_current_round: Bytes,
}

impl State {
    pub fn new(identifier: Identifier) -> Self {
        Self {
            identifier,
            height: FIRST_HEIGHT,
            round: NO_ROUND,
            last_prepared_round: NO_ROUND,
            last_prepared_value: None,
            proposal_accepted_for_current_round: None,
        }
    }

    pub fn is_prepared(&self) -> bool {
        self.last_prepared_round != NO_ROUND
    }

    fn rlp_view(&self) -> StateRlp {
        StateRlp {
            identifier: self.identifier.clone(),
            height: self.height,
            round: self.round,
            last_prepared_round: self.last_prepared_round,
            last_prepared_value: self.last_prepared_value.clone().unwrap_or_default(),
            proposal_accepted_for_current_round: self
                .proposal_accepted_for_current_round
                .as_ref()
                .map(SignedMessage::encode)
                .unwrap_or_default(),
        }
    }

    /// keccak256 of the canonical RLP encoding.
    pub fn get_root(&self) -> B256 {
        keccak256(alloy_rlp::encode(self))
    }
}

impl Encodable for State {
    fn encode(&self, out: &mut dyn BufMut) {
        self.rlp_view().encode(out)
    }

    fn length(&self) -> usize {
        self.rlp_view().length()
    }
}
