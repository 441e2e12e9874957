use alloy_rlp::{RlpDecodable, RlpEncodable};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::types::{Height, Round};

/// Uniquely identifies a specific consensus round for a specific height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, RlpEncodable, RlpDecodable)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConsensusRoundIdentifier {
    /// The instance height.
    pub height: Height,
    /// The consensus round number within that height.
    pub round: Round,
}

impl ConsensusRoundIdentifier {
    pub fn new(height: Height, round: Round) -> Self {
        Self { height, round }
    }
}

impl std::fmt::Display for ConsensusRoundIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.height, self.round)
    }
}
