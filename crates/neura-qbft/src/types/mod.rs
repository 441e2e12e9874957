pub mod collaborators;
pub mod committee;
pub mod consensus_round_identifier;
pub mod instance_config;
pub mod rlp_signature;

use alloy_primitives::Bytes;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::QbftError;

pub type Round = u64;
pub type Height = u64;
pub type OperatorId = u64;

/// Opaque byte string naming the logical stream a controller decides values for.
pub type Identifier = Bytes;

// A k256 signing key is used directly as the node key.
pub type NodeKey = k256::ecdsa::SigningKey;

/// Sentinel for "no round", e.g. nothing prepared yet.
pub const NO_ROUND: Round = 0;
pub const FIRST_ROUND: Round = 1;
pub const FIRST_HEIGHT: Height = 0;

/// Number of recent instances a controller keeps reachable for late messages.
pub const HISTORICAL_INSTANCE_CAPACITY: usize = 5;

/// Engine tunables shared by every instance of a controller.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct QbftConfig {
    /// Base round timeout. Round r waits `round_timeout_ms * 2^(r-1)`, capped.
    pub round_timeout_ms: u64,
    /// Upper bound for the exponential round timeout.
    pub max_round_timeout_ms: u64,
    /// Size of the controller's history ring.
    pub historical_instance_capacity: usize,
}

impl Default for QbftConfig {
    fn default() -> Self {
        Self {
            round_timeout_ms: 10_000,
            max_round_timeout_ms: 120_000,
            historical_instance_capacity: HISTORICAL_INSTANCE_CAPACITY,
        }
    }
}

impl QbftConfig {
    pub fn validate(&self) -> Result<(), QbftError> {
        if self.historical_instance_capacity == 0 {
            return Err(QbftError::InvalidConfig("historical_instance_capacity must be at least 1".into()));
        }
        if self.round_timeout_ms == 0 {
            return Err(QbftError::InvalidConfig("round_timeout_ms must be positive".into()));
        }
        if self.max_round_timeout_ms < self.round_timeout_ms {
            return Err(QbftError::InvalidConfig("max_round_timeout_ms must not be below round_timeout_ms".into()));
        }
        Ok(())
    }

    /// Timeout for the given round, doubling each round up to the configured maximum.
    pub fn round_timeout(&self, round: Round) -> std::time::Duration {
        let exponent = round.saturating_sub(FIRST_ROUND).min(32) as u32;
        let millis = self
            .round_timeout_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_round_timeout_ms);
        std::time::Duration::from_millis(millis)
    }
}

pub use collaborators::{DecidedValueObserver, Network, RoundTimer, ValueCheck};
pub use committee::{Committee, Node};
pub use consensus_round_identifier::ConsensusRoundIdentifier;
pub use instance_config::InstanceConfig;
pub use rlp_signature::{address_from_node_key, address_from_verifying_key, RlpSignature};
