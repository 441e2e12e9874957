use alloy_primitives::Bytes;
use std::time::Duration;

use crate::error::QbftError;
use crate::messagewrappers::SignedMessage;
use crate::types::{ConsensusRoundIdentifier, Height};

/// Outbound transport. Sends to the full committee, the local node included.
///
/// Delivery is best effort: an `Err` is logged by the caller and never rolls
/// back the state transition that produced the message.
pub trait Network: Send + Sync {
    fn broadcast(&self, message: &SignedMessage) -> Result<(), QbftError>;
}

/// Single-shot round timers. Expiry must be fed back to the owning instance
/// (directly or via `Controller::on_round_timeout`).
pub trait RoundTimer: Send + Sync {
    /// Arms the timer for `round`, replacing any timer armed for an earlier round.
    fn timeout_for_round(&self, round: ConsensusRoundIdentifier, duration: Duration);
    fn cancel(&self, round: ConsensusRoundIdentifier);
}

/// Application-level validity check for proposed values.
pub trait ValueCheck: Send + Sync {
    fn check(&self, value: &[u8]) -> Result<(), QbftError>;
}

/// Notified once per instance, right after the decision latches.
pub trait DecidedValueObserver: Send + Sync {
    fn value_decided(&self, height: Height, value: &Bytes, aggregated_commit: &SignedMessage);
}
