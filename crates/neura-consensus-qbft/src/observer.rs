use alloy_primitives::Bytes;
use neura_qbft::types::{DecidedValueObserver, Height};
use neura_qbft::SignedMessage;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// A value the local instance decided, with its commit proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecidedValue {
    pub height: Height,
    pub value: Bytes,
    pub aggregated_commit: SignedMessage,
}

/// Forwards decisions to an async consumer.
#[derive(Debug, Clone)]
pub struct ChannelDecidedObserver {
    decided_tx: mpsc::Sender<DecidedValue>,
}

impl ChannelDecidedObserver {
    pub fn new(decided_tx: mpsc::Sender<DecidedValue>) -> Self {
        Self { decided_tx }
    }
}

impl DecidedValueObserver for ChannelDecidedObserver {
    fn value_decided(&self, height: Height, value: &Bytes, aggregated_commit: &SignedMessage) {
        info!(
            target: "consensus::qbft",
            "Decided height {} in round {} with {} signers",
            height,
            aggregated_commit.round(),
            aggregated_commit.signers().len()
        );
        let decided = DecidedValue { height, value: value.clone(), aggregated_commit: aggregated_commit.clone() };
        if let Err(e) = self.decided_tx.try_send(decided) {
            warn!(target: "consensus::qbft", "Dropping decision for height {}: {}", height, e);
        }
    }
}
