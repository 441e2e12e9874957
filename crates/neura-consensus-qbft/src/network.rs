use neura_qbft::types::Network;
use neura_qbft::{QbftError, SignedMessage};
use tokio::sync::mpsc;
use tracing::trace;

/// Hands outbound messages to the transport over a bounded channel. The
/// transport is responsible for delivering them to every committee member,
/// this node included.
#[derive(Debug, Clone)]
pub struct ChannelNetwork {
    outbound_tx: mpsc::Sender<SignedMessage>,
}

impl ChannelNetwork {
    pub fn new(outbound_tx: mpsc::Sender<SignedMessage>) -> Self {
        Self { outbound_tx }
    }
}

impl Network for ChannelNetwork {
    fn broadcast(&self, message: &SignedMessage) -> Result<(), QbftError> {
        trace!(
            target: "consensus::qbft::network",
            "Queueing {} for {}",
            message.msg_type(),
            message.message().round_identifier()
        );
        self.outbound_tx
            .try_send(message.clone())
            .map_err(|e| QbftError::NetworkError(format!("outbound queue: {}", e)))
    }
}
