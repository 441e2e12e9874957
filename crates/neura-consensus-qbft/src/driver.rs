use alloy_primitives::Bytes;
use neura_qbft::payload::MessageFactory;
use neura_qbft::types::{Committee, ConsensusRoundIdentifier, Identifier, InstanceConfig, QbftConfig, ValueCheck};
use neura_qbft::{Controller, QbftError, SignedMessage};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::error::QbftServiceError;
use crate::network::ChannelNetwork;
use crate::observer::{ChannelDecidedObserver, DecidedValue};
use crate::timer::TokioRoundTimer;

/// Inputs from outside the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsensusEvent {
    /// Start the next height with the given local value.
    StartInstance(Bytes),
    /// A message received from the network, possibly our own.
    Message(Box<SignedMessage>),
}

/// Serializes network input, start requests and timer expiries into a controller.
pub struct QbftDriver {
    controller: Arc<Controller>,
    events_rx: mpsc::Receiver<ConsensusEvent>,
    timeouts_rx: mpsc::Receiver<ConsensusRoundIdentifier>,
}

impl QbftDriver {
    pub fn new(
        controller: Arc<Controller>,
        events_rx: mpsc::Receiver<ConsensusEvent>,
        timeouts_rx: mpsc::Receiver<ConsensusRoundIdentifier>,
    ) -> Self {
        Self { controller, events_rx, timeouts_rx }
    }

    pub fn controller(&self) -> &Arc<Controller> {
        &self.controller
    }

    /// Runs until shutdown is signalled (or its sender dropped) or the event
    /// channel closes. Engine errors are logged and never stop the loop.
    pub async fn run(mut self, mut shutdown_rx: oneshot::Receiver<()>) -> Result<(), QbftServiceError> {
        info!(target: "consensus::qbft::driver", "QBFT driver started");
        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown_rx => {
                    info!(target: "consensus::qbft::driver", "Shutdown signal received");
                    return Ok(());
                }

                // Timer expiries take priority over network input.
                Some(round) = self.timeouts_rx.recv() => {
                    self.handle_timeout(round);
                }

                event = self.events_rx.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => {
                        info!(target: "consensus::qbft::driver", "Event channel closed, stopping");
                        return Ok(());
                    }
                },
            }
        }
    }

    fn handle_timeout(&self, round: ConsensusRoundIdentifier) {
        debug!(target: "consensus::qbft::driver", "Round {} timed out", round);
        match self.controller.on_round_timeout(round) {
            Ok(()) => {}
            Err(QbftError::InstanceNotFound { height }) => {
                trace!(target: "consensus::qbft::driver", "Timeout for evicted height {}", height);
            }
            Err(e) => warn!(target: "consensus::qbft::driver", "Error handling timeout for {}: {}", round, e),
        }
    }

    fn handle_event(&self, event: ConsensusEvent) {
        match event {
            ConsensusEvent::StartInstance(value) => match self.controller.start_new_instance(value) {
                Ok(height) => info!(target: "consensus::qbft::driver", "Started instance for height {}", height),
                Err(e) => warn!(target: "consensus::qbft::driver", "Could not start instance: {}", e),
            },
            ConsensusEvent::Message(msg) => match self.controller.process_msg(&msg) {
                Ok(outcome) if outcome.newly_decided => {
                    debug!(target: "consensus::qbft::driver", "Height {} decided by {}", msg.height(), msg.msg_type());
                }
                Ok(_) => {}
                Err(QbftError::InstanceNotFound { height }) => {
                    trace!(
                        target: "consensus::qbft::driver",
                        "No instance for {} at height {}",
                        msg.msg_type(),
                        height
                    );
                }
                Err(e) => {
                    debug!(
                        target: "consensus::qbft::driver",
                        "Rejected {} for {}: {}",
                        msg.msg_type(),
                        msg.message().round_identifier(),
                        e
                    );
                }
            },
        }
    }
}

/// Channel ends of a spawned node.
pub struct NodeChannels {
    pub events_tx: mpsc::Sender<ConsensusEvent>,
    /// Messages the node wants broadcast to the whole committee.
    pub outbound_rx: mpsc::Receiver<SignedMessage>,
    pub decided_rx: mpsc::Receiver<DecidedValue>,
    pub shutdown_tx: oneshot::Sender<()>,
    pub controller: Arc<Controller>,
}

impl NodeChannels {
    /// Asks the driver to start the next height with `value`.
    pub async fn start_instance(&self, value: Bytes) -> Result<(), QbftServiceError> {
        self.send(ConsensusEvent::StartInstance(value)).await
    }

    /// Hands a message received from the network to the driver.
    pub async fn deliver(&self, msg: SignedMessage) -> Result<(), QbftServiceError> {
        self.send(ConsensusEvent::Message(Box::new(msg))).await
    }

    async fn send(&self, event: ConsensusEvent) -> Result<(), QbftServiceError> {
        self.events_tx.send(event).await.map_err(|_| QbftServiceError::ChannelClosed("consensus events"))
    }
}

/// Wires a controller to tokio timers and channels and spawns its driver on
/// the current runtime.
pub fn spawn_node(
    identifier: Identifier,
    committee: Committee,
    message_factory: Arc<MessageFactory>,
    value_check: Arc<dyn ValueCheck>,
    qbft_config: QbftConfig,
    channel_capacity: usize,
) -> Result<(JoinHandle<Result<(), QbftServiceError>>, NodeChannels), QbftServiceError> {
    let (events_tx, events_rx) = mpsc::channel(channel_capacity);
    let (outbound_tx, outbound_rx) = mpsc::channel(channel_capacity);
    let (decided_tx, decided_rx) = mpsc::channel(channel_capacity);
    let (timeouts_tx, timeouts_rx) = mpsc::channel(channel_capacity);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let timer = TokioRoundTimer::new(timeouts_tx)?;
    let config = InstanceConfig::new(
        committee,
        message_factory,
        Arc::new(ChannelNetwork::new(outbound_tx)),
        Arc::new(timer),
        value_check,
        qbft_config,
    )?
    .with_decided_observer(Arc::new(ChannelDecidedObserver::new(decided_tx)));
    let controller = Arc::new(Controller::new(identifier, Arc::new(config))?);

    let driver = QbftDriver::new(controller.clone(), events_rx, timeouts_rx);
    let handle = tokio::spawn(driver.run(shutdown_rx));
    Ok((handle, NodeChannels { events_tx, outbound_rx, decided_rx, shutdown_tx, controller }))
}
