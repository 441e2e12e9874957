use std::sync::Arc;

use crate::error::QbftError;
use crate::payload::MessageFactory;
use crate::types::{
    Committee, DecidedValueObserver, Network, OperatorId, QbftConfig, RoundTimer, ValueCheck,
};

/// Everything an instance needs from its surroundings. Shared read-only between
/// the instance and its handlers.
#[derive(Clone)]
pub struct InstanceConfig {
    pub committee: Committee,
    pub message_factory: Arc<MessageFactory>,
    pub network: Arc<dyn Network>,
    pub round_timer: Arc<dyn RoundTimer>,
    pub value_check: Arc<dyn ValueCheck>,
    pub decided_observers: Vec<Arc<dyn DecidedValueObserver>>,
    pub qbft_config: QbftConfig,
}

impl InstanceConfig {
    /// Builds a config, checking that the local signer is a committee member with
    /// a matching address and that the tunables are usable.
    pub fn new(
        committee: Committee,
        message_factory: Arc<MessageFactory>,
        network: Arc<dyn Network>,
        round_timer: Arc<dyn RoundTimer>,
        value_check: Arc<dyn ValueCheck>,
        qbft_config: QbftConfig,
    ) -> Result<Self, QbftError> {
        qbft_config.validate()?;
        let local_id = message_factory.local_id();
        let node = committee.node(local_id).ok_or_else(|| {
            QbftError::InvalidCommittee(format!("local operator {} is not a committee member", local_id))
        })?;
        if node.address != message_factory.local_address() {
            return Err(QbftError::InvalidCommittee(format!(
                "committee address for operator {} does not match the local signing key",
                local_id
            )));
        }
        Ok(Self {
            committee,
            message_factory,
            network,
            round_timer,
            value_check,
            decided_observers: Vec::new(),
            qbft_config,
        })
    }

    pub fn with_decided_observer(mut self, observer: Arc<dyn DecidedValueObserver>) -> Self {
        self.decided_observers.push(observer);
        self
    }

    pub fn local_id(&self) -> OperatorId {
        self.message_factory.local_id()
    }
}

impl std::fmt::Debug for InstanceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceConfig")
            .field("local_id", &self.local_id())
            .field("committee", &self.committee)
            .field("decided_observers", &self.decided_observers.len())
            .field("qbft_config", &self.qbft_config)
            .finish()
    }
}
