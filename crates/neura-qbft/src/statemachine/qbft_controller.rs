use alloy_primitives::Bytes;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::QbftError;
use crate::messagewrappers::SignedMessage;
use crate::statemachine::instance::{Instance, ProcessOutcome};
use crate::types::{ConsensusRoundIdentifier, Height, Identifier, InstanceConfig, FIRST_HEIGHT};

// Fixed-size history of started instances, slot = height % capacity.
struct InstanceRing {
    slots: Vec<Option<(Height, Arc<Instance>)>>,
    latest: Option<Height>,
}

impl InstanceRing {
    fn slot_index(&self, height: Height) -> usize {
        (height % self.slots.len() as u64) as usize
    }

    fn get(&self, height: Height) -> Option<Arc<Instance>> {
        match &self.slots[self.slot_index(height)] {
            Some((stored, instance)) if *stored == height => Some(instance.clone()),
            _ => None,
        }
    }

    fn insert(&mut self, height: Height, instance: Arc<Instance>) -> Option<Height> {
        let index = self.slot_index(height);
        let evicted = self.slots[index].replace((height, instance)).map(|(evicted, _)| evicted);
        self.latest = Some(height);
        evicted
    }
}

/// Entry point for one consensus stream. Starts an instance per height and
/// routes messages and timer expiries to the last few started instances.
pub struct Controller {
    identifier: Identifier,
    config: Arc<InstanceConfig>,
    ring: Mutex<InstanceRing>,
}

impl Controller {
    pub fn new(identifier: Identifier, config: Arc<InstanceConfig>) -> Result<Self, QbftError> {
        config.qbft_config.validate()?;
        let capacity = config.qbft_config.historical_instance_capacity;
        let ring = InstanceRing { slots: vec![None; capacity], latest: None };
        Ok(Self { identifier, config, ring: Mutex::new(ring) })
    }

    fn lock_ring(&self) -> Result<MutexGuard<'_, InstanceRing>, QbftError> {
        self.ring
            .lock()
            .map_err(|_| QbftError::InternalError("controller lock poisoned".into()))
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Latest started height, whether still running or already decided.
    pub fn height(&self) -> Result<Option<Height>, QbftError> {
        Ok(self.lock_ring()?.latest)
    }

    /// Starts consensus on `value` at the next height. Fails while the latest
    /// instance is undecided.
    pub fn start_new_instance(&self, value: Bytes) -> Result<Height, QbftError> {
        let mut ring = self.lock_ring()?;
        let height = match ring.latest {
            None => FIRST_HEIGHT,
            Some(latest) => {
                let running = ring.get(latest).is_some_and(|instance| !instance.is_decided().0);
                if running {
                    log::warn!("Cannot start a new instance, height {} is still running", latest);
                    return Err(QbftError::InstanceAlreadyRunning { height: latest });
                }
                latest + 1
            }
        };

        let instance = Arc::new(Instance::new(self.config.clone(), self.identifier.clone()));
        if let Some(evicted) = ring.insert(height, instance.clone()) {
            log::debug!("Evicted instance for height {} to make room for height {}", evicted, height);
        }
        drop(ring);

        instance.start(value, height)?;
        Ok(height)
    }

    pub fn instance_for_height(&self, height: Height) -> Result<Option<Arc<Instance>>, QbftError> {
        Ok(self.lock_ring()?.get(height))
    }

    fn route(&self, height: Height) -> Result<Arc<Instance>, QbftError> {
        self.instance_for_height(height)?
            .ok_or(QbftError::InstanceNotFound { height })
    }

    /// Routes an inbound message to the instance for its height.
    pub fn process_msg(&self, msg: &SignedMessage) -> Result<ProcessOutcome, QbftError> {
        if msg.message().identifier != self.identifier {
            log::debug!("Dropping {} for foreign identifier", msg.msg_type());
            return Err(QbftError::InvalidIdentifier);
        }
        let instance = self.route(msg.height()).inspect_err(|_| {
            log::trace!("No retained instance for {} at height {}", msg.msg_type(), msg.height());
        })?;
        instance.process_msg(msg)
    }

    /// Forwards a round timer expiry to the instance it was armed for.
    pub fn on_round_timeout(&self, round: ConsensusRoundIdentifier) -> Result<(), QbftError> {
        let instance = self.route(round.height)?;
        instance.on_timeout(round.round)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{TestCommittee, TestNode};
    use crate::types::QbftConfig;

    fn controller(node: &TestNode) -> Controller {
        Controller::new(node.identifier.clone(), node.config.clone()).unwrap()
    }

    #[test]
    fn test_first_instance_starts_at_first_height() {
        let tc = TestCommittee::new(4);
        let node = TestNode::new(&tc, 1);
        let controller = controller(&node);
        assert_eq!(controller.height().unwrap(), None);

        let height = controller.start_new_instance(Bytes::from_static(&[1])).unwrap();
        assert_eq!(height, FIRST_HEIGHT);
        assert_eq!(controller.height().unwrap(), Some(FIRST_HEIGHT));
        assert!(controller.instance_for_height(FIRST_HEIGHT).unwrap().is_some());
    }

    #[test]
    fn test_cannot_start_while_latest_is_running() {
        let tc = TestCommittee::new(4);
        let node = TestNode::new(&tc, 1);
        let controller = controller(&node);
        controller.start_new_instance(Bytes::from_static(&[1])).unwrap();
        assert_eq!(
            controller.start_new_instance(Bytes::from_static(&[2])),
            Err(QbftError::InstanceAlreadyRunning { height: 0 })
        );
        assert_eq!(controller.height().unwrap(), Some(0));
    }

    #[test]
    fn test_zero_capacity_is_a_config_error() {
        let tc = TestCommittee::new(4);
        let config = QbftConfig { historical_instance_capacity: 0, ..Default::default() };
        let result = TestNode::try_with_config(&tc, 1, config);
        assert!(matches!(result, Err(QbftError::InvalidConfig(_))));
    }

    #[test]
    fn test_unknown_identifier_and_height_are_rejected() {
        let tc = TestCommittee::new(4);
        let node = TestNode::new(&tc, 1);
        let controller = controller(&node);
        controller.start_new_instance(Bytes::from_static(&[1])).unwrap();

        let foreign = TestCommittee::with_identifier(4, Bytes::from_static(b"other-stream"));
        let msg = crate::testing::signed_prepare(&foreign, 2, 0, 1, alloy_primitives::keccak256([1u8]));
        assert_eq!(controller.process_msg(&msg), Err(QbftError::InvalidIdentifier));

        let msg = crate::testing::signed_prepare(&tc, 2, 7, 1, alloy_primitives::keccak256([1u8]));
        assert_eq!(controller.process_msg(&msg), Err(QbftError::InstanceNotFound { height: 7 }));
        assert_eq!(
            controller.on_round_timeout(ConsensusRoundIdentifier::new(7, 1)),
            Err(QbftError::InstanceNotFound { height: 7 })
        );
    }
}
