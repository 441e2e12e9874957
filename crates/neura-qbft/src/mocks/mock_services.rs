use alloy_primitives::Bytes;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::error::QbftError;
use crate::messagedata::MessageType;
use crate::messagewrappers::SignedMessage;
use crate::types::{DecidedValueObserver, Height, Network, ValueCheck};

// --- MockNetwork ---
#[derive(Default, Clone)]
pub struct MockNetwork {
    broadcasts: Arc<Mutex<Vec<SignedMessage>>>,
    fail_broadcasts: Arc<Mutex<bool>>,
}

impl MockNetwork {
    pub fn new() -> Self {
        Default::default()
    }

    /// Makes every later broadcast return an error (messages are still recorded).
    pub fn set_failing(&self, failing: bool) {
        *self.fail_broadcasts.lock().unwrap() = failing;
    }

    pub fn broadcasts(&self) -> Vec<SignedMessage> {
        self.broadcasts.lock().unwrap().clone()
    }

    pub fn broadcasts_of(&self, msg_type: MessageType) -> Vec<SignedMessage> {
        self.broadcasts().into_iter().filter(|msg| msg.msg_type() == msg_type).collect()
    }

    /// Removes and returns everything recorded so far.
    pub fn drain(&self) -> Vec<SignedMessage> {
        std::mem::take(&mut *self.broadcasts.lock().unwrap())
    }

    pub fn clear(&self) {
        self.broadcasts.lock().unwrap().clear();
    }
}

impl Network for MockNetwork {
    fn broadcast(&self, message: &SignedMessage) -> Result<(), QbftError> {
        log::debug!(
            "MockNetwork: broadcasting {} for {} from {:?}",
            message.msg_type(),
            message.message().round_identifier(),
            message.signers()
        );
        self.broadcasts.lock().unwrap().push(message.clone());
        if *self.fail_broadcasts.lock().unwrap() {
            return Err(QbftError::NetworkError("mock network is failing".into()));
        }
        Ok(())
    }
}

// --- MockValueCheck ---
#[derive(Default, Clone)]
pub struct MockValueCheck {
    rejected: Arc<Mutex<HashSet<Bytes>>>,
}

impl MockValueCheck {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn reject(&self, value: Bytes) {
        self.rejected.lock().unwrap().insert(value);
    }
}

impl ValueCheck for MockValueCheck {
    fn check(&self, value: &[u8]) -> Result<(), QbftError> {
        if value.is_empty() {
            return Err(QbftError::InvalidValue("empty value".into()));
        }
        if self.rejected.lock().unwrap().contains(value) {
            return Err(QbftError::InvalidValue("value rejected by check".into()));
        }
        Ok(())
    }
}

// --- MockDecidedObserver ---
#[derive(Default, Clone)]
pub struct MockDecidedObserver {
    decisions: Arc<Mutex<Vec<(Height, Bytes, SignedMessage)>>>,
}

impl MockDecidedObserver {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn decisions(&self) -> Vec<(Height, Bytes, SignedMessage)> {
        self.decisions.lock().unwrap().clone()
    }
}

impl DecidedValueObserver for MockDecidedObserver {
    fn value_decided(&self, height: Height, value: &Bytes, aggregated_commit: &SignedMessage) {
        log::info!("MockDecidedObserver: height {} decided {} byte value", height, value.len());
        self.decisions.lock().unwrap().push((height, value.clone(), aggregated_commit.clone()));
    }
}
