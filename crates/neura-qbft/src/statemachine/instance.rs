use alloy_primitives::{Bytes, B256};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use crate::error::QbftError;
use crate::messagedata::MessageType;
use crate::messagewrappers::SignedMessage;
use crate::state::{MsgContainer, State};
use crate::types::{ConsensusRoundIdentifier, Height, Identifier, InstanceConfig, Round, FIRST_ROUND, NO_ROUND};
use crate::validation::ValidationContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Idle,
    Running,
    Decided,
}

/// The latched result of an instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub value: Bytes,
    pub aggregated_commit: SignedMessage,
}

/// What a single `process_msg` call produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// The instance's latched decision flag, whichever call set it.
    pub decided: bool,
    pub decided_value: Option<Bytes>,
    /// Commit proof, only on the call that decided.
    pub aggregated_commit: Option<SignedMessage>,
    pub newly_decided: bool,
}

pub(crate) struct InstanceInner {
    pub(crate) lifecycle: Lifecycle,
    pub(crate) state: State,
    pub(crate) start_value: Bytes,
    pub(crate) proposal_container: MsgContainer,
    pub(crate) prepare_container: MsgContainer,
    pub(crate) commit_container: MsgContainer,
    pub(crate) round_change_container: MsgContainer,
    // Highest round this node proposed in, so a round is proposed at most once.
    pub(crate) last_proposed_round: Round,
}

/// One QBFT execution for a single height.
///
/// `start`, `process_msg` and `on_timeout` are serialized by one mutex. The
/// decision is also published through a `OnceLock` so `is_decided` never blocks.
pub struct Instance {
    pub(crate) config: Arc<InstanceConfig>,
    pub(crate) identifier: Identifier,
    pub(crate) inner: Mutex<InstanceInner>,
    pub(crate) decided: OnceLock<Decision>,
}

impl Instance {
    pub fn new(config: Arc<InstanceConfig>, identifier: Identifier) -> Self {
        let inner = InstanceInner {
            lifecycle: Lifecycle::Idle,
            state: State::new(identifier.clone()),
            start_value: Bytes::new(),
            proposal_container: MsgContainer::default(),
            prepare_container: MsgContainer::default(),
            commit_container: MsgContainer::default(),
            round_change_container: MsgContainer::default(),
            last_proposed_round: NO_ROUND,
        };
        Self { config, identifier, inner: Mutex::new(inner), decided: OnceLock::new() }
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, InstanceInner>, QbftError> {
        self.inner
            .lock()
            .map_err(|_| QbftError::InternalError("instance lock poisoned".into()))
    }

    /// Starts the instance at `height`. Later calls are ignored.
    pub fn start(&self, value: Bytes, height: Height) -> Result<(), QbftError> {
        let mut inner = self.lock()?;
        if inner.lifecycle != Lifecycle::Idle {
            log::trace!("Instance for height {} already started, ignoring start", inner.state.height);
            return Ok(());
        }

        inner.state.height = height;
        inner.state.round = FIRST_ROUND;
        inner.start_value = value.clone();
        inner.proposal_container = MsgContainer::for_height(height);
        inner.prepare_container = MsgContainer::for_height(height);
        inner.commit_container = MsgContainer::for_height(height);
        inner.round_change_container = MsgContainer::for_height(height);
        inner.lifecycle = Lifecycle::Running;
        log::info!("Starting QBFT instance for height {}", height);

        self.arm_round_timer(height, FIRST_ROUND);

        let local_id = self.config.local_id();
        if self.config.committee.proposer(height, FIRST_ROUND) == local_id {
            let round_identifier = ConsensusRoundIdentifier::new(height, FIRST_ROUND);
            let proposal =
                self.config
                    .message_factory
                    .create_proposal(&self.identifier, round_identifier, value, vec![], vec![])?;
            inner.last_proposed_round = FIRST_ROUND;
            log::debug!("Node {} proposing for {}", local_id, round_identifier);
            self.broadcast(&proposal);
        }
        Ok(())
    }

    /// Validates and applies one inbound message.
    pub fn process_msg(&self, msg: &SignedMessage) -> Result<ProcessOutcome, QbftError> {
        let mut inner = self.lock()?;
        let newly_decided = match inner.lifecycle {
            Lifecycle::Idle => return Err(QbftError::InstanceNotStarted),
            Lifecycle::Decided if msg.msg_type() != MessageType::Commit => {
                log::trace!("Instance {} already decided, ignoring {}", inner.state.height, msg.msg_type());
                None
            }
            _ => match msg.msg_type() {
                MessageType::Proposal => self.upon_proposal(&mut inner, msg)?,
                MessageType::Prepare => self.upon_prepare(&mut inner, msg)?,
                MessageType::Commit => self.upon_commit(&mut inner, msg)?,
                MessageType::RoundChange => self.upon_round_change(&mut inner, msg).map(|_| None)?,
            },
        };
        let height = inner.state.height;
        drop(inner);

        if let Some(decision) = &newly_decided {
            for observer in &self.config.decided_observers {
                observer.value_decided(height, &decision.value, &decision.aggregated_commit);
            }
        }

        let latched = self.decided.get();
        Ok(ProcessOutcome {
            decided: latched.is_some(),
            decided_value: latched.map(|decision| decision.value.clone()),
            aggregated_commit: newly_decided.as_ref().map(|decision| decision.aggregated_commit.clone()),
            newly_decided: newly_decided.is_some(),
        })
    }

    /// Latched decision view. Does not take the instance lock.
    pub fn is_decided(&self) -> (bool, Option<Bytes>) {
        match self.decided.get() {
            Some(decision) => (true, Some(decision.value.clone())),
            None => (false, None),
        }
    }

    /// The aggregated commit proving the decision, once decided.
    pub fn decided_commit(&self) -> Option<SignedMessage> {
        self.decided.get().map(|decision| decision.aggregated_commit.clone())
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn lifecycle(&self) -> Result<Lifecycle, QbftError> {
        Ok(self.lock()?.lifecycle)
    }

    /// Height once started.
    pub fn height(&self) -> Result<Option<Height>, QbftError> {
        let inner = self.lock()?;
        Ok((inner.lifecycle != Lifecycle::Idle).then_some(inner.state.height))
    }

    pub fn state_snapshot(&self) -> Result<State, QbftError> {
        Ok(self.lock()?.state.clone())
    }

    pub fn state_root(&self) -> Result<B256, QbftError> {
        Ok(self.lock()?.state.get_root())
    }

    pub(crate) fn validation_context<'a>(&'a self, state: &State) -> ValidationContext<'a> {
        ValidationContext::new(
            &self.config.committee,
            &self.identifier,
            state.height,
            state.round,
            self.config.value_check.as_ref(),
        )
    }

    pub(crate) fn arm_round_timer(&self, height: Height, round: Round) {
        let duration = self.config.qbft_config.round_timeout(round);
        self.config
            .round_timer
            .timeout_for_round(ConsensusRoundIdentifier::new(height, round), duration);
    }

    pub(crate) fn broadcast(&self, msg: &SignedMessage) {
        if let Err(e) = self.config.network.broadcast(msg) {
            log::warn!(
                "Failed to broadcast {} for {}: {}",
                msg.msg_type(),
                msg.message().round_identifier(),
                e
            );
        }
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("identifier", &self.identifier)
            .field("decided", &self.decided.get().is_some())
            .finish_non_exhaustive()
    }
}
