//! QBFT consensus engine: message types, per-height instances and the
//! controller that routes messages across heights.

pub mod error;
pub mod messagedata;
pub mod messagewrappers;
pub mod mocks;
pub mod payload;
pub mod state;
pub mod statemachine;
pub mod testing;
pub mod types;
pub mod validation;

pub use error::QbftError;
pub use messagedata::MessageType;
pub use messagewrappers::{Message, SignedMessage};
pub use statemachine::{Controller, Decision, Instance, Lifecycle, ProcessOutcome};
pub use types::{
    Committee, ConsensusRoundIdentifier, DecidedValueObserver, Height, Identifier, InstanceConfig, Network, Node,
    NodeKey, OperatorId, QbftConfig, Round, RoundTimer, ValueCheck,
};
