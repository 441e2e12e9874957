//! Tokio runtime glue for the QBFT engine: a task-based round timer,
//! channel-backed network and decision adapters, and the event loop driving a
//! controller.

pub mod driver;
pub mod error;
pub mod network;
pub mod observer;
pub mod timer;

pub use driver::{spawn_node, ConsensusEvent, NodeChannels, QbftDriver};
pub use error::QbftServiceError;
pub use network::ChannelNetwork;
pub use observer::{ChannelDecidedObserver, DecidedValue};
pub use timer::TokioRoundTimer;
