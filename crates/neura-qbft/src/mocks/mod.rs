pub mod mock_services;
pub mod mock_timers;

pub use mock_services::{MockDecidedObserver, MockNetwork, MockValueCheck};
pub use mock_timers::MockRoundTimer;
