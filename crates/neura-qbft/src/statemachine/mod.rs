pub mod instance;
pub mod qbft_controller;

mod commit;
mod prepare;
mod proposal;
mod round_change;
mod timeout;

pub use instance::{Decision, Instance, Lifecycle, ProcessOutcome};
pub use qbft_controller::Controller;
