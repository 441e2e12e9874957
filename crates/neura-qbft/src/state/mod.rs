pub mod msg_container;
pub mod qbft_state;

pub use msg_container::MsgContainer;
pub use qbft_state::State;
