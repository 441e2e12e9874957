pub mod message;
pub mod signed_message;

pub use message::Message;
pub use signed_message::{AggregateSignature, SignedMessage};
