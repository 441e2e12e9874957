use alloy_rlp::{Decodable, Encodable};

use crate::messagedata::MessageType;

/// Type-specific body carried in `Message::data`.
pub trait QbftPayload: Encodable + Decodable + Clone + Send + Sync + std::fmt::Debug {
    /// The message type whose `data` field holds this payload.
    const MESSAGE_TYPE: MessageType;

    fn message_type(&self) -> MessageType {
        Self::MESSAGE_TYPE
    }
}
