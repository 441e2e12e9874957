use crate::error::QbftError;
use crate::messagedata::MessageType;
use crate::messagewrappers::SignedMessage;
use crate::types::{Committee, Height, Identifier, OperatorId, Round, ValueCheck};

/// The instance view a message is validated against.
pub struct ValidationContext<'a> {
    pub committee: &'a Committee,
    pub identifier: &'a Identifier,
    pub height: Height,
    pub current_round: Round,
    pub value_check: &'a dyn ValueCheck,
}

impl<'a> ValidationContext<'a> {
    pub fn new(
        committee: &'a Committee,
        identifier: &'a Identifier,
        height: Height,
        current_round: Round,
        value_check: &'a dyn ValueCheck,
    ) -> Self {
        Self { committee, identifier, height, current_round, value_check }
    }
}

/// Checks shared by every message kind: type, stream identifier, height, signer
/// membership and signatures.
pub fn validate_signed_message(
    msg: &SignedMessage,
    context: &ValidationContext<'_>,
    expected: MessageType,
) -> Result<(), QbftError> {
    if msg.msg_type() != expected {
        return Err(QbftError::UnexpectedMessageType { expected, actual: msg.msg_type() });
    }
    if &msg.message().identifier != context.identifier {
        log::warn!("Invalid {}: identifier mismatch (height {})", expected, msg.height());
        return Err(QbftError::InvalidIdentifier);
    }
    if msg.height() != context.height {
        log::warn!("Invalid {}: height {} but instance height is {}", expected, msg.height(), context.height);
        return Err(QbftError::WrongHeight { expected: context.height, actual: msg.height() });
    }
    msg.is_valid_signature(context.committee).inspect_err(|e| {
        log::warn!("Invalid {} for {}: {}", expected, msg.message().round_identifier(), e);
    })
}

/// Returns the only signer, failing for aggregated messages.
pub fn require_single_signer(msg: &SignedMessage) -> Result<OperatorId, QbftError> {
    msg.single_signer()
        .ok_or(QbftError::SignerCountMismatch { expected: 1, actual: msg.signers().len() })
}
