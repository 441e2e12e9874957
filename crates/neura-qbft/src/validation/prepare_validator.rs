use alloy_primitives::B256;

use crate::error::QbftError;
use crate::messagedata::MessageType;
use crate::messagewrappers::SignedMessage;
use crate::payload::PrepareData;
use crate::types::Round;
use crate::validation::message_validator::{require_single_signer, validate_signed_message, ValidationContext};

/// Validates an inbound Prepare for the instance's current round.
pub fn validate_prepare(msg: &SignedMessage, context: &ValidationContext<'_>) -> Result<PrepareData, QbftError> {
    validate_signed_message(msg, context, MessageType::Prepare)?;
    require_single_signer(msg)?;
    if msg.round() != context.current_round {
        log::debug!("Prepare for round {} ignored, current round is {}", msg.round(), context.current_round);
        return Err(QbftError::WrongRound { expected: context.current_round, actual: msg.round() });
    }
    msg.message().prepare_data()
}

/// Validates a Prepare carried as justification for (`round`, `digest`).
pub fn validate_prepare_for(
    msg: &SignedMessage,
    context: &ValidationContext<'_>,
    round: Round,
    digest: B256,
) -> Result<(), QbftError> {
    validate_signed_message(msg, context, MessageType::Prepare)?;
    require_single_signer(msg)?;
    if msg.round() != round {
        return Err(QbftError::WrongRound { expected: round, actual: msg.round() });
    }
    let data = msg.message().prepare_data()?;
    if data.digest != digest {
        return Err(QbftError::InvalidValue(format!("prepare digest {} does not match {}", data.digest, digest)));
    }
    Ok(())
}
