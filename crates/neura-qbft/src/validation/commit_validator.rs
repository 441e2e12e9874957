use crate::error::QbftError;
use crate::messagedata::MessageType;
use crate::messagewrappers::SignedMessage;
use crate::payload::CommitData;
use crate::validation::message_validator::{validate_signed_message, ValidationContext};

/// Validates an inbound Commit for the current round or any earlier one, so a
/// node that timed out can still decide on a quorum reached before it moved on.
/// Aggregated commits with several signers are accepted.
pub fn validate_commit(msg: &SignedMessage, context: &ValidationContext<'_>) -> Result<CommitData, QbftError> {
    validate_signed_message(msg, context, MessageType::Commit)?;
    if msg.round() > context.current_round {
        log::debug!("Commit for future round {} ignored, current round is {}", msg.round(), context.current_round);
        return Err(QbftError::WrongRound { expected: context.current_round, actual: msg.round() });
    }
    msg.message().commit_data()
}
