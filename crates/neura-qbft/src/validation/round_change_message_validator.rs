use alloy_primitives::keccak256;

use crate::error::QbftError;
use crate::messagedata::MessageType;
use crate::messagewrappers::SignedMessage;
use crate::payload::RoundChangeData;
use crate::types::{Round, NO_ROUND};
use crate::validation::message_validator::{require_single_signer, validate_signed_message, ValidationContext};
use crate::validation::prepare_validator::validate_prepare_for;

/// Validates an inbound RoundChange. Round changes for future rounds are
/// accepted so that a lagging node can catch up on a partial quorum.
pub fn validate_round_change(
    msg: &SignedMessage,
    context: &ValidationContext<'_>,
) -> Result<RoundChangeData, QbftError> {
    if msg.round() < context.current_round {
        log::debug!("RoundChange for past round {} (current {})", msg.round(), context.current_round);
        return Err(QbftError::MessageFromPastRound {
            message_round: msg.round(),
            current_round: context.current_round,
        });
    }
    validate_round_change_for_round(msg, context, msg.round())
}

/// Validates a RoundChange targeting exactly `round`, including the prepare
/// quorum behind a prepared value.
pub fn validate_round_change_for_round(
    msg: &SignedMessage,
    context: &ValidationContext<'_>,
    round: Round,
) -> Result<RoundChangeData, QbftError> {
    validate_signed_message(msg, context, MessageType::RoundChange)?;
    let author = require_single_signer(msg)?;
    if msg.round() != round {
        return Err(QbftError::WrongRound { expected: round, actual: msg.round() });
    }
    let data = msg.message().round_change_data()?;

    let prepared_value = data.prepared_value().cloned();
    match (data.prepared_round, prepared_value) {
        (NO_ROUND, None) => Ok(data),
        (prepared_round, Some(value)) if prepared_round != NO_ROUND && prepared_round < round => {
            let digest = keccak256(&value);
            for prepare in &data.round_change_justification {
                validate_prepare_for(prepare, context, prepared_round, digest).map_err(|e| {
                    QbftError::InvalidRoundChange(format!("prepare justification from {}: {}", author, e))
                })?;
            }
            if !context.committee.has_quorum(&data.round_change_justification) {
                log::warn!(
                    "Invalid RoundChange from {}: prepared round {} lacks a prepare quorum",
                    author,
                    prepared_round
                );
                return Err(QbftError::InvalidRoundChange("prepared value lacks a prepare quorum".into()));
            }
            Ok(data)
        }
        (prepared_round, value) => {
            log::warn!(
                "Invalid RoundChange from {}: prepared round {} with {} value for round {}",
                author,
                prepared_round,
                if value.is_some() { "a" } else { "no" },
                round
            );
            Err(QbftError::InvalidRoundChange(format!(
                "prepared round {} inconsistent with prepared value for round {}",
                prepared_round, round
            )))
        }
    }
}

/// The round change with the highest prepared round, first one wins on ties.
/// Unprepared round changes are skipped; `None` if none is prepared.
pub fn highest_prepared(round_changes: &[SignedMessage]) -> Result<Option<RoundChangeData>, QbftError> {
    let mut highest: Option<RoundChangeData> = None;
    for rc in round_changes {
        let data = rc.message().round_change_data()?;
        if !data.is_prepared() {
            continue;
        }
        let is_higher = highest.as_ref().map_or(true, |current| data.prepared_round > current.prepared_round);
        if is_higher {
            highest = Some(data);
        }
    }
    Ok(highest)
}
