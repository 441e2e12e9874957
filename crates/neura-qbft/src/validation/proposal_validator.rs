use alloy_primitives::keccak256;

use crate::error::QbftError;
use crate::messagedata::MessageType;
use crate::messagewrappers::SignedMessage;
use crate::payload::ProposalData;
use crate::types::{Round, FIRST_ROUND};
use crate::validation::message_validator::{require_single_signer, validate_signed_message, ValidationContext};
use crate::validation::prepare_validator::validate_prepare_for;
use crate::validation::round_change_message_validator::{highest_prepared, validate_round_change_for_round};

/// Validates an inbound Proposal: leader, justification and whether the instance
/// can accept it given the proposal already accepted (if any).
pub fn validate_proposal(
    msg: &SignedMessage,
    context: &ValidationContext<'_>,
    accepted_proposal: Option<&SignedMessage>,
) -> Result<ProposalData, QbftError> {
    validate_signed_message(msg, context, MessageType::Proposal)?;
    let author = require_single_signer(msg)?;

    let round = msg.round();
    let expected_proposer = context.committee.proposer(context.height, round);
    if author != expected_proposer {
        log::warn!(
            "Invalid Proposal for {}: author {} is not the proposer {}",
            msg.message().round_identifier(),
            author,
            expected_proposer
        );
        return Err(QbftError::InvalidProposer { expected: expected_proposer, actual: author });
    }

    let data = msg.message().proposal_data()?;
    is_proposal_justification(
        context,
        round,
        &data.round_change_justification,
        &data.prepare_justification,
        &data.data,
    )?;

    let acceptable = match accepted_proposal {
        None => round == context.current_round,
        Some(_) => round > context.current_round,
    };
    if !acceptable {
        log::debug!(
            "Proposal for round {} not acceptable in round {} (accepted: {})",
            round,
            context.current_round,
            accepted_proposal.is_some()
        );
        return Err(QbftError::ProposalNotAcceptable { message_round: round, current_round: context.current_round });
    }
    Ok(data)
}

/// Whether `value` may be proposed in `round` given the carried justifications.
///
/// Round one needs only a valid value. Later rounds need a quorum of round
/// changes for `round`; if any of them is prepared, a quorum of prepares for the
/// highest prepared round must be carried and `value` must be that round's value.
pub fn is_proposal_justification(
    context: &ValidationContext<'_>,
    round: Round,
    round_changes: &[SignedMessage],
    prepares: &[SignedMessage],
    value: &[u8],
) -> Result<(), QbftError> {
    context.value_check.check(value)?;
    if round == FIRST_ROUND {
        return Ok(());
    }

    for rc in round_changes {
        validate_round_change_for_round(rc, context, round)
            .map_err(|e| QbftError::ProposalNotJustified(format!("round change: {}", e)))?;
    }
    if !context.committee.has_quorum(round_changes) {
        return Err(QbftError::ProposalNotJustified(format!(
            "round change quorum missing for round {}",
            round
        )));
    }

    let Some(highest) = highest_prepared(round_changes)? else {
        return Ok(());
    };
    let prepared_value = highest.prepared_value.as_ref();
    let digest = keccak256(prepared_value);
    for prepare in prepares {
        validate_prepare_for(prepare, context, highest.prepared_round, digest)
            .map_err(|e| QbftError::ProposalNotJustified(format!("prepare: {}", e)))?;
    }
    if !context.committee.has_quorum(prepares) {
        return Err(QbftError::ProposalNotJustified(format!(
            "prepare quorum missing for prepared round {}",
            highest.prepared_round
        )));
    }
    if value != prepared_value {
        return Err(QbftError::ProposalNotJustified("proposed value differs from the highest prepared value".into()));
    }
    Ok(())
}
