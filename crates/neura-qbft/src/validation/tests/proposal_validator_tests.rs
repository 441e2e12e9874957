use super::common_helpers::*;
use crate::error::QbftError;
use crate::messagewrappers::SignedMessage;
use crate::mocks::MockValueCheck;
use crate::payload::RoundChangeData;
use crate::testing::{signed_proposal, signed_round_change, TestCommittee};
use crate::validation::{is_proposal_justification, validate_proposal};
use alloy_primitives::Bytes;

fn unprepared_round_changes(tc: &TestCommittee, signers: &[u64], round: u64) -> Vec<SignedMessage> {
    signers
        .iter()
        .map(|id| signed_round_change(tc, *id, HEIGHT, round, RoundChangeData::unprepared()))
        .collect()
}

#[test]
fn test_validate_proposal_first_round() {
    let tc = TestCommittee::new(4);
    let check = MockValueCheck::new();
    let proposal = signed_proposal(&tc, 3, HEIGHT, 1, VALUE, vec![], vec![]);

    let data = validate_proposal(&proposal, &context(&tc, &check, 1), None).unwrap();
    assert_eq!(data.data, value());
}

#[test]
fn test_validate_proposal_wrong_proposer() {
    let tc = TestCommittee::new(4);
    let check = MockValueCheck::new();
    let proposal = signed_proposal(&tc, 1, HEIGHT, 1, VALUE, vec![], vec![]);

    assert_eq!(
        validate_proposal(&proposal, &context(&tc, &check, 1), None),
        Err(QbftError::InvalidProposer { expected: 3, actual: 1 })
    );
}

#[test]
fn test_validate_proposal_rejected_value() {
    let tc = TestCommittee::new(4);
    let check = MockValueCheck::new();
    check.reject(value());
    let proposal = signed_proposal(&tc, 3, HEIGHT, 1, VALUE, vec![], vec![]);
    let empty = signed_proposal(&tc, 3, HEIGHT, 1, &[], vec![], vec![]);

    assert!(matches!(validate_proposal(&proposal, &context(&tc, &check, 1), None), Err(QbftError::InvalidValue(_))));
    assert!(matches!(validate_proposal(&empty, &context(&tc, &check, 1), None), Err(QbftError::InvalidValue(_))));
}

#[test]
fn test_validate_proposal_acceptance() {
    let tc = TestCommittee::new(4);
    let check = MockValueCheck::new();
    let first = signed_proposal(&tc, 3, HEIGHT, 1, VALUE, vec![], vec![]);

    // Once a proposal is accepted for the round, only later rounds are acceptable.
    assert_eq!(
        validate_proposal(&first, &context(&tc, &check, 1), Some(&first)),
        Err(QbftError::ProposalNotAcceptable { message_round: 1, current_round: 1 })
    );

    let rcs = unprepared_round_changes(&tc, &[1, 2, 3], 2);
    let second = signed_proposal(&tc, 4, HEIGHT, 2, VALUE, rcs, vec![]);
    assert!(validate_proposal(&second, &context(&tc, &check, 1), Some(&first)).is_ok());
    assert_eq!(
        validate_proposal(&second, &context(&tc, &check, 1), None),
        Err(QbftError::ProposalNotAcceptable { message_round: 2, current_round: 1 })
    );
}

#[test]
fn test_round_two_proposal_needs_round_change_quorum() {
    let tc = TestCommittee::new(4);
    let check = MockValueCheck::new();
    let ctx = context(&tc, &check, 2);

    let partial = unprepared_round_changes(&tc, &[1, 2], 2);
    assert!(matches!(
        is_proposal_justification(&ctx, 2, &partial, &[], VALUE),
        Err(QbftError::ProposalNotJustified(_))
    ));

    let quorum = unprepared_round_changes(&tc, &[1, 2, 4], 2);
    assert!(is_proposal_justification(&ctx, 2, &quorum, &[], VALUE).is_ok());

    // Round changes for another round do not justify.
    let stale = unprepared_round_changes(&tc, &[1, 2, 4], 3);
    assert!(matches!(
        is_proposal_justification(&ctx, 2, &stale, &[], VALUE),
        Err(QbftError::ProposalNotJustified(_))
    ));
}

#[test]
fn test_round_two_proposal_must_carry_highest_prepared_value() {
    let tc = TestCommittee::new(4);
    let check = MockValueCheck::new();
    let ctx = context(&tc, &check, 2);
    let prepares = prepares_for(&tc, &[1, 2, 3], 1, VALUE);
    let rcs = vec![
        signed_round_change(&tc, 1, HEIGHT, 2, RoundChangeData::prepared(1, value(), prepares.clone())),
        signed_round_change(&tc, 2, HEIGHT, 2, RoundChangeData::unprepared()),
        signed_round_change(&tc, 3, HEIGHT, 2, RoundChangeData::unprepared()),
    ];

    assert!(is_proposal_justification(&ctx, 2, &rcs, &prepares, VALUE).is_ok());

    let other = Bytes::from_static(b"different value");
    assert!(matches!(
        is_proposal_justification(&ctx, 2, &rcs, &prepares, &other),
        Err(QbftError::ProposalNotJustified(_))
    ));
    assert!(matches!(
        is_proposal_justification(&ctx, 2, &rcs, &prepares[..2], VALUE),
        Err(QbftError::ProposalNotJustified(_))
    ));
}

#[test]
fn test_round_two_proposal_end_to_end() {
    let tc = TestCommittee::new(4);
    let check = MockValueCheck::new();
    let rcs = unprepared_round_changes(&tc, &[1, 2, 3], 2);
    let proposal = signed_proposal(&tc, 4, HEIGHT, 2, VALUE, rcs, vec![]);

    let data = validate_proposal(&proposal, &context(&tc, &check, 2), None).unwrap();
    assert_eq!(data.round_change_justification.len(), 3);
}
