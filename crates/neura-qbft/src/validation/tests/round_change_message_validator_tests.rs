use super::common_helpers::*;
use crate::error::QbftError;
use crate::mocks::MockValueCheck;
use crate::payload::RoundChangeData;
use crate::testing::{signed_round_change, TestCommittee};
use crate::types::NO_ROUND;
use crate::validation::{highest_prepared, validate_round_change, validate_round_change_for_round};
use alloy_primitives::Bytes;

#[test]
fn test_validate_round_change_unprepared() {
    let tc = TestCommittee::new(4);
    let check = MockValueCheck::new();
    let rc = signed_round_change(&tc, 2, HEIGHT, 2, RoundChangeData::unprepared());

    let data = validate_round_change(&rc, &context(&tc, &check, 2)).unwrap();
    assert!(!data.is_prepared());
    assert_eq!(data.prepared_value(), None);
}

#[test]
fn test_validate_round_change_past_and_future_rounds() {
    let tc = TestCommittee::new(4);
    let check = MockValueCheck::new();
    let past = signed_round_change(&tc, 2, HEIGHT, 2, RoundChangeData::unprepared());
    let future = signed_round_change(&tc, 2, HEIGHT, 7, RoundChangeData::unprepared());

    assert_eq!(
        validate_round_change(&past, &context(&tc, &check, 3)),
        Err(QbftError::MessageFromPastRound { message_round: 2, current_round: 3 })
    );
    assert!(validate_round_change(&future, &context(&tc, &check, 3)).is_ok());
}

#[test]
fn test_validate_round_change_prepared_with_quorum() {
    let tc = TestCommittee::new(4);
    let check = MockValueCheck::new();
    let data = RoundChangeData::prepared(1, value(), prepares_for(&tc, &[1, 2, 4], 1, VALUE));
    let rc = signed_round_change(&tc, 3, HEIGHT, 2, data);

    let validated = validate_round_change(&rc, &context(&tc, &check, 2)).unwrap();
    assert_eq!(validated.prepared_round, 1);
    assert_eq!(validated.prepared_value(), Some(&value()));
}

#[test]
fn test_validate_round_change_prepared_without_quorum() {
    let tc = TestCommittee::new(4);
    let check = MockValueCheck::new();
    let data = RoundChangeData::prepared(1, value(), prepares_for(&tc, &[1, 2], 1, VALUE));
    let rc = signed_round_change(&tc, 3, HEIGHT, 2, data);

    assert!(matches!(validate_round_change(&rc, &context(&tc, &check, 2)), Err(QbftError::InvalidRoundChange(_))));
}

#[test]
fn test_validate_round_change_prepares_for_other_value() {
    let tc = TestCommittee::new(4);
    let check = MockValueCheck::new();
    let data = RoundChangeData::prepared(1, value(), prepares_for(&tc, &[1, 2, 3], 1, b"another value"));
    let rc = signed_round_change(&tc, 3, HEIGHT, 2, data);

    assert!(matches!(validate_round_change(&rc, &context(&tc, &check, 2)), Err(QbftError::InvalidRoundChange(_))));
}

#[test]
fn test_validate_round_change_inconsistent_prepared_fields() {
    let tc = TestCommittee::new(4);
    let check = MockValueCheck::new();
    let ctx = context(&tc, &check, 2);

    // Prepared round without a value.
    let no_value = RoundChangeData::prepared(1, Bytes::new(), vec![]);
    let rc = signed_round_change(&tc, 1, HEIGHT, 2, no_value);
    assert!(matches!(validate_round_change(&rc, &ctx), Err(QbftError::InvalidRoundChange(_))));

    // Value without a prepared round.
    let no_round = RoundChangeData::prepared(NO_ROUND, value(), vec![]);
    let rc = signed_round_change(&tc, 1, HEIGHT, 2, no_round);
    assert!(matches!(validate_round_change(&rc, &ctx), Err(QbftError::InvalidRoundChange(_))));

    // Prepared round not below the target round.
    let not_below = RoundChangeData::prepared(2, value(), prepares_for(&tc, &[1, 2, 3], 2, VALUE));
    let rc = signed_round_change(&tc, 1, HEIGHT, 2, not_below);
    assert!(matches!(validate_round_change(&rc, &ctx), Err(QbftError::InvalidRoundChange(_))));
}

#[test]
fn test_validate_round_change_for_round_requires_exact_round() {
    let tc = TestCommittee::new(4);
    let check = MockValueCheck::new();
    let rc = signed_round_change(&tc, 1, HEIGHT, 3, RoundChangeData::unprepared());

    assert_eq!(
        validate_round_change_for_round(&rc, &context(&tc, &check, 1), 2),
        Err(QbftError::WrongRound { expected: 2, actual: 3 })
    );
}

#[test]
fn test_highest_prepared_prefers_higher_round() {
    let tc = TestCommittee::new(4);
    let other = Bytes::from_static(b"round two value");
    let prepared_first = RoundChangeData::prepared(1, value(), prepares_for(&tc, &[1, 2, 3], 1, VALUE));
    let prepared_second = RoundChangeData::prepared(2, other.clone(), prepares_for(&tc, &[1, 2, 3], 2, &other));
    let rcs = vec![
        signed_round_change(&tc, 1, HEIGHT, 3, RoundChangeData::unprepared()),
        signed_round_change(&tc, 2, HEIGHT, 3, prepared_first),
        signed_round_change(&tc, 3, HEIGHT, 3, prepared_second),
    ];

    let highest = highest_prepared(&rcs).unwrap().unwrap();
    assert_eq!(highest.prepared_round, 2);
    assert_eq!(highest.prepared_value(), Some(&other));

    assert_eq!(highest_prepared(&rcs[..1]).unwrap(), None);
}
