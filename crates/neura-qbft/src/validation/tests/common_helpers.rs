//! Shared fixtures for validator tests.

use alloy_primitives::{keccak256, Bytes, B256};

use crate::messagewrappers::{AggregateSignature, SignedMessage};
use crate::mocks::MockValueCheck;
use crate::testing::{signed_prepare, TestCommittee};
use crate::types::{Height, OperatorId, Round};
use crate::validation::ValidationContext;

pub const HEIGHT: Height = 1;
pub const VALUE: &[u8] = &[1, 2, 3, 4];

pub fn value_digest() -> B256 {
    keccak256(VALUE)
}

pub fn context<'a>(tc: &'a TestCommittee, value_check: &'a MockValueCheck, round: Round) -> ValidationContext<'a> {
    ValidationContext::new(&tc.committee, &tc.identifier, HEIGHT, round, value_check)
}

pub fn prepares_for(tc: &TestCommittee, signers: &[OperatorId], round: Round, value: &[u8]) -> Vec<SignedMessage> {
    signers.iter().map(|id| signed_prepare(tc, *id, HEIGHT, round, keccak256(value))).collect()
}

/// Re-labels `msg` as coming from `claimed_signer` while keeping the original signature.
pub fn forge_signer(msg: &SignedMessage, claimed_signer: OperatorId) -> SignedMessage {
    SignedMessage::new(
        msg.message().clone(),
        vec![claimed_signer],
        AggregateSignature(msg.signatures().to_vec()),
    )
}

pub fn value() -> Bytes {
    Bytes::from_static(VALUE)
}
