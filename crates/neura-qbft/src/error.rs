use thiserror::Error;

use crate::messagedata::MessageType;
use crate::types::{Height, OperatorId, Round};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QbftError {
    #[error("RLP error: {0}")]
    RlpError(#[from] alloy_rlp::Error),
    #[error("Crypto operation failed: {0}")]
    CryptoError(String),
    #[error("Invalid message type: {0}")]
    InvalidMessageType(u8),
    #[error("Unexpected message type: expected {expected:?}, got {actual:?}")]
    UnexpectedMessageType {
        expected: MessageType,
        actual: MessageType,
    },
    #[error("Message identifier does not match the instance identifier")]
    InvalidIdentifier,
    #[error("Wrong height: expected {expected}, got {actual}")]
    WrongHeight { expected: Height, actual: Height },
    #[error("Wrong round: expected {expected}, got {actual}")]
    WrongRound { expected: Round, actual: Round },
    #[error("Message for past round {message_round}, current round is {current_round}")]
    MessageFromPastRound {
        message_round: Round,
        current_round: Round,
    },
    #[error("Signed message has no signers")]
    NoSigners,
    #[error("Signers must be unique and in ascending order")]
    UnorderedSigners,
    #[error("Signer {0} is not a committee member")]
    UnknownSigner(OperatorId),
    #[error("Expected {expected} signer(s), got {actual}")]
    SignerCountMismatch { expected: usize, actual: usize },
    #[error("Invalid signature from signer {signer}")]
    InvalidSignature { signer: OperatorId },
    #[error("Invalid proposer: expected {expected}, got {actual}")]
    InvalidProposer {
        expected: OperatorId,
        actual: OperatorId,
    },
    #[error("Proposal is not justified: {0}")]
    ProposalNotJustified(String),
    #[error("Proposal for round {message_round} not acceptable in round {current_round}")]
    ProposalNotAcceptable {
        message_round: Round,
        current_round: Round,
    },
    #[error("Invalid round change: {0}")]
    InvalidRoundChange(String),
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    #[error("Cannot aggregate signed messages: {0}")]
    AggregationMismatch(String),
    #[error("Instance has not been started")]
    InstanceNotStarted,
    #[error("Instance for height {height} is still running")]
    InstanceAlreadyRunning { height: Height },
    #[error("No instance found for height {height}")]
    InstanceNotFound { height: Height },
    #[error("Invalid committee: {0}")]
    InvalidCommittee(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<k256::ecdsa::Error> for QbftError {
    fn from(err: k256::ecdsa::Error) -> Self {
        QbftError::CryptoError(err.to_string())
    }
}
