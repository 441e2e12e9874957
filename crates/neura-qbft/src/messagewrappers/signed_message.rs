use alloy_primitives::{keccak256, Bytes, B256};
use alloy_rlp::{RlpDecodable, RlpDecodableWrapper, RlpEncodable, RlpEncodableWrapper};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::QbftError;
use crate::messagedata::MessageType;
use crate::messagewrappers::Message;
use crate::types::{Committee, Height, NodeKey, OperatorId, RlpSignature, Round};

/// One recoverable signature per signer, aligned with `SignedMessage::signers`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, RlpEncodableWrapper, RlpDecodableWrapper)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AggregateSignature(pub Vec<RlpSignature>);

/// A message together with the operators that signed it.
///
/// `signers` is strictly ascending. Aggregated commits carry several signers,
/// every other message carries exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, RlpEncodable, RlpDecodable)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SignedMessage {
    message: Message,
    signers: Vec<OperatorId>,
    signature: AggregateSignature,
}

impl SignedMessage {
    /// Assembles a signed message from raw parts without checking them.
    /// Use [`SignedMessage::is_valid_signature`] before trusting the result.
    pub fn new(message: Message, signers: Vec<OperatorId>, signature: AggregateSignature) -> Self {
        Self { message, signers, signature }
    }

    pub fn sign(message: Message, signer: OperatorId, node_key: &NodeKey) -> Result<Self, QbftError> {
        let signature = RlpSignature::sign_prehash(&message.digest(), node_key)?;
        Ok(Self { message, signers: vec![signer], signature: AggregateSignature(vec![signature]) })
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn signers(&self) -> &[OperatorId] {
        &self.signers
    }

    pub fn signatures(&self) -> &[RlpSignature] {
        &self.signature.0
    }

    pub fn msg_type(&self) -> MessageType {
        self.message.msg_type
    }

    pub fn height(&self) -> Height {
        self.message.height
    }

    pub fn round(&self) -> Round {
        self.message.round
    }

    /// The signer of a single-signer message.
    pub fn single_signer(&self) -> Option<OperatorId> {
        match self.signers.as_slice() {
            [signer] => Some(*signer),
            _ => None,
        }
    }

    pub fn common_signers(&self, other: &SignedMessage) -> bool {
        self.signers.iter().any(|signer| other.signers.binary_search(signer).is_ok())
    }

    fn check_signer_set(&self) -> Result<(), QbftError> {
        if self.signers.is_empty() {
            return Err(QbftError::NoSigners);
        }
        if self.signers.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(QbftError::UnorderedSigners);
        }
        if self.signers.len() != self.signature.0.len() {
            return Err(QbftError::SignerCountMismatch {
                expected: self.signers.len(),
                actual: self.signature.0.len(),
            });
        }
        Ok(())
    }

    /// Checks that every signature component recovers to the committee address
    /// of the signer at the same position.
    pub fn is_valid_signature(&self, committee: &Committee) -> Result<(), QbftError> {
        self.check_signer_set()?;
        let digest = self.message.digest();
        for (signer, signature) in self.signers.iter().zip(self.signature.0.iter()) {
            let node = committee.node(*signer).ok_or(QbftError::UnknownSigner(*signer))?;
            let recovered = signature
                .recover_address(&digest)
                .map_err(|_| QbftError::InvalidSignature { signer: *signer })?;
            if recovered != node.address {
                log::trace!(
                    "Signature for signer {} recovered to {:?}, expected {:?}",
                    signer,
                    recovered,
                    node.address
                );
                return Err(QbftError::InvalidSignature { signer: *signer });
            }
        }
        Ok(())
    }

    /// Merges two signatures over the same message. Signer sets must be disjoint.
    pub fn aggregate(&self, other: &SignedMessage) -> Result<SignedMessage, QbftError> {
        if self.message.digest() != other.message.digest() {
            return Err(QbftError::AggregationMismatch("messages differ".into()));
        }
        if self.common_signers(other) {
            return Err(QbftError::AggregationMismatch("signer sets overlap".into()));
        }
        self.check_signer_set()?;
        other.check_signer_set()?;

        let mut pairs: Vec<(OperatorId, RlpSignature)> = self
            .signers
            .iter()
            .copied()
            .zip(self.signature.0.iter().cloned())
            .chain(other.signers.iter().copied().zip(other.signature.0.iter().cloned()))
            .collect();
        pairs.sort_by_key(|(signer, _)| *signer);
        let (signers, signatures) = pairs.into_iter().unzip();

        Ok(SignedMessage { message: self.message.clone(), signers, signature: AggregateSignature(signatures) })
    }

    /// Folds a non-empty set of signed messages into one.
    pub fn aggregate_all<'a, I>(msgs: I) -> Result<SignedMessage, QbftError>
    where
        I: IntoIterator<Item = &'a SignedMessage>,
    {
        let mut msgs = msgs.into_iter();
        let first = msgs.next().ok_or_else(|| QbftError::AggregationMismatch("nothing to aggregate".into()))?;
        msgs.try_fold(first.clone(), |acc, msg| acc.aggregate(msg))
    }

    pub fn encode(&self) -> Bytes {
        Bytes::from(alloy_rlp::encode(self))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, QbftError> {
        Ok(alloy_rlp::decode_exact(bytes)?)
    }

    /// keccak256 of the full RLP encoding, signatures included.
    pub fn get_root(&self) -> B256 {
        keccak256(alloy_rlp::encode(self))
    }
}
