use alloy_primitives::{keccak256, Address, B256};
use alloy_rlp::{RlpDecodable, RlpEncodable};
use k256::ecdsa::{RecoveryId, Signature as K256Signature, VerifyingKey};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::QbftError;
use crate::types::NodeKey;

/// A recoverable secp256k1 signature, RLP encoded as `[r, s, y_parity]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, RlpEncodable, RlpDecodable)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RlpSignature {
    pub r: B256,
    pub s: B256,
    pub y_parity: bool,
}

impl RlpSignature {
    /// Signs a 32-byte prehash with the given key.
    pub fn sign_prehash(digest: &B256, signing_key: &NodeKey) -> Result<Self, QbftError> {
        let (signature, recovery_id): (K256Signature, RecoveryId) =
            signing_key.sign_prehash_recoverable(digest.as_slice())?;
        let bytes = signature.to_bytes();
        Ok(Self {
            r: B256::from_slice(&bytes[..32]),
            s: B256::from_slice(&bytes[32..]),
            y_parity: recovery_id.is_y_odd(),
        })
    }

    /// Recovers the address of the key that produced this signature over `digest`.
    pub fn recover_address(&self, digest: &B256) -> Result<Address, QbftError> {
        let signature = K256Signature::from_scalars(self.r.0, self.s.0)
            .map_err(|e| QbftError::CryptoError(format!("Malformed signature scalars: {}", e)))?;
        let recovery_id = RecoveryId::from_byte(u8::from(self.y_parity))
            .ok_or_else(|| QbftError::CryptoError("Invalid recovery id".to_string()))?;
        let verifying_key = VerifyingKey::recover_from_prehash(digest.as_slice(), &signature, recovery_id)
            .map_err(|e| QbftError::CryptoError(format!("Public key recovery failed: {}", e)))?;
        Ok(address_from_verifying_key(&verifying_key))
    }
}

/// Ethereum-style address of a secp256k1 public key: last 20 bytes of keccak256(x || y).
pub fn address_from_verifying_key(verifying_key: &VerifyingKey) -> Address {
    let encoded_point = verifying_key.to_encoded_point(false);
    let hashed_pk = keccak256(&encoded_point.as_bytes()[1..]);
    Address::from_slice(&hashed_pk[12..])
}

pub fn address_from_node_key(node_key: &NodeKey) -> Address {
    address_from_verifying_key(node_key.verifying_key())
}
