//! Composite authorization assembly
//!
//! The final authorization the chain accepts combines the proof artifact,
//! the address seed, the validity window, and a conventional signature made
//! with the ephemeral key over the transaction bytes. Signing and assembly
//! are pure; the only failure mode is a proof whose recorded binding does
//! not match the composing session.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use borsh::{BorshDeserialize, BorshSerialize};
use subtle::ConstantTimeEq;

use crate::address::ZKLOGIN_SCHEME_FLAG;
use crate::error::Error;
use crate::keys::{EphemeralKeyPair, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};
use crate::nonce::Randomness;
use crate::proof::ZkProof;

/// A plain Ed25519 signature over the transaction bytes, together with the
/// public key that made it.
#[derive(Debug, Clone, PartialEq)]
pub struct ConventionalSignature {
    pub signature: [u8; SIGNATURE_LENGTH],
    pub public_key: [u8; PUBLIC_KEY_LENGTH],
}

/// Sign transaction bytes with the session's ephemeral key. Pure, no I/O.
pub fn sign_transaction(tx_bytes: &[u8], keypair: &EphemeralKeyPair) -> ConventionalSignature {
    ConventionalSignature {
        signature: keypair.sign(tx_bytes),
        public_key: keypair.public_bytes(),
    }
}

/// The composite structure submitted alongside transaction bytes.
///
/// Byte encoding is borsh; transport encoding is standard base64. The proof
/// body rides as its canonical JSON string, untouched.
#[derive(Debug, Clone, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct CompositeAuthorization {
    pub scheme: u8,
    pub proof: String,
    pub address_seed: [u8; 32],
    pub max_epoch: u64,
    pub signature: [u8; SIGNATURE_LENGTH],
    pub public_key: [u8; PUBLIC_KEY_LENGTH],
}

impl CompositeAuthorization {
    /// Borsh byte encoding.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        self.try_to_vec().map_err(Error::Storage)
    }

    /// Transport form: base64 of the borsh encoding.
    pub fn to_base64(&self) -> Result<String, Error> {
        Ok(STANDARD.encode(self.to_bytes()?))
    }

    /// Decode the borsh byte encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        Self::try_from_slice(bytes).map_err(Error::Storage)
    }
}

/// Assemble the composite authorization. Pure and deterministic.
///
/// The proof is only accepted when its recorded binding matches the exact
/// (ephemeral public key, max epoch, randomness) triple of the composing
/// session; a proof fetched under any other binding fails with
/// `Error::ProofBinding`, which is what makes cross-session proof reuse
/// impossible client-side (the prover enforces the same server-side).
pub fn compose(
    proof: &ZkProof,
    address_seed: [u8; 32],
    max_epoch: u64,
    randomness: &Randomness,
    signature: &ConventionalSignature,
) -> Result<CompositeAuthorization, Error> {
    let binding = proof.binding();
    let key_matches: bool = binding
        .ephemeral_public
        .ct_eq(&signature.public_key)
        .into();
    if !key_matches || binding.max_epoch != max_epoch || &binding.randomness != randomness {
        return Err(Error::ProofBinding);
    }

    Ok(CompositeAuthorization {
        scheme: ZKLOGIN_SCHEME_FLAG,
        proof: proof.body().to_string(),
        address_seed,
        max_epoch,
        signature: signature.signature,
        public_key: signature.public_key,
    })
}
