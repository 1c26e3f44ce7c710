//! Ephemeral signing keys
//!
//! A fresh Ed25519 keypair is generated at session start, lives exactly as
//! long as the session, and must survive the OAuth redirect via the session
//! store. Only the 32-byte secret seed is ever serialized; the public half
//! is re-derived on restore.
//!
//! Security:
//! - Secret material is zeroized on drop and never logged
//! - `Debug` redacts the secret half
//! - Restoration validates the width before constructing a key

use ed25519_dalek::{Keypair, PublicKey, SecretKey, Signer};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroize;

use crate::bytes::SecureBytes;
use crate::error::Error;

/// Width of the serialized secret seed.
pub const SECRET_KEY_LENGTH: usize = 32;

/// Width of the public key.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Width of an Ed25519 signature.
pub const SIGNATURE_LENGTH: usize = 64;

/// Scheme flag prefixed to the public key in its extended (proving-service)
/// form, matching the chain's Ed25519 scheme tag.
pub const ED25519_SCHEME_FLAG: u8 = 0x00;

/// A short-lived Ed25519 signing keypair.
pub struct EphemeralKeyPair {
    keypair: Keypair,
}

impl EphemeralKeyPair {
    /// Generate a fresh keypair from OS entropy.
    pub fn generate() -> Self {
        let mut seed = [0u8; SECRET_KEY_LENGTH];
        OsRng.fill_bytes(&mut seed);
        let secret = SecretKey::from_bytes(&seed).expect("seed width is fixed");
        seed.zeroize();
        let public = PublicKey::from(&secret);
        Self {
            keypair: Keypair { secret, public },
        }
    }

    /// Serialize the secret seed only, in the canonical fixed-width form.
    pub fn serialize(&self) -> SecureBytes<SECRET_KEY_LENGTH> {
        SecureBytes::from_bytes(self.keypair.secret.to_bytes())
    }

    /// Rebuild a keypair from stored seed bytes.
    ///
    /// Fails with `Error::MalformedKey` if the width is wrong; the public
    /// key is re-derived from the seed.
    pub fn restore(bytes: &[u8]) -> Result<Self, Error> {
        let seed = SecureBytes::<SECRET_KEY_LENGTH>::from_slice(bytes)?;
        Ok(Self::from_secret_bytes(&seed))
    }

    /// Rebuild from an already width-validated seed.
    pub fn from_secret_bytes(seed: &SecureBytes<SECRET_KEY_LENGTH>) -> Self {
        let secret = SecretKey::from_bytes(seed.as_bytes()).expect("seed width is fixed");
        let public = PublicKey::from(&secret);
        Self {
            keypair: Keypair { secret, public },
        }
    }

    /// The public key.
    pub fn public(&self) -> &PublicKey {
        &self.keypair.public
    }

    /// The public key as raw bytes.
    pub fn public_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.keypair.public.to_bytes()
    }

    /// The extended public key form sent to the proving service:
    /// scheme flag byte followed by the public key, base64 encoded.
    pub fn extended_public_base64(&self) -> String {
        use base64::{engine::general_purpose::STANDARD, Engine as _};
        let mut extended = [0u8; PUBLIC_KEY_LENGTH + 1];
        extended[0] = ED25519_SCHEME_FLAG;
        extended[1..].copy_from_slice(&self.public_bytes());
        STANDARD.encode(extended)
    }

    /// Sign a message with the ephemeral key (RFC 8032, deterministic).
    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_LENGTH] {
        self.keypair.sign(message).to_bytes()
    }
}

impl Clone for EphemeralKeyPair {
    fn clone(&self) -> Self {
        Self::from_secret_bytes(&self.serialize())
    }
}

impl PartialEq for EphemeralKeyPair {
    fn eq(&self, other: &Self) -> bool {
        // Secret comparison is constant-time via SecureBytes
        self.serialize() == other.serialize() && self.public_bytes() == other.public_bytes()
    }
}

impl std::fmt::Debug for EphemeralKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralKeyPair")
            .field("public", &hex::encode(self.public_bytes()))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signature, Verifier};

    #[test]
    fn test_serialize_restore_roundtrip() {
        let keypair = EphemeralKeyPair::generate();
        let serialized = keypair.serialize();

        let restored = EphemeralKeyPair::restore(serialized.as_bytes()).unwrap();
        assert_eq!(keypair, restored);
        assert_eq!(restored.serialize(), serialized);
    }

    #[test]
    fn test_restore_rejects_wrong_width() {
        let result = EphemeralKeyPair::restore(&[0u8; 31]);
        assert!(matches!(
            result,
            Err(Error::MalformedKey { expected: 32, actual: 31 })
        ));

        let result = EphemeralKeyPair::restore(&[0u8; 33]);
        assert!(matches!(
            result,
            Err(Error::MalformedKey { expected: 32, actual: 33 })
        ));
    }

    #[test]
    fn test_signatures_verify() {
        let keypair = EphemeralKeyPair::generate();
        let message = b"transaction bytes";
        let sig_bytes = keypair.sign(message);

        let sig = Signature::from_bytes(&sig_bytes).unwrap();
        assert!(keypair.public().verify(message, &sig).is_ok());
    }

    #[test]
    fn test_signing_is_deterministic() {
        let keypair = EphemeralKeyPair::generate();
        let message = b"same input";
        assert_eq!(keypair.sign(message), keypair.sign(message));
    }

    #[test]
    fn test_generated_keys_are_unique() {
        let a = EphemeralKeyPair::generate();
        let b = EphemeralKeyPair::generate();
        assert_ne!(a.public_bytes(), b.public_bytes());
    }

    #[test]
    fn test_extended_public_key_prefix() {
        use base64::{engine::general_purpose::STANDARD, Engine as _};
        let keypair = EphemeralKeyPair::generate();
        let decoded = STANDARD.decode(keypair.extended_public_base64()).unwrap();
        assert_eq!(decoded.len(), 33);
        assert_eq!(decoded[0], ED25519_SCHEME_FLAG);
        assert_eq!(&decoded[1..], &keypair.public_bytes());
    }
}
