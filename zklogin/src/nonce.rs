//! Nonce binding
//!
//! The nonce ties the ephemeral public key, the validity window, and a
//! session-lifetime blinding value into one string that rides inside the
//! OAuth request. The identity provider signs it back in the token's
//! `nonce` claim, which is what lets the proving service attest that the
//! token was issued for exactly this ephemeral key.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::bytes::SecureBytes;

/// Domain separator for nonce derivation.
const NONCE_DOMAIN: &[u8] = b"zklogin_nonce_v1";

/// Width of the session randomness.
pub const RANDOMNESS_LENGTH: usize = 16;

/// Digest bytes kept before encoding.
const NONCE_DIGEST_LENGTH: usize = 20;

/// Encoded nonce length (URL-safe base64, no padding).
pub const NONCE_LENGTH: usize = 27;

/// Session-lifetime blinding value. Generated once, immutable thereafter.
pub type Randomness = SecureBytes<RANDOMNESS_LENGTH>;

/// Generate fresh session randomness from OS entropy.
pub fn generate_randomness() -> Randomness {
    let mut bytes = [0u8; RANDOMNESS_LENGTH];
    OsRng.fill_bytes(&mut bytes);
    Randomness::from_bytes(bytes)
}

/// The derived nonce embedded in the OAuth authorization request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nonce(String);

impl Nonce {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Nonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bind an ephemeral public key, validity window, and randomness into a nonce.
///
/// Pure and deterministic: identical inputs always produce the identical
/// nonce. Computed once at session start and never recomputed mid-session
/// (restoration re-derives it from the checkpointed inputs).
pub fn bind(
    public_key: &[u8; 32],
    max_epoch: u64,
    randomness: &Randomness,
) -> Nonce {
    let mut hasher = Sha256::new();
    hasher.update(NONCE_DOMAIN);
    hasher.update(public_key);
    hasher.update(max_epoch.to_le_bytes());
    hasher.update(randomness.as_bytes());
    let digest = hasher.finalize();

    Nonce(URL_SAFE_NO_PAD.encode(&digest[..NONCE_DIGEST_LENGTH]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_is_deterministic() {
        let public = [0x11u8; 32];
        let randomness = Randomness::from_bytes([0x22; 16]);

        let a = bind(&public, 100, &randomness);
        let b = bind(&public, 100, &randomness);
        assert_eq!(a, b);
    }

    #[test]
    fn test_nonce_length() {
        let nonce = bind(&[0u8; 32], 0, &Randomness::from_bytes([0u8; 16]));
        assert_eq!(nonce.as_str().len(), NONCE_LENGTH);
    }

    #[test]
    fn test_any_input_change_alters_nonce() {
        let public = [0x11u8; 32];
        let randomness = Randomness::from_bytes([0x22; 16]);
        let base = bind(&public, 100, &randomness);

        assert_ne!(base, bind(&[0x12u8; 32], 100, &randomness));
        assert_ne!(base, bind(&public, 101, &randomness));
        assert_ne!(base, bind(&public, 100, &Randomness::from_bytes([0x23; 16])));
    }

    #[test]
    fn test_randomness_is_unique() {
        let a = generate_randomness();
        let b = generate_randomness();
        assert_ne!(a, b);
    }
}
