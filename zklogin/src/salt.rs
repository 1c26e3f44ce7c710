//! User salt derivation
//!
//! The salt blinds the subject claim in address derivation so the on-chain
//! address cannot be computed from the identity token alone. Derivation is
//! local and deterministic: the same subject always yields the same salt,
//! with no server-side storage. A trusted salt-issuing service, when one is
//! available, takes precedence over the local scheme.

use sha2::{Digest, Sha256};

use crate::error::Error;

/// Domain separator for salt derivation.
const SALT_DOMAIN: &[u8] = b"zklogin_salt_v1";

/// Width of the salt's decimal rendering: a zero-padded `u128`.
pub const SALT_DECIMAL_LENGTH: usize = 39;

/// A deterministic per-user salt, rendered as a fixed-length decimal string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSalt(String);

impl UserSalt {
    /// Validate an externally supplied salt (e.g. from a trusted salt
    /// service or the session store). Must be exactly the fixed-length
    /// decimal form; anything else fails with `Error::MalformedSalt`.
    pub fn parse(value: &str) -> Result<Self, Error> {
        if value.len() != SALT_DECIMAL_LENGTH || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::MalformedSalt(SALT_DECIMAL_LENGTH));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserSalt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the salt for a subject claim.
///
/// One-way, deterministic, and stable across processes: a domain-separated
/// SHA-256 of the subject, truncated to 128 bits and rendered as a
/// zero-padded decimal string.
pub fn derive(subject: &str) -> UserSalt {
    let mut hasher = Sha256::new();
    hasher.update(SALT_DOMAIN);
    hasher.update(subject.as_bytes());
    let digest = hasher.finalize();

    let mut truncated = [0u8; 16];
    truncated.copy_from_slice(&digest[..16]);
    let value = u128::from_be_bytes(truncated);

    UserSalt(format!("{value:039}"))
}

/// Resolve the salt for a subject, preferring a trusted external value.
///
/// An externally issued salt is validated before use; the local derivation
/// is the supported fallback and must never change for a given subject
/// within a deployment.
pub fn resolve(subject: &str, external: Option<&str>) -> Result<UserSalt, Error> {
    match external {
        Some(value) => UserSalt::parse(value),
        None => Ok(derive(subject)),
    }
}
