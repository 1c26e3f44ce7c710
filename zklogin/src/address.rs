//! On-chain address derivation
//!
//! The address is a deterministic function of the identity token's claims
//! and the user salt. The address seed blinds the subject behind the salt;
//! the address itself additionally binds the issuer and the authenticator
//! scheme flag, mirroring the chain's address-derivation rule.

use sha2::{Digest, Sha256};

use crate::salt::UserSalt;
use crate::token::IdentityToken;

/// Domain separator for the address seed.
const SEED_DOMAIN: &[u8] = b"zklogin_seed_v1";

/// Domain separator for the address itself.
const ADDRESS_DOMAIN: &[u8] = b"zklogin_address_v1";

/// Authenticator scheme flag for zkLogin composite authorizations.
pub const ZKLOGIN_SCHEME_FLAG: u8 = 0x05;

/// Width of a derived address.
pub const ADDRESS_LENGTH: usize = 32;

/// A derived on-chain account identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Canonical display form: `0x` followed by 64 hex chars.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse the canonical display form back into an address.
    pub fn from_hex(s: &str) -> Option<Self> {
        let stripped = s.strip_prefix("0x")?;
        let bytes = hex::decode(stripped).ok()?;
        let array: [u8; ADDRESS_LENGTH] = bytes.try_into().ok()?;
        Some(Self(array))
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Append a length-prefixed field, keeping the construction unambiguous.
fn update_field(hasher: &mut Sha256, field: &[u8]) {
    hasher.update((field.len() as u16).to_le_bytes());
    hasher.update(field);
}

/// Derive the address seed from (salt, subject, audience).
///
/// One-way and independently testable; this is the value the composite
/// authorization carries in place of the subject itself.
pub fn derive_address_seed(salt: &UserSalt, sub: &str, aud: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(SEED_DOMAIN);
    update_field(&mut hasher, salt.as_str().as_bytes());
    update_field(&mut hasher, sub.as_bytes());
    update_field(&mut hasher, aud.as_bytes());

    let digest = hasher.finalize();
    let mut seed = [0u8; 32];
    seed.copy_from_slice(&digest);
    seed
}

/// Derive the on-chain address for an identity token and salt.
///
/// Deterministic: the same (token claims, salt) pair always yields the
/// same address.
pub fn derive(token: &IdentityToken, salt: &UserSalt) -> Address {
    let claims = token.claims();
    let seed = derive_address_seed(salt, &claims.sub, &claims.aud);

    let mut hasher = Sha256::new();
    hasher.update(ADDRESS_DOMAIN);
    hasher.update([ZKLOGIN_SCHEME_FLAG]);
    update_field(&mut hasher, claims.iss.as_bytes());
    hasher.update(seed);

    let digest = hasher.finalize();
    let mut address = [0u8; ADDRESS_LENGTH];
    address.copy_from_slice(&digest);
    Address(address)
}
