//! Fixed-width secret byte wrapper with one canonical codec
//!
//! Every fixed-width secret in this crate (ephemeral secret key, nonce
//! randomness) moves through `SecureBytes`: one type, one base64 codec,
//! zeroized on drop, constant-time equality.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::error::Error;

/// A fixed-width byte string holding secret material.
///
/// Decoding validates the width: wrong-length input fails with
/// `Error::MalformedKey`, never silently truncates or pads.
#[derive(Clone)]
pub struct SecureBytes<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> SecureBytes<N> {
    /// Wrap raw bytes.
    pub fn from_bytes(bytes: [u8; N]) -> Self {
        Self { bytes }
    }

    /// Copy from a slice, validating the width.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != N {
            return Err(Error::MalformedKey {
                expected: N,
                actual: bytes.len(),
            });
        }
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(Self { bytes: out })
    }

    /// The raw bytes (use carefully).
    pub fn as_bytes(&self) -> &[u8; N] {
        &self.bytes
    }

    /// Canonical storage encoding.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.bytes)
    }

    /// Decode the canonical encoding, validating the width.
    pub fn from_base64(encoded: &str) -> Result<Self, Error> {
        let decoded = STANDARD
            .decode(encoded)
            .map_err(|_| Error::MalformedKey { expected: N, actual: 0 })?;
        let result = Self::from_slice(&decoded);
        let mut decoded = decoded;
        decoded.zeroize();
        result
    }
}

impl<const N: usize> Drop for SecureBytes<N> {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl<const N: usize> PartialEq for SecureBytes<N> {
    fn eq(&self, other: &Self) -> bool {
        bool::from(self.bytes.ct_eq(&other.bytes))
    }
}

impl<const N: usize> Eq for SecureBytes<N> {}

impl<const N: usize> std::fmt::Debug for SecureBytes<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureBytes")
            .field("len", &N)
            .finish_non_exhaustive()
    }
}
