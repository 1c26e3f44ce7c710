//! zkLogin session core
//!
//! Authenticate with an identity-provider login, authorize on-chain
//! transactions, never hold a long-lived private key. The pieces, in
//! protocol order:
//!
//! - [`keys`] - the ephemeral signing keypair a session owns
//! - [`nonce`] - binds the key, the validity window, and fresh randomness
//!   into the nonce the OAuth request carries
//! - [`callback`] / [`token`] - extract and decode the identity token the
//!   provider redirects back with
//! - [`salt`] / [`address`] - deterministic per-user salt and on-chain
//!   address derivation
//! - [`proof`] - fetches the zero-knowledge proof tying token and key
//!   together
//! - [`compose`] - assembles proof, address seed, and a conventional
//!   signature into the composite authorization the chain accepts
//! - [`session`] - the state machine ordering all of the above
//! - [`store`] - the encrypted checkpoint that survives the redirect
//!
//! The session's ordering requirements are strict: the ephemeral key and
//! its nonce binding must be persisted *before* the provider redirect, and
//! a proof is only valid with the exact (key, epoch, randomness) triple the
//! nonce was built from. The [`session::Session`] API and the
//! [`store::SessionStore`] checkpoint make both impossible to get wrong by
//! construction.

pub mod address;
pub mod bytes;
pub mod callback;
pub mod compose;
pub mod error;
pub mod keys;
pub mod nonce;
pub mod proof;
pub mod salt;
pub mod session;
pub mod store;
pub mod token;

#[cfg(test)]
mod test_vectors;

#[cfg(test)]
mod fuzz_tests;

pub use address::Address;
pub use compose::CompositeAuthorization;
pub use error::Error;
pub use keys::EphemeralKeyPair;
pub use nonce::{Nonce, Randomness};
pub use proof::{ProofClient, ZkProof};
pub use salt::UserSalt;
pub use session::{Session, SessionPhase};
pub use store::SessionStore;
pub use token::IdentityToken;
