//! Proving service client
//!
//! Sends the identity token and nonce inputs to the external prover and
//! receives an opaque proof artifact. The proof is only meaningful for the
//! exact (ephemeral public key, max epoch, randomness) triple the nonce was
//! built from, so the client records that binding alongside the artifact
//! and the composer enforces it.
//!
//! Retry policy: 4xx responses fail fast (the inputs are wrong or the token
//! expired); 5xx and network failures are retried with exponential backoff,
//! proof generation being idempotent for identical inputs. The epoch check
//! happens before any I/O.

use std::time::Duration;

use serde::Serialize;

use crate::keys::EphemeralKeyPair;
use crate::error::Error;
use crate::nonce::Randomness;
use crate::salt::UserSalt;
use crate::token::IdentityToken;

/// Default request timeout. Proving is computationally heavy server-side.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Attempts for retryable failures.
const MAX_ATTEMPTS: u32 = 3;

/// Initial backoff, doubled per attempt.
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// The claim the prover should treat as the user identifier.
const KEY_CLAIM_NAME: &str = "sub";

/// The (key, epoch, randomness) triple a proof was generated under.
#[derive(Debug, Clone, PartialEq)]
pub struct ProofBinding {
    pub ephemeral_public: [u8; 32],
    pub max_epoch: u64,
    pub randomness: Randomness,
}

/// An opaque proof artifact plus the binding it was fetched under.
///
/// The body is consumed as-is by the composer; this subsystem never
/// interprets it.
#[derive(Debug, Clone)]
pub struct ZkProof {
    body: serde_json::Value,
    binding: ProofBinding,
}

impl ZkProof {
    pub fn body(&self) -> &serde_json::Value {
        &self.body
    }

    pub fn binding(&self) -> &ProofBinding {
        &self.binding
    }

    #[cfg(test)]
    pub(crate) fn for_tests(body: serde_json::Value, binding: ProofBinding) -> Self {
        Self { body, binding }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProofRequest<'a> {
    jwt: &'a str,
    extended_ephemeral_public_key: String,
    max_epoch: u64,
    jwt_randomness: String,
    salt: &'a str,
    key_claim_name: &'a str,
}

/// Client for the external proving service.
pub struct ProofClient {
    http: reqwest::Client,
    base_url: String,
}

impl ProofClient {
    /// Connect to a prover endpoint with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self, Error> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Connect with a caller-specified timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Fetch a proof for the given session inputs.
    ///
    /// Checks the epoch window lazily before any network traffic: a
    /// `max_epoch` already in the past returns `Error::StaleEpoch` without
    /// touching the prover.
    pub async fn fetch_proof(
        &self,
        token: &IdentityToken,
        keypair: &EphemeralKeyPair,
        max_epoch: u64,
        randomness: &Randomness,
        salt: &UserSalt,
        current_epoch: u64,
    ) -> Result<ZkProof, Error> {
        if current_epoch > max_epoch {
            return Err(Error::StaleEpoch {
                max_epoch,
                current_epoch,
            });
        }

        let request = ProofRequest {
            jwt: token.raw(),
            extended_ephemeral_public_key: keypair.extended_public_base64(),
            max_epoch,
            jwt_randomness: randomness.to_base64(),
            salt: salt.as_str(),
            key_claim_name: KEY_CLAIM_NAME,
        };

        let mut backoff = INITIAL_BACKOFF;
        let mut attempt = 0;
        let body = loop {
            attempt += 1;
            match self.try_fetch(&request).await {
                Ok(body) => break body,
                Err(err) if attempt < MAX_ATTEMPTS && err.is_retryable() => {
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(err) => return Err(err),
            }
        };

        Ok(ZkProof {
            body,
            binding: ProofBinding {
                ephemeral_public: keypair.public_bytes(),
                max_epoch,
                randomness: randomness.clone(),
            },
        })
    }

    async fn try_fetch(&self, request: &ProofRequest<'_>) -> Result<serde_json::Value, Error> {
        let response = self.http.post(&self.base_url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::ProofService {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}
