//! Session state machine
//!
//! One login-to-transaction cycle, modeled as an explicit value owned by
//! the caller. Every transition consumes the previous step's output, so the
//! protocol ordering is enforced by construction; the OAuth redirect is the
//! one suspension point, bridged by the checkpoint in `store`.
//!
//! `UNSTARTED -> KEY_GENERATED -> NONCE_BOUND -> (redirect) ->
//!  TOKEN_RECEIVED -> SALT_RESOLVED -> ADDRESS_RESOLVED -> READY ->
//!  [per tx: PROVING -> SIGNING -> COMPOSED] -> READY`
//!
//! Fatal errors land in `INVALID`; recovery restarts from `UNSTARTED`.

use serde::{Deserialize, Serialize};

use crate::address::{self, Address};
use crate::callback;
use crate::compose::{self, CompositeAuthorization};
use crate::error::Error;
use crate::keys::EphemeralKeyPair;
use crate::nonce::{self, Nonce, Randomness};
use crate::proof::ProofClient;
use crate::salt::{self, UserSalt};
use crate::token::IdentityToken;

/// Protocol phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Unstarted,
    KeyGenerated,
    NonceBound,
    TokenReceived,
    SaltResolved,
    AddressResolved,
    Ready,
    Proving,
    Signing,
    Composed,
    Invalid,
}

/// One user's authentication session.
///
/// Plain owned value: no interior mutability, no global state, all
/// transitions take `&mut self` and are sequential by protocol definition.
pub struct Session {
    phase: SessionPhase,
    keypair: Option<EphemeralKeyPair>,
    max_epoch: Option<u64>,
    randomness: Option<Randomness>,
    nonce: Option<Nonce>,
    token: Option<IdentityToken>,
    salt: Option<UserSalt>,
    address: Option<Address>,
}

impl Session {
    /// A fresh, unstarted session.
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Unstarted,
            keypair: None,
            max_epoch: None,
            randomness: None,
            nonce: None,
            token: None,
            salt: None,
            address: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn keypair(&self) -> Option<&EphemeralKeyPair> {
        self.keypair.as_ref()
    }

    pub fn max_epoch(&self) -> Option<u64> {
        self.max_epoch
    }

    pub fn randomness(&self) -> Option<&Randomness> {
        self.randomness.as_ref()
    }

    pub fn nonce(&self) -> Option<&Nonce> {
        self.nonce.as_ref()
    }

    pub fn token(&self) -> Option<&IdentityToken> {
        self.token.as_ref()
    }

    pub fn salt(&self) -> Option<&UserSalt> {
        self.salt.as_ref()
    }

    pub fn address(&self) -> Option<Address> {
        self.address
    }

    fn expect_phase(&self, expected: SessionPhase, op: &'static str) -> Result<(), Error> {
        if self.phase != expected {
            return Err(Error::Phase {
                op,
                phase: self.phase,
            });
        }
        Ok(())
    }

    /// Drop all session material and land in the terminal error state.
    pub fn invalidate(&mut self) {
        self.phase = SessionPhase::Invalid;
        self.keypair = None;
        self.max_epoch = None;
        self.randomness = None;
        self.nonce = None;
        self.token = None;
        self.salt = None;
        self.address = None;
    }

    /// Generate the ephemeral keypair. `Unstarted -> KeyGenerated`.
    pub fn begin(&mut self) -> Result<(), Error> {
        self.expect_phase(SessionPhase::Unstarted, "begin")?;
        self.keypair = Some(EphemeralKeyPair::generate());
        self.phase = SessionPhase::KeyGenerated;
        Ok(())
    }

    /// Fix the validity window, draw the randomness, and bind the nonce.
    /// `KeyGenerated -> NonceBound`. The caller must checkpoint
    /// (`SessionStore::save_partial`) before redirecting.
    pub fn bind(&mut self, current_epoch: u64, validity_epochs: u64) -> Result<&Nonce, Error> {
        self.expect_phase(SessionPhase::KeyGenerated, "bind")?;
        let keypair = self.keypair.as_ref().ok_or(Error::IncompleteSession {
            missing: "ephemeral keypair",
        })?;

        let max_epoch = current_epoch + validity_epochs;
        let randomness = nonce::generate_randomness();
        let bound = nonce::bind(&keypair.public_bytes(), max_epoch, &randomness);

        self.max_epoch = Some(max_epoch);
        self.randomness = Some(randomness);
        self.phase = SessionPhase::NonceBound;
        Ok(self.nonce.insert(bound))
    }

    /// Rebuild a session at `NonceBound` from the pre-redirect checkpoint,
    /// re-deriving the nonce from the checkpointed inputs.
    pub fn resume_partial(
        keypair: EphemeralKeyPair,
        max_epoch: u64,
        randomness: Randomness,
    ) -> Self {
        let bound = nonce::bind(&keypair.public_bytes(), max_epoch, &randomness);
        Self {
            phase: SessionPhase::NonceBound,
            keypair: Some(keypair),
            max_epoch: Some(max_epoch),
            randomness: Some(randomness),
            nonce: Some(bound),
            token: None,
            salt: None,
            address: None,
        }
    }

    /// Consume the provider redirect. `NonceBound -> TokenReceived`.
    ///
    /// The token's `nonce` claim must equal the session's bound nonce; a
    /// mismatch means the token was issued for some other key or window and
    /// invalidates the session.
    pub fn receive_token(&mut self, redirect_url: &str) -> Result<(), Error> {
        self.expect_phase(SessionPhase::NonceBound, "receive_token")?;

        let token = match callback::parse_redirect(redirect_url) {
            Ok(token) => token,
            Err(err) => {
                if err.is_fatal() {
                    self.invalidate();
                }
                return Err(err);
            }
        };

        let bound = self.nonce.as_ref().ok_or(Error::IncompleteSession {
            missing: "nonce",
        })?;
        if token.claims().nonce.as_deref() != Some(bound.as_str()) {
            self.invalidate();
            return Err(Error::MalformedToken(
                "token nonce does not match the session binding".into(),
            ));
        }

        self.token = Some(token);
        self.phase = SessionPhase::TokenReceived;
        Ok(())
    }

    /// Resolve the user salt. `TokenReceived -> SaltResolved`.
    ///
    /// `external` carries a trusted salt-service value when one exists;
    /// otherwise the local deterministic derivation applies.
    pub fn resolve_salt(&mut self, external: Option<&str>) -> Result<(), Error> {
        self.expect_phase(SessionPhase::TokenReceived, "resolve_salt")?;
        let token = self.token.as_ref().ok_or(Error::IncompleteSession {
            missing: "identity token",
        })?;

        self.salt = Some(salt::resolve(&token.claims().sub, external)?);
        self.phase = SessionPhase::SaltResolved;
        Ok(())
    }

    /// Derive the on-chain address. `SaltResolved -> AddressResolved`.
    pub fn resolve_address(&mut self) -> Result<Address, Error> {
        self.expect_phase(SessionPhase::SaltResolved, "resolve_address")?;
        let token = self.token.as_ref().ok_or(Error::IncompleteSession {
            missing: "identity token",
        })?;
        let user_salt = self.salt.as_ref().ok_or(Error::IncompleteSession {
            missing: "user salt",
        })?;

        let derived = address::derive(token, user_salt);
        self.address = Some(derived);
        self.phase = SessionPhase::AddressResolved;
        Ok(derived)
    }

    /// Mark the session ready for transactions. `AddressResolved -> Ready`.
    /// The caller should persist the full record (`SessionStore::save_full`)
    /// at this point.
    pub fn activate(&mut self) -> Result<(), Error> {
        self.expect_phase(SessionPhase::AddressResolved, "activate")?;
        self.phase = SessionPhase::Ready;
        Ok(())
    }

    /// Rebuild a `Ready` session from the post-callback checkpoint.
    ///
    /// Re-derives the nonce and re-checks the token binding, so a record
    /// whose pieces were swapped between sessions fails here instead of
    /// producing signatures that the chain would reject.
    pub fn resume_full(
        keypair: EphemeralKeyPair,
        max_epoch: u64,
        randomness: Randomness,
        token: IdentityToken,
        salt: UserSalt,
        address: Address,
    ) -> Result<Self, Error> {
        let bound = nonce::bind(&keypair.public_bytes(), max_epoch, &randomness);
        if token.claims().nonce.as_deref() != Some(bound.as_str()) {
            return Err(Error::MalformedToken(
                "restored token does not match the restored key binding".into(),
            ));
        }
        if address::derive(&token, &salt) != address {
            return Err(Error::IncompleteSession {
                missing: "consistent address",
            });
        }

        Ok(Self {
            phase: SessionPhase::Ready,
            keypair: Some(keypair),
            max_epoch: Some(max_epoch),
            randomness: Some(randomness),
            nonce: Some(bound),
            token: Some(token),
            salt: Some(salt),
            address: Some(address),
        })
    }

    /// Authorize one transaction: fetch a proof, sign, compose.
    /// `Ready -> Proving -> Signing -> Composed -> Ready`.
    ///
    /// A stale epoch invalidates the session (the nonce binding is
    /// unusable); a proof-fetch failure restores `Ready` so the caller can
    /// retry, never leaving a dangling `Proving`.
    pub async fn authorize(
        &mut self,
        prover: &ProofClient,
        tx_bytes: &[u8],
        current_epoch: u64,
    ) -> Result<CompositeAuthorization, Error> {
        self.expect_phase(SessionPhase::Ready, "authorize")?;

        let max_epoch = self.max_epoch.ok_or(Error::IncompleteSession {
            missing: "max epoch",
        })?;
        if current_epoch > max_epoch {
            self.invalidate();
            return Err(Error::StaleEpoch {
                max_epoch,
                current_epoch,
            });
        }

        // Take owned copies up front so phase transitions never race the
        // session material and a failure cannot leave partial state.
        let (keypair, randomness, token, user_salt) = match (
            self.keypair.clone(),
            self.randomness.clone(),
            self.token.clone(),
            self.salt.clone(),
        ) {
            (Some(k), Some(r), Some(t), Some(s)) => (k, r, t, s),
            _ => {
                return Err(Error::IncompleteSession {
                    missing: "session material",
                })
            }
        };

        self.phase = SessionPhase::Proving;
        let proof = match prover
            .fetch_proof(&token, &keypair, max_epoch, &randomness, &user_salt, current_epoch)
            .await
        {
            Ok(proof) => proof,
            Err(err) => {
                self.phase = SessionPhase::Ready;
                return Err(err);
            }
        };

        self.phase = SessionPhase::Signing;
        let signature = compose::sign_transaction(tx_bytes, &keypair);

        let claims = token.claims();
        let seed = address::derive_address_seed(&user_salt, &claims.sub, &claims.aud);
        let authorization = compose::compose(&proof, seed, max_epoch, &randomness, &signature)?;
        self.phase = SessionPhase::Composed;

        // Composed is transient; the session is immediately reusable.
        self.phase = SessionPhase::Ready;
        Ok(authorization)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("phase", &self.phase)
            .field("max_epoch", &self.max_epoch)
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::test_support::make_jwt;

    fn login_redirect(session: &Session) -> String {
        let nonce = session.nonce().unwrap().as_str();
        let jwt = make_jwt(&format!(
            r#"{{"iss":"https://accounts.example.com","sub":"1234567890","aud":"zklogin-demo","exp":1916239022,"nonce":"{nonce}"}}"#
        ));
        format!("http://localhost:5173/callback#id_token={jwt}")
    }

    fn ready_session() -> Session {
        let mut session = Session::new();
        session.begin().unwrap();
        session.bind(10, 2).unwrap();
        let redirect = login_redirect(&session);
        session.receive_token(&redirect).unwrap();
        session.resolve_salt(None).unwrap();
        session.resolve_address().unwrap();
        session.activate().unwrap();
        session
    }

    #[test]
    fn test_full_login_cycle() {
        let session = ready_session();
        assert_eq!(session.phase(), SessionPhase::Ready);
        assert_eq!(session.max_epoch(), Some(12));
        assert!(session.address().is_some());
    }

    #[test]
    fn test_operations_enforce_ordering() {
        let mut session = Session::new();
        assert!(matches!(
            session.bind(10, 2),
            Err(Error::Phase { op: "bind", .. })
        ));
        assert!(matches!(
            session.receive_token("http://localhost/cb"),
            Err(Error::Phase { .. })
        ));

        session.begin().unwrap();
        assert!(matches!(session.begin(), Err(Error::Phase { .. })));
        assert!(matches!(session.resolve_salt(None), Err(Error::Phase { .. })));
    }

    #[test]
    fn test_nonce_mismatch_invalidates() {
        let mut session = Session::new();
        session.begin().unwrap();
        session.bind(10, 2).unwrap();

        let jwt = make_jwt(
            r#"{"iss":"i","sub":"s","aud":"a","exp":1,"nonce":"AAAAAAAAAAAAAAAAAAAAAAAAAAA"}"#,
        );
        let redirect = format!("http://localhost:5173/callback#id_token={jwt}");
        let result = session.receive_token(&redirect);

        assert!(matches!(result, Err(Error::MalformedToken(_))));
        assert_eq!(session.phase(), SessionPhase::Invalid);
        assert!(session.keypair().is_none());
    }

    #[test]
    fn test_missing_token_is_not_fatal() {
        let mut session = Session::new();
        session.begin().unwrap();
        session.bind(10, 2).unwrap();

        let result = session.receive_token("http://localhost:5173/callback?state=1");
        assert!(matches!(result, Err(Error::MissingToken)));
        // The user can be sent back through the provider with the same nonce.
        assert_eq!(session.phase(), SessionPhase::NonceBound);
    }

    #[test]
    fn test_resume_partial_rebinds_same_nonce() {
        let mut session = Session::new();
        session.begin().unwrap();
        session.bind(10, 2).unwrap();

        let keypair = session.keypair().unwrap().clone();
        let randomness = session.randomness().unwrap().clone();
        let nonce_before = session.nonce().unwrap().clone();

        let resumed = Session::resume_partial(keypair, 12, randomness);
        assert_eq!(resumed.phase(), SessionPhase::NonceBound);
        assert_eq!(resumed.nonce(), Some(&nonce_before));
    }

    #[tokio::test]
    async fn test_authorize_stale_epoch_invalidates() {
        let mut session = ready_session();
        let prover = ProofClient::new("http://127.0.0.1:1/v1").unwrap();

        let result = session.authorize(&prover, b"tx", 13).await;
        assert!(matches!(
            result,
            Err(Error::StaleEpoch { max_epoch: 12, current_epoch: 13 })
        ));
        assert_eq!(session.phase(), SessionPhase::Invalid);
    }

    #[tokio::test]
    async fn test_authorize_failure_restores_ready() {
        let mut session = ready_session();
        // Unroutable prover: the fetch fails, the session must come back
        // to Ready rather than sticking in Proving.
        let prover = ProofClient::new("http://127.0.0.1:1/v1").unwrap();

        let result = session.authorize(&prover, b"tx", 11).await;
        assert!(result.is_err());
        assert_eq!(session.phase(), SessionPhase::Ready);
    }

    #[test]
    fn test_resume_full_rejects_swapped_randomness() {
        let session = ready_session();
        let keypair = session.keypair().unwrap().clone();
        let token = session.token().unwrap().clone();
        let user_salt = session.salt().unwrap().clone();
        let address = session.address().unwrap();

        let other_randomness = nonce::generate_randomness();
        let result = Session::resume_full(
            keypair,
            12,
            other_randomness,
            token,
            user_salt,
            address,
        );
        assert!(matches!(result, Err(Error::MalformedToken(_))));
    }

    #[test]
    fn test_resume_full_roundtrip() {
        let session = ready_session();
        let resumed = Session::resume_full(
            session.keypair().unwrap().clone(),
            session.max_epoch().unwrap(),
            session.randomness().unwrap().clone(),
            session.token().unwrap().clone(),
            session.salt().unwrap().clone(),
            session.address().unwrap(),
        )
        .unwrap();

        assert_eq!(resumed.phase(), SessionPhase::Ready);
        assert_eq!(resumed.address(), session.address());
        assert_eq!(resumed.nonce(), session.nonce());
    }
}
