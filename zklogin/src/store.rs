//! Persisted session checkpoint with encryption at rest
//!
//! The OAuth redirect destroys in-memory state, so the session is
//! checkpointed in two phases: a partial record (ephemeral secret, max
//! epoch, randomness) saved at `NonceBound` before the redirect, and a full
//! record once the session reaches `Ready`. Restoration width-validates
//! every fixed-width field and refuses partial reconstruction.
//!
//! Records are encrypted with AES-256-GCM under an Argon2id
//! password-derived key and written with restrictive permissions. A record
//! that decrypts but fails structural validation is treated as corruption:
//! the store is cleared and a typed error surfaced.

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use argon2::{
    password_hash::{rand_core::RngCore, SaltString},
    Argon2,
};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;
use std::fs;
use std::path::PathBuf;

use crate::address::Address;
use crate::bytes::SecureBytes;
use crate::error::Error;
use crate::keys::{EphemeralKeyPair, SECRET_KEY_LENGTH};
use crate::nonce::{Randomness, RANDOMNESS_LENGTH};
use crate::salt::UserSalt;
use crate::session::{Session, SessionPhase};
use crate::token::IdentityToken;

/// Argon2 parameters for key derivation
const ARGON2_M_COST: u32 = 65536; // 64 MB memory
const ARGON2_T_COST: u32 = 3; // 3 iterations
const ARGON2_P_COST: u32 = 4; // 4 parallel lanes

const RECORD_VERSION: u8 = 1;

/// Encrypted session file format
#[derive(Serialize, Deserialize)]
pub struct EncryptedSessionFile {
    /// Version for future compatibility
    pub version: u8,
    /// Salt for Argon2 (base64)
    pub salt: String,
    /// Nonce for AES-GCM (base64)
    pub nonce: String,
    /// Encrypted record (base64)
    pub ciphertext: String,
    /// Creation timestamp
    pub created_at: String,
}

/// The persisted fields, serialized inside the ciphertext.
///
/// The partial form (pre-redirect) carries only the first three fields;
/// the optional fields are written once the session reaches `Ready`.
#[derive(Serialize, Deserialize)]
struct SessionRecord {
    version: u8,
    /// Ephemeral secret seed, canonical base64.
    secret_key: String,
    max_epoch: u64,
    /// Session randomness, canonical base64.
    randomness: String,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    salt: Option<String>,
    #[serde(default)]
    address: Option<String>,
}

impl Drop for SessionRecord {
    fn drop(&mut self) {
        self.secret_key.zeroize();
        self.randomness.zeroize();
        if let Some(ref mut token) = self.token {
            token.zeroize();
        }
    }
}

fn derive_cipher_key(password: &str, salt: &str) -> Result<[u8; 32], Error> {
    let argon2 = Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon2::Params::new(ARGON2_M_COST, ARGON2_T_COST, ARGON2_P_COST, Some(32))
            .map_err(|e| Error::Crypto(format!("Argon2 params error: {e}")))?,
    );

    let mut key_bytes = [0u8; 32];
    argon2
        .hash_password_into(password.as_bytes(), salt.as_bytes(), &mut key_bytes)
        .map_err(|e| Error::Crypto(format!("key derivation failed: {e}")))?;
    Ok(key_bytes)
}

impl EncryptedSessionFile {
    /// Encrypt a session record with a password.
    fn encrypt(record: &SessionRecord, password: &str) -> Result<Self, Error> {
        let salt = SaltString::generate(&mut OsRng);
        let mut key_bytes = derive_cipher_key(password, salt.as_str())?;

        let cipher = Aes256Gcm::new_from_slice(&key_bytes)
            .map_err(|e| Error::Crypto(format!("cipher creation failed: {e}")))?;

        let mut nonce_bytes = [0u8; 12];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from(nonce_bytes);

        let mut plaintext = serde_json::to_vec(record)?;
        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_ref())
            .map_err(|e| Error::Crypto(format!("encryption failed: {e}")))?;

        plaintext.zeroize();
        key_bytes.zeroize();

        Ok(Self {
            version: RECORD_VERSION,
            salt: salt.as_str().to_string(),
            nonce: b64::encode(&nonce_bytes),
            ciphertext: b64::encode(&ciphertext),
            created_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// Decrypt a session record with a password.
    ///
    /// Failure here means a wrong password or a tampered file; neither can
    /// be told apart, so the file is left in place for the caller to decide.
    fn decrypt(&self, password: &str) -> Result<SessionRecord, Error> {
        let mut key_bytes = derive_cipher_key(password, &self.salt)?;

        let cipher = Aes256Gcm::new_from_slice(&key_bytes)
            .map_err(|e| Error::Crypto(format!("cipher creation failed: {e}")))?;

        let nonce_bytes = b64::decode(&self.nonce)?;
        let ciphertext = b64::decode(&self.ciphertext)?;

        let nonce_array: [u8; 12] = nonce_bytes
            .try_into()
            .map_err(|_| Error::Crypto("invalid nonce length".into()))?;
        let nonce = Nonce::from(nonce_array);

        let mut plaintext = cipher
            .decrypt(&nonce, ciphertext.as_ref())
            .map_err(|_| Error::Crypto("decryption failed - wrong password or corrupted data".into()))?;

        let record = serde_json::from_slice(&plaintext);
        plaintext.zeroize();
        key_bytes.zeroize();

        Ok(record?)
    }
}

/// The pre-redirect checkpoint: exactly the triple the nonce was bound to.
pub struct PartialCheckpoint {
    pub keypair: EphemeralKeyPair,
    pub max_epoch: u64,
    pub randomness: Randomness,
}

/// File-backed session store.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Create a session store at the given path.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The default storage location.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".zklogin")
            .join("session.enc")
    }

    /// Whether a persisted session exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn write_encrypted(&self, record: &SessionRecord, password: &str) -> Result<(), Error> {
        let encrypted = EncryptedSessionFile::encrypt(record, password)?;
        let json = serde_json::to_string_pretty(&encrypted)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::write(&self.path, &json)?;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&self.path, &json)?;
        }

        Ok(())
    }

    fn read_encrypted(&self, password: &str) -> Result<Option<SessionRecord>, Error> {
        if !self.path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&self.path)?;
        let encrypted: EncryptedSessionFile = match serde_json::from_str(&json) {
            Ok(file) => file,
            Err(err) => {
                // Unparseable container: corruption, not a wrong password.
                self.clear()?;
                return Err(Error::Codec(err));
            }
        };

        Ok(Some(encrypted.decrypt(password)?))
    }

    /// Save the pre-redirect checkpoint. Must run at `NonceBound`, before
    /// control leaves for the identity provider.
    pub fn save_partial(
        &self,
        keypair: &EphemeralKeyPair,
        max_epoch: u64,
        randomness: &Randomness,
        password: &str,
    ) -> Result<(), Error> {
        let record = SessionRecord {
            version: RECORD_VERSION,
            secret_key: keypair.serialize().to_base64(),
            max_epoch,
            randomness: randomness.to_base64(),
            token: None,
            salt: None,
            address: None,
        };
        self.write_encrypted(&record, password)
    }

    /// Restore the pre-redirect checkpoint, width-validating every
    /// fixed-width field. Returns `None` when nothing is persisted.
    pub fn restore_partial(&self, password: &str) -> Result<Option<PartialCheckpoint>, Error> {
        let record = match self.read_encrypted(password)? {
            Some(record) => record,
            None => return Ok(None),
        };

        let checkpoint = self.validate_partial(&record);
        if checkpoint.is_err() {
            self.clear()?;
        }
        checkpoint.map(Some)
    }

    fn validate_partial(&self, record: &SessionRecord) -> Result<PartialCheckpoint, Error> {
        let seed = SecureBytes::<SECRET_KEY_LENGTH>::from_base64(&record.secret_key)?;
        let randomness = SecureBytes::<RANDOMNESS_LENGTH>::from_base64(&record.randomness)?;

        Ok(PartialCheckpoint {
            keypair: EphemeralKeyPair::from_secret_bytes(&seed),
            max_epoch: record.max_epoch,
            randomness,
        })
    }

    /// Persist the full session record. The session must be `Ready`.
    pub fn save_full(&self, session: &Session, password: &str) -> Result<(), Error> {
        if session.phase() != SessionPhase::Ready {
            return Err(Error::Phase {
                op: "save_full",
                phase: session.phase(),
            });
        }

        let keypair = session.keypair().ok_or(Error::IncompleteSession {
            missing: "ephemeral keypair",
        })?;
        let max_epoch = session.max_epoch().ok_or(Error::IncompleteSession {
            missing: "max epoch",
        })?;
        let randomness = session.randomness().ok_or(Error::IncompleteSession {
            missing: "randomness",
        })?;
        let token = session.token().ok_or(Error::IncompleteSession {
            missing: "identity token",
        })?;
        let user_salt = session.salt().ok_or(Error::IncompleteSession {
            missing: "user salt",
        })?;
        let address = session.address().ok_or(Error::IncompleteSession {
            missing: "address",
        })?;

        let record = SessionRecord {
            version: RECORD_VERSION,
            secret_key: keypair.serialize().to_base64(),
            max_epoch,
            randomness: randomness.to_base64(),
            token: Some(token.raw().to_string()),
            salt: Some(user_salt.as_str().to_string()),
            address: Some(address.to_hex()),
        };
        self.write_encrypted(&record, password)
    }

    /// Whether the persisted record, if any, carries the post-callback
    /// fields. Purely informational: nothing is validated or cleared, so
    /// callers can distinguish a pending login (partial record, redirect
    /// not yet completed) from a finished one without destroying either.
    pub fn login_completed(&self, password: &str) -> Result<Option<bool>, Error> {
        let record = match self.read_encrypted(password)? {
            Some(record) => record,
            None => return Ok(None),
        };
        Ok(Some(
            record.token.is_some() && record.salt.is_some() && record.address.is_some(),
        ))
    }

    /// Restore a full session. Returns `None` when nothing is persisted.
    ///
    /// A record that holds only the partial fields means the redirect never
    /// completed: that is `IncompleteSession`, the store is cleared, and
    /// the user logs in again - partial reconstruction is never attempted.
    pub fn restore_full(&self, password: &str) -> Result<Option<Session>, Error> {
        let record = match self.read_encrypted(password)? {
            Some(record) => record,
            None => return Ok(None),
        };

        let session = self.validate_full(&record);
        if session.is_err() {
            self.clear()?;
        }
        session.map(Some)
    }

    fn validate_full(&self, record: &SessionRecord) -> Result<Session, Error> {
        let partial = self.validate_partial(record)?;

        let raw_token = record.token.as_deref().ok_or(Error::IncompleteSession {
            missing: "identity token",
        })?;
        let salt_str = record.salt.as_deref().ok_or(Error::IncompleteSession {
            missing: "user salt",
        })?;
        let address_str = record.address.as_deref().ok_or(Error::IncompleteSession {
            missing: "address",
        })?;

        let token = IdentityToken::parse(raw_token)?;
        let user_salt = UserSalt::parse(salt_str)?;
        let address = Address::from_hex(address_str).ok_or(Error::IncompleteSession {
            missing: "well-formed address",
        })?;

        Session::resume_full(
            partial.keypair,
            partial.max_epoch,
            partial.randomness,
            token,
            user_salt,
            address,
        )
    }

    /// Wipe the persisted record. Idempotent; called on logout and on any
    /// detected corruption.
    pub fn clear(&self) -> Result<(), Error> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::Storage(err)),
        }
    }
}

// Base64 encoding/decoding helpers
mod b64 {
    use base64::{engine::general_purpose::STANDARD, Engine};

    use crate::error::Error;

    pub fn encode(data: &[u8]) -> String {
        STANDARD.encode(data)
    }

    pub fn decode(s: &str) -> Result<Vec<u8>, Error> {
        STANDARD
            .decode(s)
            .map_err(|e| Error::Crypto(format!("base64 decode error: {e}")))
    }
}
