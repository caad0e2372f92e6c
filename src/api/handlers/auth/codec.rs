//! Stateless session tokens.
//!
//! A token is `base64url(nonce (12 bytes) || ChaCha20-Poly1305 ciphertext)` of a
//! small JSON payload carrying its own issue and expiry times. Verification needs
//! only the token and the server key; there is no session table, so a token stays
//! valid until it expires.

use anyhow::{Context, Result};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chacha20poly1305::{
    ChaCha20Poly1305, Key, Nonce,
    aead::{Aead, KeyInit, Payload},
};
use rand::{RngCore, rngs::OsRng};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::clock::Clock;

const NONCE_LEN: usize = 12;
const PAYLOAD_NONCE_LEN: usize = 16;
const TOKEN_AAD: &[u8] = b"noteora-session:v1";

/// Plaintext carried inside a session token. Times are epoch milliseconds.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SessionPayload {
    pub iat: i64,
    pub exp: i64,
    pub nonce: String,
}

/// 32-byte session encryption key.
#[derive(Clone)]
pub struct SessionKey([u8; 32]);

impl SessionKey {
    /// Derive a key from a configured passphrase.
    #[must_use]
    pub fn from_passphrase(passphrase: &SecretString) -> Self {
        let digest = Sha256::digest(passphrase.expose_secret().as_bytes());
        Self(digest.into())
    }

    /// Fresh random key. Tokens sealed with it die with the process.
    ///
    /// # Errors
    /// Returns an error if the OS random generator fails.
    pub fn ephemeral() -> Result<Self> {
        let mut bytes = [0u8; 32];
        OsRng
            .try_fill_bytes(&mut bytes)
            .context("failed to generate session key")?;
        Ok(Self(bytes))
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionKey(***)")
    }
}

pub struct SessionCodec {
    key: SessionKey,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SessionCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCodec")
            .field("key", &self.key)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl SessionCodec {
    #[must_use]
    pub fn new(key: SessionKey, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { key, ttl, clock }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn ttl_millis(&self) -> i64 {
        i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX)
    }

    /// Issue a new token valid for the configured TTL.
    ///
    /// # Errors
    /// Returns an error if randomness or encryption fails.
    #[allow(deprecated)]
    pub fn issue(&self) -> Result<String> {
        let now = self.clock.now_millis();

        let mut payload_nonce = [0u8; PAYLOAD_NONCE_LEN];
        OsRng
            .try_fill_bytes(&mut payload_nonce)
            .context("failed to generate session nonce")?;

        let payload = SessionPayload {
            iat: now,
            exp: now.saturating_add(self.ttl_millis()),
            nonce: hex::encode(payload_nonce),
        };
        let plaintext = serde_json::to_vec(&payload).context("failed to encode session")?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng
            .try_fill_bytes(&mut nonce_bytes)
            .context("failed to generate cipher nonce")?;

        let cipher = ChaCha20Poly1305::new(Key::from_slice(&self.key.0));
        let ciphertext = cipher
            .encrypt(
                Nonce::from_slice(&nonce_bytes),
                Payload {
                    msg: &plaintext,
                    aad: TOKEN_AAD,
                },
            )
            .map_err(|e| anyhow::anyhow!("Encryption failure: {e}"))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);

        Ok(URL_SAFE_NO_PAD.encode(sealed))
    }

    /// Open a token, returning its payload when it decrypts and parses.
    /// Expiry is not checked here.
    #[must_use]
    #[allow(deprecated)]
    pub fn open(&self, token: &str) -> Option<SessionPayload> {
        let sealed = URL_SAFE_NO_PAD.decode(token.trim()).ok()?;
        if sealed.len() <= NONCE_LEN {
            return None;
        }
        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);

        let cipher = ChaCha20Poly1305::new(Key::from_slice(&self.key.0));
        let plaintext = cipher
            .decrypt(
                Nonce::from_slice(nonce_bytes),
                Payload {
                    msg: ciphertext,
                    aad: TOKEN_AAD,
                },
            )
            .ok()?;

        serde_json::from_slice(&plaintext).ok()
    }

    /// True iff the token decrypts, parses and `now <= exp`.
    #[must_use]
    pub fn verify(&self, token: &str) -> bool {
        let Some(payload) = self.open(token) else {
            debug!("Session token rejected: cannot be opened");
            return false;
        };
        let valid = self.clock.now_millis() <= payload.exp;
        if !valid {
            debug!("Session token rejected: expired at {}", payload.exp);
        }
        valid
    }
}
