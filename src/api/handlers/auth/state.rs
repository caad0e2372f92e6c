//! Auth state and configuration.

use anyhow::Result;
use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::{
    attempts::{AttemptTracker, DEFAULT_COOLDOWN, DEFAULT_MAX_ATTEMPTS, LockoutPolicy},
    clock::{Clock, SystemClock},
    codec::{SessionCodec, SessionKey},
    validator::CodeValidator,
};

const DEFAULT_SESSION_TTL_SECONDS: u64 = 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    secret_code: Option<SecretString>,
    session_key: Option<SecretString>,
    session_ttl_seconds: u64,
    session_cookie_secure: bool,
    max_attempts: u32,
    lockout_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            secret_code: None,
            session_key: None,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            session_cookie_secure: false,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            lockout_seconds: DEFAULT_COOLDOWN.as_secs(),
        }
    }

    #[must_use]
    pub fn with_secret_code(mut self, secret_code: Option<SecretString>) -> Self {
        self.secret_code = secret_code;
        self
    }

    #[must_use]
    pub fn with_session_key(mut self, session_key: Option<SecretString>) -> Self {
        self.session_key = session_key;
        self
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: u64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_session_cookie_secure(mut self, secure: bool) -> Self {
        self.session_cookie_secure = secure;
        self
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    #[must_use]
    pub fn with_lockout_seconds(mut self, seconds: u64) -> Self {
        self.lockout_seconds = seconds;
        self
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> u64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn session_cookie_secure(&self) -> bool {
        self.session_cookie_secure
    }

    #[must_use]
    pub fn has_secret_code(&self) -> bool {
        self.secret_code.is_some()
    }

    #[must_use]
    pub fn lockout_policy(&self) -> LockoutPolicy {
        LockoutPolicy {
            max_attempts: self.max_attempts,
            cooldown: Duration::from_secs(self.lockout_seconds),
        }
    }
}

#[derive(Debug)]
pub struct AuthState {
    config: AuthConfig,
    validator: CodeValidator,
    codec: SessionCodec,
}

impl AuthState {
    /// Build the auth state on the system clock.
    ///
    /// # Errors
    /// Returns an error if an ephemeral session key cannot be generated.
    pub fn new(config: AuthConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// # Errors
    /// Returns an error if an ephemeral session key cannot be generated.
    pub fn with_clock(config: AuthConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let key = if let Some(passphrase) = &config.session_key {
            SessionKey::from_passphrase(passphrase)
        } else {
            warn!(
                "No session key configured: using an ephemeral key, sessions will not survive a restart"
            );
            SessionKey::ephemeral()?
        };

        if config.secret_code.is_none() {
            warn!("No access code configured: every code validation will fail");
        }

        let codec = SessionCodec::new(
            key,
            Duration::from_secs(config.session_ttl_seconds),
            clock.clone(),
        );
        let tracker = AttemptTracker::new(config.lockout_policy(), clock);
        let validator = CodeValidator::new(config.secret_code.clone(), tracker);

        Ok(Self {
            config,
            validator,
            codec,
        })
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn validator(&self) -> &CodeValidator {
        &self.validator
    }

    #[must_use]
    pub fn codec(&self) -> &SessionCodec {
        &self.codec
    }
}
