//! Shared access code validation.
//!
//! Per client the validator moves `Open -> (failures) -> Locked -> (cooldown) -> Open`.
//! A lockout is checked before the code is even looked at.

use secrecy::{ExposeSecret, SecretString};
use tracing::{error, info};

use super::attempts::{AttemptTracker, FailureOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CodeRejection {
    #[error("Invalid access code. {remaining_attempts} attempt(s) remaining.")]
    WrongCode { remaining_attempts: u32 },
    #[error(
        "Too many failed attempts. Please wait {retry_after_seconds} seconds before trying again."
    )]
    Locked { retry_after_seconds: u64 },
    #[error("Server configuration error. Please contact administrator.")]
    ServerMisconfigured,
}

pub struct CodeValidator {
    secret_code: Option<SecretString>,
    tracker: AttemptTracker,
}

impl std::fmt::Debug for CodeValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeValidator")
            .field("secret_code", &self.secret_code.as_ref().map(|_| "***"))
            .field("tracker", &self.tracker)
            .finish()
    }
}

impl CodeValidator {
    #[must_use]
    pub fn new(secret_code: Option<SecretString>, tracker: AttemptTracker) -> Self {
        Self {
            secret_code,
            tracker,
        }
    }

    #[must_use]
    pub fn tracker(&self) -> &AttemptTracker {
        &self.tracker
    }

    /// Check `code` for `client_id`, updating the client's attempt history.
    ///
    /// # Errors
    /// Returns the reason the code was not accepted.
    pub fn validate(&self, code: &str, client_id: &str) -> Result<(), CodeRejection> {
        let mut attempts = self.tracker.lock();
        attempts.sweep();

        if let Some(locked_until) = attempts.locked_until(client_id) {
            let remaining_millis = locked_until.saturating_sub(attempts.now());
            return Err(CodeRejection::Locked {
                retry_after_seconds: ceil_seconds(remaining_millis),
            });
        }

        let Some(secret_code) = &self.secret_code else {
            error!("No access code configured, rejecting validation");
            return Err(CodeRejection::ServerMisconfigured);
        };

        if code == secret_code.expose_secret() {
            attempts.record_success(client_id);
            info!("Access code accepted for {client_id}");
            return Ok(());
        }

        match attempts.record_failure(client_id) {
            FailureOutcome::Counted { remaining_attempts } => {
                Err(CodeRejection::WrongCode { remaining_attempts })
            }
            FailureOutcome::LockedOut { .. } => Err(CodeRejection::Locked {
                retry_after_seconds: self.tracker.policy().cooldown_seconds(),
            }),
        }
    }
}

fn ceil_seconds(millis: i64) -> u64 {
    let millis = u64::try_from(millis).unwrap_or(0);
    millis.div_ceil(1000)
}
