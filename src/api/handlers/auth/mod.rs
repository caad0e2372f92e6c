//! Auth handlers and supporting modules.
//!
//! Access is granted by a shared access code, not per-user credentials.
//!
//! ## Brute-force protection
//!
//! Failed validations are tracked per client identifier (first `X-Forwarded-For`
//! entry, `X-Real-IP`, socket peer, or `"unknown"`).
//!
//! - **Attempt Limit:** 5 consecutive failures.
//! - **Lockout:** 60 seconds, during which even the correct code is rejected.
//!
//! Clients whose address cannot be derived share the `"unknown"` bucket and
//! therefore one lockout budget.
//!
//! ## Sessions
//!
//! Sessions are encrypted, self-expiring cookies (see [`SessionCodec`]). The gateway
//! middleware checks the origin and then the cookie on every record route.

mod attempts;
pub mod clock;
pub(crate) mod code;
mod codec;
pub mod gateway;
mod origin;
pub(crate) mod session;
mod state;
pub(crate) mod types;
mod utils;
mod validator;

pub use attempts::{
    AttemptRecord, AttemptStore, AttemptTracker, FailureOutcome, LockoutPolicy, MemoryAttemptStore,
};
pub use codec::{SessionCodec, SessionKey, SessionPayload};
pub use gateway::{AdmissionError, admit};
pub use origin::{is_same_origin, is_same_origin_request};
pub use state::{AuthConfig, AuthState};
pub use utils::{ClientId, UNKNOWN_CLIENT, client_id};
pub use validator::{CodeRejection, CodeValidator};
