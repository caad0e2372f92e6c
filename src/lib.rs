//! # Noteora (project outreach log)
//!
//! `noteora` serves a small team that records "project outreach" entries and
//! queries them through a handful of reports (search, inactive projects,
//! follow-ups due, today's entries, recent entries).
//!
//! ## Access Control
//!
//! There are no user accounts. Everyone shares a single access code:
//!
//! - **Code validation:** `POST /api/validate-code` compares the submitted code
//!   with the configured secret. Failures are counted per client identifier and
//!   5 consecutive failures lock the client out for 60 seconds. While locked,
//!   even the correct code is rejected.
//! - **Stateless sessions:** A successful validation sets an `HttpOnly` cookie
//!   holding a ChaCha20-Poly1305 encrypted payload with its own expiry. Nothing
//!   is stored server-side, so a session cannot be revoked before it expires.
//! - **Same-origin guard:** Every gated request must either omit both `Origin`
//!   and `Referer` or carry one whose host matches `Host`.
//!
//! > **Warning:** Without `--session-key` the encryption key is generated at
//! > startup, so every restart signs all users out.
//!
//! ## Record Store
//!
//! Records live behind the [`records::RecordStore`] trait. The bundled
//! implementation keeps them in memory, optionally seeded from a JSON file.

pub mod api;
pub mod cli;
pub mod records;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
