//! API handlers for Noteora.
//!
//! `auth` owns code validation, sessions and the request gateway; `records`
//! serves the report endpoints behind that gateway.

pub mod auth;
pub mod health;
pub mod records;
pub mod root;
