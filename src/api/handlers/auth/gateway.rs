//! Request admission for gated routes.
//!
//! Order matters: the origin check runs first and fails closed, then the
//! session cookie is verified. Nothing downstream runs unless both pass.

use axum::{
    Json,
    extract::{Extension, Request},
    http::{HeaderMap, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::debug;

use super::{
    codec::SessionCodec, origin::is_same_origin_request, session::extract_session_token,
    state::AuthState, types::MessageResponse,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AdmissionError {
    #[error("Cross-origin request rejected")]
    CrossOrigin,
    #[error("Authentication required")]
    Unauthenticated,
}

impl IntoResponse for AdmissionError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::CrossOrigin => StatusCode::FORBIDDEN,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
        };
        (status, Json(MessageResponse::failure(self.to_string()))).into_response()
    }
}

/// Decide whether a request may reach a gated operation.
///
/// # Errors
/// `CrossOrigin` when the origin check fails, `Unauthenticated` when the
/// session cookie is missing or invalid.
pub fn admit(
    headers: &HeaderMap,
    uri: &Uri,
    codec: &SessionCodec,
) -> Result<(), AdmissionError> {
    if !is_same_origin_request(headers, uri) {
        return Err(AdmissionError::CrossOrigin);
    }
    let token = extract_session_token(headers).ok_or(AdmissionError::Unauthenticated)?;
    if codec.verify(&token) {
        Ok(())
    } else {
        Err(AdmissionError::Unauthenticated)
    }
}

/// Middleware guarding record routes.
pub async fn require_session(
    Extension(auth_state): Extension<Arc<AuthState>>,
    request: Request,
    next: Next,
) -> Response {
    match admit(request.headers(), request.uri(), auth_state.codec()) {
        Ok(()) => next.run(request).await,
        Err(err) => {
            debug!("Request to {} rejected: {err}", request.uri().path());
            err.into_response()
        }
    }
}

/// Middleware for routes that need the origin check but no session.
pub async fn require_same_origin(request: Request, next: Next) -> Response {
    if is_same_origin_request(request.headers(), request.uri()) {
        next.run(request).await
    } else {
        debug!("Cross-origin request to {} rejected", request.uri().path());
        AdmissionError::CrossOrigin.into_response()
    }
}
