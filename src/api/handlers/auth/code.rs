//! Access code endpoint.

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{RETRY_AFTER, SET_COOKIE},
    },
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::{
    session::session_cookie,
    state::AuthState,
    types::{ValidateCodeRequest, ValidateCodeResponse},
    utils::ClientId,
    validator::CodeRejection,
};

#[utoipa::path(
    post,
    path = "/api/validate-code",
    request_body = ValidateCodeRequest,
    responses(
        (status = 200, description = "Access granted, session cookie set", body = ValidateCodeResponse),
        (status = 400, description = "Missing access code", body = ValidateCodeResponse),
        (status = 401, description = "Wrong access code", body = ValidateCodeResponse),
        (status = 403, description = "Cross-origin request", body = super::types::MessageResponse),
        (status = 429, description = "Client locked out after too many failures", body = ValidateCodeResponse),
        (status = 500, description = "Server misconfigured", body = ValidateCodeResponse)
    ),
    tag = "auth"
)]
pub async fn validate_code(
    auth_state: Extension<Arc<AuthState>>,
    ClientId(client_id): ClientId,
    payload: Result<Json<ValidateCodeRequest>, JsonRejection>,
) -> Response {
    let code = match payload {
        Ok(Json(request)) => request.code.filter(|code| !code.is_empty()),
        Err(rejection) => {
            debug!("Invalid validate-code payload: {rejection}");
            None
        }
    };
    let Some(code) = code else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ValidateCodeResponse::missing_code()),
        )
            .into_response();
    };

    if let Err(rejection) = auth_state.validator().validate(&code, &client_id) {
        return rejection_response(rejection, &client_id);
    }

    let token = match auth_state.codec().issue() {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to issue session token: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let cookie = match session_cookie(auth_state.config(), &token) {
        Ok(cookie) => cookie,
        Err(err) => {
            error!("Failed to build session cookie: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);
    (
        StatusCode::OK,
        headers,
        Json(ValidateCodeResponse::accepted()),
    )
        .into_response()
}

fn rejection_response(rejection: CodeRejection, client_id: &str) -> Response {
    let body = Json(ValidateCodeResponse::rejected(rejection));
    match rejection {
        CodeRejection::WrongCode { remaining_attempts } => {
            debug!("Wrong access code from {client_id}, {remaining_attempts} attempt(s) left");
            (StatusCode::UNAUTHORIZED, body).into_response()
        }
        CodeRejection::Locked {
            retry_after_seconds,
        } => {
            warn!("Rejected access code attempt from locked client {client_id}");
            let mut headers = HeaderMap::new();
            headers.insert(RETRY_AFTER, HeaderValue::from(retry_after_seconds));
            (StatusCode::TOO_MANY_REQUESTS, headers, body).into_response()
        }
        CodeRejection::ServerMisconfigured => {
            (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
        }
    }
}
