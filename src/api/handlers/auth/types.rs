//! Request/response types for auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::validator::CodeRejection;

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct ValidateCodeRequest {
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidateCodeResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_attempts: Option<u32>,
}

impl ValidateCodeResponse {
    #[must_use]
    pub fn accepted() -> Self {
        Self {
            success: true,
            message: "Access granted".to_string(),
            locked: None,
            remaining_seconds: None,
            remaining_attempts: None,
        }
    }

    #[must_use]
    pub fn missing_code() -> Self {
        Self {
            success: false,
            message: "Access code is required".to_string(),
            locked: None,
            remaining_seconds: None,
            remaining_attempts: None,
        }
    }

    #[must_use]
    pub fn rejected(rejection: CodeRejection) -> Self {
        let message = rejection.to_string();
        match rejection {
            CodeRejection::WrongCode { remaining_attempts } => Self {
                success: false,
                message,
                locked: Some(false),
                remaining_seconds: None,
                remaining_attempts: Some(remaining_attempts),
            },
            CodeRejection::Locked {
                retry_after_seconds,
            } => Self {
                success: false,
                message,
                locked: Some(true),
                remaining_seconds: Some(retry_after_seconds),
                remaining_attempts: None,
            },
            CodeRejection::ServerMisconfigured => Self {
                success: false,
                message,
                locked: Some(false),
                remaining_seconds: None,
                remaining_attempts: None,
            },
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct SessionStatusResponse {
    pub authenticated: bool,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
