//! Error taxonomy for the auth workflows.
//!
//! Every variant maps to a structured JSON body; internal failures are
//! reported generically without leaking details.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

use crate::api::email::MailError;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum AuthError {
    /// Malformed input; carries one message per violated field.
    #[error("invalid input")]
    Validation(Vec<String>),

    #[error("email already registered")]
    DuplicateEmail,

    #[error("account not found")]
    NotFound,

    #[error("account already verified")]
    AlreadyVerified,

    #[error("no verification pending for this account")]
    NoOtpPending,

    #[error("OTP has expired, request a new one")]
    OtpExpired,

    #[error("invalid OTP")]
    InvalidOtp,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("invalid or expired reset token")]
    InvalidOrExpiredToken,

    #[error(transparent)]
    Mail(#[from] MailError),

    #[error("missing bearer token")]
    Unauthenticated,

    #[error("invalid or expired bearer token")]
    InvalidToken,

    #[error("form tampered with")]
    CsrfMismatch,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => Self::DuplicateEmail,
            StoreError::Backend(err) => Self::Internal(err),
        }
    }
}

#[derive(ToSchema, Serialize, Debug)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
}

impl AuthError {
    fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::DuplicateEmail => "duplicate_email",
            Self::NotFound => "not_found",
            Self::AlreadyVerified => "already_verified",
            Self::NoOtpPending => "no_otp_pending",
            Self::OtpExpired => "otp_expired",
            Self::InvalidOtp => "invalid_otp",
            Self::InvalidCredentials => "invalid_credentials",
            Self::InvalidOrExpiredToken => "invalid_or_expired_token",
            Self::Mail(_) => "mail_error",
            Self::Unauthenticated => "unauthenticated",
            Self::InvalidToken => "invalid_token",
            Self::CsrfMismatch => "csrf_mismatch",
            Self::Internal(_) => "internal_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::DuplicateEmail
            | Self::NotFound
            | Self::AlreadyVerified
            | Self::NoOtpPending
            | Self::OtpExpired
            | Self::InvalidOtp
            | Self::InvalidCredentials
            | Self::InvalidOrExpiredToken => StatusCode::BAD_REQUEST,
            Self::Unauthenticated | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::CsrfMismatch => StatusCode::FORBIDDEN,
            Self::Mail(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Validation(fields) => ErrorBody {
                error: self.code(),
                message: self.to_string(),
                fields: Some(fields.clone()),
            },
            Self::Mail(err) => {
                error!("mail dispatch failed: {err}");
                ErrorBody {
                    error: self.code(),
                    message: "Failed to send email".to_string(),
                    fields: None,
                }
            }
            Self::Internal(err) => {
                error!("internal error: {err:?}");
                ErrorBody {
                    error: self.code(),
                    message: "Internal server error".to_string(),
                    fields: None,
                }
            }
            _ => ErrorBody {
                error: self.code(),
                message: self.to_string(),
                fields: None,
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_match_taxonomy() {
        assert_eq!(AuthError::Validation(vec![]).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::DuplicateEmail.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::InvalidCredentials.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::CsrfMismatch.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuthError::Mail(MailError::Transport("boom".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn store_errors_map_into_auth_errors() {
        assert!(matches!(
            AuthError::from(StoreError::DuplicateEmail),
            AuthError::DuplicateEmail
        ));
        assert!(matches!(
            AuthError::from(StoreError::Backend(anyhow::anyhow!("boom"))),
            AuthError::Internal(_)
        ));
    }

    #[test]
    fn validation_body_lists_fields() {
        let response = AuthError::Validation(vec!["email: malformed".to_string()]).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn internal_error_message_is_generic() {
        let err = AuthError::Internal(anyhow::anyhow!("secret detail"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
