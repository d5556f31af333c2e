//! Generated API document, driven by the `#[utoipa::path]` annotations on
//! the handlers. Register new endpoints here so they show up in the spec.

use utoipa::OpenApi;

use crate::api::csrf;
use crate::api::handlers::{auth, health};
use crate::store::Role;
use crate::token::Claims;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        csrf::csrf_token,
        auth::register::register,
        auth::verify::verify_otp,
        auth::login::login,
        auth::password::request_password_reset,
        auth::password::reset_password,
        auth::session::logout,
        auth::session::protected,
    ),
    components(schemas(
        Role,
        Claims,
        csrf::CsrfTokenResponse,
        auth::errors::ErrorBody,
        auth::types::RegisterRequest,
        auth::types::VerifyOtpRequest,
        auth::types::LoginRequest,
        auth::types::RequestPasswordResetRequest,
        auth::types::ResetPasswordRequest,
        auth::types::AccountResponse,
        auth::types::TokenResponse,
        auth::types::AckResponse,
        auth::types::ClaimsResponse,
    )),
    tags(
        (name = "auth", description = "Signup, verification, login and password reset"),
        (name = "csrf", description = "Anti-forgery token issuance"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
