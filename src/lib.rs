//! # Aula authentication service
//!
//! `aula` is the authentication backend for the Aula e-learning platform. It
//! handles account signup with email OTP verification, login with bearer
//! tokens, and password reset over a JSON HTTP API.
//!
//! ## Flow
//!
//! 1. **Register:** an account is created unverified and a 6-digit one-time
//!    code is emailed to the address on file.
//! 2. **Verify:** presenting the code within its 10 minute window marks the
//!    account verified and returns a bearer token.
//! 3. **Login:** verified accounts exchange email and password for a token,
//!    valid for one hour.
//! 4. **Reset:** a single-use reset link is emailed on request; only a hash
//!    of the reset token is ever persisted.
//!
//! Accounts are scoped per role, so a student and a teacher may share an
//! email address without colliding.
//!
//! State-changing requests additionally require an anti-forgery token from
//! `GET /api/csrf-token` in the `x-csrf-token` header.

pub mod api;
pub mod cli;
pub mod otp;
pub mod password;
pub mod store;
pub mod token;
