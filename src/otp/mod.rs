//! OTP issue and verification.
//!
//! Codes are TOTP-derived from a per-challenge random secret: 6 digits over a
//! 600-second step with one adjacent window of clock-drift tolerance. The
//! orchestrator checks the stored wall-clock expiry separately before asking
//! this module to verify; both must agree for a code to be accepted.

use anyhow::{anyhow, Result};
use totp_rs::{Algorithm, Secret, TOTP};

const OTP_DIGITS: usize = 6;
const OTP_SKEW: u8 = 1;
const DEFAULT_STEP_SECONDS: u64 = 600;

#[derive(Clone, Debug)]
pub struct OtpService {
    step_seconds: u64,
}

impl OtpService {
    #[must_use]
    pub fn new() -> Self {
        Self {
            step_seconds: DEFAULT_STEP_SECONDS,
        }
    }

    #[must_use]
    pub fn with_step_seconds(mut self, seconds: u64) -> Self {
        self.step_seconds = seconds;
        self
    }

    /// Lifetime of an issued code; the orchestrator stores `now + this` as
    /// the challenge expiry.
    #[must_use]
    pub fn step_seconds(&self) -> u64 {
        self.step_seconds
    }

    fn totp(&self, secret_bytes: Vec<u8>) -> Result<TOTP> {
        TOTP::new(
            Algorithm::SHA1,
            OTP_DIGITS,
            OTP_SKEW,
            self.step_seconds,
            secret_bytes,
        )
        .map_err(|err| anyhow!("TOTP init error: {err}"))
    }

    /// Generate a fresh secret and the code for the current window.
    ///
    /// Returns `(secret_base32, code)`; the secret is persisted with the
    /// account, the code is only ever mailed to the user.
    ///
    /// # Errors
    /// Returns an error if secret generation or code derivation fails.
    pub fn issue(&self) -> Result<(String, String)> {
        let secret = Secret::generate_secret();
        let secret_bytes = secret
            .to_bytes()
            .map_err(|err| anyhow!("secret generation error: {err}"))?;
        let secret_base32 = secret.to_encoded().to_string();

        let totp = self.totp(secret_bytes)?;
        let code = totp
            .generate_current()
            .map_err(|err| anyhow!("code derivation error: {err}"))?;

        Ok((secret_base32, code))
    }

    /// Check a submitted code against a stored secret for the current and
    /// adjacent windows. Any malformed input verifies as false.
    #[must_use]
    pub fn verify(&self, code: &str, secret_base32: &str) -> bool {
        let Ok(secret_bytes) = Secret::Encoded(secret_base32.to_string()).to_bytes() else {
            return false;
        };
        let Ok(totp) = self.totp(secret_bytes) else {
            return false;
        };
        totp.check_current(code).unwrap_or(false)
    }
}

impl Default for OtpService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn issued_code_verifies_against_its_secret() -> Result<()> {
        let otp = OtpService::new();
        let (secret, code) = otp.issue()?;
        assert_eq!(code.len(), OTP_DIGITS);
        assert!(otp.verify(&code, &secret));
        Ok(())
    }

    #[test]
    fn code_does_not_verify_against_other_secret() -> Result<()> {
        let otp = OtpService::new();
        let (_, code) = otp.issue()?;
        let (other_secret, _) = otp.issue()?;
        assert!(!otp.verify(&code, &other_secret));
        Ok(())
    }

    #[test]
    fn wrong_code_fails() -> Result<()> {
        let otp = OtpService::new();
        let (secret, code) = otp.issue()?;
        // Flip one digit to guarantee a mismatch.
        let wrong: String = code
            .chars()
            .enumerate()
            .map(|(i, c)| if i == 0 { if c == '9' { '0' } else { '9' } } else { c })
            .collect();
        assert!(!otp.verify(&wrong, &secret));
        Ok(())
    }

    #[test]
    fn malformed_secret_verifies_false() {
        let otp = OtpService::new();
        assert!(!otp.verify("123456", "not base32!!"));
    }

    #[test]
    fn step_override_applies() {
        let otp = OtpService::new().with_step_seconds(30);
        assert_eq!(otp.step_seconds(), 30);
        assert_eq!(OtpService::new().step_seconds(), 600);
    }
}
