//! One-time passcodes used for signup verification and password resets.
//!
//! The backend generates and delivers codes; this type only guarantees that
//! what we forward has the right shape.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Number of digits in an OTP.
pub const OTP_LENGTH: usize = 6;

/// Errors that can occur when parsing an [`OtpCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OtpError {
    #[error("code must be exactly 6 digits")]
    WrongLength,
    #[error("code must contain only digits")]
    NonDigit,
}

/// A six digit one-time passcode.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OtpCode(String);

impl OtpCode {
    /// Parse a code, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`OtpError`] if the code is not exactly six ASCII digits.
    pub fn parse(s: &str) -> Result<Self, OtpError> {
        let trimmed = s.trim();
        if trimmed.chars().count() != OTP_LENGTH {
            return Err(OtpError::WrongLength);
        }
        if !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(OtpError::NonDigit);
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Codes are credentials; keep them out of logs.
impl fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OtpCode(******)")
    }
}

impl TryFrom<String> for OtpCode {
    type Error = OtpError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<OtpCode> for String {
    fn from(code: OtpCode) -> Self {
        code.0
    }
}

/// What an OTP was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    SignupVerification,
    PasswordReset,
}
