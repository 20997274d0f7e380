use std::fmt;
use std::time::SystemTime;
use serde::{Deserialize, Serialize};
use crate::store::OtpStore;

/// Why a submitted code was accepted or rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationReason {
    /// No code was ever issued for the identifier
    NotFound,
    /// The code was issued but its ttl has elapsed
    Expired,
    /// The code is fresh but the submission differs
    Mismatch,
    /// The submission matches a fresh code
    Ok,
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ValidationReason::NotFound => "OTP not found",
            ValidationReason::Expired => "OTP expired",
            ValidationReason::Mismatch => "OTP mismatch",
            ValidationReason::Ok => "OTP validated successfully",
        };
        f.write_str(message)
    }
}

/// Outcome of validating a submitted code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the submission is accepted
    pub valid: bool,
    /// Why
    pub reason: ValidationReason,
}

impl From<ValidationReason> for ValidationResult {
    fn from(reason: ValidationReason) -> Self {
        Self {
            valid: reason == ValidationReason::Ok,
            reason,
        }
    }
}

/// Checks submitted codes against a borrowed [OtpStore] without modifying it
#[derive(Debug, Clone, Copy)]
pub struct OtpValidator<'a> {
    store: &'a OtpStore,
}

impl<'a> OtpValidator<'a> {
    /// Creates a validator over `store`
    pub fn new(store: &'a OtpStore) -> Self {
        Self { store }
    }

    /// Validate `submitted` for `identifier` at the current time
    pub fn validate(&self, identifier: impl AsRef<str>, submitted: impl AsRef<str>) -> ValidationResult {
        self.validate_at(identifier, submitted, SystemTime::now())
    }

    /// Validate `submitted` for `identifier` at `now`
    ///
    /// Existence is checked before expiry, expiry before equality. The
    /// comparison is exact and case-sensitive.
    pub fn validate_at(
        &self,
        identifier: impl AsRef<str>,
        submitted: impl AsRef<str>,
        now: SystemTime,
    ) -> ValidationResult {
        let identifier = identifier.as_ref();
        let reason = match self.store.get(identifier) {
            None => ValidationReason::NotFound,
            Some(record) if record.is_expired_at(now) => ValidationReason::Expired,
            Some(record) if record.code.as_str() == submitted.as_ref() => ValidationReason::Ok,
            Some(_) => ValidationReason::Mismatch,
        };
        tracing::trace!(identifier, ?reason, "validated OTP");
        reason.into()
    }
}
