use std::time::SystemTime;
use compact_str::CompactString;
use crate::generator::OtpGenerator;
use crate::options::{OtpOptions, OtpOptionsError};
use crate::validator::{OtpValidator, ValidationReason, ValidationResult};

/// A stored code together with its expiry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedOtp {
    /// The code to deliver to the user
    pub code: CompactString,
    /// Absolute expiry time of the code
    pub expires_at: SystemTime,
}

/// Generates, stores and validates OTPs through a single owned [OtpGenerator]
///
/// Construct one per host application and pass it to whatever issues or
/// checks codes. The service is not synchronized; wrap it in a mutex to
/// share it between threads.
#[derive(Debug, Clone, Default)]
pub struct OtpService {
    generator: OtpGenerator,
    defaults: OtpOptions,
}

impl OtpService {
    /// Creates a service with an empty store and `defaults` for [OtpService::generate_otp]
    pub fn try_new(defaults: OtpOptions) -> Result<Self, OtpOptionsError> {
        defaults.validate()?;
        Ok(Self {
            generator: OtpGenerator::new(),
            defaults,
        })
    }

    /// Creates a service over an existing generator
    pub fn with_generator(generator: OtpGenerator, defaults: OtpOptions) -> Result<Self, OtpOptionsError> {
        defaults.validate()?;
        Ok(Self { generator, defaults })
    }

    /// The options used by [OtpService::generate_otp]
    pub fn defaults(&self) -> &OtpOptions {
        &self.defaults
    }

    /// The underlying generator
    pub fn generator(&self) -> &OtpGenerator {
        &self.generator
    }

    /// Generate and store a code for `identifier` with the default options
    pub fn generate_otp(&mut self, identifier: impl AsRef<str>) -> CompactString {
        let options = self.defaults;
        self.generate_otp_with(identifier, options)
    }

    /// Generate and store a code for `identifier`, returning only the code
    ///
    /// Any earlier code for `identifier` stops validating.
    pub fn generate_otp_with(&mut self, identifier: impl AsRef<str>, options: OtpOptions) -> CompactString {
        self.issue_otp_at(identifier, options, SystemTime::now()).code
    }

    /// Generate and store a code for `identifier`, returning the code and its expiry
    pub fn issue_otp(&mut self, identifier: impl AsRef<str>, options: OtpOptions) -> IssuedOtp {
        self.issue_otp_at(identifier, options, SystemTime::now())
    }

    /// Same as [OtpService::issue_otp] with the generation time supplied by the caller
    pub fn issue_otp_at(
        &mut self,
        identifier: impl AsRef<str>,
        options: OtpOptions,
        now: SystemTime,
    ) -> IssuedOtp {
        let identifier = identifier.as_ref();
        let otp = self.generator.generate_at(&options, now);
        self.generator.store(identifier, otp.code.clone(), otp.expires_at);
        tracing::debug!(
            identifier,
            length = options.length,
            alphanumeric = options.alphanumeric,
            ttl_ms = u64::try_from(options.ttl.as_millis()).unwrap_or(u64::MAX),
            "issued OTP"
        );
        IssuedOtp {
            code: otp.code,
            expires_at: otp.expires_at,
        }
    }

    /// Validate `submitted` for `identifier`. The record is left in place.
    pub fn validate_otp(&self, identifier: impl AsRef<str>, submitted: impl AsRef<str>) -> ValidationResult {
        self.validate_otp_at(identifier, submitted, SystemTime::now())
    }

    /// Same as [OtpService::validate_otp] at `now`
    pub fn validate_otp_at(
        &self,
        identifier: impl AsRef<str>,
        submitted: impl AsRef<str>,
        now: SystemTime,
    ) -> ValidationResult {
        OtpValidator::new(self.generator.otp_store()).validate_at(identifier, submitted, now)
    }

    /// Validate `submitted` and remove the record when it is accepted
    ///
    /// Unlike [OtpService::validate_otp], a code can succeed only once.
    pub fn consume_otp(&mut self, identifier: impl AsRef<str>, submitted: impl AsRef<str>) -> ValidationResult {
        self.consume_otp_at(identifier, submitted, SystemTime::now())
    }

    /// Same as [OtpService::consume_otp] at `now`
    pub fn consume_otp_at(
        &mut self,
        identifier: impl AsRef<str>,
        submitted: impl AsRef<str>,
        now: SystemTime,
    ) -> ValidationResult {
        let identifier = identifier.as_ref();
        let result = self.validate_otp_at(identifier, submitted, now);
        if result.reason == ValidationReason::Ok {
            self.generator.remove(identifier);
            tracing::debug!(identifier, "consumed OTP");
        }
        result
    }

    /// Drop every record expired at `now`
    pub fn purge_expired(&mut self, now: SystemTime) -> usize {
        self.generator.purge_expired(now)
    }
}
