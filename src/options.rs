use std::time::Duration;
use serde::{Deserialize, Serialize};

/// The default number of symbols in a generated code
pub const DEFAULT_OTP_LENGTH: usize = 6;

/// The default lifetime of a generated code in milliseconds
pub const DEFAULT_OTP_TTL_MS: u64 = 300_000;

/// The longest ttl a code can be issued with, one hundred years
pub const MAX_OTP_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

const NUMERIC_CHARSET: &[u8] = b"0123456789";
const ALPHANUMERIC_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Symbol set a code is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpAlphabet {
    /// Digits `0-9`
    Numeric,
    /// Upper and lower case ASCII letters plus digits
    Alphanumeric,
}

impl OtpAlphabet {
    /// The symbols of this alphabet
    pub fn charset(&self) -> &'static [u8] {
        match self {
            OtpAlphabet::Numeric => NUMERIC_CHARSET,
            OtpAlphabet::Alphanumeric => ALPHANUMERIC_CHARSET,
        }
    }

    /// Check whether every character of `code` belongs to this alphabet
    pub fn contains_all(&self, code: &str) -> bool {
        code.bytes().all(|b| self.charset().contains(&b))
    }
}

/// Options for a single OTP generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OtpOptions {
    /// Number of symbols in the code
    pub length: usize,

    /// How long the code stays valid after generation
    ///
    /// Serialized as whole milliseconds under `ttl_ms`; any sub-millisecond
    /// part is dropped.
    #[serde(
        rename = "ttl_ms",
        serialize_with = "serialize_ttl_millis",
        deserialize_with = "deserialize_ttl_millis"
    )]
    pub ttl: Duration,

    /// Draw from letters and digits instead of digits only
    pub alphanumeric: bool,
}

impl Default for OtpOptions {
    fn default() -> Self {
        Self {
            length: DEFAULT_OTP_LENGTH,
            ttl: Duration::from_millis(DEFAULT_OTP_TTL_MS),
            alphanumeric: false,
        }
    }
}

fn serialize_ttl_millis<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let millis = u64::try_from(value.as_millis()).map_err(serde::ser::Error::custom)?;
    serializer.serialize_u64(millis)
}

fn deserialize_ttl_millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}

/// Error type for rejected generation options
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OtpOptionsError {
    /// A code must have at least one symbol
    #[error("OTP length must be greater than zero")]
    ZeroLength,
    /// A code must live for some time
    #[error("OTP ttl must be greater than zero")]
    ZeroTtl,
    /// The ttl exceeds [MAX_OTP_TTL]
    #[error("OTP ttl must not exceed {} ms", MAX_OTP_TTL.as_millis())]
    TtlTooLarge,
}

/// Error type for loading [OtpOptions] from configuration
#[derive(Debug, thiserror::Error)]
pub enum OtpConfigError {
    /// The configuration is not valid JSON for [OtpOptions]
    #[error("Failed to parse OTP options: {0}")]
    Parse(#[from] serde_json::Error),
    /// The configuration parsed but holds unusable values
    #[error("Invalid OTP options: {0}")]
    Invalid(#[from] OtpOptionsError),
}

impl OtpOptions {
    /// Creates options for codes of `length` symbols with the default ttl and numeric alphabet
    pub fn new(length: usize) -> Self {
        Self {
            length,
            ..Default::default()
        }
    }

    /// Sets the ttl
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets the ttl in milliseconds
    pub fn with_ttl_millis(self, ttl_ms: u64) -> Self {
        self.with_ttl(Duration::from_millis(ttl_ms))
    }

    /// Selects the alphanumeric alphabet when `alphanumeric` is true
    pub fn alphanumeric(mut self, alphanumeric: bool) -> Self {
        self.alphanumeric = alphanumeric;
        self
    }

    /// The alphabet these options draw from
    pub fn alphabet(&self) -> OtpAlphabet {
        if self.alphanumeric {
            OtpAlphabet::Alphanumeric
        } else {
            OtpAlphabet::Numeric
        }
    }

    /// Reject options that can only produce unusable codes or an unrepresentable expiry
    ///
    /// Generation itself accepts them (a zero length yields an empty code);
    /// this check is applied to configured defaults.
    pub fn validate(&self) -> Result<(), OtpOptionsError> {
        if self.length == 0 {
            return Err(OtpOptionsError::ZeroLength);
        }
        if self.ttl.is_zero() {
            return Err(OtpOptionsError::ZeroTtl);
        }
        if self.ttl > MAX_OTP_TTL {
            return Err(OtpOptionsError::TtlTooLarge);
        }
        Ok(())
    }

    /// Parse and validate options from a JSON object
    ///
    /// Missing fields fall back to their defaults, e.g. `{"length": 8}`.
    pub fn from_json(json: impl AsRef<str>) -> Result<Self, OtpConfigError> {
        let options: OtpOptions = serde_json::from_str(json.as_ref())?;
        options.validate()?;
        Ok(options)
    }
}
