use std::time::{Duration, SystemTime};
use compact_str::CompactString;
use rand::Rng;
use crate::options::{MAX_OTP_TTL, OtpAlphabet, OtpOptions};
use crate::store::{OtpRecord, OtpStore};

/// A freshly generated code that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedOtp {
    /// The code
    pub code: CompactString,
    /// `now + ttl` at generation time
    pub expires_at: SystemTime,
}

/// Draw `length` symbols from `alphabet`, uniformly and with replacement
pub fn random_code(length: usize, alphabet: OtpAlphabet) -> CompactString {
    random_code_with_rng(&mut rand::rng(), length, alphabet)
}

/// Same as [random_code] with a custom rng
pub fn random_code_with_rng(
    rng: &mut impl Rng,
    length: usize,
    alphabet: OtpAlphabet,
) -> CompactString {
    let charset = alphabet.charset();
    (0..length)
        .map(|_| charset[rng.random_range(0..charset.len())] as char)
        .collect()
}

/// `now + ttl`, capped at `now + MAX_OTP_TTL`. Falls back to `now` when even the cap overflows.
fn expiry_after(now: SystemTime, ttl: Duration) -> SystemTime {
    now.checked_add(ttl)
        .or_else(|| now.checked_add(MAX_OTP_TTL))
        .unwrap_or(now)
}

/// OTP generator. Owns the store every issued code is kept in.
#[derive(Debug, Clone, Default)]
pub struct OtpGenerator {
    store: OtpStore,
}

impl OtpGenerator {
    /// Creates a generator with an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a generator over an existing store
    pub fn with_store(store: OtpStore) -> Self {
        Self { store }
    }

    /// Generate a code expiring `options.ttl` from now
    pub fn generate(&self, options: &OtpOptions) -> GeneratedOtp {
        self.generate_at(options, SystemTime::now())
    }

    /// Generate a code expiring `options.ttl` after `now`
    pub fn generate_at(&self, options: &OtpOptions, now: SystemTime) -> GeneratedOtp {
        self.generate_with_rng(&mut rand::rng(), options, now)
    }

    /// Generate a code with a custom rng
    ///
    /// A zero `length` yields an empty code. A ttl too large to add to `now`
    /// is capped at [MAX_OTP_TTL].
    pub fn generate_with_rng(
        &self,
        rng: &mut impl Rng,
        options: &OtpOptions,
        now: SystemTime,
    ) -> GeneratedOtp {
        GeneratedOtp {
            code: random_code_with_rng(rng, options.length, options.alphabet()),
            expires_at: expiry_after(now, options.ttl),
        }
    }

    /// Store `code` for `identifier`, replacing any previous record
    pub fn store(&mut self, identifier: impl AsRef<str>, code: CompactString, expires_at: SystemTime) {
        let identifier = identifier.as_ref();
        let replaced = self.store.insert(identifier, OtpRecord { code, expires_at });
        if replaced.is_some() {
            tracing::debug!(identifier, "replaced existing OTP record");
        }
    }

    /// Get the record stored for `identifier`
    pub fn lookup(&self, identifier: impl AsRef<str>) -> Option<&OtpRecord> {
        self.store.get(identifier)
    }

    /// Remove the record stored for `identifier`
    pub fn remove(&mut self, identifier: impl AsRef<str>) -> Option<OtpRecord> {
        self.store.remove(identifier)
    }

    /// Drop records expired at `now`
    pub fn purge_expired(&mut self, now: SystemTime) -> usize {
        let purged = self.store.purge_expired(now);
        if purged > 0 {
            tracing::info!(purged, remaining = self.store.len(), "purged expired OTP records");
        }
        purged
    }

    /// Read-only view of the store, as handed to validators
    pub fn otp_store(&self) -> &OtpStore {
        &self.store
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn numeric_code_has_requested_length() {
        let generator = OtpGenerator::new();
        for length in [1, 4, 6, 12] {
            let otp = generator.generate(&OtpOptions::new(length));
            assert_eq!(otp.code.len(), length);
            assert!(OtpAlphabet::Numeric.contains_all(&otp.code));
        }
    }

    #[test]
    fn alphanumeric_code_stays_in_alphabet() {
        let generator = OtpGenerator::new();
        let options = OtpOptions::new(64).alphanumeric(true);
        for _ in 0..20 {
            let otp = generator.generate(&options);
            assert_eq!(otp.code.len(), 64);
            assert!(OtpAlphabet::Alphanumeric.contains_all(&otp.code));
        }
    }

    #[test]
    fn alphanumeric_draws_letters() {
        // 10 000 draws from 62 symbols without a single letter would be astronomically unlikely
        let code = random_code(10_000, OtpAlphabet::Alphanumeric);
        assert!(code.chars().any(|c| c.is_ascii_lowercase()));
        assert!(code.chars().any(|c| c.is_ascii_uppercase()));
    }

    #[test]
    fn zero_length_yields_empty_code() {
        let otp = OtpGenerator::new().generate(&OtpOptions::new(0));
        assert!(otp.code.is_empty());
    }

    #[test]
    fn expiry_is_now_plus_ttl() {
        let now = SystemTime::now();
        let options = OtpOptions::new(6).with_ttl_millis(1_000);
        let otp = OtpGenerator::new().generate_at(&options, now);
        assert_eq!(otp.expires_at, now + Duration::from_millis(1_000));
    }

    #[test]
    fn expiry_tracks_wall_clock() {
        let before = SystemTime::now();
        let otp = OtpGenerator::new().generate(&OtpOptions::default());
        let after = SystemTime::now();
        let ttl = Duration::from_millis(300_000);
        assert!(otp.expires_at >= before + ttl);
        assert!(otp.expires_at <= after + ttl);
    }

    #[test]
    fn huge_ttl_is_capped_instead_of_overflowing() {
        let now = SystemTime::now();
        let options = OtpOptions::new(6).with_ttl(Duration::MAX);
        let otp = OtpGenerator::new().generate_at(&options, now);
        assert_eq!(otp.expires_at, now + MAX_OTP_TTL);

        let mut service = crate::service::OtpService::default();
        let code = service.generate_otp_with("user1", options);
        assert!(service.validate_otp("user1", &code).valid);
    }

    #[test]
    fn seeded_rng_is_deterministic() {
        let generator = OtpGenerator::new();
        let now = SystemTime::now();
        let options = OtpOptions::new(8).alphanumeric(true);
        let a = generator.generate_with_rng(&mut StdRng::seed_from_u64(7), &options, now);
        let b = generator.generate_with_rng(&mut StdRng::seed_from_u64(7), &options, now);
        assert_eq!(a, b);
    }

    #[test]
    fn generate_does_not_touch_store() {
        let generator = OtpGenerator::new();
        let _ = generator.generate(&OtpOptions::default());
        assert!(generator.otp_store().is_empty());
    }

    #[test]
    fn store_and_lookup() {
        let mut generator = OtpGenerator::new();
        let otp = generator.generate(&OtpOptions::default());
        generator.store("user1", otp.code.clone(), otp.expires_at);

        let record = generator.lookup("user1").unwrap();
        assert_eq!(record.code, otp.code);
        assert_eq!(record.expires_at, otp.expires_at);
        assert!(generator.lookup("user2").is_none());
    }

    #[test]
    fn store_overwrites() {
        let mut generator = OtpGenerator::new();
        let now = SystemTime::now();
        generator.store("user1", "111111".into(), now);
        generator.store("user1", "222222".into(), now);
        assert_eq!(generator.otp_store().len(), 1);
        assert_eq!(generator.lookup("user1").unwrap().code.as_str(), "222222");
    }
}
