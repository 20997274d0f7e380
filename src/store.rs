use std::collections::HashMap;
use std::time::SystemTime;
use compact_str::CompactString;

/// A stored OTP and the instant after which it stops validating
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpRecord {
    /// The issued code
    pub code: CompactString,
    /// Absolute expiry time
    pub expires_at: SystemTime,
}

impl OtpRecord {
    /// Whether the record is stale at `now`. A record is still valid at exactly `expires_at`.
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        now > self.expires_at
    }
}

/// Identifier to [OtpRecord] map holding at most one record per identifier
#[derive(Debug, Clone, Default)]
pub struct OtpStore {
    records: HashMap<CompactString, OtpRecord>,
}

impl OtpStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the record for `identifier`, returning the one it replaced
    pub fn insert(&mut self, identifier: impl AsRef<str>, record: OtpRecord) -> Option<OtpRecord> {
        self.records.insert(identifier.as_ref().into(), record)
    }

    /// Get the record for `identifier`
    pub fn get(&self, identifier: impl AsRef<str>) -> Option<&OtpRecord> {
        self.records.get(identifier.as_ref())
    }

    /// Remove the record for `identifier`
    pub fn remove(&mut self, identifier: impl AsRef<str>) -> Option<OtpRecord> {
        self.records.remove(identifier.as_ref())
    }

    /// Drop every record that is expired at `now` and return how many were dropped
    pub fn purge_expired(&mut self, now: SystemTime) -> usize {
        let before = self.records.len();
        self.records.retain(|_, record| !record.is_expired_at(now));
        before - self.records.len()
    }

    /// Number of stored records, expired ones included
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
