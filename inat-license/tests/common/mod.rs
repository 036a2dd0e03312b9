//! Shared test helpers for license tests.

#![allow(dead_code)]

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use inat_license::{ANY_MACHINE, Clock, LicenseRecord, LicenseType};

/// A clock frozen at a fixed instant.
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// A fixed reference instant well away from month boundaries.
pub fn reference_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 15, 10, 30, 0).unwrap()
}

/// The reference instant shifted by whole days.
pub fn days_later(days: i64) -> DateTime<Utc> {
    reference_instant() + Duration::days(days)
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// A professional license bound to any machine.
pub fn professional(name: &str, valid_until: NaiveDate) -> LicenseRecord {
    LicenseRecord::new(
        LicenseType::Professional,
        name,
        Some(valid_until),
        ANY_MACHINE,
    )
}

/// An enterprise license bound to a specific machine fingerprint.
pub fn enterprise_bound(name: &str, valid_until: NaiveDate, hardware_id: &str) -> LicenseRecord {
    LicenseRecord::new(
        LicenseType::Enterprise,
        name,
        Some(valid_until),
        hardware_id,
    )
}

/// Strips the prefix and hyphens, leaving the raw token body.
pub fn token_body(token: &str) -> String {
    token
        .strip_prefix("INAT-")
        .expect("token must carry the product prefix")
        .chars()
        .filter(|c| *c != '-')
        .collect()
}

/// Rebuilds a token from a (possibly tampered) body.
pub fn token_from_body(body: &str) -> String {
    format!("INAT-{body}")
}
