//! Expiry policy
//!
//! Every sequence state has a canonical lifetime. Expiry is evaluated lazily
//! when a sequence is read; there is no background sweep.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::error::{Error, Result};

/// Seconds in one hour
pub const HOUR: i64 = 60 * 60;
/// Seconds in one day
pub const DAY: i64 = 24 * HOUR;

/// Lifetime of a proposal awaiting an answer
pub const TTL_PROPOSED: i64 = HOUR;
/// Lifetime of a proposal that has been answered but not settled
pub const TTL_PENDING: i64 = DAY;
/// Default lifetime requested for a settled session
pub const TTL_SETTLED: i64 = 7 * DAY;
/// Upper bound applied to peer-requested lifetimes
pub const MAX_TTL: i64 = 100 * 365 * DAY;

/// A stored sequence with a hard expiry instant
pub trait ExpirableSequence {
    /// Topic the sequence is keyed by
    fn topic(&self) -> &str;

    fn expiry_date(&self) -> DateTime<Utc>;

    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date() <= now
    }

    fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Instant `ttl` seconds from now, with `ttl` clamped to `0..=MAX_TTL`
pub fn expiry_from_now(ttl: i64) -> DateTime<Utc> {
    Utc::now() + Duration::seconds(ttl.clamp(0, MAX_TTL))
}

/// Instant for an absolute unix timestamp in seconds
pub fn expiry_from_timestamp(timestamp: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_opt(timestamp, 0)
        .single()
        .ok_or_else(|| Error::Decoding(format!("Invalid expiry timestamp: {}", timestamp)))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(DateTime<Utc>);

    impl ExpirableSequence for Fixed {
        fn topic(&self) -> &str {
            "fixed"
        }

        fn expiry_date(&self) -> DateTime<Utc> {
            self.0
        }
    }

    #[test]
    fn test_canonical_lifetimes() {
        assert_eq!(TTL_PROPOSED, 3600);
        assert_eq!(TTL_PENDING, 86400);
        assert_eq!(TTL_SETTLED, 604800);
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let sequence = Fixed(now);
        assert!(sequence.is_expired_at(now));
        assert!(!sequence.is_expired_at(now - Duration::seconds(1)));
        assert!(!Fixed(expiry_from_now(HOUR)).is_expired_at(now));
        assert!(Fixed(expiry_from_now(-HOUR)).is_expired());
    }

    #[test]
    fn test_absolute_timestamp() {
        let expiry = expiry_from_timestamp(1_700_000_000).unwrap();
        assert_eq!(expiry.timestamp(), 1_700_000_000);
        assert!(expiry_from_timestamp(i64::MAX).is_err());
    }
}
