//! Rotating token generation and parsing.
//!
//! Derived tokens are `v2.` followed by the first 16 bytes (lowercase hex) of
//! `HMAC-SHA256(secret, bucket.to_be_bytes())`. Anything without that prefix is
//! a legacy token and can only be checked against the rotation ledger.

use chrono::{DateTime, Utc};
use db::models::meeting_session::{self, TokenScheme};
use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::{Rng, RngCore, thread_rng};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const DERIVED_PREFIX: &str = "v2.";
const DERIVED_TAG_BYTES: usize = 16;
const LEGACY_TOKEN_LEN: usize = 32;

/// `floor(unix_seconds / rotation_seconds)`.
pub fn time_bucket(now: DateTime<Utc>, rotation_seconds: i64) -> i64 {
    now.timestamp().div_euclid(rotation_seconds.max(1))
}

fn keyed(secret_hex: &str, bucket: i64) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(secret_hex.as_bytes()).expect("HMAC key");
    mac.update(&bucket.to_be_bytes());
    mac
}

/// Same `(secret, bucket)` always gives the same token.
pub fn derive_token(secret_hex: &str, bucket: i64) -> String {
    let digest = keyed(secret_hex, bucket).finalize().into_bytes();
    format!("{DERIVED_PREFIX}{}", hex::encode(&digest[..DERIVED_TAG_BYTES]))
}

/// A fresh 256-bit session secret, hex encoded.
pub fn generate_secret() -> String {
    let mut buf = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}

pub fn generate_legacy_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(LEGACY_TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Token the session shows for `bucket`. Legacy sessions get a new random value
/// every call, so callers must persist it before handing it out.
pub fn issue_for(session: &meeting_session::Model, bucket: i64) -> String {
    match session.token_scheme {
        TokenScheme::Derived => derive_token(&session.secret, bucket),
        TokenScheme::Legacy => generate_legacy_token(),
    }
}

/// A captured token, split by its format prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturedToken<'a> {
    /// Hex tag after the `v2.` prefix.
    Derived(&'a str),
    Legacy(&'a str),
}

impl<'a> CapturedToken<'a> {
    /// `None` for blank input.
    pub fn parse(raw: &'a str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        Some(match raw.strip_prefix(DERIVED_PREFIX) {
            Some(tag) => CapturedToken::Derived(tag),
            None => CapturedToken::Legacy(raw),
        })
    }
}

/// Finds the bucket within `now_bucket ± skew` whose derived tag matches.
///
/// The comparison is constant time per candidate bucket.
pub fn verify_derived(secret_hex: &str, tag_hex: &str, now_bucket: i64, skew: i64) -> Option<i64> {
    let tag = hex::decode(tag_hex.to_ascii_lowercase()).ok()?;
    if tag.len() != DERIVED_TAG_BYTES {
        return None;
    }

    let skew = skew.max(0);
    std::iter::once(now_bucket)
        .chain((1..=skew).flat_map(|d| [now_bucket - d, now_bucket + d]))
        .find(|b| keyed(secret_hex, *b).verify_truncated_left(&tag).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff";

    fn tag(token: &str) -> &str {
        token.strip_prefix(DERIVED_PREFIX).unwrap()
    }

    #[test]
    fn derivation_is_deterministic_and_bucket_sensitive() {
        let a = derive_token(SECRET, 1000);
        assert_eq!(a, derive_token(SECRET, 1000));
        assert_ne!(a, derive_token(SECRET, 1001));
        assert_ne!(a, derive_token("another-secret", 1000));
        assert!(a.starts_with(DERIVED_PREFIX));
        assert_eq!(a.len(), DERIVED_PREFIX.len() + 2 * DERIVED_TAG_BYTES);
        assert!(!a.contains(SECRET));
    }

    #[test]
    fn one_interval_of_skew_is_tolerated_each_way() {
        let b = 55_555;
        let t = derive_token(SECRET, b);
        assert_eq!(verify_derived(SECRET, tag(&t), b, 1), Some(b));
        assert_eq!(verify_derived(SECRET, tag(&t), b - 1, 1), Some(b));
        assert_eq!(verify_derived(SECRET, tag(&t), b + 1, 1), Some(b));
        assert_eq!(verify_derived(SECRET, tag(&t), b - 2, 1), None);
        assert_eq!(verify_derived(SECRET, tag(&t), b + 2, 1), None);
    }

    #[test]
    fn skew_is_configurable() {
        let b = 10;
        let t = derive_token(SECRET, b);
        assert_eq!(verify_derived(SECRET, tag(&t), b + 1, 0), None);
        assert_eq!(verify_derived(SECRET, tag(&t), b + 2, 2), Some(b));
    }

    #[test]
    fn garbage_tags_never_verify() {
        assert_eq!(verify_derived(SECRET, "zz", 1, 1), None);
        assert_eq!(verify_derived(SECRET, "abcd", 1, 1), None);
        assert_eq!(verify_derived(SECRET, "", 1, 1), None);
    }

    #[test]
    fn prefix_selects_the_format() {
        assert_eq!(CapturedToken::parse(" v2.abcd "), Some(CapturedToken::Derived("abcd")));
        assert_eq!(CapturedToken::parse("Xy12"), Some(CapturedToken::Legacy("Xy12")));
        assert_eq!(CapturedToken::parse("   "), None);
    }

    #[test]
    fn buckets_floor_towards_negative_infinity() {
        let t = DateTime::from_timestamp(90, 0).unwrap();
        assert_eq!(time_bucket(t, 45), 2);
        let t = DateTime::from_timestamp(89, 0).unwrap();
        assert_eq!(time_bucket(t, 45), 1);
        let before_epoch = DateTime::from_timestamp(-1, 0).unwrap();
        assert_eq!(time_bucket(before_epoch, 45), -1);
    }

    #[test]
    fn generated_material_has_expected_shape() {
        let s = generate_secret();
        assert_eq!(s.len(), 64);
        assert_ne!(s, generate_secret());

        let legacy = generate_legacy_token();
        assert_eq!(legacy.len(), LEGACY_TOKEN_LEN);
        assert!(!legacy.starts_with(DERIVED_PREFIX));
    }
}
