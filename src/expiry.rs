//! Mode stamp wrapped around every plaintext before encryption.
//!
//! ```text
//! plain:    MODE 0x00 (1) | PLAINTEXT
//! expiring: MODE 0x01 (1) | EXPIRES_AT unix millis, i64 BE (8) | PLAINTEXT
//! ```
//! The stamp sits inside the ciphertext, so it is covered by the tag and a
//! plain envelope can never be read back as an expiring one. All header fields
//! are fixed-size, so the plaintext may contain any byte.

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use crate::error::{CryptoError, Result};

pub const MODE_PLAIN: u8 = 0;
pub const MODE_EXPIRING: u8 = 1;
const MODE_LEN: usize = 1;
const TIME_LEN: usize = 8;
pub const HEADER_LEN: usize = MODE_LEN + TIME_LEN;

/// A decrypted payload with its stamp parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload<'a> {
    Plain(&'a [u8]),
    Expiring {
        expires_at: DateTime<Utc>,
        plaintext: &'a [u8],
    },
}

impl<'a> Payload<'a> {
    /// Read the stamp off a decrypted payload.
    ///
    /// # Errors
    ///
    /// `Cryptographic` when the stamp is missing or unknown. The payload has
    /// already passed the tag at this point, so a bad stamp means decryption
    /// produced garbage.
    pub fn parse(payload: &'a [u8]) -> Result<Self> {
        match payload.split_first() {
            Some((&MODE_PLAIN, rest)) => Ok(Payload::Plain(rest)),
            Some((&MODE_EXPIRING, rest)) if rest.len() >= TIME_LEN => {
                let (time, plaintext) = rest.split_at(TIME_LEN);
                let mut millis = [0u8; TIME_LEN];
                millis.copy_from_slice(time);

                let expires_at = DateTime::<Utc>::from_timestamp_millis(i64::from_be_bytes(millis))
                    .ok_or_else(|| CryptoError::crypto("expiration timestamp out of range"))?;
                Ok(Payload::Expiring {
                    expires_at,
                    plaintext,
                })
            }
            _ => Err(CryptoError::crypto("decrypted payload has no valid mode stamp")),
        }
    }

    /// Plaintext of an unexpired expiring payload.
    ///
    /// Plain payloads and payloads past their expiry give `None`.
    pub fn unexpired(&self, now: DateTime<Utc>) -> Option<&'a [u8]> {
        match *self {
            Payload::Plain(_) => {
                debug!("payload carries no expiration stamp");
                None
            }
            Payload::Expiring { expires_at, .. } if now > expires_at => {
                debug!(%expires_at, "payload expired");
                None
            }
            Payload::Expiring { plaintext, .. } => Some(plaintext),
        }
    }
}

/// Absolute expiry `expiration` from `now`.
pub fn expires_at(now: DateTime<Utc>, expiration: TimeDelta) -> Result<DateTime<Utc>> {
    now.checked_add_signed(expiration)
        .ok_or_else(|| CryptoError::invalid("expiration is out of range"))
}

/// Stamp `plaintext` as carrying no expiry.
pub fn wrap_plain(plaintext: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(MODE_LEN + plaintext.len());
    buf.push(MODE_PLAIN);
    buf.extend_from_slice(plaintext);
    buf
}

/// Stamp `plaintext` as valid until `expires_at`.
pub fn wrap(plaintext: &[u8], expires_at: DateTime<Utc>) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN + plaintext.len());
    buf.push(MODE_EXPIRING);
    buf.extend_from_slice(&expires_at.timestamp_millis().to_be_bytes());
    buf.extend_from_slice(plaintext);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(millis: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(millis).unwrap()
    }

    fn unexpired(payload: &[u8], now: DateTime<Utc>) -> Option<&[u8]> {
        Payload::parse(payload).unwrap().unexpired(now)
    }

    #[test]
    fn valid_until_the_instant() {
        let payload = wrap(b"secret", at(1_000));

        assert_eq!(unexpired(&payload, at(999)), Some(&b"secret"[..]));
        assert_eq!(unexpired(&payload, at(1_000)), Some(&b"secret"[..]));
        assert_eq!(unexpired(&payload, at(1_001)), None);
    }

    #[test]
    fn plaintext_may_contain_delimiters() {
        let payload = wrap(b"a|b|2024-01-01", at(5_000));
        assert_eq!(unexpired(&payload, at(0)), Some(&b"a|b|2024-01-01"[..]));
    }

    #[test]
    fn empty_plaintext_is_kept() {
        let payload = wrap(b"", at(5_000));
        assert_eq!(payload.len(), HEADER_LEN);
        assert_eq!(unexpired(&payload, at(0)), Some(&b""[..]));

        assert_eq!(Payload::parse(&wrap_plain(b"")).unwrap(), Payload::Plain(b""));
    }

    #[test]
    fn plain_stamp_never_passes_expiry_check() {
        // looks like an expiring header once the plain stamp is stripped
        let mut crafted = vec![MODE_EXPIRING];
        crafted.extend_from_slice(&4_102_444_800_000i64.to_be_bytes());
        crafted.extend_from_slice(b"admin-token");

        let payload = wrap_plain(&crafted);
        let parsed = Payload::parse(&payload).unwrap();

        assert_eq!(parsed, Payload::Plain(&crafted[..]));
        assert_eq!(parsed.unexpired(at(0)), None);
    }

    #[test]
    fn missing_or_unknown_stamp_is_rejected() {
        assert!(matches!(Payload::parse(b""), Err(CryptoError::Cryptographic(_))));
        assert!(matches!(
            Payload::parse(&[MODE_EXPIRING, 0, 0]),
            Err(CryptoError::Cryptographic(_))
        ));

        let mut payload = wrap(b"secret", at(5_000));
        payload[0] = 9;
        assert!(matches!(Payload::parse(&payload), Err(CryptoError::Cryptographic(_))));
    }

    #[test]
    fn expires_at_adds_delta() {
        let end = expires_at(at(1_000), TimeDelta::milliseconds(250)).unwrap();
        assert_eq!(end, at(1_250));
        assert!(expires_at(DateTime::<Utc>::MAX_UTC, TimeDelta::days(1)).is_err());
    }
}
