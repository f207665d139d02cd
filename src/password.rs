//! Password hash records.
//!
//! A record is `Base64(salt ‖ PBKDF2(password, salt))`, optionally followed by
//! an outer HMAC-SHA512 tag over `salt ‖ hash` keyed by a separate MAC key.

use tracing::debug;
use zeroize::Zeroizing;

use crate::crypto::aead::{compute_tag, verify_tag};
use crate::crypto::random::random_array;
use crate::crypto::{HASH_LEN, KdfParams, RandomSource, SALT_LEN, constant_time_eq, derive_bytes};
use crate::error::{CryptoError, Result};
use crate::format::{self, PasswordRecord};

fn salted_record(password: &str, rng: &dyn RandomSource, kdf: KdfParams) -> Result<Vec<u8>> {
    let salt: [u8; SALT_LEN] = random_array(rng)?;
    let hash = derive_bytes(password.as_bytes(), &salt, kdf, HASH_LEN)?;
    PasswordRecord::write(&salt, &hash)
}

fn hash_matches(password: &str, record: &PasswordRecord<'_>, kdf: KdfParams) -> Result<bool> {
    let derived = derive_bytes(password.as_bytes(), record.salt(), kdf, HASH_LEN)?;
    Ok(constant_time_eq(&derived, record.hash()))
}

/// Hash `password` under a fresh 64-byte salt.
pub fn hash_password(password: &str, rng: &dyn RandomSource, kdf: KdfParams) -> Result<String> {
    let record = Zeroizing::new(salted_record(password, rng, kdf)?);
    Ok(format::encode(&record))
}

/// Check `password` against a record produced by [`hash_password`].
///
/// # Errors
///
/// Only malformed records are errors; a wrong password is `Ok(false)`.
pub fn verify_password(password: &str, stored: &str, kdf: KdfParams) -> Result<bool> {
    let data = format::decode(stored)?;
    let record = PasswordRecord::parse(&data)?;
    hash_matches(password, &record, kdf)
}

/// Hash `password` and append an outer tag keyed by `mac_key`.
pub fn hash_authenticated_password(
    password: &str,
    mac_key: &[u8],
    rng: &dyn RandomSource,
    kdf: KdfParams,
) -> Result<String> {
    if mac_key.is_empty() {
        return Err(CryptoError::invalid("MAC key must not be empty"));
    }
    let mut record = Zeroizing::new(salted_record(password, rng, kdf)?);
    let tag = compute_tag(mac_key, &record)?;
    record.extend_from_slice(&tag);
    Ok(format::encode(&record))
}

/// Check the outer tag, then the password.
///
/// A tampered record returns `Ok(false)` without running the KDF.
pub fn verify_authenticated_password(
    password: &str,
    stored: &str,
    mac_key: &[u8],
    kdf: KdfParams,
) -> Result<bool> {
    if mac_key.is_empty() {
        return Err(CryptoError::invalid("MAC key must not be empty"));
    }
    let data = format::decode(stored)?;
    let record = PasswordRecord::parse_authenticated(&data)?;

    let tag = record.tag().unwrap_or_default();
    if !verify_tag(mac_key, &record.body(), tag)? {
        debug!("password record tag mismatch");
        return Ok(false);
    }

    hash_matches(password, &record, kdf)
}
