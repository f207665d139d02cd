//! Encrypt-then-MAC with AES-256-CBC/PKCS7 and HMAC-SHA512.
//!
//! The tag always covers every byte that precedes it (optional clear prefix,
//! IV and ciphertext) and is checked before any block is decrypted.

use aes::Aes256;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use hmac::{Hmac, Mac};
use sha2::Sha512;
use tracing::debug;
use zeroize::Zeroizing;

use super::random::{RandomSource, random_array};
use super::{IV_LEN, KEY_LEN, TAG_LEN, constant_time_eq};
use crate::error::{CryptoError, Result};
use crate::format::Envelope;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;
type HmacSha512 = Hmac<Sha512>;

pub(crate) fn check_keys(crypt_key: &[u8], mac_key: &[u8]) -> Result<()> {
    if crypt_key.len() != KEY_LEN {
        return Err(CryptoError::invalid(format!(
            "encryption key must be {KEY_LEN} bytes, got {}",
            crypt_key.len()
        )));
    }
    if mac_key.is_empty() {
        return Err(CryptoError::invalid("MAC key must not be empty"));
    }
    Ok(())
}

/// HMAC-SHA512 of `data` under `mac_key`.
pub fn compute_tag(mac_key: &[u8], data: &[u8]) -> Result<[u8; TAG_LEN]> {
    let mut mac = <HmacSha512 as Mac>::new_from_slice(mac_key)
        .map_err(|e| CryptoError::crypto(format!("HMAC init failed: {e}")))?;
    mac.update(data);

    let mut tag = [0u8; TAG_LEN];
    tag.copy_from_slice(&mac.finalize().into_bytes());
    Ok(tag)
}

/// Recompute the tag over `data` and compare it with `sent` in constant time.
pub fn verify_tag(mac_key: &[u8], data: &[u8], sent: &[u8]) -> Result<bool> {
    let calc = Zeroizing::new(compute_tag(mac_key, data)?);
    Ok(constant_time_eq(&calc[..], sent))
}

/// Encrypt `plaintext` and return `prefix ‖ IV ‖ ciphertext ‖ tag`.
///
/// `prefix` travels in clear but is covered by the tag.
pub fn seal(
    crypt_key: &[u8],
    mac_key: &[u8],
    prefix: &[u8],
    plaintext: &[u8],
    rng: &dyn RandomSource,
) -> Result<Vec<u8>> {
    check_keys(crypt_key, mac_key)?;

    let iv: [u8; IV_LEN] = random_array(rng)?;

    let ciphertext = Aes256CbcEnc::new_from_slices(crypt_key, &iv)
        .map_err(|e| CryptoError::crypto(format!("cipher init failed: {e}")))?
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut out = Envelope::write_body(prefix, &iv, &ciphertext);
    let tag = compute_tag(mac_key, &out)?;
    out.extend_from_slice(&tag);

    Ok(out)
}

/// Verify the envelope's tag and, only if it matches, decrypt it.
///
/// Returns `Ok(None)` on tag mismatch.
pub fn open(
    crypt_key: &[u8],
    mac_key: &[u8],
    envelope: &Envelope<'_>,
) -> Result<Option<Zeroizing<Vec<u8>>>> {
    check_keys(crypt_key, mac_key)?;

    if !verify_tag(mac_key, envelope.authenticated(), envelope.tag())? {
        debug!("authentication tag mismatch, refusing to decrypt");
        return Ok(None);
    }

    let plaintext = Aes256CbcDec::new_from_slices(crypt_key, envelope.iv())
        .map_err(|e| CryptoError::crypto(format!("cipher init failed: {e}")))?
        .decrypt_padded_vec_mut::<Pkcs7>(envelope.ciphertext())
        .map_err(|_| CryptoError::crypto("decryption failed"))?;

    Ok(Some(Zeroizing::new(plaintext)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{BLOCK_LEN, OsRandom};

    const CK: [u8; KEY_LEN] = [3u8; KEY_LEN];
    const MK: [u8; 64] = [9u8; 64];

    #[test]
    fn seal_open_roundtrip() {
        let data = seal(&CK, &MK, &[], b"secret data", &OsRandom).unwrap();
        let env = Envelope::parse(&data, 0).unwrap();
        let plaintext = open(&CK, &MK, &env).unwrap().unwrap();

        assert_eq!(plaintext.as_slice(), b"secret data");
    }

    #[test]
    fn layout_is_iv_ciphertext_tag() {
        let data = seal(&CK, &MK, &[], b"0123456789abcdef", &OsRandom).unwrap();

        // 16 bytes of plaintext pad to two blocks
        assert_eq!(data.len(), IV_LEN + 2 * BLOCK_LEN + TAG_LEN);

        let body = &data[..data.len() - TAG_LEN];
        let tag = compute_tag(&MK, body).unwrap();
        assert_eq!(&data[data.len() - TAG_LEN..], &tag[..]);
    }

    #[test]
    fn prefix_is_authenticated() {
        let prefix = [0xAAu8; 8];
        let mut data = seal(&CK, &MK, &prefix, b"hello", &OsRandom).unwrap();
        assert_eq!(&data[..8], &prefix);

        data[0] ^= 0x01;
        let env = Envelope::parse(&data, 8).unwrap();
        assert!(open(&CK, &MK, &env).unwrap().is_none());
    }

    #[test]
    fn wrong_mac_key_is_rejected() {
        let data = seal(&CK, &MK, &[], b"hello", &OsRandom).unwrap();
        let env = Envelope::parse(&data, 0).unwrap();
        assert!(open(&CK, &[8u8; 64], &env).unwrap().is_none());
    }

    #[test]
    fn bad_key_sizes_are_invalid_arguments() {
        let err = seal(&[0u8; 16], &MK, &[], b"x", &OsRandom).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidArgument(_)));

        let err = seal(&CK, &[], &[], b"x", &OsRandom).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidArgument(_)));
    }

    #[test]
    fn verify_tag_rejects_truncated_tag() {
        let tag = compute_tag(&MK, b"data").unwrap();
        assert!(verify_tag(&MK, b"data", &tag).unwrap());
        assert!(!verify_tag(&MK, b"data", &tag[..63]).unwrap());
    }
}
