//! Authenticated symmetric encryption and password hashing.
//!
//! Messages are sealed with AES-256-CBC/PKCS7 and authenticated with
//! HMAC-SHA512 over `IV ‖ ciphertext` (encrypt-then-MAC). Passwords are
//! stored as PBKDF2 records. Every operation goes through [`Crypter`], which
//! owns nothing but its random source and KDF parameters.

pub mod crypto;
pub mod error;
pub mod expiry;
pub mod format;
pub mod password;

pub use crate::crypto::{KdfParams, OsRandom, Prf, RandomSource, constant_time_eq, derive_bytes};
pub use crate::error::{CryptoError, Result};

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;
use zeroize::{Zeroize, Zeroizing};

use crate::crypto::random::random_array;
use crate::crypto::{KEY_LEN, MAC_KEY_LEN, SALT_LEN, aead};
use crate::expiry::Payload;
use crate::format::Envelope;

/// Encryption and MAC keys used together.
pub struct SecretKeys {
    crypt_key: [u8; KEY_LEN],
    mac_key: Zeroizing<Vec<u8>>,
}

impl Drop for SecretKeys {
    fn drop(&mut self) {
        self.crypt_key.zeroize();
    }
}

impl std::fmt::Debug for SecretKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKeys").finish_non_exhaustive()
    }
}

impl SecretKeys {
    /// Wrap caller-supplied keys.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the encryption key is not 32 bytes or the MAC key
    /// is empty.
    pub fn new(crypt_key: &[u8], mac_key: &[u8]) -> Result<Self> {
        aead::check_keys(crypt_key, mac_key)?;

        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(crypt_key);
        Ok(Self {
            crypt_key: key,
            mac_key: Zeroizing::new(mac_key.to_vec()),
        })
    }

    /// Fresh random keys: 32-byte encryption key, 64-byte MAC key.
    pub fn generate(rng: &dyn RandomSource) -> Result<Self> {
        let crypt_key: Zeroizing<[u8; KEY_LEN]> = Zeroizing::new(random_array(rng)?);
        let mac_key: Zeroizing<[u8; MAC_KEY_LEN]> = Zeroizing::new(random_array(rng)?);
        Self::new(&crypt_key[..], &mac_key[..])
    }

    /// Derive both keys from a passphrase, one salt per key.
    pub fn derive(
        password: &str,
        crypt_salt: &[u8],
        mac_salt: &[u8],
        kdf: KdfParams,
    ) -> Result<Self> {
        let crypt_key = derive_bytes(password.as_bytes(), crypt_salt, kdf, KEY_LEN)?;
        let mac_key = derive_bytes(password.as_bytes(), mac_salt, kdf, MAC_KEY_LEN)?;
        Self::new(&crypt_key, &mac_key)
    }

    pub fn crypt_key(&self) -> &[u8] {
        &self.crypt_key
    }

    pub fn mac_key(&self) -> &[u8] {
        &self.mac_key
    }
}

/// Stateless encryption and password-hashing service.
///
/// Holds the random source every salt and IV is drawn from and the PBKDF2
/// parameters. Safe to share across threads.
#[derive(Debug, Clone, Default)]
pub struct Crypter<R: RandomSource = OsRandom> {
    rng: R,
    kdf: KdfParams,
}

impl Crypter<OsRandom> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kdf(kdf: KdfParams) -> Self {
        Self::with_rng(OsRandom, kdf)
    }
}

impl<R: RandomSource> Crypter<R> {
    pub fn with_rng(rng: R, kdf: KdfParams) -> Self {
        Self { rng, kdf }
    }

    pub fn kdf(&self) -> KdfParams {
        self.kdf
    }

    pub fn rng(&self) -> &R {
        &self.rng
    }

    /// PBKDF2 with this service's parameters.
    pub fn derive_bytes(
        &self,
        password: &[u8],
        salt: &[u8],
        output_len: usize,
    ) -> Result<Zeroizing<Vec<u8>>> {
        derive_bytes(password, salt, self.kdf, output_len)
    }

    /// Encrypt `plaintext` into `Base64(IV ‖ ciphertext ‖ tag)`.
    pub fn encrypt(&self, plaintext: &str, keys: &SecretKeys) -> Result<String> {
        self.seal(&expiry::wrap_plain(plaintext.as_bytes()), keys)
    }

    /// Encrypt `plaintext` so that it is only accepted until `now + expiration`.
    pub fn encrypt_with_expiration(
        &self,
        plaintext: &str,
        expiration: TimeDelta,
        keys: &SecretKeys,
    ) -> Result<String> {
        let payload = self.expiring_payload(plaintext, expiration)?;
        self.seal(&payload, keys)
    }

    /// Verify and decrypt an envelope from [`Crypter::encrypt`].
    ///
    /// `Ok(None)` means the tag did not verify; nothing was decrypted.
    ///
    /// # Errors
    ///
    /// `Format` if the envelope came from [`Crypter::encrypt_with_expiration`];
    /// those only open through [`Crypter::decrypt_with_expiration`].
    pub fn decrypt(&self, envelope: &str, keys: &SecretKeys) -> Result<Option<Zeroizing<String>>> {
        match self.open(envelope, keys)? {
            Some(payload) => plain_text(&payload).map(Some),
            None => Ok(None),
        }
    }

    /// Like [`Crypter::decrypt`], additionally enforcing the expiry.
    ///
    /// Expired or unstamped payloads give `Ok(None)`.
    pub fn decrypt_with_expiration(
        &self,
        envelope: &str,
        keys: &SecretKeys,
    ) -> Result<Option<Zeroizing<String>>> {
        self.decrypt_with_expiration_at(envelope, keys, Utc::now())
    }

    /// [`Crypter::decrypt_with_expiration`] against an explicit clock.
    pub fn decrypt_with_expiration_at(
        &self,
        envelope: &str,
        keys: &SecretKeys,
        now: DateTime<Utc>,
    ) -> Result<Option<Zeroizing<String>>> {
        match self.open(envelope, keys)? {
            Some(payload) => unexpired_text(&payload, now),
            None => Ok(None),
        }
    }

    /// Encrypt under keys derived from `password` with fresh salts.
    ///
    /// Output: `Base64(crypt_salt ‖ mac_salt ‖ IV ‖ ciphertext ‖ tag)`, the
    /// tag covering the salts too.
    pub fn encrypt_with_password(&self, plaintext: &str, password: &str) -> Result<String> {
        self.seal_with_password(&expiry::wrap_plain(plaintext.as_bytes()), password)
    }

    pub fn encrypt_with_password_and_expiration(
        &self,
        plaintext: &str,
        expiration: TimeDelta,
        password: &str,
    ) -> Result<String> {
        let payload = self.expiring_payload(plaintext, expiration)?;
        self.seal_with_password(&payload, password)
    }

    /// Decrypt an envelope from [`Crypter::encrypt_with_password`].
    ///
    /// A wrong password gives `Ok(None)`.
    pub fn decrypt_with_password(
        &self,
        envelope: &str,
        password: &str,
    ) -> Result<Option<Zeroizing<String>>> {
        match self.open_with_password(envelope, password)? {
            Some(payload) => plain_text(&payload).map(Some),
            None => Ok(None),
        }
    }

    pub fn decrypt_with_password_and_expiration(
        &self,
        envelope: &str,
        password: &str,
    ) -> Result<Option<Zeroizing<String>>> {
        self.decrypt_with_password_and_expiration_at(envelope, password, Utc::now())
    }

    pub fn decrypt_with_password_and_expiration_at(
        &self,
        envelope: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Zeroizing<String>>> {
        match self.open_with_password(envelope, password)? {
            Some(payload) => unexpired_text(&payload, now),
            None => Ok(None),
        }
    }

    /// Store `password` as `Base64(salt ‖ hash)`.
    pub fn hash_password(&self, password: &str) -> Result<String> {
        password::hash_password(password, &self.rng, self.kdf)
    }

    pub fn verify_password(&self, password: &str, stored: &str) -> Result<bool> {
        password::verify_password(password, stored, self.kdf)
    }

    /// Store `password` as `Base64(salt ‖ hash ‖ tag)`.
    pub fn hash_authenticated_password(&self, password: &str, mac_key: &[u8]) -> Result<String> {
        password::hash_authenticated_password(password, mac_key, &self.rng, self.kdf)
    }

    pub fn verify_authenticated_password(
        &self,
        password: &str,
        stored: &str,
        mac_key: &[u8],
    ) -> Result<bool> {
        password::verify_authenticated_password(password, stored, mac_key, self.kdf)
    }

    fn expiring_payload(&self, plaintext: &str, expiration: TimeDelta) -> Result<Vec<u8>> {
        let expires_at = expiry::expires_at(Utc::now(), expiration)?;
        Ok(expiry::wrap(plaintext.as_bytes(), expires_at))
    }

    fn seal(&self, payload: &[u8], keys: &SecretKeys) -> Result<String> {
        let data = aead::seal(keys.crypt_key(), keys.mac_key(), &[], payload, &self.rng)?;
        Ok(format::encode(&data))
    }

    fn open(&self, envelope: &str, keys: &SecretKeys) -> Result<Option<Zeroizing<Vec<u8>>>> {
        let data = format::decode(envelope)?;
        let parsed = Envelope::parse(&data, 0)?;
        aead::open(keys.crypt_key(), keys.mac_key(), &parsed)
    }

    fn seal_with_password(&self, payload: &[u8], password: &str) -> Result<String> {
        if password.is_empty() {
            return Err(CryptoError::invalid("password must not be empty"));
        }

        let crypt_salt: [u8; SALT_LEN] = random_array(&self.rng)?;
        let mac_salt: [u8; SALT_LEN] = random_array(&self.rng)?;
        let keys = SecretKeys::derive(password, &crypt_salt, &mac_salt, self.kdf)?;

        let prefix = [crypt_salt, mac_salt].concat();
        let data = aead::seal(keys.crypt_key(), keys.mac_key(), &prefix, payload, &self.rng)?;
        Ok(format::encode(&data))
    }

    fn open_with_password(
        &self,
        envelope: &str,
        password: &str,
    ) -> Result<Option<Zeroizing<Vec<u8>>>> {
        if password.is_empty() {
            return Err(CryptoError::invalid("password must not be empty"));
        }

        let data = format::decode(envelope)?;
        let parsed = Envelope::parse(&data, 2 * SALT_LEN)?;
        let (crypt_salt, mac_salt) = parsed.prefix().split_at(SALT_LEN);

        let keys = SecretKeys::derive(password, crypt_salt, mac_salt, self.kdf)?;
        aead::open(keys.crypt_key(), keys.mac_key(), &parsed)
    }
}

fn into_text(plaintext: &[u8]) -> Result<Zeroizing<String>> {
    match std::str::from_utf8(plaintext) {
        Ok(text) => Ok(Zeroizing::new(text.to_owned())),
        Err(_) => Err(CryptoError::crypto("decrypted data is not valid UTF-8")),
    }
}

fn plain_text(payload: &[u8]) -> Result<Zeroizing<String>> {
    match Payload::parse(payload)? {
        Payload::Plain(plaintext) => into_text(plaintext),
        Payload::Expiring { .. } => Err(CryptoError::format(
            "envelope carries an expiration stamp, decrypt it with the expiration check",
        )),
    }
}

fn unexpired_text(payload: &[u8], now: DateTime<Utc>) -> Result<Option<Zeroizing<String>>> {
    match Payload::parse(payload)?.unexpired(now) {
        Some(plaintext) => into_text(plaintext).map(Some),
        None => {
            debug!("rejecting payload outside its validity window");
            Ok(None)
        }
    }
}
