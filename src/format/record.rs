use crate::crypto::{HASH_LEN, SALT_LEN, TAG_LEN};
use crate::error::{CryptoError, Result};

/// Length of a plain `salt ‖ hash` record.
pub const RECORD_LEN: usize = SALT_LEN + HASH_LEN;
/// Length of a record carrying an outer tag.
pub const AUTHENTICATED_RECORD_LEN: usize = RECORD_LEN + TAG_LEN;

/// Borrowed view over a stored password record.
///
/// The salt always comes first, then the hash, then the optional tag.
#[derive(Debug, Clone, Copy)]
pub struct PasswordRecord<'a> {
    salt: &'a [u8],
    hash: &'a [u8],
    tag: Option<&'a [u8]>,
}

impl<'a> PasswordRecord<'a> {
    /// Parse a `salt ‖ hash` record.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if data.len() != RECORD_LEN {
            return Err(CryptoError::format(format!(
                "password record must be {RECORD_LEN} bytes, got {}",
                data.len()
            )));
        }
        let (salt, hash) = data.split_at(SALT_LEN);
        Ok(Self {
            salt,
            hash,
            tag: None,
        })
    }

    /// Parse a `salt ‖ hash ‖ tag` record.
    pub fn parse_authenticated(data: &'a [u8]) -> Result<Self> {
        if data.len() != AUTHENTICATED_RECORD_LEN {
            return Err(CryptoError::format(format!(
                "authenticated password record must be {AUTHENTICATED_RECORD_LEN} bytes, got {}",
                data.len()
            )));
        }
        let (body, tag) = data.split_at(RECORD_LEN);
        let mut record = Self::parse(body)?;
        record.tag = Some(tag);
        Ok(record)
    }

    pub fn write(salt: &[u8; SALT_LEN], hash: &[u8]) -> Result<Vec<u8>> {
        if hash.len() != HASH_LEN {
            return Err(CryptoError::invalid(format!(
                "hash must be {HASH_LEN} bytes, got {}",
                hash.len()
            )));
        }
        let mut buf = Vec::with_capacity(AUTHENTICATED_RECORD_LEN);
        buf.extend_from_slice(salt);
        buf.extend_from_slice(hash);
        Ok(buf)
    }

    pub fn salt(&self) -> &'a [u8] {
        self.salt
    }

    pub fn hash(&self) -> &'a [u8] {
        self.hash
    }

    pub fn tag(&self) -> Option<&'a [u8]> {
        self.tag
    }

    /// The bytes covered by the outer tag.
    pub fn body(&self) -> Vec<u8> {
        [self.salt, self.hash].concat()
    }
}
