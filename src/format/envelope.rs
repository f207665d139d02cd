use crate::crypto::{BLOCK_LEN, IV_LEN, TAG_LEN};
use crate::error::{CryptoError, Result};

/// Borrowed view over a parsed authenticated envelope.
#[derive(Debug, Clone, Copy)]
pub struct Envelope<'a> {
    prefix: &'a [u8],
    iv: &'a [u8],
    ciphertext: &'a [u8],
    tag: &'a [u8],
    authenticated: &'a [u8],
}

impl<'a> Envelope<'a> {
    /// Smallest envelope carrying a `prefix_len`-byte clear prefix.
    pub const fn min_len(prefix_len: usize) -> usize {
        prefix_len + IV_LEN + BLOCK_LEN + TAG_LEN
    }

    /// Split `data` into prefix, IV, ciphertext and tag.
    ///
    /// # Errors
    ///
    /// Returns a format error if the data is too short or the ciphertext is
    /// not a whole number of blocks.
    pub fn parse(data: &'a [u8], prefix_len: usize) -> Result<Self> {
        if data.len() < Self::min_len(prefix_len) {
            return Err(CryptoError::format(format!(
                "envelope too short: {} bytes",
                data.len()
            )));
        }

        let (authenticated, tag) = data.split_at(data.len() - TAG_LEN);
        let (prefix, rest) = authenticated.split_at(prefix_len);
        let (iv, ciphertext) = rest.split_at(IV_LEN);

        if ciphertext.len() % BLOCK_LEN != 0 {
            return Err(CryptoError::format(
                "ciphertext is not a multiple of the block size",
            ));
        }

        Ok(Self {
            prefix,
            iv,
            ciphertext,
            tag,
            authenticated,
        })
    }

    /// Concatenate `prefix ‖ iv ‖ ciphertext`, leaving room for the tag.
    pub fn write_body(prefix: &[u8], iv: &[u8], ciphertext: &[u8]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(prefix.len() + iv.len() + ciphertext.len() + TAG_LEN);
        buf.extend_from_slice(prefix);
        buf.extend_from_slice(iv);
        buf.extend_from_slice(ciphertext);
        buf
    }

    pub fn prefix(&self) -> &'a [u8] {
        self.prefix
    }

    pub fn iv(&self) -> &'a [u8] {
        self.iv
    }

    pub fn ciphertext(&self) -> &'a [u8] {
        self.ciphertext
    }

    pub fn tag(&self) -> &'a [u8] {
        self.tag
    }

    /// Everything the tag covers.
    pub fn authenticated(&self) -> &'a [u8] {
        self.authenticated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_regions() {
        let mut data = vec![1u8; 4];
        data.extend_from_slice(&[2u8; IV_LEN]);
        data.extend_from_slice(&[3u8; 2 * BLOCK_LEN]);
        data.extend_from_slice(&[4u8; TAG_LEN]);

        let env = Envelope::parse(&data, 4).unwrap();

        assert_eq!(env.prefix(), &[1u8; 4]);
        assert_eq!(env.iv(), &[2u8; IV_LEN]);
        assert_eq!(env.ciphertext().len(), 2 * BLOCK_LEN);
        assert_eq!(env.tag(), &[4u8; TAG_LEN]);
        assert_eq!(env.authenticated().len(), 4 + IV_LEN + 2 * BLOCK_LEN);
    }

    #[test]
    fn too_short_fails() {
        let data = vec![0u8; Envelope::min_len(0) - 1];
        assert!(matches!(
            Envelope::parse(&data, 0),
            Err(CryptoError::Format(_))
        ));
    }

    #[test]
    fn partial_block_fails() {
        let data = vec![0u8; Envelope::min_len(0) + 5];
        assert!(Envelope::parse(&data, 0).is_err());
    }

    #[test]
    fn write_body_concatenates() {
        let body = Envelope::write_body(b"ab", b"cd", b"ef");
        assert_eq!(body, b"abcdef");
    }
}
