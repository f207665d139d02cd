use thiserror::Error;

/// Errors raised by the encryption and password-hashing operations.
///
/// Authentication failures and expired payloads are not errors: they come
/// back as `Ok(None)` or `Ok(false)` so a caller cannot tell a bad tag from a
/// bad ciphertext.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Caller supplied an unusable argument (key size, salt length, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Input is not valid Base64 or has the wrong structure.
    #[error("malformed input: {0}")]
    Format(String),

    /// A primitive or the OS random source failed.
    #[error("cryptographic failure: {0}")]
    Cryptographic(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;

impl CryptoError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        CryptoError::InvalidArgument(msg.into())
    }

    pub(crate) fn format(msg: impl Into<String>) -> Self {
        CryptoError::Format(msg.into())
    }

    pub(crate) fn crypto(msg: impl Into<String>) -> Self {
        CryptoError::Cryptographic(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_kind() {
        assert_eq!(
            CryptoError::invalid("salt too short").to_string(),
            "invalid argument: salt too short"
        );
        assert_eq!(
            CryptoError::format("bad base64").to_string(),
            "malformed input: bad base64"
        );
        assert_eq!(
            CryptoError::crypto("rng").to_string(),
            "cryptographic failure: rng"
        );
    }
}
