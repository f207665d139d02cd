//! Byte layouts and the Base64 text boundary.
//!
//! Envelope layout:
//! ```text
//! [PREFIX] | IV (16) | CIPHERTEXT (16 * k, k >= 1) | TAG (64)
//! ```
//! Password record layout:
//! ```text
//! SALT (64) | HASH (64) [| TAG (64)]
//! ```

use base64::{Engine, engine::general_purpose::STANDARD};
use zeroize::Zeroizing;

use crate::error::{CryptoError, Result};

pub mod envelope;
pub mod record;

pub use envelope::Envelope;
pub use record::PasswordRecord;

/// Encode bytes with the standard, padded Base64 alphabet.
pub fn encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decode standard, padded Base64.
///
/// Surrounding whitespace is ignored.
pub fn decode(text: &str) -> Result<Zeroizing<Vec<u8>>> {
    STANDARD
        .decode(text.trim())
        .map(Zeroizing::new)
        .map_err(|e| CryptoError::format(format!("invalid base64: {e}")))
}
