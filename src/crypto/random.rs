use crate::error::{CryptoError, Result};
use getrandom::fill;

/// Source of cryptographically secure random bytes.
///
/// Every salt, IV and generated key is drawn through this trait.
pub trait RandomSource: Send + Sync {
    fn fill(&self, buf: &mut [u8]) -> Result<()>;
}

/// The operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    /// Fill buffer with cryptographically secure random bytes
    fn fill(&self, buf: &mut [u8]) -> Result<()> {
        fill(buf).map_err(|_| CryptoError::crypto("OS random generator unavailable"))
    }
}

/// Draw a fixed-size array from `rng`.
pub fn random_array<const N: usize>(rng: &dyn RandomSource) -> Result<[u8; N]> {
    let mut out = [0u8; N];
    rng.fill(&mut out)?;
    Ok(out)
}
