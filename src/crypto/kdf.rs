use hmac::Hmac;
use pbkdf2::pbkdf2;
use sha1::Sha1;
use sha2::{Sha256, Sha512};
use zeroize::Zeroizing;

use super::{DEFAULT_ITERATIONS, MIN_SALT_LEN};
use crate::error::{CryptoError, Result};

/// Pseudorandom function used inside PBKDF2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Prf {
    /// HMAC-SHA1, only for records produced by older deployments.
    Sha1,
    /// HMAC-SHA256, the default.
    #[default]
    Sha256,
    /// HMAC-SHA512.
    Sha512,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    iterations: u32,
    prf: Prf,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            prf: Prf::default(),
        }
    }
}

impl KdfParams {
    pub fn new(iterations: u32, prf: Prf) -> Result<Self> {
        let params = Self { iterations, prf };
        params.validate()?;
        Ok(params)
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn prf(&self) -> Prf {
        self.prf
    }

    pub fn validate(&self) -> Result<()> {
        if self.iterations < 1 {
            return Err(CryptoError::invalid("PBKDF2 iterations must be >= 1"));
        }
        Ok(())
    }
}

/// Derive `output_len` bytes from `password` and `salt` with PBKDF2.
///
/// Deterministic for identical arguments.
pub fn derive_bytes(
    password: &[u8],
    salt: &[u8],
    params: KdfParams,
    output_len: usize,
) -> Result<Zeroizing<Vec<u8>>> {
    params.validate()?;
    if salt.len() < MIN_SALT_LEN {
        return Err(CryptoError::invalid(format!(
            "salt must be at least {MIN_SALT_LEN} bytes, got {}",
            salt.len()
        )));
    }
    if output_len == 0 {
        return Err(CryptoError::invalid("output length must be >= 1"));
    }

    let mut out = Zeroizing::new(vec![0u8; output_len]);
    let res = match params.prf {
        Prf::Sha1 => pbkdf2::<Hmac<Sha1>>(password, salt, params.iterations, &mut out),
        Prf::Sha256 => pbkdf2::<Hmac<Sha256>>(password, salt, params.iterations, &mut out),
        Prf::Sha512 => pbkdf2::<Hmac<Sha512>>(password, salt, params.iterations, &mut out),
    };
    res.map_err(|e| CryptoError::crypto(format!("PBKDF2 key derivation failed: {e}")))?;

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kdf_is_deterministic() {
        let salt = [42u8; 64];
        let kdf = KdfParams::default();

        let k1 = derive_bytes(b"password", &salt, kdf, 64).unwrap();
        let k2 = derive_bytes(b"password", &salt, kdf, 64).unwrap();

        assert_eq!(*k1, *k2);
        assert_eq!(k1.len(), 64);
    }

    #[test]
    fn kdf_params_affect_output() {
        let salt = [7u8; 16];

        let k1 = derive_bytes(b"pw", &salt, KdfParams::new(1000, Prf::Sha256).unwrap(), 32).unwrap();
        let k2 = derive_bytes(b"pw", &salt, KdfParams::new(1001, Prf::Sha256).unwrap(), 32).unwrap();
        let k3 = derive_bytes(b"pw", &salt, KdfParams::new(1000, Prf::Sha1).unwrap(), 32).unwrap();

        assert_ne!(*k1, *k2);
        assert_ne!(*k1, *k3);
    }

    #[test]
    fn salt_affects_output() {
        let kdf = KdfParams::default();
        let k1 = derive_bytes(b"pw", &[1u8; 8], kdf, 32).unwrap();
        let k2 = derive_bytes(b"pw", &[2u8; 8], kdf, 32).unwrap();
        assert_ne!(*k1, *k2);
    }

    #[test]
    fn matches_rfc6070_sha1_vector() {
        let params = KdfParams::new(4096, Prf::Sha1).unwrap();
        let out = derive_bytes(
            b"passwordPASSWORDpassword",
            b"saltSALTsaltSALTsaltSALTsaltSALTsalt",
            params,
            25,
        )
        .unwrap();
        let expected = [
            0x3d, 0x2e, 0xec, 0x4f, 0xe4, 0x1c, 0x84, 0x9b, 0x80, 0xc8, 0xd8, 0x36, 0x62, 0xc0,
            0xe4, 0x4a, 0x8b, 0x29, 0x1a, 0x96, 0x4c, 0xf2, 0xf0, 0x70, 0x38,
        ];
        assert_eq!(out.as_slice(), &expected);
    }

    #[test]
    fn short_salt_is_rejected() {
        let err = derive_bytes(b"pw", &[0u8; 7], KdfParams::default(), 32).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidArgument(_)));
    }

    #[test]
    fn kdf_invalid_params_fail_gracefully() {
        assert!(KdfParams::new(0, Prf::Sha256).is_err());
        assert!(derive_bytes(b"pw", &[0u8; 8], KdfParams::default(), 0).is_err());
    }
}
