//! Cryptographic primitives.
//!
//! Provides the random source, PBKDF2 key derivation, constant-time
//! comparison and the AES-256-CBC + HMAC-SHA512 construction.

pub mod aead;
pub mod ct;
pub mod kdf;
pub mod random;

pub use aead::{open, seal};
pub use ct::constant_time_eq;
pub use kdf::{KdfParams, Prf, derive_bytes};
pub use random::{OsRandom, RandomSource};

/// Length of salts (64 bytes / 512 bits).
pub const SALT_LEN: usize = 64;
/// Smallest salt accepted by the KDF.
pub const MIN_SALT_LEN: usize = 8;
/// Length of the CBC initialization vector (one AES block).
pub const IV_LEN: usize = 16;
/// AES block size.
pub const BLOCK_LEN: usize = 16;
/// Length of the encryption key (32 bytes / 256 bits).
pub const KEY_LEN: usize = 32;
/// Length of an HMAC-SHA512 tag.
pub const TAG_LEN: usize = 64;
/// Length of a password hash.
pub const HASH_LEN: usize = 64;
/// Length of MAC keys produced by key generation and password derivation.
pub const MAC_KEY_LEN: usize = 64;
/// Default PBKDF2 iteration count.
pub const DEFAULT_ITERATIONS: u32 = 10_000;
