use crate::error::{FtlockError, Result};
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Key material length in bytes
pub const KEY_SIZE: usize = 32;

/// Length of the hex-encoded key
pub const KEY_HEX_LEN: usize = KEY_SIZE * 2;

/// The 256-bit symmetric key driving one run.
///
/// Either freshly generated (lock mode) or reconstructed from the user's
/// 64-character hex string (unlock mode); never constructed partially.
/// Zeroed on drop, not `Clone`, and redacted in debug output so it can
/// never leak through logs or panic messages.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Key {
    bytes: [u8; KEY_SIZE],
}

impl Key {
    /// Generate a fresh key from the OS CSPRNG.
    ///
    /// Fails only if the secure-randomness source is unavailable, which
    /// callers treat as fatal: no key means no safe operation.
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; KEY_SIZE];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| FtlockError::KeyGeneration(e.to_string()))?;
        Ok(Self { bytes })
    }

    /// Import a key from its 64-character hexadecimal form.
    ///
    /// Rejects anything that is not exactly 64 hex digits; both error
    /// kinds are raised before any file is touched.
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let len = hex_str.chars().count();
        if len != KEY_HEX_LEN {
            return Err(FtlockError::InvalidKeyLength(len));
        }

        let mut decoded = hex::decode(hex_str).map_err(|_| FtlockError::InvalidKeyEncoding)?;
        let mut bytes = [0u8; KEY_SIZE];
        bytes.copy_from_slice(&decoded);
        decoded.zeroize();

        Ok(Self { bytes })
    }

    /// Lowercase hex encoding, always 64 characters; round-trips through
    /// [`Key::from_hex`].
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Borrow the raw key material for cipher construction.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

// Do NOT implement Clone: one key buffer per run, no stray copies.
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key").field("bytes", &"<redacted>").finish()
    }
}
