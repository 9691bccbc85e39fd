//! ftlock - educational ransomware-simulation engine
//!
//! Bulk, reversible, authenticated transformation of files in a target
//! directory: encrypts ("locks") document and media files into `.ft`
//! streams and exactly reverses the operation ("unlocks") given the
//! 256-bit key, using:
//! - XChaCha20-Poly1305 for per-segment authenticated encryption
//! - a fixed random nonce base per stream, counter-derived segment nonces
//! - an authenticated terminal marker so truncated streams never pass
//!
//! # Safety properties
//! - bounded memory: files stream through 64 KiB segments
//! - any tampering or truncation fails decryption, never garbage output
//! - per-file atomic commit (temp file + rename) or abort (temp removal)
//! - memory-safe key handling with automatic zeroization
//!
//! # Architecture
//! - `error`: error kinds and result alias
//! - `key`: key generation, hex import/export
//! - `stream`: the chunked encrypt/decrypt engine over byte streams
//! - `targets`: extension policy (target set, `.ft` marker)
//! - `locker`: directory orchestration and commit/abort handling
//!
//! # Example
//! ```rust,ignore
//! use ftlock::{Key, Locker};
//!
//! let key = Key::generate()?;
//! let summary = Locker::new("/home/infection", key, false).lock().await?;
//! println!("{} files locked", summary.processed);
//! ```

pub mod error;
pub mod key;
pub mod locker;
pub mod stream;
pub mod targets;

// Re-export commonly used types
pub use error::{FtlockError, Result};
pub use key::{Key, KEY_HEX_LEN, KEY_SIZE};
pub use locker::{Locker, Summary, KEY_FILE_NAME};
pub use stream::{decrypt_stream, encrypt_stream, CHUNK_SIZE, HEADER_SIZE};
pub use targets::{is_encrypted, is_target, ENCRYPTED_EXTENSION, TARGET_EXTENSIONS};
