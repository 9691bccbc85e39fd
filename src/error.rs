use std::path::PathBuf;
use thiserror::Error;

/// Error kinds for the ftlock engine.
///
/// Fatal kinds (key lifecycle, target directory) abort the whole run;
/// the remaining kinds are per-file and recovered by the orchestrator.
#[derive(Debug, Error)]
pub enum FtlockError {
    /// The OS secure-randomness source is unavailable
    #[error("secure randomness source unavailable: {0}")]
    KeyGeneration(String),

    /// Imported key string is not exactly 64 characters
    #[error("invalid key length: expected 64 hexadecimal characters, got {0}")]
    InvalidKeyLength(usize),

    /// Imported key string contains a non-hexadecimal character
    #[error("invalid key: not a hexadecimal string")]
    InvalidKeyEncoding,

    /// Target directory does not exist
    #[error("{}: no such directory", .0.display())]
    DirectoryMissing(PathBuf),

    /// Target path exists but is not a directory
    #[error("{}: not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// A source or temporary file could not be opened
    #[error("cannot open {}: {source}", .path.display())]
    FileOpen {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Encrypted stream ends before its header is complete
    #[error("stream ends before the header is complete")]
    TruncatedHeader,

    /// The first segment failed to open: wrong key or corrupt header
    #[error("invalid key or corrupt stream header")]
    InvalidKeyOrHeader,

    /// A later segment failed to authenticate: tampering or corruption
    #[error("segment failed to authenticate: tampered or corrupt stream")]
    AuthenticationFailure,

    /// Encrypted stream ends without a terminal segment
    #[error("stream ends without a terminal segment")]
    TruncatedStream,

    /// A completed temporary file could not be renamed into place
    #[error("cannot rename into {}: {source}", .path.display())]
    Rename {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Cryptographic operation error
    #[error("cryptographic failure: {0}")]
    Crypto(String),

    /// I/O operation error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FtlockError>;
