use crate::error::{FtlockError, Result};
use crate::key::Key;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::rngs::OsRng;
use rand::RngCore;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

// Framing constants, shared between directions
pub const CHUNK_SIZE: usize = 65536; // 64 KiB of plaintext per segment
pub const TAG_SIZE: usize = 16;
pub const FLAG_SIZE: usize = 1;
pub const SEGMENT_OVERHEAD: usize = TAG_SIZE + FLAG_SIZE;
pub const SEALED_CHUNK_SIZE: usize = CHUNK_SIZE + SEGMENT_OVERHEAD;

/// Size of the stream header: the random nonce base, written verbatim
pub const HEADER_SIZE: usize = 16;

// Terminal marker, carried as the first plaintext byte of every segment
// so it is covered by the authentication tag.
const FLAG_MORE: u8 = 0;
const FLAG_FINAL: u8 = 1;

/// Construct the nonce for a segment: nonce_base (16 bytes) || index (8 bytes, big-endian)
fn segment_nonce(nonce_base: &[u8; HEADER_SIZE], index: u64) -> XNonce {
    let mut nonce = [0u8; 24];
    nonce[..HEADER_SIZE].copy_from_slice(nonce_base);
    nonce[HEADER_SIZE..].copy_from_slice(&index.to_be_bytes());
    nonce.into()
}

/// Read until `buf` is full or the source is exhausted.
///
/// A short return therefore always means end-of-input, which is what both
/// directions key their terminality logic on.
async fn read_full<R>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Encrypt a byte stream into the sealed segment format.
///
/// Output layout: `[nonce_base: 16][segment_1]...[segment_k]` where each
/// segment seals `[flag_byte || chunk]` under XChaCha20-Poly1305 with the
/// segment-index nonce and no associated data. Exactly the last segment
/// carries the terminal flag; a zero-byte source still yields the header
/// plus one terminal empty segment.
///
/// Terminality is decided by a one-chunk read-ahead: a chunk is final iff
/// the read that follows it returns no bytes. The source is never assumed
/// to be seekable and its size is never inspected.
///
/// Returns the number of plaintext bytes processed.
pub async fn encrypt_stream<R, W>(reader: &mut R, writer: &mut W, key: &Key) -> Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let cipher = XChaCha20Poly1305::new_from_slice(key.as_bytes())
        .map_err(|e| FtlockError::Crypto(format!("invalid key: {e}")))?;

    let mut nonce_base = [0u8; HEADER_SIZE];
    OsRng
        .try_fill_bytes(&mut nonce_base)
        .map_err(|e| FtlockError::KeyGeneration(e.to_string()))?;

    writer.write_all(&nonce_base).await?;

    let mut pending = vec![0u8; CHUNK_SIZE];
    let mut lookahead = vec![0u8; CHUNK_SIZE];
    let mut pending_len = read_full(reader, &mut pending).await?;

    let mut index: u64 = 0;
    let mut total: u64 = 0;

    loop {
        let lookahead_len = read_full(reader, &mut lookahead).await?;
        let final_segment = lookahead_len == 0;

        let mut plaintext = Vec::with_capacity(FLAG_SIZE + pending_len);
        plaintext.push(if final_segment { FLAG_FINAL } else { FLAG_MORE });
        plaintext.extend_from_slice(&pending[..pending_len]);

        let sealed = cipher
            .encrypt(&segment_nonce(&nonce_base, index), plaintext.as_slice())
            .map_err(|e| FtlockError::Crypto(format!("segment seal failed: {e}")))?;

        writer.write_all(&sealed).await?;
        total += pending_len as u64;
        index += 1;

        if final_segment {
            break;
        }
        std::mem::swap(&mut pending, &mut lookahead);
        pending_len = lookahead_len;
    }

    writer.flush().await?;
    Ok(total)
}

/// Decrypt a sealed segment stream back to its original bytes.
///
/// Stops after the terminal segment opens. Error mapping:
/// - fewer than [`HEADER_SIZE`] bytes available: [`FtlockError::TruncatedHeader`]
/// - first segment fails to open (wrong key and corrupt header are
///   indistinguishable here): [`FtlockError::InvalidKeyOrHeader`]
/// - any later segment fails to open: [`FtlockError::AuthenticationFailure`]
/// - source exhausted before a terminal flag: [`FtlockError::TruncatedStream`]
///
/// No plaintext from a failed segment is ever written to the sink.
///
/// Returns the number of plaintext bytes recovered.
pub async fn decrypt_stream<R, W>(reader: &mut R, writer: &mut W, key: &Key) -> Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let cipher = XChaCha20Poly1305::new_from_slice(key.as_bytes())
        .map_err(|e| FtlockError::Crypto(format!("invalid key: {e}")))?;

    let mut nonce_base = [0u8; HEADER_SIZE];
    if read_full(reader, &mut nonce_base).await? < HEADER_SIZE {
        return Err(FtlockError::TruncatedHeader);
    }

    let mut sealed = vec![0u8; SEALED_CHUNK_SIZE];
    let mut index: u64 = 0;
    let mut total: u64 = 0;

    loop {
        let sealed_len = read_full(reader, &mut sealed).await?;
        if sealed_len == 0 {
            // all segments so far authenticated, but none was terminal
            return Err(FtlockError::TruncatedStream);
        }

        let plaintext = cipher
            .decrypt(&segment_nonce(&nonce_base, index), &sealed[..sealed_len])
            .map_err(|_| {
                if index == 0 {
                    FtlockError::InvalidKeyOrHeader
                } else {
                    FtlockError::AuthenticationFailure
                }
            })?;

        let (flag, chunk) = plaintext
            .split_first()
            .ok_or(FtlockError::AuthenticationFailure)?;

        writer.write_all(chunk).await?;
        total += chunk.len() as u64;
        index += 1;

        if *flag == FLAG_FINAL {
            break;
        }
    }

    writer.flush().await?;
    Ok(total)
}
