use crate::error::{FtlockError, Result};
use crate::key::Key;
use crate::stream;
use crate::targets;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{BufReader, BufWriter};
use tracing::{info, warn};

/// Fixed name of the key file written at lock time
pub const KEY_FILE_NAME: &str = "encryption_key.txt";

const TMP_SUFFIX: &str = ".tmp";

/// Outcome of one directory pass. Per-file results are independent;
/// a failed file never aborts the pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Files successfully transformed
    pub processed: usize,
    /// Files reported as already in the other form and left alone
    pub skipped: usize,
    /// Files that failed and were left in their pre-operation state
    pub failed: usize,
}

enum Direction {
    Encrypt,
    Decrypt,
}

/// Drives the stream engine over a directory: selects candidate files by
/// extension policy and commits each one atomically (temp file + rename)
/// or aborts it (temp file removal), one file at a time.
///
/// Owns the run's [`Key`]; the key is read-only once the locker is built.
pub struct Locker {
    root: PathBuf,
    key: Key,
    silent: bool,
    key_file: PathBuf,
}

impl Locker {
    pub fn new(root: impl Into<PathBuf>, key: Key, silent: bool) -> Self {
        Self {
            root: root.into(),
            key,
            silent,
            key_file: PathBuf::from(KEY_FILE_NAME),
        }
    }

    /// Override where the key file is written on lock. Defaults to
    /// [`KEY_FILE_NAME`] in the process working directory.
    pub fn key_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.key_file = path.into();
        self
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    async fn check_root(&self) -> Result<()> {
        match fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(FtlockError::NotADirectory(self.root.clone())),
            Err(_) => Err(FtlockError::DirectoryMissing(self.root.clone())),
        }
    }

    /// Encrypt every target-extension file in the root directory.
    ///
    /// The key is persisted in hex form to the key file before any file is
    /// touched, so the user can always recover what was encrypted. Files
    /// already carrying the marker extension are reported and left alone;
    /// non-target files are ignored.
    pub async fn lock(&self) -> Result<Summary> {
        self.check_root().await?;

        let mut key_hex = self.key.to_hex();
        key_hex.push('\n');
        fs::write(&self.key_file, key_hex).await?;
        if !self.silent {
            info!(path = %self.key_file.display(), "encryption key written");
        }

        let mut summary = Summary::default();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !entry.file_type().await?.is_file() {
                continue;
            }

            if targets::is_target(&path) {
                match self.encrypt_file(&path).await {
                    Ok(bytes) => {
                        summary.processed += 1;
                        if !self.silent {
                            info!(file = %path.display(), bytes, "encrypted");
                        }
                    }
                    Err(err) => {
                        summary.failed += 1;
                        if !self.silent {
                            warn!(file = %path.display(), %err, "cannot encrypt file");
                        }
                    }
                }
            } else if targets::is_encrypted(&path) {
                summary.skipped += 1;
                if !self.silent {
                    info!(file = %path.display(), "file already encrypted");
                }
            }
        }
        Ok(summary)
    }

    /// Decrypt every marker-extension file in the root directory.
    ///
    /// Target-extension files (already plaintext) are reported and left
    /// alone. A failed decrypt leaves the encrypted file untouched and no
    /// temp file behind, so it is always safely retryable.
    pub async fn unlock(&self) -> Result<Summary> {
        self.check_root().await?;

        let mut summary = Summary::default();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !entry.file_type().await?.is_file() {
                continue;
            }

            if targets::is_encrypted(&path) {
                match self.decrypt_file(&path).await {
                    Ok(bytes) => {
                        summary.processed += 1;
                        if !self.silent {
                            info!(file = %path.display(), bytes, "decrypted");
                        }
                    }
                    Err(err) => {
                        summary.failed += 1;
                        if !self.silent {
                            warn!(file = %path.display(), %err, "cannot decrypt file");
                        }
                    }
                }
            } else if targets::is_target(&path) {
                summary.skipped += 1;
                if !self.silent {
                    info!(file = %path.display(), "file is not encrypted");
                }
            }
        }
        Ok(summary)
    }

    /// Encrypt one file into `<name>.ft` via a sibling temp file.
    ///
    /// Commit order is delete-original-then-rename, matching the tool this
    /// simulates; a crash between the two steps can lose the file. See
    /// DESIGN.md for why that window is kept rather than closed.
    async fn encrypt_file(&self, path: &Path) -> Result<u64> {
        let tmp_path = append_suffix(path, TMP_SUFFIX);
        let final_path = append_suffix(path, &format!(".{}", targets::ENCRYPTED_EXTENSION));

        let bytes = match self.transform(path, &tmp_path, Direction::Encrypt).await {
            Ok(bytes) => bytes,
            Err(err) => {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(err);
            }
        };

        if let Err(err) = fs::remove_file(path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(err.into());
        }
        // the original is gone from here on; the temp file is the only copy,
        // so it is never cleaned up on a rename failure
        fs::rename(&tmp_path, &final_path)
            .await
            .map_err(|source| FtlockError::Rename {
                path: final_path.clone(),
                source,
            })?;

        Ok(bytes)
    }

    /// Decrypt one `.ft` file back to its original name via a sibling temp
    /// file. Any failure removes the temp file and leaves the encrypted
    /// source untouched.
    async fn decrypt_file(&self, path: &Path) -> Result<u64> {
        let final_path = path.with_extension(""); // strip the marker
        let tmp_path = append_suffix(&final_path, TMP_SUFFIX);

        let bytes = match self.transform(path, &tmp_path, Direction::Decrypt).await {
            Ok(bytes) => bytes,
            Err(err) => {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(err);
            }
        };

        if let Err(err) = fs::remove_file(path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(err.into());
        }
        fs::rename(&tmp_path, &final_path)
            .await
            .map_err(|source| FtlockError::Rename {
                path: final_path.clone(),
                source,
            })?;

        Ok(bytes)
    }

    /// Run the stream engine from `source` into `dest`, closing both
    /// handles (with the destination synced) before returning, so the
    /// caller is free to rename or delete either path.
    async fn transform(&self, source: &Path, dest: &Path, direction: Direction) -> Result<u64> {
        let source_file = File::open(source).await.map_err(|e| FtlockError::FileOpen {
            path: source.to_path_buf(),
            source: e,
        })?;
        let mut reader = BufReader::new(source_file);

        let dest_file = File::create(dest).await.map_err(|e| FtlockError::FileOpen {
            path: dest.to_path_buf(),
            source: e,
        })?;
        let mut writer = BufWriter::new(dest_file);

        let bytes = match direction {
            Direction::Encrypt => stream::encrypt_stream(&mut reader, &mut writer, &self.key).await?,
            Direction::Decrypt => stream::decrypt_stream(&mut reader, &mut writer, &self.key).await?,
        };

        let dest_file = writer.into_inner();
        dest_file.sync_all().await?;
        drop(dest_file);
        drop(reader);

        Ok(bytes)
    }
}

/// Append a suffix to a path's full file name: `doc.txt` + `.tmp`
/// becomes `doc.txt.tmp`.
fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_key(byte: u8) -> Key {
        Key::from_hex(&hex::encode([byte; 32])).unwrap()
    }

    fn locker_for(dir: &Path, key: Key) -> Locker {
        Locker::new(dir, key, true).key_file(dir.join(KEY_FILE_NAME))
    }

    async fn tmp_files_in(dir: &Path) -> Vec<PathBuf> {
        let mut found = Vec::new();
        let mut entries = fs::read_dir(dir).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            if entry.path().to_string_lossy().ends_with(TMP_SUFFIX) {
                found.push(entry.path());
            }
        }
        found
    }

    #[tokio::test]
    async fn lock_then_unlock_round_trip() {
        let dir = tempdir().unwrap();
        let doc = dir.path().join("doc.txt");
        fs::write(&doc, b"secret data").await.unwrap();

        let summary = locker_for(dir.path(), test_key(1)).lock().await.unwrap();
        assert_eq!(summary, Summary { processed: 1, skipped: 0, failed: 0 });

        let encrypted = dir.path().join("doc.txt.ft");
        assert!(!doc.exists());
        assert!(encrypted.exists());

        // key file holds exactly 64 lowercase hex characters
        let key_hex = fs::read_to_string(dir.path().join(KEY_FILE_NAME)).await.unwrap();
        let key_hex = key_hex.trim();
        assert_eq!(key_hex.len(), 64);

        let key = Key::from_hex(key_hex).unwrap();
        let summary = locker_for(dir.path(), key).unlock().await.unwrap();
        assert_eq!(summary, Summary { processed: 1, skipped: 0, failed: 0 });

        assert!(!encrypted.exists());
        assert_eq!(fs::read(&doc).await.unwrap(), b"secret data");
    }

    #[tokio::test]
    async fn empty_file_round_trips() {
        let dir = tempdir().unwrap();
        let doc = dir.path().join("empty.csv");
        fs::write(&doc, b"").await.unwrap();

        locker_for(dir.path(), test_key(2)).lock().await.unwrap();
        let sealed = fs::read(dir.path().join("empty.csv.ft")).await.unwrap();
        assert!(!sealed.is_empty());

        locker_for(dir.path(), test_key(2)).unlock().await.unwrap();
        assert_eq!(fs::read(&doc).await.unwrap(), b"");
    }

    #[tokio::test]
    async fn lock_skips_already_encrypted() {
        let dir = tempdir().unwrap();
        let encrypted = dir.path().join("image.jpg.ft");
        fs::write(&encrypted, b"pretend ciphertext").await.unwrap();

        let summary = locker_for(dir.path(), test_key(3)).lock().await.unwrap();
        assert_eq!(summary, Summary { processed: 0, skipped: 1, failed: 0 });
        assert_eq!(fs::read(&encrypted).await.unwrap(), b"pretend ciphertext");
    }

    #[tokio::test]
    async fn lock_ignores_non_targets() {
        let dir = tempdir().unwrap();
        let other = dir.path().join("program.exe");
        fs::write(&other, b"machine code").await.unwrap();

        let summary = locker_for(dir.path(), test_key(4)).lock().await.unwrap();
        assert_eq!(summary, Summary::default());
        assert_eq!(fs::read(&other).await.unwrap(), b"machine code");
    }

    #[tokio::test]
    async fn unlock_skips_plaintext_targets() {
        let dir = tempdir().unwrap();
        let doc = dir.path().join("doc.txt");
        fs::write(&doc, b"never encrypted").await.unwrap();

        let summary = locker_for(dir.path(), test_key(5)).unlock().await.unwrap();
        assert_eq!(summary, Summary { processed: 0, skipped: 1, failed: 0 });
        assert_eq!(fs::read(&doc).await.unwrap(), b"never encrypted");
    }

    #[tokio::test]
    async fn unlock_with_wrong_key_is_retryable() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("doc.txt"), b"secret data").await.unwrap();
        locker_for(dir.path(), test_key(6)).lock().await.unwrap();

        let encrypted = dir.path().join("doc.txt.ft");
        let sealed_before = fs::read(&encrypted).await.unwrap();

        let summary = locker_for(dir.path(), test_key(7)).unlock().await.unwrap();
        assert_eq!(summary, Summary { processed: 0, skipped: 0, failed: 1 });

        // source untouched, no temp file left behind
        assert_eq!(fs::read(&encrypted).await.unwrap(), sealed_before);
        assert!(!dir.path().join("doc.txt").exists());
        assert!(tmp_files_in(dir.path()).await.is_empty());
    }

    #[tokio::test]
    async fn unlock_truncated_stream_is_retryable() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("doc.txt"), vec![7u8; stream::CHUNK_SIZE + 9])
            .await
            .unwrap();
        locker_for(dir.path(), test_key(8)).lock().await.unwrap();

        // drop the terminal segment
        let encrypted = dir.path().join("doc.txt.ft");
        let mut sealed = fs::read(&encrypted).await.unwrap();
        sealed.truncate(stream::HEADER_SIZE + stream::SEALED_CHUNK_SIZE);
        fs::write(&encrypted, &sealed).await.unwrap();

        let summary = locker_for(dir.path(), test_key(8)).unlock().await.unwrap();
        assert_eq!(summary.failed, 1);
        assert_eq!(fs::read(&encrypted).await.unwrap(), sealed);
        assert!(tmp_files_in(dir.path()).await.is_empty());
    }

    #[tokio::test]
    async fn one_bad_file_never_stops_the_pass() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("good.txt"), b"fine").await.unwrap();
        fs::write(dir.path().join("bad.txt.ft"), b"not a real stream").await.unwrap();
        fs::write(dir.path().join("also_good.csv"), b"a,b,c").await.unwrap();

        let summary = locker_for(dir.path(), test_key(9)).unlock().await.unwrap();
        // the corrupt .ft file fails, both plaintext targets are reported
        assert_eq!(summary, Summary { processed: 0, skipped: 2, failed: 1 });
    }

    #[tokio::test]
    async fn missing_root_is_fatal() {
        let dir = tempdir().unwrap();
        let gone = dir.path().join("nope");

        let err = locker_for(&gone, test_key(10)).lock().await.unwrap_err();
        assert!(matches!(err, FtlockError::DirectoryMissing(_)));
    }

    #[tokio::test]
    async fn non_directory_root_is_fatal() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("file.txt");
        fs::write(&file, b"x").await.unwrap();

        let err = Locker::new(&file, test_key(11), true)
            .key_file(dir.path().join(KEY_FILE_NAME))
            .unlock()
            .await
            .unwrap_err();
        assert!(matches!(err, FtlockError::NotADirectory(_)));
    }

    #[tokio::test]
    async fn subdirectories_are_not_recursed() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("nested");
        fs::create_dir(&sub).await.unwrap();
        fs::write(sub.join("deep.txt"), b"untouched").await.unwrap();

        let summary = locker_for(dir.path(), test_key(12)).lock().await.unwrap();
        assert_eq!(summary, Summary::default());
        assert_eq!(fs::read(sub.join("deep.txt")).await.unwrap(), b"untouched");
    }
}
