//! Record of source videos that have already been republished.
//!
//! The ledger is a plain text file with one video id per line. It is only ever appended to, so a
//! crash between publishing and recording can at worst cause one duplicate upload on the next run,
//! never a lost record. The whole file is read once at startup into a [`HashSet`]; every
//! [`Ledger::record`] writes through to both the file and the set.
//!
//! There is no locking: only one migration may use a given ledger file at a time.

use crate::error::LedgerError;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    ids: HashSet<String>,
}

impl Ledger {
    /// Reads every id previously recorded at `path`.
    ///
    /// A missing file is an empty ledger. Any other I/O failure is an error.
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("no ledger yet, starting empty");
                String::new()
            }
            Err(source) => return Err(LedgerError::Read { path, source }),
        };

        let ids: HashSet<String> = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();
        tracing::debug!(entries = ids.len(), "loaded ledger");

        Ok(Self { path, ids })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, video_id: &str) -> bool {
        self.ids.contains(video_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Appends `video_id` to the ledger file, creating it if needed.
    ///
    /// No deduplication happens here: recording an id that is already present writes it again.
    /// Callers check [`Ledger::contains`] first.
    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn record(&mut self, video_id: &str) -> Result<(), LedgerError> {
        let append = |source| LedgerError::Append {
            path: self.path.clone(),
            source,
        };

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(append)?;
        file.write_all(format!("{video_id}\n").as_bytes())
            .await
            .map_err(append)?;
        file.flush().await.map_err(append)?;

        self.ids.insert(video_id.to_string());
        tracing::debug!("recorded video in ledger");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::load(dir.path().join("uploaded_videos.txt"))
            .await
            .unwrap();
        assert!(ledger.is_empty());
        assert!(!ledger.contains("abc"));
    }

    #[tokio::test]
    async fn unreadable_path_is_an_error() {
        // a directory exists at the path but cannot be read as a file
        let dir = tempfile::tempdir().unwrap();
        let err = Ledger::load(dir.path()).await.unwrap_err();
        assert!(matches!(err, LedgerError::Read { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn record_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uploaded_videos.txt");

        let mut ledger = Ledger::load(&path).await.unwrap();
        ledger.record("abc").await.unwrap();
        ledger.record("xyz").await.unwrap();
        assert!(ledger.contains("abc"));

        let reloaded = Ledger::load(&path).await.unwrap();
        assert!(reloaded.contains("abc"));
        assert!(reloaded.contains("xyz"));
        assert_eq!(reloaded.len(), 2);

        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert_eq!(on_disk, "abc\nxyz\n");
    }

    #[tokio::test]
    async fn record_does_not_deduplicate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uploaded_videos.txt");

        let mut ledger = Ledger::load(&path).await.unwrap();
        ledger.record("abc").await.unwrap();
        ledger.record("abc").await.unwrap();

        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert_eq!(on_disk, "abc\nabc\n");
        assert_eq!(Ledger::load(&path).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn blank_lines_and_crlf_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uploaded_videos.txt");
        std::fs::write(&path, "abc\r\n\nxyz\n\n").unwrap();

        let ledger = Ledger::load(&path).await.unwrap();
        assert_eq!(ledger.len(), 2);
        assert!(ledger.contains("abc"));
        assert!(ledger.contains("xyz"));
    }
}
