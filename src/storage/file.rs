// src/storage/file.rs

use std::{
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::sync::Mutex;

use super::{ScoreStore, StorageError};
use crate::models::leaderboard::LeaderboardEntry;

const HEADER: [&str; 2] = ["Team", "Score"];

/// Leaderboard kept in a CSV file with a `Team,Score` header.
///
/// Every mutation rewrites the whole file: the new content goes to a fresh
/// temporary file in the same directory which is then persisted over the
/// original, so readers never see a half-written table. Writers inside this
/// process are serialized by `write_lock`, and so is recreating a missing file.
pub struct CsvScoreStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvScoreStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Option<Vec<LeaderboardEntry>>, StorageError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => parse(&bytes).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Must be called with `write_lock` held.
    async fn write_all(&self, rows: &[LeaderboardEntry]) -> Result<(), StorageError> {
        let bytes = render(rows)?;

        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        tokio::fs::create_dir_all(&parent).await?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let mut tmp = NamedTempFile::new_in(&parent)?;
            tmp.write_all(&bytes)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&path).map_err(|e| e.error)?;
            Ok::<_, std::io::Error>(())
        })
        .await
        .map_err(std::io::Error::other)??;

        Ok(())
    }

    /// Writes an empty table unless the file appeared meanwhile.
    /// Must be called with `write_lock` held.
    async fn create_if_missing(&self) -> Result<bool, StorageError> {
        if tokio::fs::try_exists(&self.path).await? {
            return Ok(false);
        }
        self.write_all(&[]).await?;
        Ok(true)
    }
}

#[async_trait]
impl ScoreStore for CsvScoreStore {
    async fn exists(&self) -> Result<bool, StorageError> {
        Ok(tokio::fs::try_exists(&self.path).await?)
    }

    async fn init_empty(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        if self.create_if_missing().await? {
            tracing::info!("Initialized empty leaderboard at {:?}", self.path);
        }
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<LeaderboardEntry>, StorageError> {
        if let Some(rows) = self.load().await? {
            return Ok(rows);
        }

        // Re-check under the lock: a writer may have created the file since.
        let _guard = self.write_lock.lock().await;
        if let Some(rows) = self.load().await? {
            return Ok(rows);
        }

        tracing::warn!("Leaderboard {:?} is missing, recreating it", self.path);
        self.create_if_missing().await?;
        Ok(Vec::new())
    }

    async fn append_and_persist(&self, entry: LeaderboardEntry) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut rows = self.load().await?.unwrap_or_default();
        rows.push(entry);
        self.write_all(&rows).await
    }
}

fn parse(bytes: &[u8]) -> Result<Vec<LeaderboardEntry>, StorageError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader.headers()?;
    if headers.iter().ne(HEADER) {
        return Err(StorageError::Malformed(format!(
            "expected header {:?}, found {:?}",
            HEADER.join(","),
            headers.iter().collect::<Vec<_>>().join(",")
        )));
    }

    reader
        .deserialize()
        .map(|row| row.map_err(StorageError::from))
        .collect()
}

fn render(rows: &[LeaderboardEntry]) -> Result<Vec<u8>, StorageError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }

    writer
        .into_inner()
        .map_err(|e| StorageError::Io(e.into_error()))
}
