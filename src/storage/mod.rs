// src/storage/mod.rs

pub mod file;
pub mod memory;

use std::fmt;

use async_trait::async_trait;

use crate::models::leaderboard::LeaderboardEntry;

pub use file::CsvScoreStore;
pub use memory::MemoryScoreStore;

#[derive(Debug)]
pub enum StorageError {
    /// The store could not be read or written.
    Io(std::io::Error),

    /// The store exists but does not match the `Team,Score` schema.
    Malformed(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "leaderboard store I/O error: {}", e),
            StorageError::Malformed(msg) => write!(f, "leaderboard store is malformed: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err)
    }
}

impl From<csv::Error> for StorageError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            match err.into_kind() {
                csv::ErrorKind::Io(e) => StorageError::Io(e),
                other => StorageError::Malformed(format!("{:?}", other)),
            }
        } else {
            StorageError::Malformed(err.to_string())
        }
    }
}

/// Durable table of leaderboard results.
///
/// `append_and_persist` must not lose or duplicate an entry when called by a
/// single writer. Implementations serialize writers within the process;
/// several processes sharing one store are not supported.
#[async_trait]
pub trait ScoreStore: Send + Sync {
    async fn exists(&self) -> Result<bool, StorageError>;

    /// Creates an empty store with the `Team,Score` schema.
    async fn init_empty(&self) -> Result<(), StorageError>;

    /// All entries in insertion order.
    async fn read_all(&self) -> Result<Vec<LeaderboardEntry>, StorageError>;

    async fn append_and_persist(&self, entry: LeaderboardEntry) -> Result<(), StorageError>;
}
