// src/storage/memory.rs

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ScoreStore, StorageError};
use crate::models::leaderboard::LeaderboardEntry;

/// Keeps the leaderboard in memory. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryScoreStore {
    rows: RwLock<Option<Vec<LeaderboardEntry>>>,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScoreStore for MemoryScoreStore {
    async fn exists(&self) -> Result<bool, StorageError> {
        Ok(self.rows.read().await.is_some())
    }

    async fn init_empty(&self) -> Result<(), StorageError> {
        self.rows.write().await.get_or_insert_with(Vec::new);
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<LeaderboardEntry>, StorageError> {
        Ok(self.rows.read().await.clone().unwrap_or_default())
    }

    async fn append_and_persist(&self, entry: LeaderboardEntry) -> Result<(), StorageError> {
        self.rows
            .write()
            .await
            .get_or_insert_with(Vec::new)
            .push(entry);
        Ok(())
    }
}
