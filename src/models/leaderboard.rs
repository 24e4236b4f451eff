// src/models/leaderboard.rs

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::storage::{ScoreStore, StorageError};

/// One completed attempt. A team may appear several times.
///
/// Serialized with the `Team,Score` column names of the leaderboard file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    #[serde(rename = "Team")]
    pub team: String,
    #[serde(rename = "Score")]
    pub score: u32,
}

impl LeaderboardEntry {
    pub fn new(team: impl Into<String>, score: u32) -> Self {
        Self {
            team: team.into(),
            score,
        }
    }
}

/// Ranked view over the durable score store.
#[derive(Clone)]
pub struct Leaderboard {
    store: Arc<dyn ScoreStore>,
}

impl Leaderboard {
    pub fn new(store: Arc<dyn ScoreStore>) -> Self {
        Self { store }
    }

    /// Creates an empty store if none exists yet.
    pub async fn ensure_initialized(&self) -> Result<(), StorageError> {
        if !self.store.exists().await? {
            tracing::info!("No leaderboard found, creating an empty one");
            self.store.init_empty().await?;
        }
        Ok(())
    }

    pub async fn submit(&self, entry: LeaderboardEntry) -> Result<(), StorageError> {
        tracing::info!("Recording score {} for team {}", entry.score, entry.team);
        self.store.append_and_persist(entry).await
    }

    /// The `n` best results. Equal scores keep submission order.
    pub async fn top_n(&self, n: usize) -> Result<Vec<LeaderboardEntry>, StorageError> {
        let entries = self.store.read_all().await?;
        Ok(rank(entries, n))
    }

    pub async fn all(&self) -> Result<Vec<LeaderboardEntry>, StorageError> {
        self.store.read_all().await
    }
}

fn rank(mut entries: Vec<LeaderboardEntry>, n: usize) -> Vec<LeaderboardEntry> {
    // sort_by is stable
    entries.sort_by(|a, b| b.score.cmp(&a.score));
    entries.truncate(n);
    entries
}
