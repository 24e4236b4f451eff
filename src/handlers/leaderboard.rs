// src/handlers/leaderboard.rs

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use crate::{
    config::{Config, MAX_LEADERBOARD_SIZE},
    error::AppError,
    models::leaderboard::Leaderboard,
};

/// Query parameters for the leaderboard.
#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RankedEntry {
    pub rank: usize,
    pub team: String,
    pub score: u32,
}

/// Retrieves the best results, highest score first.
/// Equal scores are listed in the order they were recorded.
/// `limit=0` yields an empty list; larger limits are capped.
pub async fn get_leaderboard(
    State(leaderboard): State<Leaderboard>,
    State(config): State<Config>,
    query: Result<Query<LeaderboardParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(params) = query?;
    let limit = params
        .limit
        .unwrap_or(config.leaderboard_size)
        .min(MAX_LEADERBOARD_SIZE);

    let ranked: Vec<RankedEntry> = leaderboard
        .top_n(limit)
        .await?
        .into_iter()
        .enumerate()
        .map(|(i, entry)| RankedEntry {
            rank: i + 1,
            team: entry.team,
            score: entry.score,
        })
        .collect();

    Ok(Json(ranked))
}
