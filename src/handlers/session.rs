// src/handlers/session.rs

use std::path::{Component, Path as FsPath};

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        question::PublicQuestion,
        session::{AnswerOutcome, Phase, QuizSession},
    },
    state::AppState,
};

/// DTO for starting a quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSessionRequest {
    #[validate(length(max = 50, message = "Team name must be at most 50 characters."))]
    pub team_name: String,
}

/// DTO for answering the current question.
#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    /// 0-based position of the chosen option.
    pub option_index: usize,
}

/// Snapshot of a session as seen by the client.
#[derive(Debug, Serialize)]
pub struct SessionStatus {
    pub session_id: Uuid,
    pub team_name: String,
    pub phase: Phase,
    pub current_index: usize,
    pub question_count: usize,
    pub score: u32,
    pub time_remaining_secs: i64,
    pub complete: bool,
    /// Only set once the quiz is over.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl SessionStatus {
    fn capture(id: Uuid, session: &mut QuizSession, now: DateTime<Utc>) -> Self {
        let complete = session.is_complete(now);
        let summary = complete.then(|| {
            format!(
                "Team `{}` scored {} out of {}",
                session.team_name(),
                session.final_score(),
                session.question_count()
            )
        });

        Self {
            session_id: id,
            team_name: session.team_name().to_string(),
            phase: session.phase(),
            current_index: session.current_index(),
            question_count: session.question_count(),
            score: session.final_score(),
            time_remaining_secs: session.time_remaining(now).num_seconds(),
            complete,
            summary,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QuestionResponse {
    #[serde(flatten)]
    pub question: PublicQuestion,
    pub question_count: usize,
    pub answered: bool,
    pub time_remaining_secs: i64,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub correct: bool,
    pub score: u32,
    pub message: &'static str,
    pub status: SessionStatus,
}

/// Starts a quiz for a team.
///
/// * Blank team names are rejected with 400 and nothing is created.
/// * Stale sessions are pruned on the way.
/// * Returns 201 with the session id the client uses for every later call.
pub async fn create_session(
    State(state): State<AppState>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let now = state.now();
    let mut session = QuizSession::new(state.questions.clone(), state.session_duration());
    session.start(&payload.team_name, now)?;

    let pruned = state
        .sessions
        .prune(now, state.session_duration(), state.session_retention())
        .await;
    for entry in pruned {
        tracing::debug!("Recording score of pruned session for team {}", entry.team);
        if let Err(e) = state.leaderboard.submit(entry).await {
            tracing::error!("Failed to record score of pruned session: {}", e);
        }
    }

    let id = state.sessions.insert(session).await;
    tracing::info!("Team {} started session {}", payload.team_name.trim(), id);

    let status = state
        .sessions
        .with_slot(id, |slot| SessionStatus::capture(id, &mut slot.session, now))
        .await?;

    Ok((StatusCode::CREATED, Json(status)))
}

/// Reports the session state. Applies the timer and records the score the
/// first time the quiz is seen complete.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let now = state.now();
    record_if_complete(&state, id, now).await?;

    let status = state
        .sessions
        .with_slot(id, |slot| SessionStatus::capture(id, &mut slot.session, now))
        .await?;

    Ok(Json(status))
}

/// Discards a session so the team can start over. A quiz that already ran
/// out is recorded first, so restarting never loses a finished score.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    record_if_complete(&state, id, state.now()).await?;

    if !state.sessions.remove(id).await {
        return Err(AppError::NotFound(format!("Session {} not found", id)));
    }
    tracing::info!("Session {} discarded", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Returns the current question without its answer key.
pub async fn get_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let now = state.now();

    let result = state
        .sessions
        .with_slot(id, |slot| {
            let session = &mut slot.session;
            let question = session.current_question(now)?.clone();
            Ok::<_, AppError>((
                session.current_index(),
                question,
                session.question_count(),
                session.phase() == Phase::Answered,
                session.time_remaining(now).num_seconds(),
            ))
        })
        .await?;

    let (index, question, question_count, answered, time_remaining_secs) = match result {
        Ok(found) => found,
        Err(e) => {
            record_if_complete(&state, id, now).await?;
            return Err(e);
        }
    };

    let image = match question.image.as_deref() {
        Some(reference) => resolve_image(&state.config.assets_dir, reference).await,
        None => None,
    };

    Ok(Json(QuestionResponse {
        question: PublicQuestion::from_question(index, &question, image),
        question_count,
        answered,
        time_remaining_secs,
    }))
}

/// Scores the selected option of the current question.
pub async fn submit_answer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let now = state.now();

    let result = state
        .sessions
        .with_slot(id, |slot| {
            let outcome = slot.session.submit_answer(payload.option_index, now)?;
            Ok::<_, AppError>((outcome, SessionStatus::capture(id, &mut slot.session, now)))
        })
        .await?;
    record_if_complete(&state, id, now).await?;

    let (AnswerOutcome { correct, score }, status) = result?;
    Ok(Json(AnswerResponse {
        correct,
        score,
        message: if correct { "Correct!" } else { "Incorrect!" },
        status,
    }))
}

/// Moves to the next question, or finishes the quiz after the last one.
pub async fn advance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let now = state.now();

    let result = state
        .sessions
        .with_slot(id, |slot| slot.session.advance(now))
        .await?;
    record_if_complete(&state, id, now).await?;
    result?;

    let status = state
        .sessions
        .with_slot(id, |slot| SessionStatus::capture(id, &mut slot.session, now))
        .await?;

    Ok(Json(status))
}

/// Appends the final score to the leaderboard exactly once per session.
/// A failed write is retried on the next request for this session.
async fn record_if_complete(state: &AppState, id: Uuid, now: DateTime<Utc>) -> Result<(), AppError> {
    let entry = state
        .sessions
        .with_slot(id, |slot| slot.take_unrecorded_result(now))
        .await?;

    let Some(entry) = entry else {
        return Ok(());
    };

    if let Err(e) = state.leaderboard.submit(entry).await {
        tracing::error!("Failed to record score for session {}: {}", id, e);
        // The session may have been discarded meanwhile; nothing left to retry then.
        let _ = state
            .sessions
            .with_slot(id, |slot| slot.recorded = false)
            .await;
        return Err(e.into());
    }

    Ok(())
}

/// Maps an image reference to its public URL if the file exists under the
/// assets directory. Missing images are not an error.
async fn resolve_image(assets_dir: &FsPath, reference: &str) -> Option<String> {
    let relative = FsPath::new(reference);
    if !relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        tracing::warn!("Ignoring image reference outside assets dir: {}", reference);
        return None;
    }

    match tokio::fs::try_exists(assets_dir.join(relative)).await {
        Ok(true) => Some(format!("/images/{}", reference)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[tokio::test]
    async fn test_resolve_image_rejects_traversal() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("secret"), b"x").unwrap();
        let assets = dir.path().join("assets");

        assert_eq!(resolve_image(&assets, "../secret").await, None);
        assert_eq!(resolve_image(&assets, "/etc/passwd").await, None);
    }

    #[tokio::test]
    async fn test_resolve_image_missing_file_is_none() {
        let dir = tempdir().unwrap();
        assert_eq!(resolve_image(dir.path(), "nope.png").await, None);
    }

    #[tokio::test]
    async fn test_resolve_image_existing_file() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("chart.png"), b"png").unwrap();

        assert_eq!(
            resolve_image(dir.path(), "chart.png").await.as_deref(),
            Some("/images/chart.png")
        );
    }
}
