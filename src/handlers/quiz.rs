// src/handlers/quiz.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;

use crate::state::AppState;

pub const QUIZ_TITLE: &str = "Weekly Trivia: Dash & Discover!";

const WELCOME: &str = "Every week, we test your store knowledge, data intuition, and your \
ability to use BI dashboards. Check the dashboards, discuss with your team, and make smart decisions.";

/// Intro page content.
#[derive(Debug, Serialize)]
pub struct QuizInfo {
    pub title: &'static str,
    pub welcome: &'static str,
    pub question_count: usize,
    pub duration_secs: u64,
}

/// Returns what the intro page shows before a team enters its name.
pub async fn quiz_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(QuizInfo {
        title: QUIZ_TITLE,
        welcome: WELCOME,
        question_count: state.questions.len(),
        duration_secs: state.session_duration().num_seconds().unsigned_abs(),
    })
}
