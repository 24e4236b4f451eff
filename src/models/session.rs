// src/models/session.rs

use std::{fmt, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::models::question::{Question, QuestionSet};

/// Where a session is in its run through the quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    NotStarted,
    AwaitingAnswer,
    Answered,
    Complete,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::NotStarted => "not_started",
            Phase::AwaitingAnswer => "awaiting_answer",
            Phase::Answered => "answered",
            Phase::Complete => "complete",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Bad input from the team; nothing changed and the team may retry.
    Validation(String),

    /// The operation is not valid in the current phase.
    InvalidState {
        operation: &'static str,
        phase: Phase,
    },

    /// The quiz is over (finished or timed out).
    AlreadyComplete,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Validation(msg) => f.write_str(msg),
            SessionError::InvalidState { operation, phase } => {
                write!(f, "cannot {} while session is {}", operation, phase)
            }
            SessionError::AlreadyComplete => f.write_str("quiz is already complete"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Result of submitting an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub score: u32,
}

/// One team's attempt at the quiz.
///
/// The timer is lazy: nothing runs in the background. Every operation first
/// calls [`QuizSession::poll`], which forces `Complete` once the duration has
/// elapsed, so expiry is observed on the next interaction.
///
/// Restarting is done by dropping the session and building a new one.
#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Arc<QuestionSet>,
    duration: Duration,
    team_name: String,
    current_index: usize,
    score: u32,
    started_at: Option<DateTime<Utc>>,
    phase: Phase,
}

impl QuizSession {
    pub fn new(questions: Arc<QuestionSet>, duration: Duration) -> Self {
        Self {
            questions,
            duration,
            team_name: String::new(),
            current_index: 0,
            score: 0,
            started_at: None,
            phase: Phase::NotStarted,
        }
    }

    /// Starts the clock for `team_name`.
    ///
    /// The name is trimmed; a blank name is rejected and the session stays
    /// `NotStarted`.
    pub fn start(&mut self, team_name: &str, now: DateTime<Utc>) -> Result<(), SessionError> {
        if self.phase != Phase::NotStarted {
            return Err(SessionError::InvalidState {
                operation: "start",
                phase: self.phase,
            });
        }

        let team_name = team_name.trim();
        if team_name.is_empty() {
            return Err(SessionError::Validation(
                "Please enter your team name to begin.".to_string(),
            ));
        }

        self.team_name = team_name.to_string();
        self.started_at = Some(now);
        self.current_index = 0;
        self.score = 0;
        self.phase = Phase::AwaitingAnswer;

        tracing::debug!("Session started for team {}", self.team_name);
        Ok(())
    }

    /// Applies the timer. Returns the phase after the check.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Phase {
        if matches!(self.phase, Phase::AwaitingAnswer | Phase::Answered) && self.is_expired(now) {
            // An answered question counts as passed, so score <= current_index
            // still holds once complete.
            if self.phase == Phase::Answered {
                self.current_index += 1;
            }
            self.phase = Phase::Complete;
            tracing::info!(
                "Time's up for team {}: {} of {} answered, score {}",
                self.team_name,
                self.current_index,
                self.question_count(),
                self.score
            );
        }
        self.phase
    }

    /// Scores the selected option of the current question.
    ///
    /// Comparison is by option index, so two options with the same text
    /// cannot be confused.
    pub fn submit_answer(
        &mut self,
        option_index: usize,
        now: DateTime<Utc>,
    ) -> Result<AnswerOutcome, SessionError> {
        match self.poll(now) {
            Phase::AwaitingAnswer => {}
            Phase::Complete => return Err(SessionError::AlreadyComplete),
            phase => {
                return Err(SessionError::InvalidState {
                    operation: "submit an answer",
                    phase,
                });
            }
        }

        let question = self.question_at_cursor()?;
        if option_index >= question.options.len() {
            return Err(SessionError::Validation(format!(
                "Option {} does not exist; choose between 0 and {}.",
                option_index,
                question.options.len() - 1
            )));
        }

        let correct = question.is_correct(option_index);
        if correct {
            self.score += 1;
        }
        self.phase = Phase::Answered;

        Ok(AnswerOutcome {
            correct,
            score: self.score,
        })
    }

    /// Moves past an answered question. Completes the quiz after the last one.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<Phase, SessionError> {
        match self.poll(now) {
            Phase::Answered => {}
            Phase::Complete => return Err(SessionError::AlreadyComplete),
            phase => {
                return Err(SessionError::InvalidState {
                    operation: "advance",
                    phase,
                });
            }
        }

        self.current_index += 1;
        self.phase = if self.current_index < self.question_count() {
            Phase::AwaitingAnswer
        } else {
            tracing::info!(
                "Team {} finished with {} of {}",
                self.team_name,
                self.score,
                self.question_count()
            );
            Phase::Complete
        };

        Ok(self.phase)
    }

    /// The question the team is on. Only valid while the quiz is running.
    pub fn current_question(&mut self, now: DateTime<Utc>) -> Result<&Question, SessionError> {
        match self.poll(now) {
            Phase::AwaitingAnswer | Phase::Answered => self.question_at_cursor(),
            phase => Err(SessionError::InvalidState {
                operation: "show a question",
                phase,
            }),
        }
    }

    /// Time left on the clock, never negative.
    /// The full duration before the session starts.
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Duration {
        match self.started_at {
            Some(started_at) => (self.duration - (now - started_at)).max(Duration::zero()),
            None => self.duration,
        }
    }

    pub fn is_complete(&mut self, now: DateTime<Utc>) -> bool {
        self.poll(now) == Phase::Complete
    }

    pub fn final_score(&self) -> u32 {
        self.score
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn team_name(&self) -> &str {
        &self.team_name
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Questions the team has answered, including one still on screen.
    pub fn answered_count(&self) -> usize {
        match self.phase {
            Phase::Answered => self.current_index + 1,
            _ => self.current_index,
        }
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// True once the clock has run out.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.started_at
            .is_some_and(|started_at| now - started_at >= self.duration)
    }

    fn question_at_cursor(&self) -> Result<&Question, SessionError> {
        self.questions
            .get(self.current_index)
            .ok_or(SessionError::InvalidState {
                operation: "show a question",
                phase: self.phase,
            })
    }
}
