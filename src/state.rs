// src/state.rs

use std::{collections::HashMap, sync::Arc};

use axum::extract::FromRef;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    config::Config,
    error::AppError,
    models::{
        leaderboard::{Leaderboard, LeaderboardEntry},
        question::QuestionSet,
        session::QuizSession,
    },
    utils::clock::Clock,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub questions: Arc<QuestionSet>,
    pub sessions: SessionRegistry,
    pub leaderboard: Leaderboard,
    pub clock: Arc<dyn Clock>,
    session_duration: Duration,
    session_retention: Duration,
}

impl AppState {
    pub fn new(
        config: Config,
        questions: QuestionSet,
        leaderboard: Leaderboard,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let session_duration = config.session_duration();
        let session_retention = config.session_retention();

        Self {
            config,
            session_duration,
            session_retention,
            questions: Arc::new(questions),
            sessions: SessionRegistry::default(),
            leaderboard,
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn session_duration(&self) -> Duration {
        self.session_duration
    }

    pub fn session_retention(&self) -> Duration {
        self.session_retention
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Leaderboard {
    fn from_ref(state: &AppState) -> Self {
        state.leaderboard.clone()
    }
}

/// A live session plus whether its result already went to the leaderboard.
#[derive(Debug)]
pub struct SessionSlot {
    pub session: QuizSession,
    pub recorded: bool,
}

impl SessionSlot {
    /// Returns the leaderboard entry the first time the session is seen
    /// complete, and marks it recorded.
    pub fn take_unrecorded_result(&mut self, now: DateTime<Utc>) -> Option<LeaderboardEntry> {
        if self.recorded || !self.session.is_complete(now) {
            return None;
        }
        self.recorded = true;
        Some(LeaderboardEntry::new(
            self.session.team_name(),
            self.session.final_score(),
        ))
    }
}

/// Owns every team's session, keyed by an opaque id handed to the client.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    slots: Arc<RwLock<HashMap<Uuid, SessionSlot>>>,
}

impl SessionRegistry {
    pub async fn insert(&self, session: QuizSession) -> Uuid {
        let id = Uuid::new_v4();
        self.slots.write().await.insert(
            id,
            SessionSlot {
                session,
                recorded: false,
            },
        );
        id
    }

    /// Drops a session. Returns false if it did not exist.
    pub async fn remove(&self, id: Uuid) -> bool {
        self.slots.write().await.remove(&id).is_some()
    }

    /// Runs `f` against the session with exclusive access.
    pub async fn with_slot<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut SessionSlot) -> R,
    ) -> Result<R, AppError> {
        let mut slots = self.slots.write().await;
        let slot = slots
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", id)))?;
        Ok(f(slot))
    }

    /// Forgets sessions whose clock ran out more than `retention` ago and
    /// returns the results of those nobody had recorded yet.
    pub async fn prune(
        &self,
        now: DateTime<Utc>,
        duration: Duration,
        retention: Duration,
    ) -> Vec<LeaderboardEntry> {
        let cutoff = duration.checked_add(&retention).unwrap_or(Duration::MAX);
        let mut slots = self.slots.write().await;

        let stale: Vec<Uuid> = slots
            .iter()
            .filter(|(_, slot)| {
                slot.session
                    .started_at()
                    .is_some_and(|started_at| now - started_at >= cutoff)
            })
            .map(|(id, _)| *id)
            .collect();

        stale
            .into_iter()
            .filter_map(|id| slots.remove(&id))
            .filter_map(|mut slot| slot.take_unrecorded_result(now))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::Question;

    fn session(duration: Duration) -> QuizSession {
        let set = QuestionSet::new(vec![Question::new("Q", &["A", "B"], 0, None)]).unwrap();
        QuizSession::new(Arc::new(set), duration)
    }

    #[tokio::test]
    async fn test_result_is_taken_once() {
        let now = Utc::now();
        let mut s = session(Duration::minutes(5));
        s.start("Alpha", now).unwrap();
        s.submit_answer(0, now).unwrap();
        s.advance(now).unwrap();

        let mut slot = SessionSlot {
            session: s,
            recorded: false,
        };

        assert_eq!(
            slot.take_unrecorded_result(now),
            Some(LeaderboardEntry::new("Alpha", 1))
        );
        assert_eq!(slot.take_unrecorded_result(now), None);
    }

    #[tokio::test]
    async fn test_running_session_has_no_result() {
        let now = Utc::now();
        let mut s = session(Duration::minutes(5));
        s.start("Alpha", now).unwrap();
        let mut slot = SessionSlot {
            session: s,
            recorded: false,
        };

        assert_eq!(slot.take_unrecorded_result(now), None);
        assert!(!slot.recorded);
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let registry = SessionRegistry::default();
        let result = registry.with_slot(Uuid::new_v4(), |_| ()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_prune_drops_only_stale_sessions() {
        let registry = SessionRegistry::default();
        let now = Utc::now();
        let duration = Duration::minutes(5);
        let retention = Duration::minutes(60);

        let mut old = session(duration);
        old.start("Old", now - Duration::hours(2)).unwrap();
        let mut fresh = session(duration);
        fresh.start("Fresh", now).unwrap();

        registry.insert(old).await;
        let fresh_id = registry.insert(fresh).await;

        assert_eq!(
            registry.prune(now, duration, retention).await,
            vec![LeaderboardEntry::new("Old", 0)]
        );
        assert_eq!(registry.len().await, 1);
        assert!(registry.with_slot(fresh_id, |_| ()).await.is_ok());
        assert!(registry.remove(fresh_id).await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_prune_skips_already_recorded_results() {
        let registry = SessionRegistry::default();
        let now = Utc::now();
        let duration = Duration::minutes(5);

        let mut old = session(duration);
        old.start("Old", now - Duration::hours(2)).unwrap();
        let id = registry.insert(old).await;
        let recorded = registry
            .with_slot(id, |slot| slot.take_unrecorded_result(now))
            .await
            .unwrap();
        assert_eq!(recorded, Some(LeaderboardEntry::new("Old", 0)));

        assert!(registry.prune(now, duration, Duration::zero()).await.is_empty());
        assert!(registry.is_empty().await);
    }
}
