// src/state.rs

use std::{collections::HashMap, sync::Arc};

use axum::extract::FromRef;
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    config::Config,
    editor::{QuestionDialog, QuizEditor},
    error::AppError,
    library::QuizLibrary,
};

pub type SessionId = Uuid;

/// One author's open editor together with its question dialog.
#[derive(Debug)]
pub struct EditorSession {
    pub editor: QuizEditor,
    pub dialog: QuestionDialog,
    pub opened_at: DateTime<Utc>,
    /// Last time the session was changed. Drives idle expiry.
    pub last_active: DateTime<Utc>,
}

impl EditorSession {
    pub fn new(editor: QuizEditor) -> Self {
        let now = Utc::now();
        Self {
            editor,
            dialog: QuestionDialog::new(),
            opened_at: now,
            last_active: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        now - self.last_active > ttl
    }
}

/// Open editor sessions, capped in number and expired after an idle period.
///
/// Reads through [`SessionTable::get`] do not count as activity; only
/// mutations keep a session alive.
#[derive(Debug)]
pub struct SessionTable {
    sessions: HashMap<SessionId, EditorSession>,
    ttl: TimeDelta,
    max_sessions: usize,
}

impl SessionTable {
    pub fn new(max_sessions: usize, ttl: TimeDelta) -> Self {
        Self {
            sessions: HashMap::new(),
            ttl,
            max_sessions,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Looks up a live session for reading.
    pub fn get(&self, id: SessionId) -> Result<&EditorSession, AppError> {
        self.sessions
            .get(&id)
            .filter(|session| !session.is_expired(Utc::now(), self.ttl))
            .ok_or_else(|| not_found(id))
    }

    /// Looks up a live session for a change and marks it active.
    /// An expired session is dropped on the spot.
    pub fn get_mut(&mut self, id: SessionId) -> Result<&mut EditorSession, AppError> {
        let now = Utc::now();
        if self
            .sessions
            .get(&id)
            .is_some_and(|session| session.is_expired(now, self.ttl))
        {
            self.sessions.remove(&id);
            tracing::info!(session_id = %id, "editor session expired");
        }

        let session = self.sessions.get_mut(&id).ok_or_else(|| not_found(id))?;
        session.last_active = now;
        Ok(session)
    }

    /// Opens a session on `editor`. Idle sessions are evicted first so they
    /// never hold a slot against the cap.
    pub fn insert(&mut self, editor: QuizEditor) -> Result<(SessionId, &EditorSession), AppError> {
        self.evict_expired();

        if self.sessions.len() >= self.max_sessions {
            tracing::warn!("Editor session limit reached ({})", self.max_sessions);
            return Err(AppError::Conflict(
                "Too many open editor sessions".to_string(),
            ));
        }

        let session_id = Uuid::new_v4();
        let session = self
            .sessions
            .entry(session_id)
            .or_insert(EditorSession::new(editor));
        Ok((session_id, session))
    }

    /// Takes a live session out of the table.
    pub fn remove(&mut self, id: SessionId) -> Result<EditorSession, AppError> {
        let session = self.sessions.remove(&id).ok_or_else(|| not_found(id))?;
        if session.is_expired(Utc::now(), self.ttl) {
            tracing::info!(session_id = %id, "editor session expired");
            return Err(not_found(id));
        }
        Ok(session)
    }

    /// Puts back a session taken with [`SessionTable::remove`].
    pub fn restore(&mut self, id: SessionId, session: EditorSession) {
        self.sessions.insert(id, session);
    }

    /// Drops every session idle for longer than the ttl. Returns how many went.
    pub fn evict_expired(&mut self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| !session.is_expired(now, self.ttl));

        let evicted = before - self.sessions.len();
        if evicted > 0 {
            tracing::info!(evicted, remaining = self.sessions.len(), "idle editor sessions evicted");
        }
        evicted
    }
}

fn not_found(id: SessionId) -> AppError {
    AppError::NotFound(format!("Editor session {} not found", id))
}

pub type Sessions = Arc<RwLock<SessionTable>>;
pub type Library = Arc<RwLock<QuizLibrary>>;

#[derive(Clone)]
pub struct AppState {
    pub sessions: Sessions,
    pub library: Library,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let table = SessionTable::new(config.max_sessions, config.session_ttl());
        Self {
            sessions: Arc::new(RwLock::new(table)),
            library: Arc::default(),
            config,
        }
    }
}

impl FromRef<AppState> for Sessions {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

impl FromRef<AppState> for Library {
    fn from_ref(state: &AppState) -> Self {
        state.library.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle(table: &mut SessionTable, id: SessionId, minutes: i64) {
        if let Some(session) = table.sessions.get_mut(&id) {
            session.last_active = Utc::now() - TimeDelta::minutes(minutes);
        }
    }

    #[test]
    fn test_idle_sessions_do_not_hold_the_cap() {
        let mut table = SessionTable::new(1, TimeDelta::minutes(30));
        let (first, _) = table.insert(QuizEditor::open(None)).unwrap();

        assert!(matches!(
            table.insert(QuizEditor::open(None)),
            Err(AppError::Conflict(_))
        ));

        idle(&mut table, first, 31);
        let (second, _) = table.insert(QuizEditor::open(None)).unwrap();
        assert_ne!(first, second);
        assert_eq!(table.len(), 1);
        assert!(table.get(first).is_err());
    }

    #[test]
    fn test_change_refreshes_activity_but_read_does_not() {
        let mut table = SessionTable::new(4, TimeDelta::minutes(30));
        let (id, _) = table.insert(QuizEditor::open(None)).unwrap();

        idle(&mut table, id, 20);
        let seen = table.get(id).unwrap().last_active;
        assert!(Utc::now() - seen >= TimeDelta::minutes(20));

        table.get_mut(id).unwrap();
        assert!(Utc::now() - table.get(id).unwrap().last_active < TimeDelta::minutes(1));

        idle(&mut table, id, 45);
        assert!(matches!(table.get(id), Err(AppError::NotFound(_))));
        assert!(matches!(table.get_mut(id), Err(AppError::NotFound(_))));
        assert!(table.is_empty());
    }

    #[test]
    fn test_expired_session_cannot_be_taken() {
        let mut table = SessionTable::new(4, TimeDelta::minutes(30));
        let (id, _) = table.insert(QuizEditor::open(None)).unwrap();
        idle(&mut table, id, 31);

        assert!(matches!(table.remove(id), Err(AppError::NotFound(_))));
        assert!(table.is_empty());
    }
}
