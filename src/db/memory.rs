use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::Result;

use crate::app::ports::SessionRepository;
use crate::models::Session;

/// Process-local session store used for `--ephemeral` runs and tests.
#[derive(Default)]
pub struct InMemorySessionRepository {
    sessions: Mutex<Vec<Session>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionRepository for InMemorySessionRepository {
    async fn save(&self, session: &Session) -> Result<()> {
        let mut sessions = self.lock();
        match sessions.iter_mut().find(|existing| existing.id == session.id) {
            Some(existing) => *existing = session.clone(),
            None => sessions.push(session.clone()),
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Session>> {
        Ok(self.lock().iter().find(|session| session.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<Session>> {
        Ok(self.lock().clone())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|session| session.id != id);
        Ok(sessions.len() != before)
    }

    async fn clear(&self) -> Result<()> {
        self.lock().clear();
        Ok(())
    }
}
