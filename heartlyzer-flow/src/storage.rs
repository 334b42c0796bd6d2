use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, watch};
use uuid::Uuid;

use crate::{error::Result, service::PredictionService, session::SessionState};

/// Handle to one chat session.
///
/// Clones share the same state, so a handle can be moved into background
/// tasks while callers keep reading from storage.
#[derive(Clone)]
pub struct Session {
    pub id: String,
    pub principal: String,
    service: Arc<dyn PredictionService>,
    state: Arc<Mutex<SessionState>>,
    revision: Arc<watch::Sender<u64>>,
}

impl Session {
    pub fn new(principal: impl Into<String>, service: Arc<dyn PredictionService>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), principal, service)
    }

    pub fn with_id(
        id: impl Into<String>,
        principal: impl Into<String>,
        service: Arc<dyn PredictionService>,
    ) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            id: id.into(),
            principal: principal.into(),
            service,
            state: Arc::new(Mutex::new(SessionState::new())),
            revision: Arc::new(revision),
        }
    }

    pub fn service(&self) -> Arc<dyn PredictionService> {
        self.service.clone()
    }

    pub async fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().await
    }

    /// Signals subscribers that the state changed.
    pub fn touch(&self) {
        self.revision.send_modify(|r| *r += 1);
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Receiver that wakes on every state change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("principal", &self.principal)
            .field("revision", &self.revision())
            .finish()
    }
}

/// Trait for storing and retrieving sessions
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn save(&self, session: Session) -> Result<()>;
    async fn get(&self, id: &str) -> Result<Option<Session>>;
    async fn delete(&self, id: &str) -> Result<()>;
}

/// In-memory implementation of SessionStorage
#[derive(Default)]
pub struct InMemorySessionStorage {
    sessions: Arc<DashMap<String, Session>>,
}

impl InMemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStorage for InMemorySessionStorage {
    async fn save(&self, session: Session) -> Result<()> {
        self.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Session>> {
        Ok(self.sessions.get(id).map(|entry| entry.clone()))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.sessions.remove(id);
        Ok(())
    }
}
