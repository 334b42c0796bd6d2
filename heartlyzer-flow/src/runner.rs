//! ChatRunner: loads a session, applies one user action, and keeps storage
//! and subscribers in step.
//!
//! Every front-end (HTTP service, terminal) drives sessions through this
//! type only. Interactive input goes through [`ChatRunner::submit`]; the
//! sidebar actions (new chat, history selection, deletion) have their own
//! methods. Remote history calls are made without holding the session lock,
//! so a slow service never blocks progress updates.

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::{
    error::{FlowError, Result},
    orchestrator::{self, OrchestratorConfig},
    service::ServiceConnector,
    session::{SessionView, Submission},
    storage::{Session, SessionStorage},
};

/// What [`ChatRunner::submit`] did with an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// Blank, or dropped while an analysis was running.
    Ignored,
    Handled,
    /// The interview completed and an analysis is now running.
    PredictionStarted { run_id: u64 },
}

#[derive(Clone)]
pub struct ChatRunner {
    storage: Arc<dyn SessionStorage>,
    connector: Arc<dyn ServiceConnector>,
    config: OrchestratorConfig,
}

impl ChatRunner {
    pub fn new(storage: Arc<dyn SessionStorage>, connector: Arc<dyn ServiceConnector>) -> Self {
        Self::with_config(storage, connector, OrchestratorConfig::default())
    }

    pub fn with_config(
        storage: Arc<dyn SessionStorage>,
        connector: Arc<dyn ServiceConnector>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            storage,
            connector,
            config,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Creates a session for `principal`, seeded with the welcome message and
    /// the caller's remote history. A failed history fetch is logged and the
    /// session starts with an empty list.
    #[instrument(skip(self))]
    pub async fn open_session(&self, principal: &str) -> Result<Session> {
        let service = self.connector.connect(principal);
        let principal = match service.get_principal().await {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(error = %e, "could not resolve principal, using the requested one");
                principal.to_string()
            }
        };

        let session = Session::new(principal, service);
        self.storage.save(session.clone()).await?;
        info!(session_id = %session.id, principal = %session.principal, "session opened");

        if let Err(e) = self.refresh(&session).await {
            warn!(session_id = %session.id, error = %e, "initial history fetch failed");
        }
        Ok(session)
    }

    pub async fn session(&self, session_id: &str) -> Result<Session> {
        self.storage
            .get(session_id)
            .await?
            .ok_or_else(|| FlowError::SessionNotFound(session_id.to_string()))
    }

    /// Feeds one line of user input into the session.
    #[instrument(skip(self, input), fields(input_len = input.len()))]
    pub async fn submit(&self, session_id: &str, input: &str) -> Result<SubmitOutcome> {
        let session = self.session(session_id).await?;
        let outcome = {
            let mut state = session.lock().await;
            match state.submit(input) {
                Submission::Ignored => SubmitOutcome::Ignored,
                Submission::Handled => SubmitOutcome::Handled,
                Submission::Predict(run) => {
                    let run_id = run.run_id;
                    orchestrator::launch(&session, &mut state, run, &self.config);
                    SubmitOutcome::PredictionStarted { run_id }
                }
            }
        };
        if outcome != SubmitOutcome::Ignored {
            session.touch();
        }
        Ok(outcome)
    }

    /// Starts over with a fresh transcript. Any running analysis is
    /// cancelled and its result discarded.
    #[instrument(skip(self))]
    pub async fn new_chat(&self, session_id: &str) -> Result<()> {
        let session = self.session(session_id).await?;
        session.lock().await.new_chat();
        session.touch();
        info!("new chat started");
        Ok(())
    }

    /// Shows history entry `index` in review mode.
    #[instrument(skip(self))]
    pub async fn select_history(&self, session_id: &str, index: usize) -> Result<()> {
        let session = self.session(session_id).await?;
        session.lock().await.select_history(index)?;
        session.touch();
        Ok(())
    }

    /// Deletes entry `index` remotely, then locally. On failure the local
    /// list is left as it was.
    #[instrument(skip(self))]
    pub async fn delete_history(&self, session_id: &str, index: usize) -> Result<()> {
        let session = self.session(session_id).await?;
        if index >= session.lock().await.history().len() {
            return Err(FlowError::HistoryIndexOutOfBounds(index));
        }

        if let Err(e) = session.service().delete_prediction_history(index).await {
            warn!(error = %e, "remote history deletion failed");
            return Err(e);
        }

        if session.lock().await.history_mut().remove(index).is_none() {
            warn!("history changed while deleting, refetching");
            self.refresh(&session).await?;
        }
        session.touch();
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn clear_history(&self, session_id: &str) -> Result<()> {
        let session = self.session(session_id).await?;
        if let Err(e) = session.service().clear_prediction_history().await {
            warn!(error = %e, "remote history clear failed");
            return Err(e);
        }
        session.lock().await.history_mut().clear();
        session.touch();
        Ok(())
    }

    /// Replaces the local history with the remote one.
    pub async fn refresh_history(&self, session_id: &str) -> Result<()> {
        let session = self.session(session_id).await?;
        self.refresh(&session).await
    }

    async fn refresh(&self, session: &Session) -> Result<()> {
        let results = session.service().get_prediction_history().await?;
        session.lock().await.history_mut().load(results);
        session.touch();
        Ok(())
    }

    pub async fn snapshot(&self, session_id: &str) -> Result<SessionView> {
        let session = self.session(session_id).await?;
        let revision = session.revision();
        let view = session
            .lock()
            .await
            .view(&session.id, &session.principal, revision);
        Ok(view)
    }

    /// Cancels any running analysis and forgets the session.
    #[instrument(skip(self))]
    pub async fn close_session(&self, session_id: &str) -> Result<()> {
        let session = self.session(session_id).await?;
        session.lock().await.cancel_run();
        self.storage.delete(session_id).await
    }
}
