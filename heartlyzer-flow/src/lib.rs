//! Conversational cardiovascular-risk questionnaire.
//!
//! A [`ChatRunner`] walks each [`Session`] through the 28-field interview,
//! hands the completed record to a [`PredictionService`], and mirrors the
//! caller's prediction history.

pub mod error;
pub mod history;
#[cfg(feature = "http")]
pub mod http;
pub mod interview;
pub mod orchestrator;
pub mod recommendations;
pub mod record;
pub mod render;
pub mod runner;
pub mod schema;
pub mod service;
pub mod session;
pub mod storage;
pub mod transcript;

// Re-export commonly used types
pub use error::{FlowError, Result};
pub use history::{HistoryEntry, HistoryPanel};
#[cfg(feature = "http")]
pub use http::{HttpConnector, HttpPredictionService, PRINCIPAL_HEADER};
pub use interview::{AnswerOutcome, Command, InterviewState, Stage};
pub use orchestrator::OrchestratorConfig;
pub use record::{HealthData, PredictionRecord, PredictionResult, RiskLevel};
pub use render::{MarkupStyle, render_entry};
pub use runner::{ChatRunner, SubmitOutcome};
pub use schema::{AnswerValue, FIELDS, FieldKind, FieldSpec};
pub use service::{InMemoryBackend, PredictionService, ServiceConnector};
pub use session::{SessionState, SessionView};
pub use storage::{InMemorySessionStorage, Session, SessionStorage};
pub use transcript::{Speaker, Transcript, TranscriptEntry};
