use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::info;

use crate::{
    error::{FlowError, Result},
    record::{HIGH_RISK, HealthData, LOW_RISK, PredictionRecord, PredictionResult},
};

/// Remote prediction service as seen by one caller identity.
#[async_trait]
pub trait PredictionService: Send + Sync {
    async fn get_principal(&self) -> Result<String>;
    async fn train_and_predict(&self, record: &PredictionRecord) -> Result<PredictionResult>;
    async fn get_prediction_history(&self) -> Result<Vec<PredictionResult>>;
    async fn delete_prediction_history(&self, index: usize) -> Result<()>;
    async fn clear_prediction_history(&self) -> Result<()>;
    async fn load_dataset(&self) -> Result<Vec<HealthData>>;
}

/// Hands out a [`PredictionService`] bound to a caller identity.
pub trait ServiceConnector: Send + Sync {
    fn connect(&self, principal: &str) -> Arc<dyn PredictionService>;
}

/// Type alias for risk classifier functions
pub type RiskClassifier = Arc<dyn Fn(&PredictionRecord) -> String + Send + Sync>;

/// Process-local stand-in for the prediction service.
///
/// Keeps every caller's prediction history in memory and classifies with a
/// pluggable closure.
#[derive(Clone)]
pub struct InMemoryBackend {
    histories: Arc<DashMap<String, Vec<PredictionResult>>>,
    classifier: RiskClassifier,
    dataset: Arc<Vec<HealthData>>,
}

impl InMemoryBackend {
    pub fn new<F>(classifier: F) -> Self
    where
        F: Fn(&PredictionRecord) -> String + Send + Sync + 'static,
    {
        Self {
            histories: Arc::new(DashMap::new()),
            classifier: Arc::new(classifier),
            dataset: Arc::new(Vec::new()),
        }
    }

    /// Rule-of-thumb classifier for running without a trained model: any
    /// prior heart attack or heart disease counts as high risk.
    pub fn development() -> Self {
        Self::new(|record| {
            if record.heart_attack || record.previous_heart_disease {
                HIGH_RISK.to_string()
            } else {
                LOW_RISK.to_string()
            }
        })
    }

    /// Backend that answers every request with the same label.
    pub fn with_fixed(risk_level: impl Into<String>) -> Self {
        let risk_level = risk_level.into();
        Self::new(move |_| risk_level.clone())
    }

    pub fn with_dataset(mut self, dataset: Vec<HealthData>) -> Self {
        self.dataset = Arc::new(dataset);
        self
    }

    pub fn client(&self, principal: impl Into<String>) -> InMemoryPredictionService {
        InMemoryPredictionService {
            principal: principal.into(),
            backend: self.clone(),
        }
    }

    pub fn history_len(&self, principal: &str) -> usize {
        self.histories.get(principal).map(|h| h.len()).unwrap_or(0)
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::with_fixed(LOW_RISK)
    }
}

impl ServiceConnector for InMemoryBackend {
    fn connect(&self, principal: &str) -> Arc<dyn PredictionService> {
        Arc::new(self.client(principal))
    }
}

/// [`InMemoryBackend`] viewed through one principal.
#[derive(Clone)]
pub struct InMemoryPredictionService {
    principal: String,
    backend: InMemoryBackend,
}

#[async_trait]
impl PredictionService for InMemoryPredictionService {
    async fn get_principal(&self) -> Result<String> {
        Ok(self.principal.clone())
    }

    async fn train_and_predict(&self, record: &PredictionRecord) -> Result<PredictionResult> {
        let result = PredictionResult::new((self.backend.classifier)(record));
        self.backend
            .histories
            .entry(self.principal.clone())
            .or_default()
            .push(result.clone());
        info!(principal = %self.principal, risk_level = %result.risk_level, "prediction stored");
        Ok(result)
    }

    async fn get_prediction_history(&self) -> Result<Vec<PredictionResult>> {
        Ok(self
            .backend
            .histories
            .get(&self.principal)
            .map(|entry| entry.clone())
            .unwrap_or_default())
    }

    async fn delete_prediction_history(&self, index: usize) -> Result<()> {
        let mut history = self
            .backend
            .histories
            .get_mut(&self.principal)
            .ok_or_else(|| FlowError::Remote("No history found for user".to_string()))?;
        if index >= history.len() {
            return Err(FlowError::Remote("Index out of bounds".to_string()));
        }
        history.remove(index);
        Ok(())
    }

    async fn clear_prediction_history(&self) -> Result<()> {
        self.backend.histories.remove(&self.principal);
        Ok(())
    }

    async fn load_dataset(&self) -> Result<Vec<HealthData>> {
        Ok(self.backend.dataset.as_ref().clone())
    }
}
