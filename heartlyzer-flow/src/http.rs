//! JSON-over-HTTP client for a remote prediction service.
//!
//! Wire contract (caller identity in the `x-principal` header):
//!
//! | operation | request |
//! |---|---|
//! | `get_principal` | `GET /principal` -> `{ "principal": "..." }` |
//! | `train_and_predict` | `POST /predict` with the record |
//! | `get_prediction_history` | `GET /history` |
//! | `delete_prediction_history` | `DELETE /history/{index}` |
//! | `clear_prediction_history` | `DELETE /history` |
//! | `load_dataset` | `GET /dataset` |
//!
//! Failures come back as a non-2xx status with `{ "error": "..." }`.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    error::{FlowError, Result},
    record::{HealthData, PredictionRecord, PredictionResult},
    service::{PredictionService, ServiceConnector},
};

pub const PRINCIPAL_HEADER: &str = "x-principal";

#[derive(Deserialize)]
struct PrincipalBody {
    principal: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Clone)]
pub struct HttpPredictionService {
    client: Client,
    base_url: String,
    principal: String,
}

impl HttpPredictionService {
    pub fn new(base_url: impl Into<String>, principal: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url, principal)
    }

    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        principal: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            principal: principal.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .header(PRINCIPAL_HEADER, &self.principal)
            .send()
            .await
            .map_err(|e| FlowError::Transport(e.to_string()))?;

        let status = response.status();
        debug!(%status, "prediction service responded");
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or_else(|_| format!("HTTP {status}: {text}"));
        warn!(%status, error = %message, "prediction service returned an error");
        Err(FlowError::Remote(message))
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| FlowError::Transport(format!("invalid response body: {e}")))
    }
}

#[async_trait]
impl PredictionService for HttpPredictionService {
    async fn get_principal(&self) -> Result<String> {
        let body: PrincipalBody = self.json(self.client.get(self.url("/principal"))).await?;
        Ok(body.principal)
    }

    async fn train_and_predict(&self, record: &PredictionRecord) -> Result<PredictionResult> {
        self.json(self.client.post(self.url("/predict")).json(record))
            .await
    }

    async fn get_prediction_history(&self) -> Result<Vec<PredictionResult>> {
        self.json(self.client.get(self.url("/history"))).await
    }

    async fn delete_prediction_history(&self, index: usize) -> Result<()> {
        self.send(self.client.delete(self.url(&format!("/history/{index}"))))
            .await
            .map(|_| ())
    }

    async fn clear_prediction_history(&self) -> Result<()> {
        self.send(self.client.delete(self.url("/history")))
            .await
            .map(|_| ())
    }

    async fn load_dataset(&self) -> Result<Vec<HealthData>> {
        self.json(self.client.get(self.url("/dataset"))).await
    }
}

/// Connector sharing one HTTP connection pool across identities.
#[derive(Clone)]
pub struct HttpConnector {
    client: Client,
    base_url: String,
}

impl HttpConnector {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl ServiceConnector for HttpConnector {
    fn connect(&self, principal: &str) -> Arc<dyn PredictionService> {
        Arc::new(HttpPredictionService::with_client(
            self.client.clone(),
            self.base_url.clone(),
            principal,
        ))
    }
}
