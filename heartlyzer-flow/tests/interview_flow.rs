use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;

use heartlyzer_flow::{
    ChatRunner, FlowError, HealthData, InMemoryBackend, InMemorySessionStorage,
    OrchestratorConfig, PredictionRecord, PredictionResult, PredictionService, Result,
    ServiceConnector, Session, SessionState, Speaker, SubmitOutcome,
    interview::Stage,
    orchestrator::{FAILURE_MESSAGE, PLACEHOLDER, PROGRESS_STEPS},
    recommendations::{HIGH_RISK_BUNDLE, HOSPITALS_HEADING, LOW_RISK_BUNDLE},
    session::{WELCOME_BACK_MESSAGE, WELCOME_MESSAGE},
};

const HEALTHY: [&str; 28] = [
    "45", "female", "rural", "middle", "tidak", "tidak", "180", "tidak", "75", "tidak", "never",
    "none", "high", "healthy", "low", "low", "8", "115", "75", "90", "60", "90", "120", "normal",
    "tidak", "tidak", "ya", "tidak",
];

/// Prediction service whose answers are held until the test releases them.
#[derive(Default)]
struct ScriptedService {
    gate: Option<Semaphore>,
    fail: AtomicBool,
    calls: AtomicUsize,
    risk_level: String,
    history: std::sync::Mutex<Vec<PredictionResult>>,
    fail_history: AtomicBool,
}

impl ScriptedService {
    fn returning(risk_level: &str) -> Self {
        Self {
            risk_level: risk_level.to_string(),
            ..Default::default()
        }
    }

    fn gated(risk_level: &str) -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::returning(risk_level)
        }
    }

    fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PredictionService for ScriptedService {
    async fn get_principal(&self) -> Result<String> {
        Ok("tester".to_string())
    }

    async fn train_and_predict(&self, _record: &PredictionRecord) -> Result<PredictionResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| FlowError::Transport(e.to_string()))?
                .forget();
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(FlowError::Transport("connection refused".to_string()));
        }
        let result = PredictionResult::new(self.risk_level.clone());
        self.history.lock().unwrap().push(result.clone());
        Ok(result)
    }

    async fn get_prediction_history(&self) -> Result<Vec<PredictionResult>> {
        if self.fail_history.load(Ordering::SeqCst) {
            return Err(FlowError::Transport("connection refused".to_string()));
        }
        Ok(self.history.lock().unwrap().clone())
    }

    async fn delete_prediction_history(&self, index: usize) -> Result<()> {
        if self.fail_history.load(Ordering::SeqCst) {
            return Err(FlowError::Remote("Index out of bounds".to_string()));
        }
        self.history.lock().unwrap().remove(index);
        Ok(())
    }

    async fn clear_prediction_history(&self) -> Result<()> {
        self.history.lock().unwrap().clear();
        Ok(())
    }

    async fn load_dataset(&self) -> Result<Vec<HealthData>> {
        Ok(Vec::new())
    }
}

struct ScriptedConnector(Arc<ScriptedService>);

impl ServiceConnector for ScriptedConnector {
    fn connect(&self, _principal: &str) -> Arc<dyn PredictionService> {
        self.0.clone()
    }
}

fn runner_with(service: &Arc<ScriptedService>, config: OrchestratorConfig) -> ChatRunner {
    ChatRunner::with_config(
        Arc::new(InMemorySessionStorage::new()),
        Arc::new(ScriptedConnector(service.clone())),
        config,
    )
}

async fn answer_all(runner: &ChatRunner, session: &Session) -> SubmitOutcome {
    runner.submit(&session.id, "Mulai").await.unwrap();
    let mut outcome = SubmitOutcome::Ignored;
    for answer in HEALTHY {
        outcome = runner.submit(&session.id, answer).await.unwrap();
    }
    outcome
}

async fn wait_until<F>(session: &Session, predicate: F)
where
    F: Fn(&SessionState) -> bool,
{
    let mut rx = session.subscribe();
    loop {
        if predicate(&*session.lock().await) {
            return;
        }
        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .expect("session did not reach the expected state in time")
            .unwrap();
    }
}

#[tokio::test]
async fn test_low_risk_run_shows_prevention_advice() {
    let service = Arc::new(ScriptedService::returning("Low risk"));
    let runner = runner_with(&service, OrchestratorConfig::immediate());
    let session = runner.open_session("tester").await.unwrap();

    let outcome = answer_all(&runner, &session).await;
    assert!(matches!(outcome, SubmitOutcome::PredictionStarted { .. }));
    wait_until(&session, |s| !s.is_busy()).await;

    let state = session.lock().await;
    let last = state.transcript().last().unwrap();
    assert_eq!(last.speaker, Speaker::System);
    assert!(last.content.contains(LOW_RISK_BUNDLE.title));
    assert!(!last.content.contains(HOSPITALS_HEADING));
    assert_eq!(state.history().len(), 1);
    assert_eq!(state.interview().stage(), Stage::Complete);
    assert_eq!(service.calls(), 1);
}

#[tokio::test]
async fn test_high_risk_run_lists_hospitals() {
    let service = Arc::new(ScriptedService::returning("High risk"));
    let runner = runner_with(&service, OrchestratorConfig::immediate());
    let session = runner.open_session("tester").await.unwrap();

    answer_all(&runner, &session).await;
    wait_until(&session, |s| !s.is_busy()).await;

    let state = session.lock().await;
    let last = &state.transcript().last().unwrap().content;
    assert!(last.contains(HIGH_RISK_BUNDLE.title));
    assert!(last.contains(HOSPITALS_HEADING));
}

#[tokio::test]
async fn test_rejected_answer_keeps_position() {
    let service = Arc::new(ScriptedService::returning("Low risk"));
    let runner = runner_with(&service, OrchestratorConfig::immediate());
    let session = runner.open_session("tester").await.unwrap();

    runner.submit(&session.id, "mulai").await.unwrap();
    runner.submit(&session.id, "15").await.unwrap();
    {
        let state = session.lock().await;
        assert_eq!(state.interview().position(), 0);
        assert!(state.interview().answers().is_empty());
    }

    runner.submit(&session.id, "45").await.unwrap();
    let view = runner.snapshot(&session.id).await.unwrap();
    assert_eq!(view.position, 1);
    assert_eq!(view.progress.as_deref(), Some("Pertanyaan 2 dari 28"));
}

#[tokio::test]
async fn test_each_accepted_answer_advances_by_exactly_one() {
    let service = Arc::new(ScriptedService::gated("Low risk"));
    let runner = runner_with(&service, OrchestratorConfig::immediate());
    let session = runner.open_session("tester").await.unwrap();

    runner.submit(&session.id, "mulai").await.unwrap();
    for (i, answer) in HEALTHY.iter().enumerate() {
        runner.submit(&session.id, answer).await.unwrap();
        let state = session.lock().await;
        assert_eq!(state.interview().position(), i as i64 + 1);
        assert_eq!(state.interview().answers().len(), i + 1);
    }
    service.release();
}

#[tokio::test]
async fn test_restart_is_idempotent_from_every_stage() {
    let service = Arc::new(ScriptedService::returning("Low risk"));
    let runner = runner_with(&service, OrchestratorConfig::immediate());
    let session = runner.open_session("tester").await.unwrap();

    let assert_reset = |state: &SessionState| {
        assert_eq!(state.interview().position(), -1);
        assert!(state.interview().answers().is_empty());
        assert_eq!(state.transcript().len(), 1);
        assert_eq!(state.transcript().entries()[0].content, WELCOME_BACK_MESSAGE);
    };

    // intro
    runner.submit(&session.id, "mulai lagi").await.unwrap();
    assert_reset(&*session.lock().await);

    // mid-interview
    runner.submit(&session.id, "mulai").await.unwrap();
    runner.submit(&session.id, "45").await.unwrap();
    runner.submit(&session.id, "MULAI LAGI").await.unwrap();
    assert_reset(&*session.lock().await);

    // complete
    answer_all(&runner, &session).await;
    wait_until(&session, |s| !s.is_busy()).await;
    runner.submit(&session.id, " Mulai lagi ").await.unwrap();
    assert_reset(&*session.lock().await);

    // reviewing
    runner.select_history(&session.id, 0).await.unwrap();
    assert_eq!(session.lock().await.interview().position(), -2);
    runner.submit(&session.id, "mulai lagi").await.unwrap();
    assert_reset(&*session.lock().await);
}

#[tokio::test]
async fn test_input_while_busy_has_no_effect() {
    let service = Arc::new(ScriptedService::gated("Low risk"));
    let runner = runner_with(&service, OrchestratorConfig::immediate());
    let session = runner.open_session("tester").await.unwrap();

    answer_all(&runner, &session).await;
    let before = runner.snapshot(&session.id).await.unwrap();
    assert!(before.busy);

    let first = runner.submit(&session.id, "45").await.unwrap();
    let second = runner.submit(&session.id, "mulai lagi").await.unwrap();
    assert_eq!(first, SubmitOutcome::Ignored);
    assert_eq!(second, SubmitOutcome::Ignored);

    let during = runner.snapshot(&session.id).await.unwrap();
    assert_eq!(during.position, before.position);
    assert_eq!(during.transcript.len(), before.transcript.len());

    service.release();
    wait_until(&session, |s| !s.is_busy()).await;
    assert_eq!(service.calls(), 1);
}

#[tokio::test]
async fn test_failed_prediction_replaces_placeholder() {
    let service = Arc::new(ScriptedService::returning("Low risk"));
    service.fail.store(true, Ordering::SeqCst);
    let runner = runner_with(&service, OrchestratorConfig::immediate());
    let session = runner.open_session("tester").await.unwrap();

    answer_all(&runner, &session).await;
    wait_until(&session, |s| !s.is_busy()).await;

    let state = session.lock().await;
    let entries = state.transcript().entries();
    assert_eq!(entries.last().unwrap().content, FAILURE_MESSAGE);
    assert!(entries.iter().all(|e| e.content != PLACEHOLDER));
    assert!(state.history().is_empty());
}

#[tokio::test]
async fn test_progress_stops_once_result_arrives() {
    let service = Arc::new(ScriptedService::gated("Low risk"));
    let config = OrchestratorConfig::default().with_progress_interval(Duration::from_millis(10));
    let runner = runner_with(&service, config);
    let session = runner.open_session("tester").await.unwrap();

    answer_all(&runner, &session).await;
    wait_until(&session, |s| {
        s.transcript()
            .entries()
            .iter()
            .any(|e| e.content == PROGRESS_STEPS[1])
    })
    .await;

    service.release();
    wait_until(&session, |s| !s.is_busy()).await;
    let settled_len = session.lock().await.transcript().len();

    tokio::time::sleep(Duration::from_millis(100)).await;
    let state = session.lock().await;
    assert_eq!(state.transcript().len(), settled_len);
    assert!(state.transcript().last().unwrap().content.contains(LOW_RISK_BUNDLE.title));
    assert!(state.transcript().entries().iter().any(|e| e.content == PLACEHOLDER));
}

#[tokio::test]
async fn test_new_chat_discards_in_flight_result() {
    let service = Arc::new(ScriptedService::gated("High risk"));
    let runner = runner_with(&service, OrchestratorConfig::immediate());
    let session = runner.open_session("tester").await.unwrap();

    answer_all(&runner, &session).await;
    runner.new_chat(&session.id).await.unwrap();
    service.release();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let view = runner.snapshot(&session.id).await.unwrap();
    assert!(!view.busy);
    assert_eq!(view.position, -1);
    assert_eq!(view.transcript.len(), 1);
    assert_eq!(view.transcript[0].content, WELCOME_BACK_MESSAGE);
    assert!(view.history.is_empty());
}

#[tokio::test]
async fn test_history_fetched_on_open_and_mirrors_deletes() -> anyhow::Result<()> {
    let backend = InMemoryBackend::with_fixed("High risk");
    let record: PredictionRecord = serde_json::from_value(serde_json::json!({
            "age": 60, "gender": "Male", "region": "Urban", "income_level": "Low",
            "hypertension": 1, "diabetes": 1, "cholesterol_level": 260, "obesity": 1,
            "waist_circumference": 110, "family_history": 1, "smoking_status": "Current",
            "alcohol_consumption": "High", "physical_activity": "Low",
            "dietary_habits": "Unhealthy", "air_pollution_exposure": "High",
            "stress_level": "High", "sleep_hours": 5, "blood_pressure_systolic": 170,
            "blood_pressure_diastolic": 100, "fasting_blood_sugar": 160,
            "cholesterol_hdl": 30, "cholesterol_ldl": 170, "triglycerides": 250,
            "ekg_results": "Abnormal", "previous_heart_disease": 1, "medication_usage": 1,
            "participated_in_free_screening": 0, "heart_attack": 1
        }))?;
    let remote = backend.client("erin");
    remote.train_and_predict(&record).await?;
    remote.train_and_predict(&record).await?;

    let runner = ChatRunner::with_config(
        Arc::new(InMemorySessionStorage::new()),
        Arc::new(backend.clone()),
        OrchestratorConfig::immediate(),
    );
    let session = runner.open_session("erin").await?;
    let view = runner.snapshot(&session.id).await?;
    assert_eq!(view.principal, "erin");
    assert_eq!(view.transcript[0].content, WELCOME_MESSAGE);
    assert_eq!(view.history.len(), 2);
    assert_eq!(view.history[1].label, "Analisis Jantung #2");

    runner.delete_history(&session.id, 0).await?;
    assert_eq!(backend.history_len("erin"), 1);
    assert_eq!(runner.snapshot(&session.id).await?.history.len(), 1);

    let err = runner.delete_history(&session.id, 7).await.unwrap_err();
    assert!(matches!(err, FlowError::HistoryIndexOutOfBounds(7)));

    runner.clear_history(&session.id).await?;
    assert_eq!(backend.history_len("erin"), 0);
    assert!(runner.snapshot(&session.id).await?.history.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_failed_remote_delete_keeps_local_list() {
    let service = Arc::new(ScriptedService::returning("Low risk"));
    let runner = runner_with(&service, OrchestratorConfig::immediate());
    let session = runner.open_session("tester").await.unwrap();

    answer_all(&runner, &session).await;
    wait_until(&session, |s| !s.is_busy()).await;

    service.fail_history.store(true, Ordering::SeqCst);
    let err = runner.delete_history(&session.id, 0).await.unwrap_err();
    assert!(matches!(err, FlowError::Remote(_)));
    assert_eq!(session.lock().await.history().len(), 1);

    assert!(runner.refresh_history(&session.id).await.is_err());
    assert_eq!(session.lock().await.history().len(), 1);
}

#[tokio::test]
async fn test_unknown_session_is_reported() {
    let service = Arc::new(ScriptedService::returning("Low risk"));
    let runner = runner_with(&service, OrchestratorConfig::immediate());
    let err = runner.submit("missing", "mulai").await.unwrap_err();
    assert!(matches!(err, FlowError::SessionNotFound(ref id) if id == "missing"));
}
