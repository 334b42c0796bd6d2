//! Everything one chat session owns, mutated only through its methods.

use serde::Serialize;
use tokio::task::AbortHandle;
use tracing::{debug, error, info, warn};

use crate::{
    error::{FlowError, Result},
    history::{HistoryEntry, HistoryPanel},
    interview::{AnswerOutcome, Command, InterviewState, Stage},
    orchestrator::{FAILURE_MESSAGE, INTEGRITY_ERROR_MESSAGE, PLACEHOLDER},
    record::{PredictionRecord, PredictionResult},
    recommendations,
    transcript::{Transcript, TranscriptEntry},
};

pub const WELCOME_MESSAGE: &str = "Selamat datang di Heartlyzer, sistem analisis risiko penyakit jantung berbasis AI.

Saya akan membantu Anda mengevaluasi risiko penyakit jantung berdasarkan data kesehatan Anda. Anda akan menjawab beberapa pertanyaan satu per satu, dan setiap jawaban Anda akan disimpan untuk analisis.

Proses ini membutuhkan sekitar 5-10 menit. Semua data yang Anda berikan bersifat rahasia dan hanya digunakan untuk perhitungan risiko.

Siap untuk memulai? Ketik \"Mulai\" untuk melanjutkan.";

pub const WELCOME_BACK_MESSAGE: &str = "Selamat datang kembali di Heartlyzer.

Saya akan membantu Anda mengevaluasi risiko penyakit jantung berdasarkan data kesehatan Anda. Ketik \"Mulai\" untuk melanjutkan.";

pub const START_HINT: &str = "Untuk memulai analisis, ketik \"Mulai\".";

pub const FINISHED_HINT: &str =
    "Analisis telah selesai. Jika ingin memulai analisis baru, ketik \"Mulai lagi\".";

pub const REVIEW_HEADER: &str =
    "Berikut adalah hasil analisis risiko jantung Anda dari sesi sebelumnya:";

/// A prediction the caller must now hand to the remote service.
#[derive(Debug, Clone)]
pub struct PendingRun {
    pub run_id: u64,
    pub record: PredictionRecord,
}

/// What a submission did.
#[derive(Debug, Clone)]
pub enum Submission {
    /// Blank input, or dropped because an analysis is in flight.
    Ignored,
    /// Processed synchronously.
    Handled,
    /// The interview just completed; the orchestration must be launched.
    Predict(PendingRun),
}

/// The single orchestration allowed per session.
#[derive(Debug)]
struct InFlight {
    id: u64,
    ticker: Option<AbortHandle>,
    worker: Option<AbortHandle>,
}

#[derive(Debug)]
pub struct SessionState {
    interview: InterviewState,
    transcript: Transcript,
    history: HistoryPanel,
    last_result: Option<PredictionResult>,
    in_flight: Option<InFlight>,
    next_run_id: u64,
}

impl SessionState {
    pub fn new() -> Self {
        let mut transcript = Transcript::new();
        transcript.system(WELCOME_MESSAGE);
        Self {
            interview: InterviewState::new(),
            transcript,
            history: HistoryPanel::new(),
            last_result: None,
            in_flight: None,
            next_run_id: 1,
        }
    }

    pub fn interview(&self) -> &InterviewState {
        &self.interview
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn history(&self) -> &HistoryPanel {
        &self.history
    }

    pub(crate) fn history_mut(&mut self) -> &mut HistoryPanel {
        &mut self.history
    }

    pub fn last_result(&self) -> Option<&PredictionResult> {
        self.last_result.as_ref()
    }

    /// True while an analysis is awaiting its result. Input is dropped meanwhile.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn is_current_run(&self, run_id: u64) -> bool {
        self.in_flight.as_ref().is_some_and(|run| run.id == run_id)
    }

    /// Runs one input through the state machine.
    pub fn submit(&mut self, input: &str) -> Submission {
        let input = input.trim();
        if input.is_empty() {
            return Submission::Ignored;
        }
        if self.is_busy() {
            debug!("input dropped while analysis is in flight");
            return Submission::Ignored;
        }

        self.transcript.user(input);

        let command = Command::parse(input);
        if command == Command::Restart {
            self.restart();
            return Submission::Handled;
        }

        match (self.interview.stage(), command) {
            (Stage::Intro, Command::Start) => {
                if let Some(first) = self.interview.start() {
                    self.transcript.system(first.prompt_message());
                }
                Submission::Handled
            }
            (Stage::Intro, _) => {
                self.transcript.system(START_HINT);
                Submission::Handled
            }
            (Stage::Asking(_), _) => match self.interview.answer(input) {
                AnswerOutcome::Advanced { next } => {
                    self.transcript.system(next.prompt_message());
                    Submission::Handled
                }
                AnswerOutcome::Rejected { field } => {
                    self.transcript.system(field.error_message());
                    Submission::Handled
                }
                AnswerOutcome::Completed => self.begin_run(),
                AnswerOutcome::NotAsking => Submission::Handled,
            },
            (Stage::Complete | Stage::Reviewing, _) => {
                self.transcript.system(FINISHED_HINT);
                Submission::Handled
            }
        }
    }

    /// Places the placeholder and assembles the record. On an integrity
    /// failure the placeholder is settled with an error and no run starts.
    fn begin_run(&mut self) -> Submission {
        self.transcript.pending(PLACEHOLDER);

        let record = match PredictionRecord::from_answers(self.interview.answers()) {
            Ok(record) => record,
            Err(e) => {
                error!(error = %e, "cannot assemble prediction record");
                self.transcript
                    .replace_last(TranscriptEntry::is_pending_system, INTEGRITY_ERROR_MESSAGE);
                return Submission::Handled;
            }
        };

        let run_id = self.next_run_id;
        self.next_run_id += 1;
        self.in_flight = Some(InFlight {
            id: run_id,
            ticker: None,
            worker: None,
        });
        info!(run_id, "interview complete, analysis started");
        Submission::Predict(PendingRun { run_id, record })
    }

    /// Associates spawned tasks with the run so they can be cancelled.
    pub(crate) fn attach_tasks(
        &mut self,
        run_id: u64,
        ticker: Option<AbortHandle>,
        worker: AbortHandle,
    ) {
        match self.in_flight.as_mut() {
            Some(run) if run.id == run_id => {
                run.ticker = ticker;
                run.worker = Some(worker);
            }
            _ => {
                if let Some(ticker) = ticker {
                    ticker.abort();
                }
                worker.abort();
            }
        }
    }

    /// Appends a progress line for the given run, if it is still current.
    pub(crate) fn push_progress(&mut self, run_id: u64, step: &str) -> bool {
        if !self.is_current_run(run_id) {
            return false;
        }
        self.transcript.pending(step);
        true
    }

    /// Settles the run: stops progress, swaps the latest pending entry for
    /// the result (or the failure text) and clears the busy flag.
    pub(crate) fn finish_run(&mut self, run_id: u64, outcome: Result<PredictionResult>) -> bool {
        if !self.is_current_run(run_id) {
            return false;
        }
        if let Some(ticker) = self.in_flight.take().and_then(|run| run.ticker) {
            ticker.abort();
        }

        let content = match outcome {
            Ok(result) => {
                info!(run_id, risk_level = %result.risk_level, "analysis finished");
                let message = recommendations::result_message(&result);
                self.history.push(result.clone());
                self.last_result = Some(result);
                message
            }
            Err(e) => {
                error!(run_id, error = %e, "prediction request failed");
                FAILURE_MESSAGE.to_string()
            }
        };

        if !self
            .transcript
            .replace_last(TranscriptEntry::is_pending_system, content.clone())
        {
            self.transcript.system(content);
        }
        true
    }

    /// Aborts the in-flight analysis, if any, and discards its eventual result.
    pub fn cancel_run(&mut self) {
        if let Some(run) = self.in_flight.take() {
            warn!(run_id = run.id, "cancelling in-flight analysis");
            if let Some(ticker) = run.ticker {
                ticker.abort();
            }
            if let Some(worker) = run.worker {
                worker.abort();
            }
        }
    }

    /// Back to Intro with a single welcome-back entry.
    fn restart(&mut self) {
        info!("interview restarted");
        self.interview.reset();
        self.last_result = None;
        self.transcript.reset([WELCOME_BACK_MESSAGE]);
    }

    /// Sidebar "new chat": always available, cancels any running analysis.
    pub fn new_chat(&mut self) {
        self.cancel_run();
        self.restart();
    }

    /// Shows a past analysis. Cancels any running analysis.
    pub fn select_history(&mut self, index: usize) -> Result<()> {
        let entry = self
            .history
            .get(index)
            .cloned()
            .ok_or(FlowError::HistoryIndexOutOfBounds(index))?;
        self.cancel_run();
        self.show_review(&entry)
    }

    fn show_review(&mut self, entry: &HistoryEntry) -> Result<()> {
        let body = serde_json::to_string_pretty(entry)?;
        self.interview.review();
        self.last_result = Some(entry.result.clone());
        self.transcript.reset([REVIEW_HEADER.to_string(), body]);
        Ok(())
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable picture of a session for clients.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: String,
    pub principal: String,
    pub stage: Stage,
    pub position: i64,
    pub progress: Option<String>,
    pub busy: bool,
    pub revision: u64,
    pub transcript: Vec<TranscriptEntry>,
    pub history: Vec<HistoryEntry>,
}

impl SessionState {
    pub fn view(&self, session_id: &str, principal: &str, revision: u64) -> SessionView {
        SessionView {
            session_id: session_id.to_string(),
            principal: principal.to_string(),
            stage: self.interview.stage(),
            position: self.interview.position(),
            progress: self.interview.progress_label(),
            busy: self.is_busy(),
            revision,
            transcript: self.transcript.entries().to_vec(),
            history: self.history.entries().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::LOW_RISK;
    use crate::schema::{self, FIELDS};
    use crate::transcript::Speaker;

    fn answer_everything(state: &mut SessionState) -> Submission {
        state.submit("mulai");
        let mut last = Submission::Ignored;
        for field in FIELDS {
            let answer = match field.kind {
                schema::FieldKind::Number { min, .. } => min.to_string(),
                schema::FieldKind::Boolean => "tidak".to_string(),
                schema::FieldKind::Select { options } => options[0].to_lowercase(),
            };
            last = state.submit(&answer);
        }
        last
    }

    #[test]
    fn test_new_session_has_single_welcome() {
        let state = SessionState::new();
        assert_eq!(state.transcript().len(), 1);
        assert_eq!(state.transcript().entries()[0].content, WELCOME_MESSAGE);
        assert_eq!(state.interview().position(), -1);
    }

    #[test]
    fn test_intro_without_start_repeats_hint() {
        let mut state = SessionState::new();
        assert!(matches!(state.submit("halo"), Submission::Handled));
        assert_eq!(state.interview().position(), -1);
        assert_eq!(state.transcript().last().unwrap().content, START_HINT);
    }

    #[test]
    fn test_blank_input_is_ignored() {
        let mut state = SessionState::new();
        assert!(matches!(state.submit("   "), Submission::Ignored));
        assert_eq!(state.transcript().len(), 1);
    }

    #[test]
    fn test_rejection_appends_error_without_progress() {
        let mut state = SessionState::new();
        state.submit("mulai");
        state.submit("15");
        assert_eq!(state.interview().position(), 0);
        assert!(state.interview().answers().is_empty());
        let last = state.transcript().last().unwrap();
        assert_eq!(last.speaker, Speaker::System);
        assert!(last.content.contains("18-100"));
    }

    #[test]
    fn test_completion_starts_single_run_and_blocks_input() {
        let mut state = SessionState::new();
        let submission = answer_everything(&mut state);
        let Submission::Predict(run) = submission else {
            panic!("expected a prediction run");
        };
        assert_eq!(run.record.age, 18);
        assert!(state.is_busy());
        assert_eq!(state.transcript().last().unwrap().content, PLACEHOLDER);

        let before = state.transcript().len();
        assert!(matches!(state.submit("mulai lagi"), Submission::Ignored));
        assert_eq!(state.transcript().len(), before);
        assert_eq!(state.interview().stage(), Stage::Complete);
    }

    #[test]
    fn test_finish_replaces_latest_pending_entry() {
        let mut state = SessionState::new();
        let Submission::Predict(run) = answer_everything(&mut state) else {
            panic!("expected a prediction run");
        };
        assert!(state.push_progress(run.run_id, "step"));
        let len = state.transcript().len();

        assert!(state.finish_run(run.run_id, Ok(PredictionResult::new(LOW_RISK))));
        assert_eq!(state.transcript().len(), len);
        assert!(!state.is_busy());
        assert!(state.transcript().last().unwrap().content.contains("RISIKO RENDAH"));
        assert_eq!(state.history().len(), 1);
        assert!(!state.push_progress(run.run_id, "late step"));
    }

    #[test]
    fn test_failure_message_and_restart() {
        let mut state = SessionState::new();
        let Submission::Predict(run) = answer_everything(&mut state) else {
            panic!("expected a prediction run");
        };
        state.finish_run(run.run_id, Err(FlowError::Transport("down".into())));
        assert_eq!(state.transcript().last().unwrap().content, FAILURE_MESSAGE);
        assert!(state.history().is_empty());

        state.submit("Mulai Lagi");
        assert_eq!(state.interview().position(), -1);
        assert!(state.interview().answers().is_empty());
        assert_eq!(state.transcript().len(), 1);
        assert_eq!(state.transcript().entries()[0].content, WELCOME_BACK_MESSAGE);
    }

    #[test]
    fn test_new_chat_discards_running_analysis() {
        let mut state = SessionState::new();
        let Submission::Predict(run) = answer_everything(&mut state) else {
            panic!("expected a prediction run");
        };
        state.new_chat();
        assert!(!state.is_busy());
        assert!(!state.finish_run(run.run_id, Ok(PredictionResult::new(LOW_RISK))));
        assert_eq!(state.transcript().len(), 1);
        assert_eq!(state.transcript().entries()[0].content, WELCOME_BACK_MESSAGE);
    }

    #[test]
    fn test_review_mode_refuses_answers() {
        let mut state = SessionState::new();
        state.history_mut().push(PredictionResult::new("High risk"));
        assert!(matches!(
            state.select_history(4),
            Err(FlowError::HistoryIndexOutOfBounds(4))
        ));

        state.select_history(0).unwrap();
        assert_eq!(state.interview().position(), -2);
        assert_eq!(state.transcript().len(), 2);
        assert!(state.transcript().entries()[1].content.contains("High risk"));

        state.submit("45");
        assert_eq!(state.transcript().last().unwrap().content, FINISHED_HINT);
        state.submit("mulai lagi");
        assert_eq!(state.interview().position(), -1);
    }
}
