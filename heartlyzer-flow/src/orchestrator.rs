//! Runs one prediction in the background: cosmetic progress lines on a timer,
//! the remote call, then a single replacement of the pending placeholder.
//!
//! A run is identified by the `run_id` handed out when the interview
//! completes. Both spawned tasks re-check that id under the session lock
//! before writing, so a cancelled run (new chat, history review) never
//! touches the transcript again even if its task was mid-flight.

use std::time::Duration;
use tracing::{Instrument, debug, info_span};

use crate::{
    session::{PendingRun, SessionState},
    storage::Session,
};

pub const PLACEHOLDER: &str = "Menganalisis data kesehatan Anda...";

pub const FAILURE_MESSAGE: &str =
    "Terjadi kesalahan saat menganalisis data. Silakan coba lagi dengan mengetik \"Mulai lagi\".";

pub const INTEGRITY_ERROR_MESSAGE: &str =
    "Data jawaban tidak lengkap sehingga analisis tidak dapat dilakukan. Silakan ketik \"Mulai lagi\" untuk mengulang.";

pub const PROGRESS_STEPS: [&str; 6] = [
    "Mengumpulkan data dan memverifikasi informasi...",
    "Menganalisis tekanan darah dan kadar gula darah...",
    "Mengevaluasi riwayat keluarga dan faktor risiko...",
    "Menghitung tingkat kolesterol dan trigliserida...",
    "Memprediksi tingkat risiko berdasarkan pola kesehatan...",
    "Menyusun rekomendasi berdasarkan hasil analisis...",
];

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Delay between progress lines. Zero disables them.
    pub progress_interval: Duration,
    /// Time an analysis is shown as running before the remote call is made.
    pub min_analysis_time: Duration,
    pub progress_steps: Vec<String>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            progress_interval: Duration::from_secs(2),
            min_analysis_time: Duration::ZERO,
            progress_steps: PROGRESS_STEPS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl OrchestratorConfig {
    /// No progress lines and no artificial delay.
    pub fn immediate() -> Self {
        Self {
            progress_interval: Duration::ZERO,
            min_analysis_time: Duration::ZERO,
            progress_steps: Vec::new(),
        }
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn with_min_analysis_time(mut self, time: Duration) -> Self {
        self.min_analysis_time = time;
        self
    }
}

/// Spawns the tasks for `run` and registers their abort handles with the
/// session. Must be called while `state` is locked by the caller so the run
/// cannot settle before its handles are attached.
pub(crate) fn launch(
    session: &Session,
    state: &mut SessionState,
    run: PendingRun,
    config: &OrchestratorConfig,
) {
    let run_id = run.run_id;
    let span = info_span!("analysis", session_id = %session.id, run_id);

    let ticker = (!config.progress_interval.is_zero() && !config.progress_steps.is_empty())
        .then(|| {
            tokio::spawn(
                progress_ticker(session.clone(), run_id, config.clone()).instrument(span.clone()),
            )
            .abort_handle()
        });

    let worker = tokio::spawn(
        predict(session.clone(), run, config.min_analysis_time).instrument(span),
    )
    .abort_handle();

    state.attach_tasks(run_id, ticker, worker);
}

async fn progress_ticker(session: Session, run_id: u64, config: OrchestratorConfig) {
    for step in &config.progress_steps {
        tokio::time::sleep(config.progress_interval).await;
        let appended = session.lock().await.push_progress(run_id, step);
        if !appended {
            debug!("run settled, stopping progress");
            return;
        }
        session.touch();
    }
}

async fn predict(session: Session, run: PendingRun, delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let outcome = session.service().train_and_predict(&run.record).await;

    let settled = session.lock().await.finish_run(run.run_id, outcome);
    if settled {
        session.touch();
    } else {
        debug!("run was cancelled, result discarded");
    }
}
