use heartlyzer_flow::OrchestratorConfig;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    /// `pretty` selects human-readable output; anything else is JSON.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("pretty") => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }

    pub fn from_env() -> Self {
        Self::parse(std::env::var("LOG_FORMAT").ok().as_deref())
    }
}

/// Settings read once at startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub port: u16,
    pub log_format: LogFormat,
    /// Base URL of the prediction service. `None` runs the in-memory backend.
    pub prediction_service_url: Option<String>,
    pub orchestrator: OrchestratorConfig,
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = OrchestratorConfig::default();
        let millis = |key: &str, default: Duration| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(default)
        };

        let orchestrator = OrchestratorConfig {
            progress_interval: millis(
                "HEARTLYZER_PROGRESS_INTERVAL_MS",
                defaults.progress_interval,
            ),
            min_analysis_time: millis("HEARTLYZER_MIN_ANALYSIS_MS", defaults.min_analysis_time),
            progress_steps: defaults.progress_steps,
        };

        Self {
            port: lookup("PORT")
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(DEFAULT_PORT),
            log_format: LogFormat::parse(lookup("LOG_FORMAT").as_deref()),
            prediction_service_url: lookup("PREDICTION_SERVICE_URL")
                .filter(|url| !url.trim().is_empty()),
            orchestrator,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
