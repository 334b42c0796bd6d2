pub mod config;
pub mod models;
pub mod service;
pub mod telemetry;

pub use config::{LogFormat, ServiceConfig};
pub use service::{AppState, build_router, create_app, create_connector};
pub use telemetry::{correlation_id_middleware, init_tracing};
