pub mod app_config;
pub mod client;
pub mod telemetry;

pub use app_config::{BackendConfig, Config, LifecycleConfig, LoggingConfig};
pub use client::BackendClient;
