use serde::Deserialize;
use std::env;
use voyage_catalog::{PricingConfig, PricingEngine};
use voyage_core::TransitionPolicy;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub backend: BackendConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 { 15 }

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LifecycleConfig {
    #[serde(default)]
    pub transition_policy: TransitionPolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String { "voyage=info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: default_filter() }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Developer overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `VOYAGE__BACKEND__BASE_URL=https://api.example.com`
            .add_source(config::Environment::with_prefix("VOYAGE").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    pub fn from_toml_str(source: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    pub fn pricing_engine(&self) -> PricingEngine {
        PricingEngine::new(self.pricing.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::from_toml_str(
            r#"
            [backend]
            base_url = "http://localhost:5000/api"
            "#,
        )
        .unwrap();

        assert_eq!(config.backend.timeout_secs, 15);
        assert_eq!(config.pricing, PricingConfig::default());
        assert_eq!(config.pricing.max_party_size, Some(10));
        assert_eq!(config.lifecycle.transition_policy, TransitionPolicy::Strict);
        assert_eq!(config.logging.filter, "voyage=info");
    }

    #[test]
    fn test_overrides_are_read() {
        let config = Config::from_toml_str(
            r#"
            [backend]
            base_url = "https://backend.example.com"
            timeout_secs = 5

            [pricing]
            transport_child_rate = "0.80"
            max_party_size = 20

            [lifecycle]
            transition_policy = "permissive"
            "#,
        )
        .unwrap();

        assert_eq!(config.backend.timeout_secs, 5);
        assert_eq!(config.pricing.transport_child_rate, Decimal::new(80, 2));
        assert_eq!(config.pricing.tour_child_rate, Decimal::new(70, 2));
        assert_eq!(config.pricing.max_party_size, Some(20));
        assert_eq!(config.lifecycle.transition_policy, TransitionPolicy::Permissive);
    }

    #[test]
    fn test_missing_backend_is_error() {
        assert!(Config::from_toml_str("[logging]\nfilter = \"debug\"").is_err());
    }
}
