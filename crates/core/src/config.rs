use serde::Deserialize;

use crate::error::{CampaignError, CampaignResult};

/// Root application configuration. Loaded from environment variables
/// with the prefix `CAMPAIGN_SERVER__` and an optional TOML config file.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

/// Delivery simulation knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryConfig {
    /// Probability that a simulated attempt is classified `SENT`.
    #[serde(default = "default_success_rate")]
    pub success_rate: f64,
    /// Upper bound of the random per-recipient latency.
    #[serde(default = "default_max_latency_ms")]
    pub max_latency_ms: u64,
    /// Worker-pool cap on concurrent recipient attempts.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    /// Load demo customers and orders when the store opens.
    #[serde(default)]
    pub seed_demo_data: bool,
}

// Default functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_metrics_enabled() -> bool {
    true
}
fn default_metrics_port() -> u16 {
    9091
}
fn default_success_rate() -> f64 {
    0.9
}
fn default_max_latency_ms() -> u64 {
    100
}
fn default_max_in_flight() -> usize {
    256
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            port: default_metrics_port(),
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            success_rate: default_success_rate(),
            max_latency_ms: default_max_latency_ms(),
            max_in_flight: default_max_in_flight(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            delivery: DeliveryConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl DeliveryConfig {
    pub fn validate(&self) -> CampaignResult<()> {
        if !(0.0..=1.0).contains(&self.success_rate) {
            return Err(CampaignError::Config(format!(
                "delivery.success_rate must be within [0, 1], got {}",
                self.success_rate
            )));
        }
        if self.max_in_flight == 0 {
            return Err(CampaignError::Config(
                "delivery.max_in_flight must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load configuration from an optional config file and environment variables.
    /// Environment variables take precedence.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        let builder = builder.add_source(
            config::Environment::with_prefix("CAMPAIGN_SERVER")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    pub fn validate(&self) -> CampaignResult<()> {
        self.delivery.validate()
    }
}
