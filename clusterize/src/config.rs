use gateway::config::GatewayConfig;
use serde::Deserialize;
use std::fs::File;

/// Environment variable that overrides `gateway.downstream.base_url`.
pub const SERVER_URL_ENV: &str = "SERVER_URL";

fn default_metrics_prefix() -> String {
    "clusterize".to_string()
}

#[derive(Debug, Deserialize)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
    #[serde(default = "default_metrics_prefix")]
    pub prefix: String,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    pub sentry_dsn: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommonConfig {
    pub metrics: Option<MetricsConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub common: CommonConfig,
    pub gateway: Option<GatewayConfig>,
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }

    /// Applies environment overrides. A set but empty `SERVER_URL` clears the
    /// base URL, leaving the gateway up but unconfigured.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let (Some(gateway), Some(url)) = (self.gateway.as_mut(), lookup(SERVER_URL_ENV)) {
            tracing::debug!(env = SERVER_URL_ENV, "overriding downstream base URL");
            gateway.downstream.base_url = url;
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
}
