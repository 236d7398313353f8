use crate::domain::Credentials;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,

    // Hosted AI flows (detection + categorization)
    pub ai_base_url: String,
    pub ai_api_key: Option<String>,
    pub ai_timeout_secs: u64,

    pub free_scan_limit: u32,
    pub default_currency: String,

    // Mock login
    pub demo_email: String,
    pub demo_password: String,
    pub seed_demo_data: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("SUBSCRIBE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server_host", "0.0.0.0")?
            .set_default("server_port", 8080)?
            .set_default("ai_base_url", "http://localhost:3400")?
            .set_default("ai_timeout_secs", 30)?
            .set_default("free_scan_limit", 1)?
            .set_default("default_currency", "USD")?
            .set_default("demo_email", "user@example.com")?
            .set_default("demo_password", "password")?
            .set_default("seed_demo_data", true)?
            .build()?;

        config.try_deserialize()
    }

    pub fn ai_timeout(&self) -> Duration {
        Duration::from_secs(self.ai_timeout_secs)
    }

    pub fn demo_credentials(&self) -> Credentials {
        Credentials::new(self.demo_email.clone(), self.demo_password.clone())
    }
}
