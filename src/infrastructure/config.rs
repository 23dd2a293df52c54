use crate::domain::billing::{TariffRate, DEFAULT_TARIFF_RATE};
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use serde::Deserialize;

const CONFIG_FILE: &str = "config/electroguard";
const ENV_PREFIX: &str = "ELECTROGUARD";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub billing: BillingSettings,
    pub narrative: NarrativeSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind_address: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BillingSettings {
    /// Initial tariff; operators change it at runtime.
    pub tariff_rate: TariffRate,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NarrativeSettings {
    pub base_url: String,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

fn with_defaults() -> anyhow::Result<ConfigBuilder<DefaultState>> {
    Ok(config::Config::builder()
        .set_default("server.bind_address", "0.0.0.0:8080")?
        .set_default("billing.tariff_rate", DEFAULT_TARIFF_RATE)?
        .set_default("narrative.base_url", "https://generativelanguage.googleapis.com")?
        .set_default("narrative.model", "gemini-2.5-flash")?
        .set_default("narrative.timeout_secs", 30)?)
}

/// Defaults, then `config/electroguard.*` if present, then `ELECTROGUARD__SECTION__KEY` variables.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = with_defaults()?
        .add_source(File::with_name(CONFIG_FILE).required(false))
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}
