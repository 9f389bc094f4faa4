use std::fs::File;

use anyhow::{Context, Result};
use serde::Deserialize;

const CONFIG_PATH_VAR: &str = "FORGE_API_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "./config.yml";

fn default_log_level() -> String {
    String::from("info")
}

// UTC-5; used to bucket workout timestamps into calendar days for streaks
fn default_utc_offset_hours() -> i32 {
    -5
}

#[derive(Deserialize, Clone)]
pub struct ListenConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Clone)]
pub struct MongoConfig {
    pub url: String,
    pub database: String,
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    pub listen: ListenConfig,
    pub mongo: MongoConfig,
    /// SHA-256 hex of the admin token expected in the `Authorization` header.
    pub admin_token_hash: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
}

pub fn load_config() -> Result<ApiConfig> {
    let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| String::from(DEFAULT_CONFIG_PATH));
    let file = File::open(&path).with_context(|| format!("Could not open config file at '{}'", path))?;
    let config: ApiConfig =
        serde_yaml::from_reader(file).with_context(|| format!("Could not parse config file at '{}'", path))?;
    Ok(config)
}
