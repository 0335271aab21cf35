use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Excel,
    Postgres,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub storage_backend: StorageBackend,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub workbook_path: String,
    pub workbook_cache_path: String,
    pub workbook_seed_path: Option<String>,
    pub workbook_urls: Vec<String>,
    pub approvals_path: String,
    pub public_rps: u32,
    pub api_rps: u32,
    pub bootstrap_admin_email: Option<String>,
    pub bootstrap_admin_password: Option<String>,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let storage_backend = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "excel".to_string())
            .to_lowercase()
            .as_str()
        {
            "excel" => StorageBackend::Excel,
            "postgres" => StorageBackend::Postgres,
            other => {
                return Err(Error::Config(format!(
                    "Invalid STORAGE_BACKEND: {} (expected excel or postgres)",
                    other
                )))
            }
        };

        let workbook_urls = env::var("WORKBOOK_URLS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            storage_backend,
            session_secret: get_env("SESSION_SECRET")?,
            session_ttl_hours: get_env_or_parse("SESSION_TTL_HOURS", 12)?,
            workbook_path: env::var("WORKBOOK_PATH")
                .unwrap_or_else(|_| "data/suppliers.xlsx".to_string()),
            workbook_cache_path: env::var("WORKBOOK_CACHE_PATH")
                .unwrap_or_else(|_| "data/suppliers.cache.xlsx".to_string()),
            workbook_seed_path: env::var("WORKBOOK_SEED_PATH").ok(),
            workbook_urls,
            approvals_path: env::var("APPROVALS_PATH")
                .unwrap_or_else(|_| "data/approvals.json".to_string()),
            public_rps: get_env_or_parse("PUBLIC_RPS", 30)?,
            api_rps: get_env_or_parse("API_RPS", 100)?,
            bootstrap_admin_email: env::var("BOOTSTRAP_ADMIN_EMAIL").ok(),
            bootstrap_admin_password: env::var("BOOTSTRAP_ADMIN_PASSWORD").ok(),
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or_parse<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
