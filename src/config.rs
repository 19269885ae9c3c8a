use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use dotenvy::dotenv;

use crate::scanner::DEFAULT_CADENCE;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,
    pub api_prefix: String,
    pub log_dir: String,

    // Attendance backend
    pub backend_url: String,
    pub backend_timeout: Duration,
    pub photo_base_url: String,

    // Timers
    pub scan_interval: Duration,
    pub refresh_interval: Duration,
    pub tenant_idle: Duration,

    // Camera kiosk, both set or both unset
    pub camera_url: Option<String>,
    pub kiosk_host: Option<String>,

    // Rate limiting
    pub rate_checkin_per_min: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| -> String {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config = Self {
            server_addr: var("SERVER_ADDR", "127.0.0.1:8080"),
            api_prefix: var("API_PREFIX", "/api"),
            log_dir: var("LOG_DIR", "logs"),

            backend_url: var("BACKEND_URL", "http://localhost:5000/api"),
            backend_timeout: Duration::from_secs(parse(
                "BACKEND_TIMEOUT_SECS",
                &var("BACKEND_TIMEOUT_SECS", "10"),
            )?),
            photo_base_url: var("PHOTO_BASE_URL", "http://localhost:5000/uploads"),

            scan_interval: match optional("SCAN_INTERVAL_MS") {
                Some(ms) => Duration::from_millis(parse("SCAN_INTERVAL_MS", &ms)?),
                None => DEFAULT_CADENCE,
            },
            refresh_interval: Duration::from_secs(parse(
                "REFRESH_INTERVAL_SECS",
                &var("REFRESH_INTERVAL_SECS", "30"),
            )?),
            tenant_idle: Duration::from_secs(parse(
                "TENANT_IDLE_SECS",
                &var("TENANT_IDLE_SECS", "600"),
            )?),

            camera_url: optional("CAMERA_URL"),
            kiosk_host: optional("KIOSK_HOST"),

            rate_checkin_per_min: parse(
                "RATE_CHECKIN_PER_MIN",
                &var("RATE_CHECKIN_PER_MIN", "120"),
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.refresh_interval.is_zero() {
            bail!("REFRESH_INTERVAL_SECS must be greater than zero");
        }
        if self.tenant_idle.is_zero() {
            bail!("TENANT_IDLE_SECS must be greater than zero");
        }
        if self.rate_checkin_per_min == 0 {
            bail!("RATE_CHECKIN_PER_MIN must be greater than zero");
        }
        if self.camera_url.is_some() && self.kiosk_host.is_none() {
            bail!("KIOSK_HOST must be set when CAMERA_URL is set");
        }
        Ok(())
    }
}

fn parse<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("Invalid {key} value: {value}"))
}
