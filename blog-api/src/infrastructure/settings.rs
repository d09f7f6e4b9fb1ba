use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};

use crate::domain::filter::MAX_PAGE_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(anyhow!(
                "APP_ENV must be one of development|staging|production, got '{other}'"
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub max_idle_time: Duration,
    pub query_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct LimiterSettings {
    pub enabled: bool,
    pub rps: f64,
    pub burst: u32,
    pub sweep_interval: Duration,
    pub idle_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub sender: String,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub environment: Environment,
    pub http_addr: String,
    pub cors_origins: Vec<String>,
    pub log_level: String,
    pub http_request_body_limit_bytes: usize,
    pub http_concurrency_limit: usize,
    pub http_request_timeout_secs: u64,
    pub default_page_size: i64,
    pub database: DatabaseSettings,
    pub limiter: LimiterSettings,
    pub smtp: SmtpSettings,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let database_url = env.required("DATABASE_URL")?;
        let environment = env
            .string("APP_ENV", "development")
            .parse::<Environment>()?;

        let http_addr = env.string("HTTP_ADDR", "0.0.0.0:9090");
        let cors_origins = parse_cors_origins(
            &env.string("CORS_ORIGINS", "http://localhost:8000,http://127.0.0.1:8000"),
        );
        let log_level = env
            .get("LOG_LEVEL")
            .or_else(|| env.get("RUST_LOG"))
            .unwrap_or_else(|| "info".to_string());

        let http_request_body_limit_bytes =
            env.positive::<usize>("HTTP_REQUEST_BODY_LIMIT_BYTES", 1024 * 1024)?;
        let http_concurrency_limit = env.positive::<usize>("HTTP_CONCURRENCY_LIMIT", 256)?;
        let http_request_timeout_secs = env.positive::<u64>("HTTP_REQUEST_TIMEOUT_SECS", 10)?;

        let default_page_size = env.positive::<i64>("DEFAULT_PAGE_SIZE", 20)?;
        if default_page_size > MAX_PAGE_SIZE {
            return Err(anyhow!(
                "DEFAULT_PAGE_SIZE must be <= {MAX_PAGE_SIZE}, got {default_page_size}"
            ));
        }

        let database = DatabaseSettings {
            url: database_url,
            max_connections: env.positive::<u32>("DB_MAX_CONNECTIONS", 25)?,
            max_idle_time: Duration::from_secs(env.positive::<u64>("DB_MAX_IDLE_TIME_SECS", 600)?),
            query_timeout: Duration::from_secs(env.positive::<u64>("DB_QUERY_TIMEOUT_SECS", 3)?),
        };

        let rps = env.parse::<f64>("LIMITER_RPS", 2.0)?;
        if !rps.is_finite() || rps <= 0.0 {
            return Err(anyhow!("LIMITER_RPS must be > 0"));
        }
        let limiter = LimiterSettings {
            enabled: env.parse::<bool>("LIMITER_ENABLED", true)?,
            rps,
            burst: env.positive::<u32>("LIMITER_BURST", 4)?,
            sweep_interval: Duration::from_secs(
                env.positive::<u64>("LIMITER_SWEEP_INTERVAL_SECS", 60)?,
            ),
            idle_timeout: Duration::from_secs(
                env.positive::<u64>("LIMITER_IDLE_TIMEOUT_SECS", 180)?,
            ),
        };

        let smtp = SmtpSettings {
            host: env.string("SMTP_HOST", "localhost"),
            port: env.positive::<u16>("SMTP_PORT", 2525)?,
            username: env.string("SMTP_USERNAME", ""),
            password: env.string("SMTP_PASSWORD", ""),
            sender: env.string("SMTP_SENDER", "Blog <no-reply@blog.local>"),
        };

        Ok(Self {
            environment,
            http_addr,
            cors_origins,
            log_level,
            http_request_body_limit_bytes,
            http_concurrency_limit,
            http_request_timeout_secs,
            default_page_size,
            database,
            limiter,
            smtp,
        })
    }
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn required(&self, key: &str) -> Result<String> {
        self.get(key)
            .ok_or_else(|| anyhow!("{key} is required and must not be empty"))
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn parse<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match self.get(key) {
            Some(raw) => raw
                .parse::<T>()
                .with_context(|| format!("Failed to parse {key}, got '{raw}'")),
            None => Ok(default),
        }
    }

    fn positive<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr + Default + PartialOrd,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        let value = self
            .parse(key, default)
            .with_context(|| format!("{key} must be a positive integer"))?;
        if value <= T::default() {
            return Err(anyhow!("{key} must be > 0"));
        }
        Ok(value)
    }
}

fn parse_cors_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}
