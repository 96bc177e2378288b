use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Root of the upstream service, without the `/api/v1` suffix.
    pub api_url: String,
    pub port: u16,
    pub cache_ttl: Duration,
    pub request_timeout: Duration,
    pub secure_cookies: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("NITRO_API_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::Missing("NITRO_API_URL"))?;

        Ok(Self {
            api_url,
            port: parsed(&lookup, "PORT", 3000)?,
            cache_ttl: Duration::from_secs(parsed(&lookup, "CACHE_TTL_SECS", 60)?),
            request_timeout: Duration::from_secs(parsed(&lookup, "REQUEST_TIMEOUT_SECS", 30)?),
            secure_cookies: parsed(&lookup, "SECURE_COOKIES", false)?,
        })
    }

    pub fn api_base(&self) -> String {
        format!("{}/api/v1", self.api_url)
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

fn parsed<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) if value.trim().is_empty() => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
