use crate::application::dashboard::DashboardSettings;
use crate::domain::entities::TimeRange;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub base_url: String,
    pub auth_token: Option<String>,
    pub request_timeout_secs: u64,
    pub search_debounce_ms: u64,
    pub noteworthy_status_code: u16,
    pub noteworthy_limit: u32,
    /// 0 disables auto refresh
    pub auto_refresh_secs: u64,
    pub trend_range: TimeRange,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            auth_token: None,
            request_timeout_secs: 30,
            search_debounce_ms: 500,
            noteworthy_status_code: 429,
            noteworthy_limit: 10,
            auto_refresh_secs: 0,
            trend_range: TimeRange::TwentyFourHours,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let base_url = lookup("KEYDASH_BASE_URL").unwrap_or(defaults.base_url);
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(base_url));
        }

        let auth_token = lookup("KEYDASH_AUTH_TOKEN").filter(|token| !token.is_empty());

        let request_timeout_secs = parse_var(&lookup, "KEYDASH_REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs)?;
        if request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                name: "KEYDASH_REQUEST_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }

        let search_debounce_ms = parse_var(&lookup, "KEYDASH_SEARCH_DEBOUNCE_MS", defaults.search_debounce_ms)?;
        let noteworthy_status_code =
            parse_var(&lookup, "KEYDASH_NOTEWORTHY_STATUS_CODE", defaults.noteworthy_status_code)?;
        let noteworthy_limit = parse_var(&lookup, "KEYDASH_NOTEWORTHY_LIMIT", defaults.noteworthy_limit)?;
        let auto_refresh_secs = parse_var(&lookup, "KEYDASH_AUTO_REFRESH_SECS", defaults.auto_refresh_secs)?;
        let trend_range = parse_var(&lookup, "KEYDASH_TREND_RANGE", defaults.trend_range)?;

        Ok(Config {
            base_url,
            auth_token,
            request_timeout_secs,
            search_debounce_ms,
            noteworthy_status_code,
            noteworthy_limit,
            auto_refresh_secs,
            trend_range,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn dashboard_settings(&self) -> DashboardSettings {
        DashboardSettings {
            search_debounce: Duration::from_millis(self.search_debounce_ms),
            request_timeout: self.request_timeout(),
            noteworthy_status_code: self.noteworthy_status_code,
            noteworthy_limit: self.noteworthy_limit,
            auto_refresh: (self.auto_refresh_secs > 0).then(|| Duration::from_secs(self.auto_refresh_secs)),
            trend_range: self.trend_range,
        }
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        None => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("KEYDASH_BASE_URL must be an http(s) URL, got {0}")]
    InvalidBaseUrl(String),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}
