use std::time::Duration;

use url::Url;

use crate::{ErrorKind, UpstreamError};

pub const API_KEY_ENV: &str = "RAWG_API_KEY";
pub const API_BASE_ENV: &str = "RAWG_API_BASE";
pub const DEFAULT_BASE_URL: &str = "https://api.rawg.io/api/";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    /// Upstream credential. Checked when a request is built, not here.
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Extra attempts allowed after a 429 response.
    pub max_retries: u32,
    /// Back-off used when a 429 carries no usable `Retry-After`.
    pub default_retry_after: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            max_retries: 1,
            default_retry_after: Duration::from_secs(1),
        }
    }
}

impl ClientSettings {
    pub fn from_env() -> Self {
        let mut settings = Self {
            api_key: std::env::var(API_KEY_ENV).ok(),
            ..Self::default()
        };
        if let Ok(base) = std::env::var(API_BASE_ENV) {
            if !base.trim().is_empty() {
                settings.base_url = base;
            }
        }
        settings
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub(crate) fn credential(&self) -> Result<&str, UpstreamError> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                UpstreamError::new(
                    ErrorKind::Configuration,
                    format!("missing API key; set {API_KEY_ENV}"),
                )
            })
    }

    /// Base URL with a guaranteed trailing slash so relative joins keep its path.
    pub(crate) fn base(&self) -> Result<Url, UpstreamError> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Url::parse(&raw).map_err(|err| {
            UpstreamError::new(
                ErrorKind::Configuration,
                format!("invalid base url {raw:?}: {err}"),
            )
        })
    }
}
