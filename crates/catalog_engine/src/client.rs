use std::time::Duration;

use catalog_logging::{catalog_debug, catalog_info, catalog_warn, redact};
use reqwest::header::{HeaderValue, CONTENT_TYPE, RETRY_AFTER};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{AbortReason, ClientSettings, ErrorKind, UpstreamError};

/// Per-call overrides. Unset fields fall back to [`ClientSettings`].
#[derive(Debug, Clone, Default)]
pub struct GetOptions {
    pub cancel: Option<CancellationToken>,
    /// Zero disables the timeout.
    pub timeout: Option<Duration>,
    pub max_retries: Option<u32>,
}

impl GetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    Int(i64),
    /// Serialized comma-joined.
    List(Vec<String>),
}

impl ParamValue {
    pub fn list<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        ParamValue::List(values.into_iter().map(|v| v.to_string()).collect())
    }

    fn render(&self) -> String {
        match self {
            ParamValue::Text(text) => text.clone(),
            ParamValue::Int(n) => n.to_string(),
            ParamValue::List(values) => values.join(","),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

/// Ordered query parameters; setting a name twice replaces the earlier value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, ParamValue)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name.to_string(), value)),
        }
        self
    }

    /// Like [`Params::set`], but `None` leaves the parameter out.
    pub fn set_opt<V: Into<ParamValue>>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.set(name, value),
            None => self,
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

struct RawResponse {
    status: StatusCode,
    retry_after: Option<Duration>,
    content_type: Option<String>,
    body: Vec<u8>,
}

/// HTTP access to the upstream content API.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    settings: ClientSettings,
}

impl UpstreamClient {
    pub fn new(settings: ClientSettings) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| UpstreamError::new(ErrorKind::Network, err.to_string()))?;
        catalog_info!(
            "Upstream client for {} (key {})",
            settings.base_url,
            settings
                .api_key
                .as_deref()
                .map(redact)
                .unwrap_or_else(|| "missing".to_string())
        );
        Ok(Self { http, settings })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// `{base}/{path}?key=...&params`. Fails with a configuration error when
    /// the credential is missing.
    pub fn build_url(&self, path: &str, params: &Params) -> Result<Url, UpstreamError> {
        let key = self.settings.credential()?;
        let base = self.settings.base()?;
        let mut url = base
            .join(path.trim_start_matches('/'))
            .map_err(|err| UpstreamError::new(ErrorKind::Configuration, err.to_string()))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.clear();
            pairs.append_pair("key", key);
            for (name, value) in &params.entries {
                pairs.append_pair(name, &value.render());
            }
        }
        Ok(url)
    }

    /// GETs `path` and decodes the JSON body as `T`.
    ///
    /// A 429 response is retried after the advertised delay while retries
    /// remain; the delay is abortable. Cancellation and timeouts surface as
    /// [`ErrorKind::Aborted`], never as upstream errors.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &Params,
        options: &GetOptions,
    ) -> Result<T, UpstreamError> {
        let url = self.build_url(path, params)?;
        let cancel = options.cancel.clone().unwrap_or_default();
        let timeout = options.timeout.unwrap_or(self.settings.timeout);
        let mut retries_left = options.max_retries.unwrap_or(self.settings.max_retries);
        let mut attempt = 1u32;

        loop {
            if cancel.is_cancelled() {
                return Err(UpstreamError::aborted(AbortReason::Cancelled));
            }
            catalog_debug!(
                "GET {} attempt={} retries_left={} params={}",
                path,
                attempt,
                retries_left,
                params.len()
            );

            let response = self.attempt(url.clone(), timeout, &cancel).await?;
            if response.status.is_success() {
                return serde_json::from_slice(&response.body).map_err(|err| {
                    UpstreamError::new(ErrorKind::InvalidBody, format!("{path}: {err}"))
                });
            }

            if response.status == StatusCode::TOO_MANY_REQUESTS && retries_left > 0 {
                let delay = response
                    .retry_after
                    .unwrap_or(self.settings.default_retry_after);
                catalog_info!(
                    "GET {} rate limited; retrying in {:?} ({} retries left)",
                    path,
                    delay,
                    retries_left
                );
                wait_or_cancel(delay, &cancel).await?;
                retries_left -= 1;
                attempt += 1;
                continue;
            }

            let message = error_message(&response);
            catalog_warn!(
                "GET {} failed with {}: {}",
                path,
                response.status.as_u16(),
                message
            );
            return Err(UpstreamError::new(
                ErrorKind::Status(response.status.as_u16()),
                message,
            ));
        }
    }

    async fn attempt(
        &self,
        url: Url,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<RawResponse, UpstreamError> {
        let request = async {
            let response = self
                .http
                .get(url)
                .send()
                .await
                .map_err(map_reqwest_error)?;
            let status = response.status();
            let retry_after = parse_retry_after(response.headers().get(RETRY_AFTER));
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(ToOwned::to_owned);
            let body = response.bytes().await.map_err(map_reqwest_error)?;
            Ok::<_, UpstreamError>(RawResponse {
                status,
                retry_after,
                content_type,
                body: body.to_vec(),
            })
        };
        let deadline = async {
            if timeout.is_zero() {
                std::future::pending::<()>().await;
            } else {
                tokio::time::sleep(timeout).await;
            }
        };

        // Losing branches are dropped, which aborts the request and its timer.
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                catalog_debug!("request cancelled");
                Err(UpstreamError::aborted(AbortReason::Cancelled))
            }
            _ = deadline => {
                catalog_debug!("request timed out after {:?}", timeout);
                Err(UpstreamError::aborted(AbortReason::TimedOut))
            }
            result = request => result,
        }
    }
}

/// Sleeps for `delay` unless `cancel` fires first.
pub async fn wait_or_cancel(
    delay: Duration,
    cancel: &CancellationToken,
) -> Result<(), UpstreamError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(UpstreamError::aborted(AbortReason::Cancelled)),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}

/// Longest back-off honoured from a `Retry-After` header.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// `Retry-After` in seconds; non-numeric or non-positive values are ignored.
/// Larger values are clamped to [`MAX_RETRY_AFTER`].
pub fn parse_retry_after(value: Option<&HeaderValue>) -> Option<Duration> {
    let seconds = value?.to_str().ok()?.trim().parse::<f64>().ok()?;
    if !seconds.is_finite() || seconds <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(seconds.min(MAX_RETRY_AFTER.as_secs_f64())).ok()
}

fn error_message(response: &RawResponse) -> String {
    let fallback = response
        .status
        .canonical_reason()
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| format!("HTTP {}", response.status.as_u16()));

    let is_json = response
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.contains("application/json"));
    let extracted = if is_json {
        serde_json::from_slice::<serde_json::Value>(&response.body)
            .ok()
            .and_then(|body| {
                ["detail", "error"].into_iter().find_map(|field| {
                    body.get(field)
                        .and_then(serde_json::Value::as_str)
                        .map(ToOwned::to_owned)
                })
            })
    } else {
        Some(String::from_utf8_lossy(&response.body).trim().to_string())
    };

    extracted
        .filter(|message| !message.trim().is_empty())
        .unwrap_or(fallback)
}

/// The request URL carries the credential, so it never reaches the message.
fn map_reqwest_error(err: reqwest::Error) -> UpstreamError {
    UpstreamError::new(ErrorKind::Network, err.without_url().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_after_accepts_positive_seconds_only() {
        let parse = |raw: &'static str| parse_retry_after(Some(&HeaderValue::from_static(raw)));
        assert_eq!(parse("2"), Some(Duration::from_secs(2)));
        assert_eq!(parse("0.5"), Some(Duration::from_millis(500)));
        assert_eq!(parse("0"), None);
        assert_eq!(parse("-3"), None);
        assert_eq!(parse("NaN"), None);
        assert_eq!(parse("inf"), None);
        assert_eq!(parse("1e20"), Some(MAX_RETRY_AFTER));
        assert_eq!(parse("3600"), Some(MAX_RETRY_AFTER));
        assert_eq!(parse("Wed, 21 Oct 2015 07:28:00 GMT"), None);
        assert_eq!(parse_retry_after(None), None);
    }

    #[test]
    fn params_replace_and_skip_absent_values() {
        let params = Params::new()
            .set("page", 1u32)
            .set("page", 2u32)
            .set_opt::<String>("search", None)
            .set("genres", ParamValue::list(["4", "51"]));
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("page"), Some(&ParamValue::Int(2)));
        assert_eq!(params.get("genres").map(ParamValue::render), Some("4,51".into()));
        assert_eq!(params.get("search"), None);
    }

    #[test]
    fn build_url_requires_a_credential() {
        let client = UpstreamClient::new(ClientSettings::default()).unwrap();
        let err = client.build_url("games", &Params::new()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);

        let client =
            UpstreamClient::new(ClientSettings::default().with_api_key("   ")).unwrap();
        assert!(client.build_url("games", &Params::new()).is_err());
    }

    #[test]
    fn build_url_puts_key_first_and_joins_lists() {
        let settings = ClientSettings {
            base_url: "https://example.test/api".to_string(),
            ..ClientSettings::default().with_api_key("secret")
        };
        let client = UpstreamClient::new(settings).unwrap();
        let params = Params::new()
            .set("page", 3u32)
            .set("platforms", ParamValue::list([4u32, 18]));

        let url = client.build_url("/games", &params).unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.test/api/games?key=secret&page=3&platforms=4%2C18"
        );
    }
}
