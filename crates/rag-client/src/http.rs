//! HTTP client wrapper for the console API
//!
//! Single choke point for REST calls: attaches the bearer token, strips null
//! fields, unwraps the response envelope and maps server error codes to
//! notices, navigation and a one-shot replay after a token refresh.

use futures::StreamExt;
use reqwest::Method;
use reqwest::header::AUTHORIZATION;
use reqwest_eventsource::{Event, EventSource};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::envelope::{ErrorBody, check_response, strip_nulls};
use crate::error::{Error, ErrorCode, Result};
use crate::notify::{Navigation, NoticeLevel, Notifier};
use crate::refresh::{HttpRefreshBackend, RefreshBackend, TokenRefresher};
use crate::sse::{SseEventStream, StreamEvent, create_stream, parse_frame};
use crate::storage::SharedStore;

/// Connection settings
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, e.g. `http://localhost:5001/api`
    pub base_url: String,
    /// Default timeout for REST calls
    pub request_timeout: Duration,
    /// Budget for recovering an expired access token
    pub refresh_timeout: Duration,
    /// Pause between checks while another client refreshes
    pub poll_interval: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5001/api".to_string(),
            request_timeout: Duration::from_secs(300),
            refresh_timeout: Duration::from_secs(100),
            poll_interval: TokenRefresher::DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Per-request options
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Suppress user-facing notices for this request
    pub silent: bool,
    /// Override the default request timeout
    pub timeout: Option<Duration>,
    /// Extra headers
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn silent() -> Self {
        Self {
            silent: true,
            ..Default::default()
        }
    }
}

/// Console API client. Cloning is cheap; clones share storage and the
/// refresh coordinator.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
    store: Arc<dyn SharedStore>,
    refresher: Arc<TokenRefresher>,
    notifier: Arc<dyn Notifier>,
}

impl ApiClient {
    pub fn new(
        config: ClientConfig,
        store: Arc<dyn SharedStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        if config.base_url.is_empty() {
            return Err(Error::InvalidConfig("API base URL is empty".to_string()));
        }

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::InvalidConfig(format!("Failed to build HTTP client: {}", e)))?;
        let backend = Arc::new(HttpRefreshBackend::new(http.clone(), config.base_url.clone()));
        let refresher = TokenRefresher::new(store.clone(), backend)
            .with_poll_interval(config.poll_interval);

        Ok(Self {
            http,
            config: Arc::new(config),
            store,
            refresher: Arc::new(refresher),
            notifier,
        })
    }

    /// Replace the refresh backend (the default calls the refresh endpoint)
    pub fn with_refresh_backend(mut self, backend: Arc<dyn RefreshBackend>) -> Self {
        self.refresher = Arc::new(
            TokenRefresher::new(self.store.clone(), backend)
                .with_poll_interval(self.config.poll_interval),
        );
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn SharedStore> {
        &self.store
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub fn refresher(&self) -> &TokenRefresher {
        &self.refresher
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn bearer(&self) -> Option<String> {
        self.store.access_token().map(|t| format!("Bearer {}", t))
    }

    pub async fn get<T: DeserializeOwned, P: Serialize + ?Sized>(
        &self,
        path: &str,
        params: &P,
    ) -> Result<T> {
        self.request(Method::GET, path, serde_json::to_value(params)?, &RequestOptions::default())
            .await
    }

    pub async fn post<T: DeserializeOwned, P: Serialize + ?Sized>(
        &self,
        path: &str,
        data: &P,
    ) -> Result<T> {
        self.request(Method::POST, path, serde_json::to_value(data)?, &RequestOptions::default())
            .await
    }

    pub async fn put<T: DeserializeOwned, P: Serialize + ?Sized>(
        &self,
        path: &str,
        data: &P,
    ) -> Result<T> {
        self.request(Method::PUT, path, serde_json::to_value(data)?, &RequestOptions::default())
            .await
    }

    pub async fn delete<T: DeserializeOwned, P: Serialize + ?Sized>(
        &self,
        path: &str,
        data: &P,
    ) -> Result<T> {
        self.request(Method::DELETE, path, serde_json::to_value(data)?, &RequestOptions::default())
            .await
    }

    /// Issue a request and deserialize the unwrapped payload
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        data: Value,
        options: &RequestOptions,
    ) -> Result<T> {
        let value = self.request_value(method, path, data, options).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Issue a request and return the unwrapped payload as JSON
    pub async fn request_value(
        &self,
        method: Method,
        path: &str,
        mut data: Value,
        options: &RequestOptions,
    ) -> Result<Value> {
        strip_nulls(&mut data);
        self.with_recovery(options, || async {
            let response = self.send(&method, path, &data, options).await?;
            let status = response.status().as_u16();
            let text = response.text().await?;
            check_response(status, parse_body(text))
        })
        .await
    }

    /// Issue a request whose successful response is raw bytes (audio, files)
    pub async fn request_bytes(
        &self,
        method: Method,
        path: &str,
        mut data: Value,
        options: &RequestOptions,
    ) -> Result<Vec<u8>> {
        strip_nulls(&mut data);
        self.with_recovery(options, || async {
            let response = self.send(&method, path, &data, options).await?;
            let status = response.status();
            if status.is_success() {
                return Ok(response.bytes().await?.to_vec());
            }
            let text = response.text().await?;
            let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
            Err(body.into_error(status.as_u16()))
        })
        .await
    }

    async fn send(
        &self,
        method: &Method,
        path: &str,
        data: &Value,
        options: &RequestOptions,
    ) -> Result<reqwest::Response> {
        let mut builder = self
            .http
            .request(method.clone(), self.url(path))
            .timeout(options.timeout.unwrap_or(self.config.request_timeout));

        if let Some(bearer) = self.bearer() {
            builder = builder.header(AUTHORIZATION, bearer);
        }
        for (key, value) in &options.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        builder = if has_json_body(method) {
            builder.json(data)
        } else {
            builder.query(&query_pairs(data))
        };

        tracing::debug!("{} {}", method, path);
        Ok(builder.send().await?)
    }

    /// Run `attempt`, recovering from an expired token by refreshing and
    /// replaying exactly once.
    async fn with_recovery<T, F, Fut>(&self, options: &RequestOptions, attempt: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut replayed = false;
        loop {
            let err = match attempt().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };
            self.recover(err, options, replayed).await?;
            replayed = true;
        }
    }

    /// Apply the error-code policy. `Ok(())` means the request should be
    /// replayed; every other outcome is returned as the error to surface.
    async fn recover(&self, err: Error, options: &RequestOptions, replayed: bool) -> Result<()> {
        let code = match &err {
            Error::Api {
                error_code: Some(code),
                ..
            } => ErrorCode::from_code(code),
            Error::Api { status: 401, .. } => Some(ErrorCode::Unauthorized),
            _ => None,
        };

        match code {
            Some(ErrorCode::UnauthorizedAndForceLogout) => {
                tracing::warn!("Server forced logout");
                if let Err(e) = self.store.clear_tokens() {
                    tracing::warn!("Failed to clear tokens: {}", e);
                }
                self.notifier.navigate(Navigation::Reload);
                return Err(Error::ForcedLogout);
            }
            Some(ErrorCode::Unauthorized) => {
                if !replayed {
                    match self
                        .refresher
                        .refresh_access_token_or_relogin(self.config.refresh_timeout)
                        .await
                    {
                        Ok(_) => return Ok(()),
                        Err(e) => tracing::warn!("Token refresh failed: {}", e),
                    }
                }
                self.notifier.navigate(Navigation::SignIn);
                return Err(Error::Unauthorized);
            }
            Some(ErrorCode::AgentNotFound) if !options.silent => {
                self.notifier
                    .notify(NoticeLevel::Error, ErrorCode::AgentNotFound.message());
                self.notifier.navigate(Navigation::Agents);
                return Err(err);
            }
            Some(ErrorCode::AgentNotFound) => {}
            Some(known) => {
                if !options.silent {
                    self.notifier.notify(NoticeLevel::Error, known.message());
                }
                return Err(err);
            }
            None => {}
        }

        if !options.silent {
            self.notifier.notify(NoticeLevel::Error, &err.user_message());
        }
        Err(err)
    }

    /// Open a streaming completion.
    ///
    /// A 401 on the initial response triggers one refresh and retry; if the
    /// refresh fails the user is sent to sign-in. Any other error status
    /// yields a stream holding a single `Error` event with the server's
    /// message. Cancelling `cancel` ends the stream quietly.
    pub async fn sse_request(
        &self,
        path: &str,
        mut data: Value,
        cancel: CancellationToken,
    ) -> Result<SseEventStream> {
        strip_nulls(&mut data);
        let mut retried = false;

        loop {
            let mut builder = self.http.post(self.url(path)).json(&data);
            builder = builder.header(AUTHORIZATION, self.bearer().unwrap_or_default());

            let mut event_source = EventSource::new(builder)
                .map_err(|e| Error::Sse(format!("Failed to create event source: {}", e)))?;

            let first = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                first = event_source.next() => Some(first),
            };

            let Some(first) = first else {
                event_source.close();
                return Ok(Box::pin(futures::stream::empty()));
            };

            match first {
                Some(Ok(Event::Open)) => {
                    return Ok(Box::pin(create_stream(event_source, cancel, None)));
                }
                Some(Ok(Event::Message(msg))) => {
                    let pending = parse_frame(&msg.data);
                    return Ok(Box::pin(create_stream(event_source, cancel, pending)));
                }
                Some(Err(reqwest_eventsource::Error::InvalidStatusCode(status, _)))
                    if status == reqwest::StatusCode::UNAUTHORIZED =>
                {
                    event_source.close();
                    if retried {
                        self.notifier.navigate(Navigation::SignIn);
                        return Err(Error::Unauthorized);
                    }
                    if let Err(e) = self
                        .refresher
                        .refresh_access_token_or_relogin(self.config.refresh_timeout)
                        .await
                    {
                        tracing::warn!("Token refresh failed: {}", e);
                        self.notifier.navigate(Navigation::SignIn);
                        return Err(Error::Unauthorized);
                    }
                    retried = true;
                }
                Some(Err(reqwest_eventsource::Error::InvalidStatusCode(status, response))) => {
                    event_source.close();
                    let message = response
                        .json::<ErrorBody>()
                        .await
                        .ok()
                        .and_then(|b| b.message)
                        .unwrap_or_else(|| "Server Error".to_string());
                    tracing::warn!("Stream request failed with {}: {}", status, message);
                    let event = StreamEvent::Error {
                        message,
                        code: Some(status.as_u16().to_string()),
                    };
                    return Ok(Box::pin(futures::stream::once(async move { event })));
                }
                Some(Err(e)) => {
                    event_source.close();
                    return Err(Error::Sse(e.to_string()));
                }
                None => {
                    return Err(Error::Sse("Stream closed before opening".to_string()));
                }
            }
        }
    }
}

fn has_json_body(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT || *method == Method::DELETE
}

fn parse_body(text: String) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

/// Flatten a JSON object into query parameters
fn query_pairs(data: &Value) -> Vec<(String, String)> {
    let Value::Object(map) = data else {
        return Vec::new();
    };
    map.iter()
        .map(|(k, v)| {
            let value = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), value)
        })
        .collect()
}
