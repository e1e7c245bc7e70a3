//! Access token refresh with a lock shared across client processes
//!
//! At most one client performs the network refresh at a time. The lock is a
//! flag plus a claim timestamp in the [`SharedStore`]; a claim older than the
//! caller's timeout is treated as abandoned so a crashed holder cannot wedge
//! everyone else. Within a process the claim is an atomic test-and-set; across
//! processes it is a plain read-then-write on the store.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::envelope::check_response;
use crate::error::{Error, Result};
use crate::retry::{RetryPolicy, fetch_with_retry};
use crate::storage::{LAST_REFRESH_TIME_KEY, REFRESH_TOKEN_KEY, REFRESHING_FLAG_KEY, SharedStore};
use crate::types::TokenPair;

/// Path of the refresh endpoint, relative to the API base URL
pub const REFRESH_TOKEN_PATH: &str = "/console/account/refresh-token";

/// Exchanges a refresh token for a new token pair
#[async_trait]
pub trait RefreshBackend: Send + Sync {
    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair>;
}

/// Calls the console refresh endpoint directly, without the bearer/401 logic
/// of [`crate::ApiClient`].
pub struct HttpRefreshBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRefreshBackend {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl RefreshBackend for HttpRefreshBackend {
    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair> {
        let url = format!("{}{}", self.base_url, REFRESH_TOKEN_PATH);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = if text.trim().is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&text)?
        };

        let payload = check_response(status, body)?;
        Ok(serde_json::from_value(payload)?)
    }
}

/// Coordinates access-token refreshes for one client instance.
pub struct TokenRefresher {
    store: Arc<dyn SharedStore>,
    backend: Arc<dyn RefreshBackend>,
    refreshing: AtomicBool,
    poll_interval: Duration,
    retry: RetryPolicy,
}

/// Releases the refresh lock when dropped, including when the owning future
/// is dropped by a timeout or the process unwinds.
struct RefreshLease<'a> {
    refresher: &'a TokenRefresher,
}

impl Drop for RefreshLease<'_> {
    fn drop(&mut self) {
        self.refresher.release_refresh_lock();
    }
}

impl TokenRefresher {
    /// Default pause between lock checks while another client refreshes
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

    pub fn new(store: Arc<dyn SharedStore>, backend: Arc<dyn RefreshBackend>) -> Self {
        Self {
            store,
            backend,
            refreshing: AtomicBool::new(false),
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Whether this instance currently holds the refresh lock
    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire)
    }

    /// Obtain a fresh access token, either by refreshing it here or by
    /// waiting for whichever client holds the lock. Fails with
    /// [`Error::RefreshTimeout`] if nothing resolves within `timeout`.
    pub async fn refresh_access_token_or_relogin(&self, timeout: Duration) -> Result<String> {
        match tokio::time::timeout(timeout, self.get_new_access_token(timeout)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("Access token refresh timed out after {:?}", timeout);
                Err(Error::RefreshTimeout)
            }
        }
    }

    async fn get_new_access_token(&self, timeout: Duration) -> Result<String> {
        if self.is_refresh_in_progress(timeout) {
            self.wait_until_token_refreshed().await;
            return self.current_access_token();
        }

        let Some(_lease) = self.try_claim()? else {
            self.wait_until_token_refreshed().await;
            return self.current_access_token();
        };

        let refresh_token = self
            .store
            .get(REFRESH_TOKEN_KEY)
            .ok_or(Error::NoRefreshToken)?;

        tracing::debug!("Refreshing access token");
        let pair = fetch_with_retry(&self.retry, || self.backend.refresh_token(&refresh_token)).await?;
        self.store.save_token_pair(&pair)?;
        Ok(pair.access_token)
    }

    /// Claim the lock. `None` means another task in this process won the race.
    fn try_claim(&self) -> Result<Option<RefreshLease<'_>>> {
        if self
            .refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(None);
        }

        let lease = RefreshLease { refresher: self };
        self.store.set(REFRESHING_FLAG_KEY, "1")?;
        self.store
            .set(LAST_REFRESH_TIME_KEY, &now_millis().to_string())?;
        Ok(Some(lease))
    }

    fn release_refresh_lock(&self) {
        if self.refreshing.swap(false, Ordering::AcqRel) {
            if let Err(e) = self.store.remove(REFRESHING_FLAG_KEY) {
                tracing::warn!("Failed to clear refresh flag: {}", e);
            }
            if let Err(e) = self.store.remove(LAST_REFRESH_TIME_KEY) {
                tracing::warn!("Failed to clear refresh timestamp: {}", e);
            }
        }
    }

    fn is_refresh_in_progress(&self, timeout: Duration) -> bool {
        self.is_refreshing() || self.shared_lock_is_fresh(timeout)
    }

    fn shared_flag_is_set(&self) -> bool {
        self.store.get(REFRESHING_FLAG_KEY).as_deref() == Some("1")
    }

    /// The shared flag is set and was claimed within `timeout` of now
    fn shared_lock_is_fresh(&self, timeout: Duration) -> bool {
        if !self.shared_flag_is_set() {
            return false;
        }
        let last = self
            .store
            .get(LAST_REFRESH_TIME_KEY)
            .and_then(|t| t.parse::<i64>().ok())
            .unwrap_or(0);
        let timeout_ms = i64::try_from(timeout.as_millis()).unwrap_or(i64::MAX);
        now_millis().saturating_sub(last) <= timeout_ms
    }

    /// Poll until no one holds the lock. Staleness is only judged on entry;
    /// a waiter relies on its own timeout instead.
    async fn wait_until_token_refreshed(&self) {
        while self.is_refreshing() || self.shared_flag_is_set() {
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    fn current_access_token(&self) -> Result<String> {
        self.store.access_token().ok_or(Error::Unauthorized)
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
