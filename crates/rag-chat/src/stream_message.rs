//! Single-flight streaming completion state

use futures::StreamExt;
use parking_lot::Mutex;
use rag_client::{NoticeLevel, Notifier, SseExtraInfo, StreamEvent};
use serde_json::Value;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::backend::ChatBackend;

/// Notice shown when a send is attempted while a response is in flight
pub const BUSY_NOTICE: &str = "Please wait for the end of the previous response";

/// Snapshot of one streamed response
#[derive(Debug, Clone, Default)]
pub struct StreamState {
    /// Latest cumulative answer text
    pub content: String,
    /// Metadata of the latest frame
    pub extra_info: Option<SseExtraInfo>,
    pub is_responding: bool,
    pub is_done: bool,
    pub has_error: bool,
}

/// Drives one streaming completion at a time and tracks its progress.
///
/// A second `send_message` while a stream is in flight is rejected with a
/// notice; sends are never queued.
pub struct StreamMessage {
    backend: Arc<dyn ChatBackend>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<StreamState>,
    in_flight: AtomicBool,
    cancel: Mutex<CancellationToken>,
    completion_delay: Duration,
}

/// Clears the in-flight flag when a send finishes, however it finishes
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl StreamMessage {
    /// Pause between the end of the stream and `is_done`, so frames still
    /// buffered by the transport land first.
    pub const DEFAULT_COMPLETION_DELAY: Duration = Duration::from_millis(1000);

    pub fn new(backend: Arc<dyn ChatBackend>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            backend,
            notifier,
            state: Mutex::new(StreamState::default()),
            in_flight: AtomicBool::new(false),
            cancel: Mutex::new(CancellationToken::new()),
            completion_delay: Self::DEFAULT_COMPLETION_DELAY,
        }
    }

    pub fn with_completion_delay(mut self, delay: Duration) -> Self {
        self.completion_delay = delay;
        self
    }

    pub fn state(&self) -> StreamState {
        self.state.lock().clone()
    }

    pub fn content(&self) -> String {
        self.state.lock().content.clone()
    }

    pub fn extra_info(&self) -> Option<SseExtraInfo> {
        self.state.lock().extra_info.clone()
    }

    pub fn is_responding(&self) -> bool {
        self.state.lock().is_responding
    }

    pub fn is_done(&self) -> bool {
        self.state.lock().is_done
    }

    pub fn has_error(&self) -> bool {
        self.state.lock().has_error
    }

    /// Abort the in-flight stream. Not an error: nothing is reported and
    /// `is_done` stays unset.
    pub fn stop_generation(&self) {
        self.cancel.lock().cancel();
        self.state.lock().is_responding = false;
    }

    /// Stream a completion from `path`. Returns `false` if the request could
    /// not be started.
    pub async fn send_message(&self, path: &str, payload: Value) -> bool {
        self.send_message_with(path, payload, |_| {}).await
    }

    /// Like [`send_message`](Self::send_message), also handing every event to
    /// `on_event` after the state has been updated.
    pub async fn send_message_with<F>(&self, path: &str, payload: Value, mut on_event: F) -> bool
    where
        F: FnMut(&StreamEvent) + Send,
    {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.notifier.notify(NoticeLevel::Info, BUSY_NOTICE);
            return false;
        }
        let _flight = InFlightGuard(&self.in_flight);

        let cancel = CancellationToken::new();
        *self.cancel.lock() = cancel.clone();
        *self.state.lock() = StreamState {
            is_responding: true,
            ..Default::default()
        };

        let mut stream = match self.backend.open_stream(path, payload, cancel.clone()).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!("Stream request failed: {}", e);
                if !matches!(
                    e,
                    rag_client::Error::Unauthorized | rag_client::Error::ForcedLogout
                ) {
                    self.notifier.notify(NoticeLevel::Error, &e.user_message());
                }
                let mut state = self.state.lock();
                state.is_responding = false;
                state.is_done = true;
                state.has_error = true;
                return false;
            }
        };

        let mut completed = false;
        while let Some(event) = stream.next().await {
            match &event {
                StreamEvent::Data { answer, extra } => {
                    let mut state = self.state.lock();
                    state.content = answer.clone();
                    state.extra_info = Some(extra.clone());
                }
                StreamEvent::Error { message, code } => {
                    tracing::warn!("Stream error ({:?}): {}", code, message);
                    self.notifier.notify(NoticeLevel::Error, message);
                    let mut state = self.state.lock();
                    state.is_responding = false;
                    state.is_done = true;
                    state.has_error = true;
                }
                StreamEvent::Completed => completed = true,
            }
            on_event(&event);
        }

        if cancel.is_cancelled() {
            tracing::debug!("Generation stopped");
            self.state.lock().is_responding = false;
            return true;
        }

        if completed {
            tokio::time::sleep(self.completion_delay).await;
            let mut state = self.state.lock();
            state.is_responding = false;
            state.is_done = true;
        } else {
            self.state.lock().is_responding = false;
        }
        true
    }
}
