//! Server-sent event frames of the streaming completion endpoint

use async_stream::stream;
use futures::StreamExt;
use reqwest_eventsource::{Event, EventSource};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::pin::Pin;
use tokio_stream::Stream;
use tokio_util::sync::CancellationToken;

use crate::types::Reference;

/// Metadata accompanying each streamed answer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SseExtraInfo {
    #[serde(default)]
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub session_id: String,
}

/// Events emitted while reading a completion stream
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Cumulative answer text so far, with the frame's metadata
    Data { answer: String, extra: SseExtraInfo },
    /// Application-level error reported by the server or the transport
    Error {
        message: String,
        code: Option<String>,
    },
    /// The server finished the answer
    Completed,
}

impl StreamEvent {
    pub fn error(message: impl Into<String>) -> Self {
        StreamEvent::Error {
            message: message.into(),
            code: None,
        }
    }
}

/// A stream of completion events
pub type SseEventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

#[derive(Debug, Deserialize)]
struct Frame {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Value,
}

/// Interpret one `data:` payload. Frames that carry nothing actionable, or
/// that fail to parse, yield `None`.
pub fn parse_frame(raw: &str) -> Option<StreamEvent> {
    let frame: Frame = match serde_json::from_str(raw) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!("SSE parse error: {}", e);
            return None;
        }
    };

    if frame.code != Some(0) {
        return Some(StreamEvent::Error {
            message: frame
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "Server Error".to_string()),
            code: frame.code.map(|c| c.to_string()),
        });
    }

    if frame.data == Value::Bool(true) {
        return Some(StreamEvent::Completed);
    }

    let answer = frame.data.get("answer")?;
    let answer = answer.as_str().unwrap_or_default().to_string();
    let extra = serde_json::from_value::<SseExtraInfo>(frame.data.clone()).unwrap_or_else(|e| {
        tracing::debug!("Unexpected SSE metadata shape: {}", e);
        SseExtraInfo {
            answer: answer.clone(),
            ..Default::default()
        }
    });
    Some(StreamEvent::Data { answer, extra })
}

/// Turn an opened event source into completion events.
///
/// `Completed` is emitted at most once: on the `data: true` sentinel or at
/// end of input. Cancellation ends the stream without a terminal event, and
/// a transport failure ends it after one `Error`.
pub(crate) fn create_stream(
    mut event_source: EventSource,
    cancel: CancellationToken,
    pending: Option<StreamEvent>,
) -> impl Stream<Item = StreamEvent> + Send {
    stream! {
        let mut completed = false;

        if let Some(event) = pending {
            if event == StreamEvent::Completed {
                completed = true;
            }
            yield event;
        }

        let ended = loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                next = event_source.next() => Some(next),
            };

            let Some(next) = next else {
                tracing::debug!("SSE stream aborted");
                break false;
            };

            match next {
                None | Some(Err(reqwest_eventsource::Error::StreamEnded)) => break true,
                Some(Ok(Event::Open)) => {}
                Some(Ok(Event::Message(msg))) => match parse_frame(&msg.data) {
                    Some(StreamEvent::Completed) => {
                        if !completed {
                            completed = true;
                            yield StreamEvent::Completed;
                        }
                    }
                    Some(event) => yield event,
                    None => {}
                },
                Some(Err(e)) => {
                    tracing::warn!("SSE transport error: {}", e);
                    yield StreamEvent::error(e.to_string());
                    break false;
                }
            }
        };

        event_source.close();

        if ended && !completed {
            yield StreamEvent::Completed;
        }
    }
}
