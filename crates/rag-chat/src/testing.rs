//! Test doubles shared by the session and stream tests

use async_trait::async_trait;
use parking_lot::Mutex;
use rag_client::{
    Conversation, ConversationCreateParams, Dialog, Error, Message, Navigation, NoticeLevel,
    Notifier, Result, SseEventStream, StreamEvent,
};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio_util::sync::CancellationToken;

use crate::backend::ChatBackend;

/// How the next opened stream behaves
pub enum Script {
    /// Yield these events, then end
    Events(Vec<StreamEvent>),
    /// Yield these events, then hang until cancelled
    EventsThenStall(Vec<StreamEvent>),
    /// Fail to open
    OpenError,
}

pub struct MockBackend {
    scripts: Mutex<VecDeque<Script>>,
    streams: Mutex<Vec<(String, Value)>>,
    created: Mutex<Vec<ConversationCreateParams>>,
    fail_create: Mutex<bool>,
    server_messages: Mutex<Vec<Message>>,
    prologue: Mutex<String>,
    pub fetches: AtomicU32,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(VecDeque::new()),
            streams: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
            fail_create: Mutex::new(false),
            server_messages: Mutex::new(Vec::new()),
            prologue: Mutex::new(String::new()),
            fetches: AtomicU32::new(0),
        }
    }

    pub fn push_script(&self, script: Script) {
        self.scripts.lock().push_back(script);
    }

    pub fn stream_paths(&self) -> Vec<String> {
        self.streams.lock().iter().map(|(p, _)| p.clone()).collect()
    }

    pub fn stream_payloads(&self) -> Vec<Value> {
        self.streams.lock().iter().map(|(_, v)| v.clone()).collect()
    }

    pub fn created(&self) -> Vec<ConversationCreateParams> {
        self.created.lock().clone()
    }

    pub fn set_fail_create(&self, fail: bool) {
        *self.fail_create.lock() = fail;
    }

    pub fn set_server_messages(&self, messages: Vec<Message>) {
        *self.server_messages.lock() = messages;
    }

    pub fn set_prologue(&self, prologue: &str) {
        *self.prologue.lock() = prologue.to_string();
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn create_conversation(
        &self,
        params: &ConversationCreateParams,
    ) -> Result<Conversation> {
        if *self.fail_create.lock() {
            return Err(Error::Api {
                status: 500,
                error_code: None,
                message: "create failed".to_string(),
            });
        }
        self.created.lock().push(params.clone());
        Ok(Conversation {
            id: "conv-1".to_string(),
            dialog_id: params.dialog_id.clone(),
            name: params.name.clone(),
            messages: params.messages.clone(),
            reference: None,
            avatar: None,
            created_at: None,
        })
    }

    async fn get_conversation(&self, conversation_id: &str) -> Result<Conversation> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(Conversation {
            id: conversation_id.to_string(),
            dialog_id: "dialog-1".to_string(),
            name: "Hello".to_string(),
            messages: self.server_messages.lock().clone(),
            reference: None,
            avatar: None,
            created_at: None,
        })
    }

    async fn get_dialog(&self, dialog_id: &str) -> Result<Dialog> {
        let dialog = json!({
            "id": dialog_id,
            "name": "Support",
            "prompt_config": {"prologue": self.prologue.lock().clone()},
        });
        Ok(serde_json::from_value(dialog)?)
    }

    async fn open_stream(
        &self,
        path: &str,
        payload: Value,
        cancel: CancellationToken,
    ) -> Result<SseEventStream> {
        self.streams.lock().push((path.to_string(), payload));
        let script = self
            .scripts
            .lock()
            .pop_front()
            .unwrap_or(Script::Events(vec![StreamEvent::Completed]));

        match script {
            Script::Events(events) => Ok(Box::pin(futures::stream::iter(events))),
            Script::EventsThenStall(events) => Ok(Box::pin(async_stream::stream! {
                for event in events {
                    yield event;
                }
                cancel.cancelled().await;
            })),
            Script::OpenError => Err(Error::Sse("connection refused".to_string())),
        }
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<(NoticeLevel, String)>>,
    navigations: Mutex<Vec<Navigation>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<(NoticeLevel, String)> {
        self.notices.lock().clone()
    }

    pub fn navigations(&self) -> Vec<Navigation> {
        self.navigations.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        self.notices.lock().push((level, message.to_string()));
    }

    fn navigate(&self, target: Navigation) {
        self.navigations.lock().push(target);
    }
}
