//! Turn-based chat session over a dialog
//!
//! The local message list is provisional while a turn streams; once the
//! stream completes the server's copy of the conversation replaces it.

use parking_lot::Mutex;
use rag_client::api::CONVERSATION_PREFIX;
use rag_client::{
    ConversationCreateParams, Dialog, Message, Notifier, Role, SseExtraInfo, StreamEvent,
};
use serde_json::json;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;
use tokio::sync::broadcast;

use crate::backend::ChatBackend;
use crate::error::{Error, Result};
use crate::events::ChatEvent;
use crate::stream_message::StreamMessage;

/// Longest conversation name derived from the first question
const CONVERSATION_NAME_LIMIT: usize = 50;

#[derive(Debug, Default)]
struct SessionState {
    messages: Vec<Message>,
    conversation_id: Option<String>,
    dialog: Option<Dialog>,
    /// Length of `messages` before the latest turn's user message
    turn_start: usize,
    last_turn_failed: bool,
}

impl SessionState {
    /// Mirror streamed text into the trailing assistant message, appending
    /// one if the list does not end with an assistant message.
    fn merge_answer(&mut self, answer: &str) -> Message {
        match self.messages.last_mut() {
            Some(last) if last.is_assistant() => {
                last.content = answer.to_string();
                last.clone()
            }
            _ => {
                let message = new_message(Role::Assistant, answer);
                self.messages.push(message.clone());
                message
            }
        }
    }

    fn sync_prologue(&mut self, prologue: &str) {
        match self.messages.first_mut() {
            None => self.messages.push(new_message(Role::Assistant, prologue)),
            Some(first) if first.is_assistant() => first.content = prologue.to_string(),
            Some(_) => {}
        }
    }
}

/// Build a message with a client-generated id
pub fn new_message(role: Role, content: &str) -> Message {
    let mut message = Message::new(role, content);
    message.id = Some(uuid::Uuid::new_v4().to_string());
    if role == Role::User {
        message.doc_ids = Some(Vec::new());
    }
    message
}

/// Resets the turn flag when a turn ends
struct TurnGuard<'a>(&'a AtomicBool);

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A conversation with one dialog, driven one turn at a time
pub struct ChatSession {
    dialog_id: String,
    backend: Arc<dyn ChatBackend>,
    stream: StreamMessage,
    state: Arc<Mutex<SessionState>>,
    turn_active: AtomicBool,
    event_tx: broadcast::Sender<ChatEvent>,
}

impl ChatSession {
    /// Create a session for `dialog_id` with no conversation yet
    pub fn new(
        dialog_id: impl Into<String>,
        backend: Arc<dyn ChatBackend>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            dialog_id: dialog_id.into(),
            stream: StreamMessage::new(backend.clone(), notifier),
            backend,
            state: Arc::new(Mutex::new(SessionState::default())),
            turn_active: AtomicBool::new(false),
            event_tx,
        }
    }

    /// Set the pause between stream completion and reconciliation
    pub fn with_completion_delay(mut self, delay: Duration) -> Self {
        self.stream = self.stream.with_completion_delay(delay);
        self
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.event_tx.subscribe()
    }

    pub fn dialog_id(&self) -> &str {
        &self.dialog_id
    }

    pub fn messages(&self) -> Vec<Message> {
        self.state.lock().messages.clone()
    }

    pub fn conversation_id(&self) -> Option<String> {
        self.state.lock().conversation_id.clone()
    }

    pub fn dialog(&self) -> Option<Dialog> {
        self.state.lock().dialog.clone()
    }

    pub fn is_responding(&self) -> bool {
        self.stream.is_responding()
    }

    pub fn has_error(&self) -> bool {
        self.stream.has_error()
    }

    pub fn extra_info(&self) -> Option<SseExtraInfo> {
        self.stream.extra_info()
    }

    pub fn stop_generation(&self) {
        self.stream.stop_generation();
    }

    fn emit(&self, event: ChatEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    /// Fetch the dialog and keep its greeting in sync
    pub async fn load_dialog(&self) -> Result<Dialog> {
        let dialog = self.backend.get_dialog(&self.dialog_id).await?;
        let mut state = self.state.lock();
        if let Some(prologue) = dialog.prologue() {
            state.sync_prologue(prologue);
        }
        state.dialog = Some(dialog.clone());
        Ok(dialog)
    }

    /// Put the dialog's greeting in the first slot. Leaves the list alone
    /// when it already opens with a user message.
    pub fn sync_prologue(&self, prologue: Option<&str>) {
        let Some(prologue) = prologue.filter(|p| !p.is_empty()) else {
            return;
        };
        self.state.lock().sync_prologue(prologue);
    }

    /// Continue an existing conversation of this dialog
    pub async fn open_conversation(&self, conversation_id: &str) -> Result<()> {
        let conversation = self.backend.get_conversation(conversation_id).await?;
        if conversation.dialog_id != self.dialog_id {
            return Err(Error::Other(format!(
                "Conversation {} belongs to dialog {}",
                conversation_id, conversation.dialog_id
            )));
        }
        let mut state = self.state.lock();
        state.messages = with_ids(conversation.messages);
        state.conversation_id = Some(conversation.id);
        state.turn_start = state.messages.len();
        state.last_turn_failed = false;
        Ok(())
    }

    /// Send one user turn and stream the answer into the message list.
    ///
    /// Empty input, or a call while a turn is still running, returns
    /// `Ok(false)` without touching any state. After a failed turn the failed
    /// user message (and any partial answer) is dropped before the new one is
    /// appended.
    pub async fn send_message(&self, input: &str) -> Result<bool> {
        if input.trim().is_empty() || self.stream.is_responding() {
            return Ok(false);
        }
        if self
            .turn_active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(false);
        }
        let _turn = TurnGuard(&self.turn_active);

        let user_message = new_message(Role::User, input);
        let (mut outgoing, conversation_id) = {
            let mut state = self.state.lock();
            if state.last_turn_failed {
                let start = state.turn_start;
                state.messages.truncate(start);
            }
            state.last_turn_failed = false;
            let history = state.messages.clone();
            state.turn_start = state.messages.len();
            state.messages.push(user_message.clone());
            (history, state.conversation_id.clone())
        };
        self.emit(ChatEvent::TurnStart {
            input: input.to_string(),
        });

        let conversation_id = match conversation_id {
            Some(id) => id,
            None => match self.create_initial_conversation(input).await {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!("Failed to create conversation: {}", e);
                    self.emit(ChatEvent::Error {
                        message: e.user_message(),
                    });
                    self.finish_turn(true);
                    return Err(e.into());
                }
            },
        };

        outgoing.push(user_message);
        let path = format!("{}/{}", CONVERSATION_PREFIX, conversation_id);
        let payload = json!({ "messages": outgoing });

        let state = self.state.clone();
        let events = self.event_tx.clone();
        let sent = self
            .stream
            .send_message_with(&path, payload, move |event| match event {
                StreamEvent::Data { answer, .. } if !answer.is_empty() => {
                    let message = state.lock().merge_answer(answer);
                    let _ = events.send(ChatEvent::MessageUpdate { message });
                }
                StreamEvent::Error { message, .. } => {
                    let _ = events.send(ChatEvent::Error {
                        message: message.clone(),
                    });
                }
                _ => {}
            })
            .await;

        let failed = !sent || self.stream.has_error();
        if !failed && self.stream.is_done() {
            self.reconcile(&conversation_id).await;
        }
        self.finish_turn(failed);
        Ok(sent)
    }

    async fn create_initial_conversation(&self, input: &str) -> rag_client::Result<String> {
        let params = ConversationCreateParams {
            name: input.chars().take(CONVERSATION_NAME_LIMIT).collect(),
            dialog_id: self.dialog_id.clone(),
            messages: vec![new_message(Role::Assistant, input)],
        };
        let conversation = self.backend.create_conversation(&params).await?;
        tracing::debug!("Created conversation {}", conversation.id);

        self.state.lock().conversation_id = Some(conversation.id.clone());
        self.emit(ChatEvent::ConversationCreated {
            conversation_id: conversation.id.clone(),
        });
        Ok(conversation.id)
    }

    /// Replace local history with the server's canonical copy
    async fn reconcile(&self, conversation_id: &str) {
        match self.backend.get_conversation(conversation_id).await {
            Ok(conversation) => {
                let messages = with_ids(conversation.messages);
                {
                    let mut state = self.state.lock();
                    state.messages = messages.clone();
                    state.turn_start = messages.len();
                }
                self.emit(ChatEvent::Reconciled { messages });
            }
            Err(e) => {
                tracing::warn!("Failed to refresh conversation {}: {}", conversation_id, e);
            }
        }
    }

    fn finish_turn(&self, failed: bool) {
        self.state.lock().last_turn_failed = failed;
        self.emit(ChatEvent::TurnEnd { failed });
    }
}

/// Fill in ids the server left out
fn with_ids(messages: Vec<Message>) -> Vec<Message> {
    messages
        .into_iter()
        .map(|mut m| {
            if m.id.is_none() {
                m.id = Some(uuid::Uuid::new_v4().to_string());
            }
            m
        })
        .collect()
}
