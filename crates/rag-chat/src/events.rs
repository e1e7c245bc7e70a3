//! Chat session event types

use rag_client::Message;
use serde::{Deserialize, Serialize};

/// Events emitted while a chat session runs turns
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// A user message was accepted and appended
    TurnStart { input: String },

    /// The first turn created the server-side conversation
    ConversationCreated { conversation_id: String },

    /// The trailing assistant message changed during streaming
    MessageUpdate { message: Message },

    /// A turn finished
    TurnEnd { failed: bool },

    /// Local history was replaced by the server's copy
    Reconciled { messages: Vec<Message> },

    /// Error occurred
    Error { message: String },
}
