//! rag-chat: streaming chat sessions for the RAG console
//!
//! Builds a turn-based conversation on top of `rag-client`: one streamed
//! answer at a time, merged into an optimistic message list that the server's
//! copy replaces once the turn completes.

pub mod backend;
pub mod error;
pub mod events;
pub mod session;
pub mod stream_message;

#[cfg(test)]
mod testing;

pub use backend::ChatBackend;
pub use error::{Error, Result};
pub use events::ChatEvent;
pub use session::ChatSession;
pub use stream_message::{StreamMessage, StreamState};
