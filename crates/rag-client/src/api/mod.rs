//! Typed endpoints of the console API
//!
//! Each submodule adds methods to [`ApiClient`](crate::ApiClient) for one
//! resource.

pub mod account;
pub mod agent;
pub mod conversation;
pub mod dialog;
pub mod document;
pub mod knowledge;
pub mod llm;
pub mod sys;

pub use account::{ACCOUNT_PREFIX, LoginParams};
pub use agent::AGENT_PREFIX;
pub use conversation::CONVERSATION_PREFIX;
pub use dialog::DIALOG_PREFIX;
pub use document::DOCUMENT_PREFIX;
pub use knowledge::KNOWLEDGE_PREFIX;
pub use llm::LLM_PREFIX;
pub use sys::SYS_PREFIX;
