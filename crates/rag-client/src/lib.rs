//! rag-client: client layer for the RAG console API
//!
//! Authenticated REST and streaming calls with transparent token refresh
//! coordinated across every process sharing the same token store.

pub mod api;
pub mod chat;
pub mod envelope;
pub mod error;
pub mod http;
pub mod notify;
pub mod refresh;
pub mod retry;
pub mod sse;
pub mod storage;
pub mod types;

pub use api::LoginParams;
pub use envelope::{CountResponse, OperationResponse, PaginationResponse};
pub use error::{Error, ErrorCode, Result};
pub use http::{ApiClient, ClientConfig, RequestOptions};
pub use notify::{LogNotifier, Navigation, NoticeLevel, Notifier};
pub use refresh::{RefreshBackend, TokenRefresher};
pub use retry::{RetryPolicy, fetch_with_retry};
pub use sse::{SseEventStream, SseExtraInfo, StreamEvent};
pub use storage::{FileStore, MemoryStore, SharedStore};
pub use types::*;
