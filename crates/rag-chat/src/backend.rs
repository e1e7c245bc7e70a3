//! Backend seam between chat sessions and the console API

use async_trait::async_trait;
use rag_client::{
    ApiClient, Conversation, ConversationCreateParams, Dialog, Result, SseEventStream,
};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// The server operations a chat session needs
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn create_conversation(&self, params: &ConversationCreateParams)
    -> Result<Conversation>;

    async fn get_conversation(&self, conversation_id: &str) -> Result<Conversation>;

    async fn get_dialog(&self, dialog_id: &str) -> Result<Dialog>;

    /// Open a streaming completion at `path`
    async fn open_stream(
        &self,
        path: &str,
        payload: Value,
        cancel: CancellationToken,
    ) -> Result<SseEventStream>;
}

#[async_trait]
impl ChatBackend for ApiClient {
    async fn create_conversation(
        &self,
        params: &ConversationCreateParams,
    ) -> Result<Conversation> {
        ApiClient::create_conversation(self, params).await
    }

    async fn get_conversation(&self, conversation_id: &str) -> Result<Conversation> {
        ApiClient::get_conversation(self, conversation_id).await
    }

    async fn get_dialog(&self, dialog_id: &str) -> Result<Dialog> {
        ApiClient::get_dialog(self, dialog_id).await
    }

    async fn open_stream(
        &self,
        path: &str,
        payload: Value,
        cancel: CancellationToken,
    ) -> Result<SseEventStream> {
        self.sse_request(path, payload, cancel).await
    }
}
