//! Conversation endpoints

use reqwest::Method;
use serde_json::{Value, json};

use crate::error::Result;
use crate::http::{ApiClient, RequestOptions};
use crate::types::{
    Conversation, ConversationCreateParams, ConversationMessageParams, ConversationUpdate,
    QuestionParams, ThumbUpParams,
};

pub const CONVERSATION_PREFIX: &str = "/rag/conversation";

fn conversation_path(conversation_id: &str) -> String {
    format!("{}/{}", CONVERSATION_PREFIX, conversation_id)
}

fn question_path() -> String {
    format!("{}/question", CONVERSATION_PREFIX)
}

impl ApiClient {
    pub async fn list_conversations(&self, dialog_id: &str) -> Result<Vec<Conversation>> {
        self.get(CONVERSATION_PREFIX, &json!({ "dialog_id": dialog_id }))
            .await
    }

    pub async fn create_conversation(
        &self,
        params: &ConversationCreateParams,
    ) -> Result<Conversation> {
        self.post(CONVERSATION_PREFIX, params).await
    }

    pub async fn delete_conversations(&self, conversation_ids: &[String]) -> Result<Value> {
        self.delete(
            CONVERSATION_PREFIX,
            &json!({ "conversation_ids": conversation_ids }),
        )
        .await
    }

    pub async fn get_conversation(&self, conversation_id: &str) -> Result<Conversation> {
        self.get(&conversation_path(conversation_id), &json!({}))
            .await
    }

    pub async fn update_conversation(
        &self,
        conversation_id: &str,
        update: &ConversationUpdate,
    ) -> Result<Conversation> {
        self.put(&conversation_path(conversation_id), update).await
    }

    /// Post messages to a conversation and wait for the whole answer
    pub async fn send_conversation_message(
        &self,
        conversation_id: &str,
        params: &ConversationMessageParams,
    ) -> Result<Value> {
        let mut body = serde_json::to_value(params)?;
        if let Value::Object(map) = &mut body {
            map.insert("conversation_id".to_string(), json!(conversation_id));
        }
        self.request_value(
            Method::POST,
            &conversation_path(conversation_id),
            body,
            &RequestOptions::default(),
        )
        .await
    }

    pub async fn ask_question(&self, params: &QuestionParams) -> Result<Value> {
        self.post(&question_path(), params).await
    }

    pub async fn generate_mind_map(&self, params: &QuestionParams) -> Result<Value> {
        self.put(&question_path(), params).await
    }

    pub async fn generate_related_terms(&self, params: &QuestionParams) -> Result<Vec<String>> {
        self.post(&question_path(), params).await
    }

    /// Synthesize speech; returns the encoded audio
    pub async fn text_to_speech(&self, text: &str) -> Result<Vec<u8>> {
        self.request_bytes(
            Method::POST,
            &format!("{}/tts", CONVERSATION_PREFIX),
            json!({ "text": text }),
            &RequestOptions::default(),
        )
        .await
    }

    pub async fn thumb_up_message(
        &self,
        conversation_id: &str,
        message_id: &str,
        params: &ThumbUpParams,
    ) -> Result<Conversation> {
        self.post(
            &format!("{}/{}", conversation_path(conversation_id), message_id),
            params,
        )
        .await
    }

    pub async fn delete_message(
        &self,
        conversation_id: &str,
        message_id: &str,
    ) -> Result<Conversation> {
        self.delete(
            &format!("{}/{}", conversation_path(conversation_id), message_id),
            &json!({}),
        )
        .await
    }
}
