//! Knowledge base endpoints

use serde_json::{Value, json};

use crate::envelope::PaginationResponse;
use crate::error::Result;
use crate::http::ApiClient;
use crate::types::{KnowledgeBase, KnowledgeBaseParams, KnowledgeListParams};

pub const KNOWLEDGE_PREFIX: &str = "/rag/kb";

fn knowledge_path(kb_id: &str) -> String {
    format!("{}/{}", KNOWLEDGE_PREFIX, kb_id)
}

impl ApiClient {
    pub async fn list_knowledge_bases(
        &self,
        params: &KnowledgeListParams,
    ) -> Result<PaginationResponse<KnowledgeBase>> {
        self.get(KNOWLEDGE_PREFIX, params).await
    }

    pub async fn get_knowledge_base(&self, kb_id: &str) -> Result<KnowledgeBase> {
        self.get(&knowledge_path(kb_id), &json!({})).await
    }

    pub async fn create_knowledge_base(
        &self,
        params: &KnowledgeBaseParams,
    ) -> Result<KnowledgeBase> {
        self.post(KNOWLEDGE_PREFIX, params).await
    }

    pub async fn update_knowledge_base(
        &self,
        kb_id: &str,
        params: &KnowledgeBaseParams,
    ) -> Result<KnowledgeBase> {
        self.put(&knowledge_path(kb_id), params).await
    }

    pub async fn delete_knowledge_base(&self, kb_id: &str) -> Result<Value> {
        self.delete(&knowledge_path(kb_id), &json!({})).await
    }
}
