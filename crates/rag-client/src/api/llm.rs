//! Model provider endpoints

use std::collections::BTreeMap;

use serde_json::{Value, json};

use crate::error::Result;
use crate::http::ApiClient;
use crate::types::{AddModelParams, ModelInfo, ProviderInfo, ProviderKeyParams, ProviderModels};

pub const LLM_PREFIX: &str = "/rag/llm";

fn factories_path() -> String {
    format!("{}/factories", LLM_PREFIX)
}

impl ApiClient {
    /// Models configured for the current tenant, keyed by provider
    pub async fn list_my_models(&self) -> Result<BTreeMap<String, ProviderModels>> {
        self.get(LLM_PREFIX, &json!({})).await
    }

    /// Every model the server offers, keyed by provider. `model_type` filters
    /// by substring (`chat`, `embedding`, ...).
    pub async fn list_models(
        &self,
        model_type: Option<&str>,
    ) -> Result<BTreeMap<String, Vec<ModelInfo>>> {
        self.get(
            &format!("{}/list", LLM_PREFIX),
            &json!({ "model_type": model_type }),
        )
        .await
    }

    pub async fn add_model(&self, params: &AddModelParams) -> Result<Value> {
        self.post(LLM_PREFIX, params).await
    }

    pub async fn delete_model(&self, llm_factory: &str, llm_name: &str) -> Result<Value> {
        self.delete(
            LLM_PREFIX,
            &json!({ "llm_factory": llm_factory, "llm_name": llm_name }),
        )
        .await
    }

    pub async fn list_providers(&self) -> Result<Vec<ProviderInfo>> {
        self.get(&factories_path(), &json!({})).await
    }

    pub async fn set_provider_key(&self, params: &ProviderKeyParams) -> Result<Value> {
        self.put(&factories_path(), params).await
    }

    pub async fn delete_provider(&self, llm_factory: &str) -> Result<Value> {
        self.delete(&factories_path(), &json!({ "llm_factory": llm_factory }))
            .await
    }
}
