//! Server status endpoints

use serde_json::json;

use crate::error::Result;
use crate::http::ApiClient;
use crate::types::SystemStatus;

pub const SYS_PREFIX: &str = "/rag/sys";

impl ApiClient {
    pub async fn system_version(&self) -> Result<String> {
        self.get(&format!("{}/version", SYS_PREFIX), &json!({}))
            .await
    }

    pub async fn system_status(&self) -> Result<SystemStatus> {
        self.get(&format!("{}/status", SYS_PREFIX), &json!({}))
            .await
    }
}
