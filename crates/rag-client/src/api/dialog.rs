//! Dialog (agent) endpoints

use serde_json::json;

use crate::error::Result;
use crate::http::ApiClient;
use crate::types::Dialog;

pub const DIALOG_PREFIX: &str = "/rag/dialog";

impl ApiClient {
    pub async fn list_dialogs(&self) -> Result<Vec<Dialog>> {
        self.get(DIALOG_PREFIX, &json!({})).await
    }

    pub async fn get_dialog(&self, dialog_id: &str) -> Result<Dialog> {
        self.get(&format!("{}/{}", DIALOG_PREFIX, dialog_id), &json!({}))
            .await
    }
}
