//! Document endpoints of a knowledge base

use reqwest::Method;
use serde_json::{Value, json};

use crate::envelope::{CountResponse, PaginationResponse};
use crate::error::Result;
use crate::http::{ApiClient, RequestOptions};
use crate::types::{Document, DocumentListParams, DocumentUpdate, ParseStatus};

pub const DOCUMENT_PREFIX: &str = "/rag/document";

fn document_path(doc_id: &str) -> String {
    format!("{}/{}", DOCUMENT_PREFIX, doc_id)
}

fn run_path() -> String {
    format!("{}/run", DOCUMENT_PREFIX)
}

impl ApiClient {
    pub async fn list_documents(
        &self,
        params: &DocumentListParams,
    ) -> Result<PaginationResponse<Document>> {
        self.get(DOCUMENT_PREFIX, params).await
    }

    /// Create an empty document in a knowledge base
    pub async fn create_document(&self, kb_id: &str, name: &str) -> Result<Document> {
        self.post(DOCUMENT_PREFIX, &json!({ "kb_id": kb_id, "name": name }))
            .await
    }

    pub async fn get_document(&self, doc_id: &str) -> Result<Document> {
        self.get(&document_path(doc_id), &json!({})).await
    }

    pub async fn update_document(&self, doc_id: &str, update: &DocumentUpdate) -> Result<Value> {
        self.put(&document_path(doc_id), update).await
    }

    pub async fn rename_document(&self, doc_id: &str, name: &str) -> Result<Value> {
        let update = DocumentUpdate {
            name: Some(name.to_string()),
            ..Default::default()
        };
        self.update_document(doc_id, &update).await
    }

    pub async fn delete_document(&self, doc_id: &str) -> Result<Value> {
        self.delete(&document_path(doc_id), &json!({})).await
    }

    pub async fn delete_documents(&self, doc_ids: &[String]) -> Result<CountResponse> {
        self.delete(DOCUMENT_PREFIX, &json!({ "doc_ids": doc_ids }))
            .await
    }

    /// Start (`stop == false`) or cancel parsing of the given documents
    pub async fn run_documents(&self, doc_ids: &[String], stop: bool) -> Result<CountResponse> {
        let run = if stop {
            ParseStatus::Cancelled
        } else {
            ParseStatus::Running
        };
        self.post(
            &run_path(),
            &json!({ "doc_ids": doc_ids, "run": run.as_code(), "stop": stop }),
        )
        .await
    }

    /// Raw file content of a document
    pub async fn download_document(&self, doc_id: &str) -> Result<Vec<u8>> {
        self.request_bytes(
            Method::GET,
            &format!("{}/download", document_path(doc_id)),
            json!({}),
            &RequestOptions::default(),
        )
        .await
    }
}
