//! Wire types shared by the console API endpoints

use serde::{Deserialize, Serialize};

/// Access/refresh token pair issued on login and refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Signed-in account details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub account: Account,
    #[serde(default)]
    pub tenant_info: Option<TenantInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub interface_language: Option<String>,
    #[serde(default)]
    pub interface_theme: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub last_login_at: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TenantInfo {
    pub name: String,
    pub asr_id: String,
    pub rerank_id: String,
    pub embd_id: String,
    pub img2txt_id: String,
    pub llm_id: String,
    pub parser_ids: String,
}

/// Author of a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// A single conversation message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbup: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

impl Message {
    /// Create a message without an id
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: None,
            role,
            content: content.into(),
            doc_ids: None,
            thumbup: None,
            feedback: None,
            prompt: None,
        }
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

/// Retrieved chunks backing an answer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(default)]
    pub chunks: Vec<ReferenceChunk>,
    #[serde(default)]
    pub doc_aggs: Vec<serde_json::Value>,
}

impl Reference {
    /// Names of the cited documents, in first-cited order, without repeats
    pub fn document_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for chunk in &self.chunks {
            let name = chunk.document_name.as_str();
            if !name.is_empty() && !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceChunk {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub document_id: String,
    #[serde(default)]
    pub document_name: String,
    #[serde(default)]
    pub dataset_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positions: Option<serde_json::Value>,
}

/// Server-owned conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub dialog_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<Vec<Reference>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationCreateParams {
    pub name: String,
    pub dialog_id: String,
    pub messages: Vec<Message>,
}

/// Partial conversation update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dialog_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessageParams {
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionParams {
    pub question: String,
    pub kb_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbUpParams {
    pub set: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

/// Chat assistant configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dialog {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub kb_ids: Vec<String>,
    #[serde(default)]
    pub llm_id: Option<String>,
    #[serde(default)]
    pub llm_setting: Option<LlmSetting>,
    #[serde(default)]
    pub prompt_config: PromptConfig,
    #[serde(default)]
    pub rerank_id: Option<String>,
    #[serde(default)]
    pub similarity_threshold: Option<f64>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub top_k: Option<u32>,
    #[serde(default)]
    pub top_n: Option<u32>,
    #[serde(default)]
    pub vector_similarity_weight: Option<f64>,
}

impl Dialog {
    /// Configured greeting, if any
    pub fn prologue(&self) -> Option<&str> {
        Some(self.prompt_config.prologue.as_str()).filter(|p| !p.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSetting {
    pub temperature: f64,
    pub top_p: f64,
    pub presence_penalty: f64,
    pub frequency_penalty: f64,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    pub empty_response: String,
    pub keyword: bool,
    pub parameters: Vec<PromptParameter>,
    pub prologue: String,
    pub quote: bool,
    pub refine_multiturn: bool,
    pub system: String,
    pub tts: bool,
    pub use_kg: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptParameter {
    pub key: String,
    #[serde(default)]
    pub optional: bool,
}

/// Knowledge base (dataset) summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBase {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub embd_id: String,
    #[serde(default)]
    pub permission: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub doc_num: u64,
    #[serde(default)]
    pub token_num: u64,
    #[serde(default)]
    pub chunk_num: u64,
    #[serde(default)]
    pub similarity_threshold: Option<f64>,
    #[serde(default)]
    pub vector_similarity_weight: Option<f64>,
    #[serde(default)]
    pub parser_id: String,
    #[serde(default)]
    pub parser_config: serde_json::Value,
    #[serde(default)]
    pub pagerank: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<serde_json::Value>,
    #[serde(default)]
    pub updated_at: Option<serde_json::Value>,
}

/// Filters and paging for knowledge base listings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parser_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orderby: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desc: Option<bool>,
}

/// Knowledge base create or update body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeBaseParams {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embd_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parser_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parser_config: Option<serde_json::Value>,
}

/// Parsing state of a document, sent as a one-digit string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStatus {
    Idle,
    Running,
    Cancelled,
    Done,
    Failed,
}

impl ParseStatus {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "0" => Some(ParseStatus::Idle),
            "1" => Some(ParseStatus::Running),
            "2" => Some(ParseStatus::Cancelled),
            "3" => Some(ParseStatus::Done),
            "4" => Some(ParseStatus::Failed),
            _ => None,
        }
    }

    pub fn as_code(&self) -> &'static str {
        match self {
            ParseStatus::Idle => "0",
            ParseStatus::Running => "1",
            ParseStatus::Cancelled => "2",
            ParseStatus::Done => "3",
            ParseStatus::Failed => "4",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ParseStatus::Idle => "idle",
            ParseStatus::Running => "running",
            ParseStatus::Cancelled => "cancelled",
            ParseStatus::Done => "done",
            ParseStatus::Failed => "failed",
        }
    }
}

/// Document stored in a knowledge base
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub kb_id: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub parser_id: Option<String>,
    #[serde(default)]
    pub parser_config: serde_json::Value,
    #[serde(default)]
    pub source_type: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub token_num: u64,
    #[serde(default)]
    pub chunk_num: u64,
    /// Parse progress in `[0, 1]`; `-1` marks a failure
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub progress_msg: Option<String>,
    #[serde(default)]
    pub process_begin_at: Option<serde_json::Value>,
    #[serde(default)]
    pub process_duration: Option<f64>,
    #[serde(default)]
    pub meta_fields: Option<serde_json::Value>,
    #[serde(default)]
    pub run: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<serde_json::Value>,
    #[serde(default)]
    pub updated_at: Option<serde_json::Value>,
}

impl Document {
    pub fn parse_status(&self) -> Option<ParseStatus> {
        ParseStatus::from_code(&self.run)
    }

    /// Progress as a whole percentage, clamped to `0..=100`
    pub fn progress_percent(&self) -> u8 {
        (self.progress.clamp(0.0, 1.0) * 100.0).round() as u8
    }
}

/// Filters and paging for the documents of one knowledge base
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentListParams {
    pub kb_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orderby: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desc: Option<bool>,
}

/// Partial document update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parser_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parser_config: Option<serde_json::Value>,
}

/// Published agent wrapping a dialog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub agent_config: serde_json::Value,
    #[serde(default)]
    pub created_at: Option<serde_json::Value>,
    #[serde(default)]
    pub updated_at: Option<serde_json::Value>,
}

impl Agent {
    pub fn is_active(&self) -> bool {
        self.status.as_deref() == Some("active")
    }
}

/// Agent create or update body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentParams {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub agent_config: serde_json::Value,
}

/// One task processed by an agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentLog {
    pub id: String,
    #[serde(default)]
    pub agent_id: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub message: serde_json::Value,
    #[serde(default)]
    pub timestamp: Option<serde_json::Value>,
}

/// Paging for agent task logs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentLogParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orderby: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desc: Option<bool>,
}

/// A model configured for the current tenant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantModel {
    pub name: String,
    #[serde(default, rename = "type")]
    pub model_type: String,
    #[serde(default)]
    pub used_token: u64,
}

/// Models a tenant has configured for one provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderModels {
    #[serde(default)]
    pub llm: Vec<TenantModel>,
    #[serde(default)]
    pub tags: Option<String>,
}

/// A model offered by a provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub llm_name: String,
    #[serde(default)]
    pub model_type: String,
    #[serde(default)]
    pub fid: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<u64>,
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub status: Option<String>,
}

/// Model provider known to the server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub model_types: Vec<String>,
}

/// Register a model with a provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddModelParams {
    pub llm_factory: String,
    pub model_type: String,
    pub llm_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u64>,
}

/// Provider credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderKeyParams {
    pub llm_factory: String,
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Message posted to an agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMessageParams {
    pub message: String,
    #[serde(default)]
    pub stream: bool,
}

/// Health of one backing service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceHealth {
    #[serde(default)]
    pub status: String,
    /// Health check time in milliseconds, formatted by the server
    #[serde(default)]
    pub elapsed: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl ServiceHealth {
    pub fn is_healthy(&self) -> bool {
        self.status == "green"
    }
}

/// Health of every service the console depends on
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemStatus {
    #[serde(default)]
    pub doc_engine: ServiceHealth,
    #[serde(default)]
    pub storage: ServiceHealth,
    #[serde(default)]
    pub database: ServiceHealth,
    #[serde(default)]
    pub redis: ServiceHealth,
    #[serde(default)]
    pub task_executor_heartbeats: serde_json::Value,
}

impl SystemStatus {
    /// Services in display order
    pub fn services(&self) -> [(&'static str, &ServiceHealth); 4] {
        [
            ("doc_engine", &self.doc_engine),
            ("storage", &self.storage),
            ("database", &self.database),
            ("redis", &self.redis),
        ]
    }
}
