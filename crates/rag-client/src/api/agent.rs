//! Published agent endpoints

use serde_json::{Value, json};

use crate::envelope::PaginationResponse;
use crate::error::Result;
use crate::http::ApiClient;
use crate::types::{Agent, AgentLog, AgentLogParams, AgentMessageParams, AgentParams};

pub const AGENT_PREFIX: &str = "/rag/agent";

fn agent_path(agent_id: &str) -> String {
    format!("{}/{}", AGENT_PREFIX, agent_id)
}

impl ApiClient {
    pub async fn list_agents(&self) -> Result<Vec<Agent>> {
        self.get(AGENT_PREFIX, &json!({})).await
    }

    pub async fn create_agent(&self, params: &AgentParams) -> Result<Agent> {
        self.post(AGENT_PREFIX, params).await
    }

    pub async fn get_agent(&self, agent_id: &str) -> Result<Agent> {
        self.get(&agent_path(agent_id), &json!({})).await
    }

    pub async fn update_agent(&self, agent_id: &str, params: &AgentParams) -> Result<Agent> {
        self.put(&agent_path(agent_id), params).await
    }

    pub async fn delete_agent(&self, agent_id: &str) -> Result<Value> {
        self.delete(&agent_path(agent_id), &json!({})).await
    }

    pub async fn send_agent_message(
        &self,
        agent_id: &str,
        params: &AgentMessageParams,
    ) -> Result<Value> {
        self.post(&format!("{}/send-message", agent_path(agent_id)), params)
            .await
    }

    pub async fn list_agent_logs(
        &self,
        agent_id: &str,
        params: &AgentLogParams,
    ) -> Result<PaginationResponse<AgentLog>> {
        self.get(&format!("{}/logs", agent_path(agent_id)), params)
            .await
    }

    pub async fn get_agent_log(&self, agent_id: &str, log_id: &str) -> Result<AgentLog> {
        self.get(
            &format!("{}/logs/{}", agent_path(agent_id), log_id),
            &json!({}),
        )
        .await
    }
}
