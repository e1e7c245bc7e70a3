//! Server health, agents and configured models

use rag_client::{ApiClient, SystemStatus};

use crate::utils::truncate_chars;

pub async fn status(client: &ApiClient) -> anyhow::Result<()> {
    let status = client.system_status().await?;
    for line in status_lines(&status) {
        println!("{}", line);
    }
    Ok(())
}

fn status_lines(status: &SystemStatus) -> Vec<String> {
    status
        .services()
        .into_iter()
        .map(|(name, health)| {
            let state = if health.is_healthy() { "ok" } else { "DOWN" };
            let mut line = format!("{:<10}  {:<4}", name, state);
            if let Some(elapsed) = &health.elapsed {
                line.push_str(&format!("  {} ms", elapsed));
            }
            if let Some(error) = health.error.as_deref().filter(|e| !e.is_empty()) {
                line.push_str(&format!("  {}", truncate_chars(error, 60)));
            }
            line.trim_end().to_string()
        })
        .collect()
}

pub async fn list_agents(client: &ApiClient) -> anyhow::Result<()> {
    let agents = client.list_agents().await?;
    if agents.is_empty() {
        println!("No agents.");
        return Ok(());
    }
    for agent in agents {
        println!(
            "{}  {}  {}",
            agent.id,
            truncate_chars(&agent.name, 40),
            if agent.is_active() { "active" } else { "inactive" }
        );
    }
    Ok(())
}

pub async fn list_models(client: &ApiClient) -> anyhow::Result<()> {
    let providers = client.list_my_models().await?;
    if providers.is_empty() {
        println!("No models configured.");
        return Ok(());
    }
    for (provider, models) in providers {
        println!("{}", provider);
        for model in models.llm {
            println!(
                "  {}  {}  {} tokens used",
                model.name, model.model_type, model.used_token
            );
        }
    }
    Ok(())
}
