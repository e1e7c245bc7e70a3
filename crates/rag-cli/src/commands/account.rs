//! Sign-in and account commands

use rag_client::{ApiClient, LoginParams};

use crate::utils::prompt_line;

fn credentials(email: &str, password: Option<String>) -> anyhow::Result<LoginParams> {
    let password = match password {
        Some(p) => p,
        None => prompt_line("Password (input is visible): ")?,
    };
    if password.is_empty() {
        anyhow::bail!("A password is required");
    }
    Ok(LoginParams::new(email, password))
}

pub async fn login(client: &ApiClient, email: &str, password: Option<String>) -> anyhow::Result<()> {
    let params = credentials(email, password)?;
    client.sign_in(&params).await?;
    println!("Logged in as {}", email);
    Ok(())
}

pub async fn register(
    client: &ApiClient,
    email: &str,
    password: Option<String>,
) -> anyhow::Result<()> {
    let params = credentials(email, password)?;
    client.sign_up_and_sign_in(&params).await?;
    println!("Registered and logged in as {}", email);
    Ok(())
}

pub async fn logout(client: &ApiClient) -> anyhow::Result<()> {
    if let Err(e) = client.logout().await {
        tracing::warn!("Server logout failed: {}", e);
    }
    println!("Logged out.");
    Ok(())
}

pub async fn whoami(client: &ApiClient) -> anyhow::Result<()> {
    let info = client.current_account().await?;
    println!("{} <{}>", info.account.username, info.account.email);
    if let Some(tenant) = info.tenant_info.filter(|t| !t.name.is_empty()) {
        println!("Tenant: {}", tenant.name);
    }
    Ok(())
}
