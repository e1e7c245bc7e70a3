//! Listing dialogs and their conversations

use rag_client::ApiClient;

use crate::utils::truncate_chars;

pub async fn list_dialogs(client: &ApiClient) -> anyhow::Result<()> {
    let dialogs = client.list_dialogs().await?;
    if dialogs.is_empty() {
        println!("No dialogs.");
        return Ok(());
    }
    for dialog in dialogs {
        let description = dialog.description.as_deref().unwrap_or("");
        println!(
            "{}  {}  {}",
            dialog.id,
            dialog.name,
            truncate_chars(&description.replace('\n', " "), 60)
        );
    }
    Ok(())
}

pub async fn list_conversations(client: &ApiClient, dialog_id: &str) -> anyhow::Result<()> {
    let conversations = client.list_conversations(dialog_id).await?;
    if conversations.is_empty() {
        println!("No conversations for dialog {}.", dialog_id);
        return Ok(());
    }
    for conversation in conversations {
        println!(
            "{}  {}  ({} messages)",
            conversation.id,
            truncate_chars(&conversation.name, 50),
            conversation.messages.len()
        );
    }
    Ok(())
}
