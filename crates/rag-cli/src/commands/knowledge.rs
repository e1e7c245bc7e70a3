//! Listing knowledge bases and the parse state of their documents

use rag_client::{ApiClient, Document, DocumentListParams, KnowledgeListParams};

use crate::utils::truncate_chars;

const PAGE_SIZE: u32 = 100;

pub async fn list_knowledge_bases(
    client: &ApiClient,
    keywords: Option<String>,
) -> anyhow::Result<()> {
    let params = KnowledgeListParams {
        keywords,
        page: Some(1),
        page_size: Some(PAGE_SIZE),
        ..Default::default()
    };
    let page = client.list_knowledge_bases(&params).await?;
    if page.data.is_empty() {
        println!("No knowledge bases.");
        return Ok(());
    }
    for kb in &page.data {
        println!(
            "{}  {}  {} docs  {} chunks",
            kb.id,
            truncate_chars(&kb.name, 40),
            kb.doc_num,
            kb.chunk_num
        );
    }
    if page.count > page.data.len() as u64 {
        println!("({} of {} shown)", page.data.len(), page.count);
    }
    Ok(())
}

pub async fn list_documents(client: &ApiClient, kb_id: &str) -> anyhow::Result<()> {
    let params = DocumentListParams {
        kb_id: kb_id.to_string(),
        page: Some(1),
        page_size: Some(PAGE_SIZE),
        ..Default::default()
    };
    let page = client.list_documents(&params).await?;
    if page.data.is_empty() {
        println!("No documents in knowledge base {}.", kb_id);
        return Ok(());
    }
    for doc in &page.data {
        println!("{}", document_line(doc));
    }
    if page.count > page.data.len() as u64 {
        println!("({} of {} shown)", page.data.len(), page.count);
    }
    Ok(())
}

/// `id  name  status  percent  message`
fn document_line(doc: &Document) -> String {
    let status = doc.parse_status().map(|s| s.label()).unwrap_or("unknown");
    let message = doc
        .progress_msg
        .as_deref()
        .and_then(|m| m.lines().last())
        .unwrap_or("");
    format!(
        "{}  {}  {}  {}%  {}",
        doc.id,
        truncate_chars(&doc.name, 40),
        status,
        doc.progress_percent(),
        truncate_chars(message, 40)
    )
    .trim_end()
    .to_string()
}
