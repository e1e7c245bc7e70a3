//! Shared utilities

use std::io::{self, Write};

/// Truncate a string to `max` characters, appending "..." if truncated.
/// Operates on Unicode char boundaries, not bytes.
pub fn truncate_chars(s: &str, max: usize) -> String {
    let mut chars = s.chars();
    let truncated: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{}...", truncated)
    } else {
        truncated
    }
}

/// Print `label` and read one trimmed line from stdin
pub fn prompt_line(label: &str) -> io::Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Whether the client already told the user about this failure
pub fn already_reported(error: &anyhow::Error) -> bool {
    let client_error = error.downcast_ref::<rag_client::Error>().or_else(|| {
        match error.downcast_ref::<rag_chat::Error>() {
            Some(rag_chat::Error::Client(e)) => Some(e),
            _ => None,
        }
    });
    matches!(
        client_error,
        Some(
            rag_client::Error::Api { .. }
                | rag_client::Error::Rejected { .. }
                | rag_client::Error::Unauthorized
                | rag_client::Error::ForcedLogout
        )
    )
}
