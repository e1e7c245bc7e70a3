//! Interactive chat against a dialog

use rag_chat::{ChatEvent, ChatSession};
use rag_client::chat::replace_text_by_old_reg;
use rag_client::{ApiClient, Message, Reference, Role};
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

/// Writes a cumulative answer to the terminal as it grows
#[derive(Debug, Default)]
struct AnswerPrinter {
    printed: String,
}

/// Text to append when the answer grew from `printed` to `content`, or
/// `None` if the earlier text was rewritten.
fn delta<'a>(printed: &str, content: &'a str) -> Option<&'a str> {
    content.strip_prefix(printed)
}

impl AnswerPrinter {
    fn handle(&mut self, event: ChatEvent) -> io::Result<()> {
        match event {
            ChatEvent::TurnStart { .. } => self.printed.clear(),
            ChatEvent::MessageUpdate { message } => {
                let mut out = io::stdout();
                match delta(&self.printed, &message.content) {
                    Some(tail) => write!(out, "{}", tail)?,
                    None => write!(out, "\n{}", message.content)?,
                }
                out.flush()?;
                self.printed = message.content;
            }
            ChatEvent::ConversationCreated { conversation_id } => {
                tracing::debug!("Conversation {}", conversation_id);
            }
            ChatEvent::Error { message } => tracing::debug!("Turn error: {}", message),
            ChatEvent::TurnEnd { .. } | ChatEvent::Reconciled { .. } => {}
        }
        Ok(())
    }

    fn finish(&mut self) {
        if !self.printed.is_empty() {
            println!();
        }
        self.printed.clear();
    }
}

/// "Sources: a, b" for the documents an answer cites
fn sources_line(reference: &Reference) -> Option<String> {
    let names = reference.document_names();
    if names.is_empty() {
        return None;
    }
    Some(format!("Sources: {}", names.join(", ")))
}

fn print_history(messages: &[Message]) {
    for message in messages {
        let who = match message.role {
            Role::User => "you",
            Role::Assistant => "assistant",
            Role::System => "system",
        };
        println!("[{}] {}", who, replace_text_by_old_reg(&message.content));
    }
}

/// Run one turn, printing the answer as it streams. Ctrl-C stops the
/// generation without leaving the chat.
async fn run_turn(session: &Arc<ChatSession>, input: &str) -> anyhow::Result<()> {
    let mut rx = session.subscribe();
    let mut printer = AnswerPrinter::default();
    let mut turn = tokio::spawn({
        let session = session.clone();
        let input = input.to_string();
        async move { session.send_message(&input).await }
    });

    loop {
        tokio::select! {
            outcome = &mut turn => {
                while let Ok(event) = rx.try_recv() {
                    printer.handle(event)?;
                }
                printer.finish();
                if let Err(e) = outcome? {
                    tracing::debug!("Turn failed: {}", e);
                }
                if let Some(line) = session
                    .extra_info()
                    .and_then(|info| info.reference)
                    .and_then(|reference| sources_line(&reference))
                {
                    println!("{}", line);
                }
                return Ok(());
            }
            event = rx.recv() => match event {
                Ok(event) => printer.handle(event)?,
                Err(RecvError::Lagged(n)) => tracing::debug!("Skipped {} chat events", n),
                Err(RecvError::Closed) => {}
            },
            _ = tokio::signal::ctrl_c() => {
                session.stop_generation();
                eprintln!("\n[stopped]");
            }
        }
    }
}

pub async fn run(
    client: &ApiClient,
    dialog_id: &str,
    conversation_id: Option<&str>,
    command: Option<&str>,
    completion_delay: Duration,
) -> anyhow::Result<()> {
    let session = Arc::new(
        ChatSession::new(
            dialog_id,
            Arc::new(client.clone()),
            client.notifier().clone(),
        )
        .with_completion_delay(completion_delay),
    );

    let dialog = session.load_dialog().await?;
    if let Some(id) = conversation_id {
        session.open_conversation(id).await?;
    }

    if let Some(command) = command {
        return run_turn(&session, command).await;
    }

    if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        eprintln!("ragc chat: {} (Ctrl-C stops an answer, Ctrl-D exits)", dialog.name);
        eprintln!();
    }
    print_history(&session.messages());

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            // EOF
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if input == "/exit" || input == "/quit" {
            break;
        }
        run_turn(&session, input).await?;
    }

    if let Some(id) = session.conversation_id() {
        eprintln!("Conversation: {}", id);
    }
    Ok(())
}
