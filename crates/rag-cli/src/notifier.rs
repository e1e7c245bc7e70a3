//! Terminal rendering of client notices

use rag_client::{Navigation, NoticeLevel, Notifier};

/// Prints notices to stderr and turns navigation requests into hints
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalNotifier;

impl TerminalNotifier {
    pub fn navigation_hint(target: Navigation) -> &'static str {
        match target {
            Navigation::SignIn => "Your session has expired. Run `ragc login <email>` to sign in again.",
            Navigation::Agents => "Run `ragc dialogs` to see the available dialogs.",
            Navigation::Reload => "You have been signed out. Run `ragc login <email>` to start a new session.",
        }
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info => eprintln!("{}", message),
            NoticeLevel::Error => eprintln!("Error: {}", message),
        }
    }

    fn navigate(&self, target: Navigation) {
        tracing::debug!("Navigation requested: {:?}", target);
        eprintln!("{}", Self::navigation_hint(target));
    }
}
