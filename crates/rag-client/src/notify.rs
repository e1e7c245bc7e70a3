//! User-facing notices and navigation requests
//!
//! The client never prints or redirects on its own; it reports through a
//! [`Notifier`] supplied by the front end.

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Where the front end should send the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// The sign-in screen; the session could not be recovered
    SignIn,
    /// The agents listing; the requested agent does not exist
    Agents,
    /// Start over from a clean state after a forced logout
    Reload,
}

/// Receives notices and navigation requests from the client
pub trait Notifier: Send + Sync {
    fn notify(&self, level: NoticeLevel, message: &str);
    fn navigate(&self, target: Navigation);
}

/// Notifier that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info => tracing::info!("{}", message),
            NoticeLevel::Error => tracing::error!("{}", message),
        }
    }

    fn navigate(&self, target: Navigation) {
        tracing::info!("Navigation requested: {:?}", target);
    }
}
