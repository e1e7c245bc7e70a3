//! Subcommand implementations

pub mod account;
pub mod chat;
pub mod dialogs;
pub mod knowledge;
pub mod system;
