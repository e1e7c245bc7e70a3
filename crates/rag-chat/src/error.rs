//! Error types for rag-chat

use thiserror::Error;

/// Result type alias using rag-chat Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving a chat session
#[derive(Error, Debug)]
pub enum Error {
    /// An error from the API client layer
    #[error(transparent)]
    Client(#[from] rag_client::Error),

    /// A generic session error
    #[error("{0}")]
    Other(String),
}
