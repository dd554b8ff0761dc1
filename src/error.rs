//! Error taxonomy shared between the backend loop and the UI.

use thiserror::Error;

/// Everything that can go wrong when talking to the hosted backend.
///
/// None of these are fatal to the session: the UI degrades each variant to a
/// transient notice, an inline form error, or an empty view state.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The requested row (conversation, profile) does not exist.
    #[error("not found")]
    NotFound,

    /// A mutation was attempted on a row the current actor does not own.
    /// This is an optimistic client-side check; the backend's row-level
    /// policies remain the actual authority.
    #[error("you can only modify your own messages")]
    Unauthorized,

    /// Network or backend failure (fetch, mutation, subscription).
    #[error("backend request failed: {0}")]
    Backend(String),

    /// Client-side input validation failed.
    #[error("{0}")]
    Validation(String),
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::Backend(err.to_string())
    }
}
