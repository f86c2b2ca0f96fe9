pub mod sqlite;
pub mod traits;

pub use traits::ChapterRepository;

use navbar::{ChapterId, NavbarError};
use std::time::{SystemTime, UNIX_EPOCH};

/// Errors from the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Transaction failed: {0}")]
    Transaction(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("Chapter {0} not found")]
    NotFound(ChapterId),
    #[error("Chapter {0} kept changing page while waiting for its page lock")]
    Contention(ChapterId),
    #[error(transparent)]
    Navbar(#[from] NavbarError),
}

impl PersistenceError {
    /// True for failures caused by the request (4xx), false for server-side
    /// failures (5xx).
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Navbar(e) => e.is_client_error(),
            Self::Io(_) | Self::Transaction(_) | Self::Migration(_) | Self::Contention(_) => false,
        }
    }
}

/// Get the current unix timestamp in seconds.
pub fn now_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
