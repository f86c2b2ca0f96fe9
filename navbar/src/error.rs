use crate::{ChapterId, Page};

/// Errors raised while validating or planning a navbar change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavbarError {
    #[error("Invalid page: {0:?}")]
    InvalidPartition(String),
    #[error("Invalid bar index {0}: positions start at 1")]
    InvalidPosition(u32),
    #[error("Chapter name must not be empty")]
    EmptyName,
    #[error("Chapter {id} listed more than once in reorder of page {page}")]
    DuplicateId { page: Page, id: ChapterId },
    #[error(
        "Reorder of page {page} does not match its chapters \
         (missing: {missing:?}, unexpected: {unexpected:?})"
    )]
    MembershipMismatch {
        page: Page,
        missing: Vec<ChapterId>,
        unexpected: Vec<ChapterId>,
    },
    #[error("Ordering invariant violated on page {page}: bar indices {positions:?}")]
    InvariantViolation { page: Page, positions: Vec<u32> },
}

impl NavbarError {
    /// Whether the error was caused by the request rather than by a bug.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::InvariantViolation { .. })
    }
}
