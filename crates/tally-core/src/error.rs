use thiserror::Error;

/// Errors from entity sources.
#[derive(Debug, Error)]
pub enum EntityError {
    #[error("entity source unavailable: {0}")]
    Unavailable(String),

    #[error("invalid entity response: {0}")]
    InvalidResponse(String),
}

/// Errors from action item extraction.
///
/// Ordinary "nothing found" outcomes are never errors. Everything except
/// `Entities` is an internal-consistency fault in a collaborator or in the
/// engine itself; callers should skip the meeting instead of retrying.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("entity span {start}..{end} is outside text of {len} characters")]
    EntityOutOfBounds { start: usize, end: usize, len: usize },

    #[error("entity span {start}..{end} ends before it starts")]
    InvertedEntitySpan { start: usize, end: usize },

    #[error("candidate references clause {index} but only {clauses} clauses exist")]
    DanglingClause { index: usize, clauses: usize },

    #[error("entity source error: {0}")]
    Entities(#[from] EntityError),
}

impl ExtractError {
    /// Whether the failure is a broken invariant rather than a collaborator outage.
    pub fn is_invariant_fault(&self) -> bool {
        !matches!(self, ExtractError::Entities(_))
    }

    /// Only the entity source call may be retried; the engine itself is deterministic.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExtractError::Entities(_))
    }
}
