//! Error type for engine calls and asynchronous engine events.

use thiserror::Error;

/// Errors surfaced by a scheduling engine.
///
/// `Clone` because the same value fans out to every subscriber of the
/// asynchronous error event channel.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The engine could not parse a trigger expression.
    #[error("invalid expression: {0}")]
    InvalidExpression(String),

    /// The backing store failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// The engine rejected the call; the message is the engine's own.
    #[error("{0}")]
    Rejected(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::InvalidExpression("not-a-cron".to_string());
        assert!(err.to_string().contains("invalid expression"));

        let err = EngineError::Storage("connection refused".to_string());
        assert!(err.to_string().contains("storage error"));

        // Rejected carries the engine's message verbatim.
        let err = EngineError::Rejected("boom".to_string());
        assert_eq!(err.to_string(), "boom");
    }
}
