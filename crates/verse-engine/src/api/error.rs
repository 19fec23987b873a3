use crate::api::types::SessionId;

/// Errors surfaced by the puzzle engine.
///
/// Only `ContentUnavailable` is meant to reach the screen layer; token and
/// index errors leave state untouched, persistence errors fall back to
/// in-memory defaults.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("content unavailable: {reason}")]
    ContentUnavailable { reason: String },
    #[error("token {index} is not in the scrambled pool")]
    InvalidToken { index: usize },
    #[error("position {position} is out of range (length {len})")]
    IndexOutOfRange { position: usize, len: usize },
    #[error("persistence unavailable: {reason}")]
    PersistenceUnavailable { reason: String },
    #[error("session {0} is not active")]
    SessionInactive(SessionId),
    #[error("no hint available")]
    HintUnavailable,
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl EngineError {
    pub fn content(reason: impl Into<String>) -> Self {
        EngineError::ContentUnavailable {
            reason: reason.into(),
        }
    }

    pub fn persistence(reason: impl Into<String>) -> Self {
        EngineError::PersistenceUnavailable {
            reason: reason.into(),
        }
    }

    /// Whether the engine recovers from this error locally.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, EngineError::ContentUnavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_content_errors_propagate() {
        assert!(!EngineError::content("empty verse").is_recoverable());
        assert!(EngineError::persistence("quota").is_recoverable());
        assert!(EngineError::InvalidToken { index: 3 }.is_recoverable());
        assert!(EngineError::IndexOutOfRange { position: 9, len: 2 }.is_recoverable());
    }

    #[test]
    fn messages_name_the_offending_value() {
        let err = EngineError::IndexOutOfRange { position: 7, len: 4 };
        assert_eq!(err.to_string(), "position 7 is out of range (length 4)");
        let err = EngineError::SessionInactive(SessionId(12));
        assert_eq!(err.to_string(), "session #12 is not active");
    }
}
