use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Every way a command into the engine can be refused.
///
/// Nothing in the step loop produces these: numeric trouble inside a step is
/// clamped or skipped locally. Errors only come out of the command boundary
/// (spawn, emit, config) and the persistence layer, and in every case the
/// world is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Malformed creation or configuration input.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Save slot name is empty or cannot be used as a slot key.
    #[error("invalid save slot name: {0:?}")]
    InvalidName(String),

    /// Requested save slot does not exist.
    #[error("save slot not found: {0}")]
    NotFound(String),

    /// Stored record could not be turned into well-formed entities.
    #[error("corrupt save data: {0}")]
    CorruptData(String),

    /// The slot store itself failed (I/O).
    #[error("slot storage failed: {0}")]
    Storage(String),
}

impl EngineError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        Self::CorruptData(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_failure() {
        let e = EngineError::invalid("width must be > 0");
        let msg = e.to_string();
        assert!(msg.contains("invalid parameter"));
        assert!(msg.contains("width"));

        let e = EngineError::NotFound("missing".into());
        assert_eq!(e.to_string(), "save slot not found: missing");
    }
}
