//! Errors raised while building harnesses or collecting outcomes.
//!
//! Only malformed harnesses are errors. A candidate interleaving whose
//! projections disagree is not an error: it simply contributes no outcome.

use thiserror::Error;

use crate::invocation::InvocationId;

/// Crate-wide result alias.
pub type Result<T, E = OracleError> = std::result::Result<T, E>;

/// A single method call that failed against the object under test.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("`{invocation}` failed: {reason}")]
pub struct InvocationFailure {
    pub invocation: String,
    pub reason: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("constructor `{constructor}` failed: {reason}")]
    Construction { constructor: String, reason: String },
    #[error("step {step} of [{sequence}]: {source}")]
    Invocation {
        step: usize,
        sequence: String,
        #[source]
        source: InvocationFailure,
    },
    #[error("happens-before order contains a cycle through invocation {id}")]
    CyclicOrder { id: InvocationId },
    #[error("happens-before edge names unknown invocation {id}")]
    UnknownInvocation { id: InvocationId },
    #[error("invocation {id} is registered twice")]
    DuplicateInvocation { id: InvocationId },
    #[error("invalid collector options: {0}")]
    InvalidOptions(String),
    #[error("serialization failure: {0}")]
    SerializationFailure(String),
    #[error("i/o failure: {0}")]
    Io(String),
}

impl From<std::io::Error> for OracleError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for OracleError {
    fn from(error: serde_json::Error) -> Self {
        Self::SerializationFailure(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_error_names_step_and_call() {
        let err = OracleError::Invocation {
            step: 2,
            sequence: "add(1), peek()".to_string(),
            source: InvocationFailure {
                invocation: "peek()".to_string(),
                reason: "queue poisoned".to_string(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("step 2"));
        assert!(msg.contains("`peek()` failed: queue poisoned"));
    }

    #[test]
    fn test_cycle_error_mentions_id() {
        let err = OracleError::CyclicOrder { id: InvocationId(3) };
        assert_eq!(
            err.to_string(),
            "happens-before order contains a cycle through invocation #3"
        );
    }
}
