//! Interpreter failures.
//!
//! The effect algebra itself is success-only. These errors describe runs the
//! interpreter could not finish; they reach the runtime's error handler
//! instead of the completion callback.

use std::any::Any;
use std::fmt;

/// Result of interpreter operations
pub type RunResult<T> = Result<T, RunError>;

/// The kind of user function that was executing when a run failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// A `Sync` thunk
    Thunk,
    /// A `Map` transform
    Transform,
    /// A `FlatMap` continuation
    Continuation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Thunk => write!(f, "thunk"),
            Stage::Transform => write!(f, "map transform"),
            Stage::Continuation => write!(f, "flat_map continuation"),
        }
    }
}

/// Errors that end a run without calling its completion callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    /// A thunk, transform or continuation panicked
    Panicked { stage: Stage, message: String },
    /// A value did not have the type its consumer expected
    TypeMismatch { expected: &'static str },
    /// The trampoline was resumed after delivering its result
    AlreadyCompleted,
    /// The host dropped the run before it completed
    Abandoned,
}

impl RunError {
    /// Build a `Panicked` error from a `catch_unwind` payload
    pub(crate) fn from_panic(stage: Stage, payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        RunError::Panicked { stage, message }
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Panicked { stage, message } => write!(f, "{} panicked: {}", stage, message),
            Self::TypeMismatch { expected } => {
                write!(f, "Type mismatch: expected a value of type {}", expected)
            }
            Self::AlreadyCompleted => write!(f, "Trampoline already completed"),
            Self::Abandoned => write!(f, "Run abandoned by its host before completion"),
        }
    }
}

impl std::error::Error for RunError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_payload_messages() {
        let err = RunError::from_panic(Stage::Thunk, Box::new("boom"));
        assert_eq!(
            err,
            RunError::Panicked {
                stage: Stage::Thunk,
                message: "boom".to_string()
            }
        );
        assert_eq!(err.to_string(), "thunk panicked: boom");

        let err = RunError::from_panic(Stage::Continuation, Box::new(format!("bad {}", 7)));
        assert_eq!(err.to_string(), "flat_map continuation panicked: bad 7");

        let err = RunError::from_panic(Stage::Transform, Box::new(42_u8));
        assert!(err.to_string().contains("non-string panic payload"));
    }
}
