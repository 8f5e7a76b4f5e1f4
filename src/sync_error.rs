use thiserror::Error;

/// Failure reported by a participant callback.
///
/// Panics raised by a callback are caught by the registry and reported as
/// [`CallbackError::Panicked`] so that sibling callbacks keep running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallbackError {
    #[error("callback failed: {message}")]
    Failed { message: String },

    #[error("callback panicked: {message}")]
    Panicked { message: String },

    /// The spawner dropped the callback task before it completed.
    #[error("callback task was dropped before completing")]
    Abandoned,
}

impl CallbackError {
    pub fn failed(message: impl Into<String>) -> Self {
        CallbackError::Failed {
            message: message.into(),
        }
    }

    /// Builds a `Panicked` error from a payload caught by `catch_unwind`.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        CallbackError::Panicked { message }
    }
}

impl From<String> for CallbackError {
    fn from(message: String) -> Self {
        CallbackError::Failed { message }
    }
}

impl From<&str> for CallbackError {
    fn from(message: &str) -> Self {
        CallbackError::failed(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_display() {
        let err = CallbackError::failed("disk full");
        assert_eq!(err.to_string(), "callback failed: disk full");
    }

    #[test]
    fn test_panicked_display() {
        let err = CallbackError::Panicked {
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "callback panicked: boom");
    }

    #[test]
    fn test_abandoned_display() {
        assert_eq!(
            CallbackError::Abandoned.to_string(),
            "callback task was dropped before completing"
        );
    }

    #[test]
    fn test_from_panic_payloads() {
        let err = CallbackError::from_panic(Box::new("static str"));
        assert_eq!(
            err,
            CallbackError::Panicked {
                message: "static str".to_string()
            }
        );

        let err = CallbackError::from_panic(Box::new(String::from("owned")));
        assert_eq!(
            err,
            CallbackError::Panicked {
                message: "owned".to_string()
            }
        );

        let err = CallbackError::from_panic(Box::new(42u8));
        assert!(matches!(err, CallbackError::Panicked { .. }));
    }

    #[test]
    fn test_conversions() {
        assert_eq!(CallbackError::from("x"), CallbackError::failed("x"));
        assert_eq!(
            CallbackError::from("y".to_string()),
            CallbackError::failed("y")
        );
    }

    #[test]
    fn test_error_trait() {
        let err: &dyn std::error::Error = &CallbackError::failed("nope");
        assert_eq!(err.to_string(), "callback failed: nope");
    }
}
