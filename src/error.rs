//! Input Pipeline Error Types
//!
//! Every fallible operation in the pipeline returns [`Result`]. Failures never
//! leave partially applied state behind: growth of click-state tables, finger
//! arrays and cursor arenas reserves capacity before mutating, and validation
//! happens before any field is touched.

use thiserror::Error;

/// Result type for input operations
pub type Result<T> = std::result::Result<T, InputError>;

/// Input pipeline error types
#[derive(Error, Debug)]
pub enum InputError {
    /// Capability not implemented by the active backend
    #[error("{0} is not supported by the active backend")]
    Unsupported(&'static str),

    /// Argument rejected before any state was modified
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Allocation failed while growing a table
    #[error("Out of memory while growing {0}")]
    OutOfMemory(&'static str),

    /// Native key code without a canonical scancode
    #[error("Unknown native key code: 0x{0:04X}")]
    UnknownKeyCode(u32),

    /// Touch device id not registered
    #[error("Unknown touch device: {0}")]
    UnknownTouchDevice(i64),

    /// Joystick instance id not open
    #[error("Unknown joystick instance: {0}")]
    UnknownJoystick(u32),

    /// Haptic device index not present
    #[error("Unknown haptic device: {0}")]
    UnknownHapticDevice(u32),

    /// Haptic effect id out of range or never created
    #[error("Invalid haptic effect: {0}")]
    InvalidEffect(i32),

    /// Low-level report could not be decoded
    #[error("Invalid joystick report: {0}")]
    InvalidReport(String),

    /// Event queue reached its capacity
    #[error("Event queue is full ({0} events)")]
    EventQueueFull(usize),

    /// Backend reported a failure
    #[error("Backend error: {0}")]
    Backend(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error classification, mirroring how callers are expected to react
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Capability missing; never fatal
    Unsupported,
    /// Caller error; nothing was modified
    InvalidArgument,
    /// Allocation or capacity exhaustion
    ResourceExhausted,
    /// Hardware or timing race, usually resolved by a later poll
    Transient,
    /// Failure reported by a collaborator
    Backend,
}

/// Classify error
pub fn classify_error(error: &InputError) -> ErrorClass {
    match error {
        InputError::Unsupported(_) => ErrorClass::Unsupported,

        InputError::InvalidArgument(_)
        | InputError::UnknownKeyCode(_)
        | InputError::UnknownTouchDevice(_)
        | InputError::UnknownJoystick(_)
        | InputError::UnknownHapticDevice(_)
        | InputError::InvalidEffect(_) => ErrorClass::InvalidArgument,

        InputError::OutOfMemory(_) | InputError::EventQueueFull(_) => {
            ErrorClass::ResourceExhausted
        }

        InputError::InvalidReport(_) => ErrorClass::Transient,

        InputError::Backend(_) | InputError::Io(_) => ErrorClass::Backend,
    }
}

impl InputError {
    /// Shorthand for [`InputError::InvalidArgument`]
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Error class of this error
    pub fn class(&self) -> ErrorClass {
        classify_error(self)
    }

    /// Whether this error only signals a missing capability
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let error = InputError::Unsupported("mouse capture");
        assert_eq!(classify_error(&error), ErrorClass::Unsupported);

        let error = InputError::invalid("hot spot outside cursor");
        assert_eq!(classify_error(&error), ErrorClass::InvalidArgument);

        let error = InputError::OutOfMemory("click states");
        assert_eq!(classify_error(&error), ErrorClass::ResourceExhausted);

        let error = InputError::EventQueueFull(16);
        assert_eq!(classify_error(&error), ErrorClass::ResourceExhausted);

        let error = InputError::InvalidReport("short report".to_string());
        assert_eq!(classify_error(&error), ErrorClass::Transient);

        let error = InputError::Backend("warp failed".to_string());
        assert_eq!(classify_error(&error), ErrorClass::Backend);
    }

    #[test]
    fn test_error_messages() {
        let error = InputError::Unsupported("mouse capture");
        assert_eq!(
            error.to_string(),
            "mouse capture is not supported by the active backend"
        );
        assert!(error.is_unsupported());

        let error = InputError::UnknownKeyCode(0x1FF);
        assert_eq!(error.to_string(), "Unknown native key code: 0x01FF");
    }
}
