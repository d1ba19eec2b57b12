use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] toml::de::Error),

    #[error("Settings encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Channel error: {details}")]
    Channel { details: String },

    #[error("System error: {message}")]
    System { message: String },

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },
}

impl PipError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn component<S: Into<String>>(component: S, message: S) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn channel<S: Into<String>>(details: S) -> Self {
        Self::Channel {
            details: details.into(),
        }
    }
}

/// Failures reported by a capture backend when acquiring a stream
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptureError {
    #[error("Capture device not available: {details}")]
    DeviceUnavailable { details: String },

    #[error("Permission denied for capture device: {details}")]
    PermissionDenied { details: String },

    #[error("Capture device busy: {details}")]
    DeviceBusy { details: String },

    #[error("Requested constraints cannot be satisfied: {details}")]
    ConstraintsUnsatisfiable { details: String },

    #[error("Capture failed: {details}")]
    Transient { details: String },
}

/// How the session manager reacts to a capture failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureErrorClass {
    DeviceUnavailable,
    PermissionDenied,
    DeviceBusy,
    ConstraintsUnsatisfiable,
    TransientFailure,
}

impl CaptureError {
    pub fn class(&self) -> CaptureErrorClass {
        match self {
            CaptureError::DeviceUnavailable { .. } => CaptureErrorClass::DeviceUnavailable,
            CaptureError::PermissionDenied { .. } => CaptureErrorClass::PermissionDenied,
            CaptureError::DeviceBusy { .. } => CaptureErrorClass::DeviceBusy,
            CaptureError::ConstraintsUnsatisfiable { .. } => {
                CaptureErrorClass::ConstraintsUnsatisfiable
            }
            CaptureError::Transient { .. } => CaptureErrorClass::TransientFailure,
        }
    }

    /// Retrying cannot change the cause of a terminal failure
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.class(),
            CaptureErrorClass::DeviceUnavailable
                | CaptureErrorClass::PermissionDenied
                | CaptureErrorClass::DeviceBusy
        )
    }

    pub fn user_message(&self) -> String {
        match self {
            CaptureError::DeviceUnavailable { .. } => "Webcam device not found".to_string(),
            CaptureError::PermissionDenied { .. } => {
                "Permission denied to access the webcam".to_string()
            }
            CaptureError::DeviceBusy { .. } => {
                "Webcam is already in use by another application".to_string()
            }
            CaptureError::ConstraintsUnsatisfiable { .. } => {
                "Video settings not supported by the webcam".to_string()
            }
            CaptureError::Transient { details } => format!("Webcam error: {}", details),
        }
    }

    pub fn transient<S: Into<String>>(details: S) -> Self {
        Self::Transient {
            details: details.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_classes() {
        let unavailable = CaptureError::DeviceUnavailable {
            details: "gone".to_string(),
        };
        let busy = CaptureError::DeviceBusy {
            details: "held".to_string(),
        };
        let overconstrained = CaptureError::ConstraintsUnsatisfiable {
            details: "4k".to_string(),
        };

        assert!(unavailable.is_terminal());
        assert!(busy.is_terminal());
        assert!(!overconstrained.is_terminal());
        assert!(!CaptureError::transient("glitch").is_terminal());
        assert_eq!(
            overconstrained.class(),
            CaptureErrorClass::ConstraintsUnsatisfiable
        );
    }

    #[test]
    fn test_capture_error_converts_into_pip_error() {
        let err: PipError = CaptureError::transient("timeout").into();
        assert!(matches!(err, PipError::Capture(CaptureError::Transient { .. })));
        assert!(err.to_string().contains("timeout"));
    }
}
