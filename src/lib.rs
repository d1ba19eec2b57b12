pub mod app;
pub mod capture;
pub mod config;
pub mod control;
pub mod error;
pub mod settings;
pub mod surface;
pub mod sync;
pub mod transform;

pub use app::{ComponentState, PipOrchestrator, ShutdownReason};
pub use capture::{
    CaptureBackend, CaptureSessionManager, DeviceInfo, MockCaptureBackend, StartOutcome,
    StreamInfo, VideoConstraints, VideoStream,
};
pub use config::PipConfig;
pub use error::{CaptureError, CaptureErrorClass, PipError, Result};
pub use settings::{FlipMode, FrameRate, JsonSettingsStore, Resolution, SettingsStore, VideoSettings};
pub use surface::{LoggingSurface, PresentationSurface};
pub use sync::{ControlCommand, ControlMessage, MenuState, PresentationMessage, SurfaceEvent};
pub use transform::{AutoFlipState, EffectiveFlip, TransformState};

#[cfg(all(feature = "gstreamer", target_os = "linux"))]
pub use capture::GstCaptureBackend;
