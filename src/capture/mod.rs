mod backend;
mod constraints;
mod mock;
mod recovery;
mod session;

#[cfg(all(feature = "gstreamer", target_os = "linux"))]
mod gst;

#[cfg(test)]
mod tests;

pub use backend::{CaptureBackend, DeviceInfo, StreamInfo, VideoStream};
pub use constraints::VideoConstraints;
pub use mock::{MockCaptureBackend, MockStream};
pub use recovery::{CaptureRecovery, RecoveryAction};
pub use session::{CaptureSessionManager, StartOutcome};

#[cfg(all(feature = "gstreamer", target_os = "linux"))]
pub use gst::GstCaptureBackend;
