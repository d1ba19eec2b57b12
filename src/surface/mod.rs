mod logging;
#[cfg(test)]
pub(crate) mod recording;

pub use logging::LoggingSurface;

use crate::capture::{StreamInfo, VideoStream};
use crate::transform::TransformState;

/// The video element the live stream is rendered into
///
/// Implementations use interior mutability; the capture session manager and
/// the presentation side share one surface.
pub trait PresentationSurface: Send + Sync {
    fn attach(&self, stream: &dyn VideoStream);
    fn detach(&self);

    /// Natural video dimensions, known once a stream is attached
    fn natural_size(&self) -> Option<(u32, u32)>;

    fn apply_transform(&self, transform: &TransformState);
    fn show_error(&self, message: &str);

    /// `None` hides the info overlay
    fn show_info(&self, info: Option<&StreamInfo>);
}
