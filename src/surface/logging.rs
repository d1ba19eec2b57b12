use super::PresentationSurface;
use crate::capture::{StreamInfo, VideoStream};
use crate::transform::TransformState;
use parking_lot::Mutex;
use tracing::{debug, error, info};

#[derive(Default)]
struct SurfaceState {
    attached: Option<StreamInfo>,
    transform: Option<TransformState>,
}

/// Headless surface that renders state changes to the log
#[derive(Default)]
pub struct LoggingSurface {
    state: Mutex<SurfaceState>,
}

impl LoggingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_transform(&self) -> Option<TransformState> {
        self.state.lock().transform
    }
}

impl PresentationSurface for LoggingSurface {
    fn attach(&self, stream: &dyn VideoStream) {
        let info = stream.info();
        info!("Surface attached to stream: {}", info.summary());
        self.state.lock().attached = Some(info);
    }

    fn detach(&self) {
        if self.state.lock().attached.take().is_some() {
            debug!("Surface detached");
        }
    }

    fn natural_size(&self) -> Option<(u32, u32)> {
        self.state.lock().attached.as_ref().map(StreamInfo::natural_size)
    }

    fn apply_transform(&self, transform: &TransformState) {
        let mut state = self.state.lock();
        if state.transform.as_ref() != Some(transform) {
            info!("Transform: {}", transform);
            state.transform = Some(*transform);
        }
    }

    fn show_error(&self, message: &str) {
        error!("{}", message);
    }

    fn show_info(&self, info: Option<&StreamInfo>) {
        match info {
            Some(info) => info!("Stream info: {}", info.summary()),
            None => debug!("Stream info hidden"),
        }
    }
}
