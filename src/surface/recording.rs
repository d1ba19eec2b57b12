use super::PresentationSurface;
use crate::capture::{StreamInfo, VideoStream};
use crate::transform::TransformState;
use parking_lot::Mutex;

/// Surface that records every call for assertions
#[derive(Default)]
pub struct RecordingSurface {
    pub attached: Mutex<Option<StreamInfo>>,
    pub attach_count: Mutex<usize>,
    pub transforms: Mutex<Vec<TransformState>>,
    pub errors: Mutex<Vec<String>>,
    pub info: Mutex<Vec<Option<StreamInfo>>>,
}

impl RecordingSurface {
    pub fn last_transform(&self) -> Option<TransformState> {
        self.transforms.lock().last().copied()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().clone()
    }

    pub fn is_attached(&self) -> bool {
        self.attached.lock().is_some()
    }
}

impl PresentationSurface for RecordingSurface {
    fn attach(&self, stream: &dyn VideoStream) {
        *self.attached.lock() = Some(stream.info());
        *self.attach_count.lock() += 1;
    }

    fn detach(&self) {
        *self.attached.lock() = None;
    }

    fn natural_size(&self) -> Option<(u32, u32)> {
        self.attached.lock().as_ref().map(StreamInfo::natural_size)
    }

    fn apply_transform(&self, transform: &TransformState) {
        self.transforms.lock().push(*transform);
    }

    fn show_error(&self, message: &str) {
        self.errors.lock().push(message.to_string());
    }

    fn show_info(&self, info: Option<&StreamInfo>) {
        self.info.lock().push(info.cloned());
    }
}
