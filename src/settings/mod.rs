mod model;
mod store;
#[cfg(test)]
mod tests;

pub use model::{
    clamp_offset, clamp_zoom, round_zoom, FlipMode, FrameRate, Resolution, VideoSettings,
    OFFSET_LIMIT, ZOOM_DEFAULT, ZOOM_MAX, ZOOM_MIN,
};
pub use store::{JsonSettingsStore, MemorySettingsStore, SettingsStore};
