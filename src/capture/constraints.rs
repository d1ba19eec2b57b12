use crate::config::CaptureConfig;
use crate::settings::VideoSettings;
use std::fmt;

/// Requested stream properties; `None` fields are left to the device
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VideoConstraints {
    /// Exact device match when present
    pub device_id: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub frame_rate: Option<f64>,
}

impl VideoConstraints {
    /// Derive constraints from persisted settings, omitting `default` choices
    pub fn from_settings(device_id: Option<&str>, settings: &VideoSettings) -> Self {
        let (width, height) = match settings.resolution.dimensions() {
            Some((w, h)) => (Some(w), Some(h)),
            None => (None, None),
        };

        Self {
            device_id: normalize_device_id(device_id),
            width,
            height,
            frame_rate: settings.frame_rate.value(),
        }
    }

    /// Widely supported constraints used when the requested ones are rejected
    pub fn fallback(device_id: Option<&str>, config: &CaptureConfig) -> Self {
        Self {
            device_id: normalize_device_id(device_id),
            width: Some(config.fallback_width),
            height: Some(config.fallback_height),
            frame_rate: Some(config.fallback_fps as f64),
        }
    }
}

fn normalize_device_id(device_id: Option<&str>) -> Option<String> {
    device_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

impl fmt::Display for VideoConstraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.device_id {
            Some(id) => write!(f, "device={}", id)?,
            None => write!(f, "device=default")?,
        }
        if let (Some(w), Some(h)) = (self.width, self.height) {
            write!(f, " {}x{}", w, h)?;
        }
        if let Some(fps) = self.frame_rate {
            write!(f, " @{}fps", fps)?;
        }
        Ok(())
    }
}
