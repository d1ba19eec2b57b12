use super::constraints::VideoConstraints;
use crate::error::CaptureError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A video-input device as reported by enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub device_id: String,
    pub label: String,
}

impl DeviceInfo {
    pub fn new<S: Into<String>>(device_id: S, label: S) -> Self {
        Self {
            device_id: device_id.into(),
            label: label.into(),
        }
    }

    /// Label shown to the user; unnamed devices get a short id-based name
    pub fn display_label(&self) -> String {
        if self.label.trim().is_empty() {
            let short: String = self.device_id.chars().take(8).collect();
            format!("Camera {}", short)
        } else {
            self.label.clone()
        }
    }
}

/// Properties of a live stream once the device has accepted it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    pub device_id: Option<String>,
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub frame_rate: Option<f64>,
}

impl StreamInfo {
    pub fn natural_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn summary(&self) -> String {
        match self.frame_rate {
            Some(fps) => format!("{} {}x{} @ {}fps", self.label, self.width, self.height, fps),
            None => format!("{} {}x{}", self.label, self.width, self.height),
        }
    }
}

/// A live media stream holding a device handle until stopped
pub trait VideoStream: Send + Sync {
    fn info(&self) -> StreamInfo;

    /// Stop every track and release the device; must be idempotent
    fn stop(&mut self);
}

/// Platform capability to open and enumerate capture devices
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    async fn acquire(
        &self,
        constraints: &VideoConstraints,
    ) -> Result<Box<dyn VideoStream>, CaptureError>;

    async fn enumerate_devices(&self) -> Result<Vec<DeviceInfo>, CaptureError>;
}
