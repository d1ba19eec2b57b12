use super::backend::{CaptureBackend, DeviceInfo, StreamInfo, VideoStream};
use super::constraints::VideoConstraints;
use crate::error::CaptureError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const MOCK_WIDTH: u32 = 1280;
const MOCK_HEIGHT: u32 = 720;
const MOCK_FPS: f64 = 30.0;

/// In-process capture backend used without camera hardware and in tests
///
/// Acquire outcomes are taken from a script queue; once it is empty every
/// acquire succeeds.
pub struct MockCaptureBackend {
    devices: Mutex<Vec<DeviceInfo>>,
    script: Mutex<VecDeque<Result<(), CaptureError>>>,
    enumerate_error: Mutex<Option<CaptureError>>,
    requests: Mutex<Vec<VideoConstraints>>,
    acquire_calls: AtomicUsize,
    open_streams: Arc<AtomicUsize>,
    latency: Option<Duration>,
}

impl MockCaptureBackend {
    pub fn new() -> Self {
        Self::with_devices(vec![DeviceInfo::new("mock-camera-0", "Mock Camera")])
    }

    pub fn with_devices(devices: Vec<DeviceInfo>) -> Self {
        Self {
            devices: Mutex::new(devices),
            script: Mutex::new(VecDeque::new()),
            enumerate_error: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
            acquire_calls: AtomicUsize::new(0),
            open_streams: Arc::new(AtomicUsize::new(0)),
            latency: None,
        }
    }

    /// Delay every acquire, to exercise overlapping starts
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn push_failure(&self, error: CaptureError) {
        self.script.lock().push_back(Err(error));
    }

    pub fn push_success(&self) {
        self.script.lock().push_back(Ok(()));
    }

    pub fn set_devices(&self, devices: Vec<DeviceInfo>) {
        *self.devices.lock() = devices;
    }

    pub fn fail_enumeration(&self, error: CaptureError) {
        *self.enumerate_error.lock() = Some(error);
    }

    pub fn acquire_calls(&self) -> usize {
        self.acquire_calls.load(Ordering::SeqCst)
    }

    /// Streams acquired and not yet stopped
    pub fn open_streams(&self) -> usize {
        self.open_streams.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<VideoConstraints> {
        self.requests.lock().clone()
    }

    fn label_for(&self, device_id: &str) -> String {
        self.devices
            .lock()
            .iter()
            .find(|d| d.device_id == device_id)
            .map(DeviceInfo::display_label)
            .unwrap_or_else(|| "Mock Camera".to_string())
    }
}

impl Default for MockCaptureBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptureBackend for MockCaptureBackend {
    async fn acquire(
        &self,
        constraints: &VideoConstraints,
    ) -> Result<Box<dyn VideoStream>, CaptureError> {
        self.acquire_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(constraints.clone());

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let scripted = self.script.lock().pop_front();
        if let Some(Err(error)) = scripted {
            debug!("Mock acquire failing with: {}", error);
            return Err(error);
        }

        let device_id = match &constraints.device_id {
            Some(id) => {
                if !self.devices.lock().iter().any(|d| &d.device_id == id) {
                    return Err(CaptureError::DeviceUnavailable {
                        details: format!("no mock device with id {}", id),
                    });
                }
                id.clone()
            }
            None => self
                .devices
                .lock()
                .first()
                .map(|d| d.device_id.clone())
                .ok_or_else(|| CaptureError::DeviceUnavailable {
                    details: "no mock devices configured".to_string(),
                })?,
        };

        let info = StreamInfo {
            label: self.label_for(&device_id),
            device_id: Some(device_id),
            width: constraints.width.unwrap_or(MOCK_WIDTH),
            height: constraints.height.unwrap_or(MOCK_HEIGHT),
            frame_rate: Some(constraints.frame_rate.unwrap_or(MOCK_FPS)),
        };

        self.open_streams.fetch_add(1, Ordering::SeqCst);
        debug!("Mock stream opened: {}", info.summary());
        Ok(Box::new(MockStream {
            info,
            open_streams: Arc::clone(&self.open_streams),
            stopped: false,
        }))
    }

    async fn enumerate_devices(&self) -> Result<Vec<DeviceInfo>, CaptureError> {
        if let Some(error) = self.enumerate_error.lock().clone() {
            return Err(error);
        }
        Ok(self.devices.lock().clone())
    }
}

pub struct MockStream {
    info: StreamInfo,
    open_streams: Arc<AtomicUsize>,
    stopped: bool,
}

impl VideoStream for MockStream {
    fn info(&self) -> StreamInfo {
        self.info.clone()
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.open_streams.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for MockStream {
    fn drop(&mut self) {
        self.stop();
    }
}
