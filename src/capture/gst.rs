use super::backend::{CaptureBackend, DeviceInfo, StreamInfo, VideoStream};
use super::constraints::VideoConstraints;
use crate::error::CaptureError;
use async_trait::async_trait;
use gstreamer::prelude::*;
use gstreamer::{ClockTime, CoreError, MessageType, MessageView, Pipeline, ResourceError, StreamError};
use tracing::{debug, info, warn};

/// How long a pipeline may take to reach PLAYING before the start counts as failed
const START_TIMEOUT_SECS: u64 = 5;

/// V4L2 capture through GStreamer
///
/// Device ids are V4L2 device paths such as `/dev/video0`.
pub struct GstCaptureBackend;

impl GstCaptureBackend {
    pub fn new() -> Result<Self, CaptureError> {
        gstreamer::init().map_err(|e| CaptureError::DeviceUnavailable {
            details: format!("Failed to initialize GStreamer: {}", e),
        })?;
        Ok(Self)
    }

    fn pipeline_description(constraints: &VideoConstraints) -> String {
        let mut source = String::from("v4l2src name=src do-timestamp=true");
        if let Some(device) = &constraints.device_id {
            source.push_str(&format!(" device={}", device));
        }

        let mut caps = String::from("video/x-raw");
        if let (Some(width), Some(height)) = (constraints.width, constraints.height) {
            caps.push_str(&format!(",width={},height={}", width, height));
        }
        if let Some(fps) = constraints.frame_rate {
            let (numer, denom) = fraction_for(fps);
            caps.push_str(&format!(",framerate={}/{}", numer, denom));
        }

        format!("{} ! {} ! fakesink sync=false", source, caps)
    }

    fn open(constraints: VideoConstraints) -> Result<GstStream, CaptureError> {
        let description = Self::pipeline_description(&constraints);
        debug!("Creating GStreamer pipeline: {}", description);

        let pipeline = gstreamer::parse::launch(&description)
            .map_err(|e| CaptureError::transient(format!("Failed to create pipeline: {}", e)))?
            .downcast::<Pipeline>()
            .map_err(|_| CaptureError::transient("Failed to downcast to Pipeline"))?;

        let bus = pipeline
            .bus()
            .ok_or_else(|| CaptureError::transient("Pipeline has no bus"))?;

        if let Err(e) = pipeline.set_state(gstreamer::State::Playing) {
            debug!("set_state(Playing) returned {:?}, waiting for bus error", e);
        }

        let message = bus.timed_pop_filtered(
            ClockTime::from_seconds(START_TIMEOUT_SECS),
            &[MessageType::AsyncDone, MessageType::Error],
        );

        let outcome = match message {
            Some(message) => match message.view() {
                MessageView::Error(err) => Err(classify(&err.error())),
                _ => Ok(()),
            },
            None => Err(CaptureError::transient("Timed out waiting for the device")),
        };

        if let Err(e) = outcome {
            let _ = pipeline.set_state(gstreamer::State::Null);
            return Err(e);
        }

        let info = negotiated_info(&pipeline, &constraints);
        info!("GStreamer stream running: {}", info.summary());
        Ok(GstStream {
            pipeline: Some(pipeline),
            info,
        })
    }

    fn list() -> Result<Vec<DeviceInfo>, CaptureError> {
        let monitor = gstreamer::DeviceMonitor::new();
        monitor.add_filter(Some("Video/Source"), None);
        monitor
            .start()
            .map_err(|e| CaptureError::transient(format!("Device monitor failed: {}", e)))?;

        let devices = monitor
            .devices()
            .iter()
            .map(|device| {
                let path = device
                    .properties()
                    .and_then(|props| {
                        props
                            .get::<String>("device.path")
                            .or_else(|_| props.get::<String>("api.v4l2.path"))
                            .ok()
                    })
                    .unwrap_or_default();
                DeviceInfo::new(path, device.display_name().to_string())
            })
            .filter(|device| !device.device_id.is_empty())
            .collect();

        monitor.stop();
        Ok(devices)
    }
}

#[async_trait]
impl CaptureBackend for GstCaptureBackend {
    async fn acquire(
        &self,
        constraints: &VideoConstraints,
    ) -> Result<Box<dyn VideoStream>, CaptureError> {
        let constraints = constraints.clone();
        let stream = tokio::task::spawn_blocking(move || Self::open(constraints))
            .await
            .map_err(|e| CaptureError::transient(format!("Capture task failed: {}", e)))??;
        Ok(Box::new(stream))
    }

    async fn enumerate_devices(&self) -> Result<Vec<DeviceInfo>, CaptureError> {
        tokio::task::spawn_blocking(Self::list)
            .await
            .map_err(|e| CaptureError::transient(format!("Enumeration task failed: {}", e)))?
    }
}

struct GstStream {
    pipeline: Option<Pipeline>,
    info: StreamInfo,
}

impl VideoStream for GstStream {
    fn info(&self) -> StreamInfo {
        self.info.clone()
    }

    fn stop(&mut self) {
        if let Some(pipeline) = self.pipeline.take() {
            if let Err(e) = pipeline.set_state(gstreamer::State::Null) {
                warn!("Failed to stop GStreamer pipeline: {:?}", e);
            }
        }
    }
}

impl Drop for GstStream {
    fn drop(&mut self) {
        self.stop();
    }
}

fn classify(error: &gstreamer::glib::Error) -> CaptureError {
    let details = error.to_string();
    if let Some(kind) = error.kind::<ResourceError>() {
        return match kind {
            ResourceError::NotFound => CaptureError::DeviceUnavailable { details },
            ResourceError::OpenRead | ResourceError::OpenReadWrite | ResourceError::OpenWrite => {
                CaptureError::PermissionDenied { details }
            }
            ResourceError::Busy => CaptureError::DeviceBusy { details },
            ResourceError::Settings => CaptureError::ConstraintsUnsatisfiable { details },
            _ => CaptureError::transient(details),
        };
    }
    if matches!(error.kind::<CoreError>(), Some(CoreError::Negotiation))
        || matches!(error.kind::<StreamError>(), Some(StreamError::Format))
    {
        return CaptureError::ConstraintsUnsatisfiable { details };
    }
    CaptureError::transient(details)
}

fn negotiated_info(pipeline: &Pipeline, constraints: &VideoConstraints) -> StreamInfo {
    let mut info = StreamInfo {
        device_id: constraints.device_id.clone(),
        label: constraints
            .device_id
            .clone()
            .unwrap_or_else(|| "Default camera".to_string()),
        width: constraints.width.unwrap_or(0),
        height: constraints.height.unwrap_or(0),
        frame_rate: constraints.frame_rate,
    };

    let caps = pipeline
        .by_name("src")
        .and_then(|src| src.static_pad("src"))
        .and_then(|pad| pad.current_caps());

    if let Some(structure) = caps.as_ref().and_then(|caps| caps.structure(0)) {
        if let Ok(width) = structure.get::<i32>("width") {
            info.width = width.max(0) as u32;
        }
        if let Ok(height) = structure.get::<i32>("height") {
            info.height = height.max(0) as u32;
        }
        if let Ok(rate) = structure.get::<gstreamer::Fraction>("framerate") {
            if rate.denom() != 0 {
                info.frame_rate = Some(rate.numer() as f64 / rate.denom() as f64);
            }
        }
    }

    info
}

/// NTSC-style rates such as 29.97 are expressed over 1001
fn fraction_for(fps: f64) -> (u32, u32) {
    if (fps - fps.round()).abs() < f64::EPSILON {
        (fps.round() as u32, 1)
    } else {
        ((fps * 1001.0 / 1000.0).round() as u32 * 1000, 1001)
    }
}
