use crate::capture::DeviceInfo;
use crate::settings::{FlipMode, FrameRate, Resolution, VideoSettings};
use crate::transform::{OffsetDirection, ZoomDirection};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

/// Zoom intent: resolved by the receiver, or an already-resolved level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoomCommand {
    Nudge(ZoomDirection),
    Set(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetCommand {
    Nudge(OffsetDirection),
    Set { x: i32, y: i32 },
}

/// How a receiver treats a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandShape {
    /// Carries an intent resolved against the receiver's current value
    Directional,
    /// Carries the final value
    Direct,
    /// Reports a change that has already been applied; persisted, never echoed
    Notification,
}

/// The closed command vocabulary accepted by the control side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ControlCommand {
    SelectDevice(String),
    ChangeResolution(Resolution),
    ChangeFrameRate(FrameRate),
    /// Direct value; never restarts capture
    ChangeFlip(FlipMode),
    ToggleInfoOverlay,
    ToggleAlwaysOnTop,
    Zoom(ZoomCommand),
    Offset(OffsetCommand),
    DevicesUpdated(Vec<DeviceInfo>),
    DeviceActive(String),
    AutoFlipStateChanged(bool),
}

impl ControlCommand {
    pub fn shape(&self) -> CommandShape {
        match self {
            ControlCommand::DevicesUpdated(_)
            | ControlCommand::DeviceActive(_)
            | ControlCommand::AutoFlipStateChanged(_) => CommandShape::Notification,
            ControlCommand::ToggleInfoOverlay
            | ControlCommand::ToggleAlwaysOnTop
            | ControlCommand::Zoom(ZoomCommand::Nudge(_))
            | ControlCommand::Offset(OffsetCommand::Nudge(_)) => CommandShape::Directional,
            ControlCommand::SelectDevice(_)
            | ControlCommand::ChangeResolution(_)
            | ControlCommand::ChangeFrameRate(_)
            | ControlCommand::ChangeFlip(_)
            | ControlCommand::Zoom(ZoomCommand::Set(_))
            | ControlCommand::Offset(OffsetCommand::Set { .. }) => CommandShape::Direct,
        }
    }

    pub fn is_notification(&self) -> bool {
        self.shape() == CommandShape::Notification
    }

    pub fn name(&self) -> &'static str {
        match self {
            ControlCommand::SelectDevice(_) => "select-device",
            ControlCommand::ChangeResolution(_) => "change-resolution",
            ControlCommand::ChangeFrameRate(_) => "change-fps",
            ControlCommand::ChangeFlip(_) => "change-flip",
            ControlCommand::ToggleInfoOverlay => "toggle-info-overlay",
            ControlCommand::ToggleAlwaysOnTop => "toggle-always-on-top",
            ControlCommand::Zoom(ZoomCommand::Nudge(_)) => "zoom-nudge",
            ControlCommand::Zoom(ZoomCommand::Set(_)) => "zoom-set",
            ControlCommand::Offset(OffsetCommand::Nudge(_)) => "offset-nudge",
            ControlCommand::Offset(OffsetCommand::Set { .. }) => "offset-set",
            ControlCommand::DevicesUpdated(_) => "devices-updated",
            ControlCommand::DeviceActive(_) => "device-active",
            ControlCommand::AutoFlipStateChanged(_) => "auto-flip-state-changed",
        }
    }
}

/// Envelope on the control side's inbound channel
#[derive(Debug)]
pub enum ControlMessage {
    Command(ControlCommand),
    /// Current persisted settings, for callers outside the protocol
    GetSettings(oneshot::Sender<VideoSettings>),
    /// Write final settings, tell the presentation side to stop, then exit
    Shutdown,
}

impl From<ControlCommand> for ControlMessage {
    fn from(command: ControlCommand) -> Self {
        ControlMessage::Command(command)
    }
}

/// Messages from the control side to the presentation side
///
/// Every settings-bearing variant carries the full settings document, and the
/// presentation side reconciles against it instead of applying a delta.
#[derive(Debug, Clone, PartialEq)]
pub enum PresentationMessage {
    /// Startup: adopt every value, including zoom and offset, and start capture
    Initialize(VideoSettings),
    /// Start a fresh capture sequence on `selected_device_id`
    DeviceSelected(VideoSettings),
    /// Resolution or frame rate changed; restart on the active device
    CaptureSettingsChanged(VideoSettings),
    /// Presentation-only change (flip mode, info overlay)
    SettingsChanged(VideoSettings),
    ZoomNudge(ZoomDirection),
    OffsetNudge(OffsetDirection),
    Shutdown,
}

/// Events raised by the window hosting the video surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceEvent {
    /// Window gained focus; auto-flip resolves without debounce
    Focused,
    /// Window became visible again; auto-flip resolves without debounce
    VisibilityRestored,
    Resized,
    /// Local zoom gesture (wheel or pinch)
    Zoom(ZoomDirection),
    /// Local drag, in surface pixels
    Pan { dx: i32, dy: i32 },
}
