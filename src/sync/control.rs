use super::menu::MenuState;
use super::protocol::{ControlCommand, ControlMessage, OffsetCommand, PresentationMessage, ZoomCommand};
use crate::capture::DeviceInfo;
use crate::error::{PipError, Result};
use crate::settings::{SettingsStore, VideoSettings};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Privileged side of the protocol: owns persisted settings
///
/// A single dispatcher handles every command. Notifications and direct
/// commands are persisted and never sent back to the presentation side;
/// everything that needs the presentation side to act ships the full
/// settings document.
pub struct ControlSide {
    store: Arc<dyn SettingsStore>,
    settings: VideoSettings,
    devices: Vec<DeviceInfo>,
    presentation: mpsc::Sender<PresentationMessage>,
    menu: watch::Sender<MenuState>,
}

impl ControlSide {
    pub fn new(
        store: Arc<dyn SettingsStore>,
        presentation: mpsc::Sender<PresentationMessage>,
    ) -> (Self, watch::Receiver<MenuState>) {
        let settings = store.load();
        let (menu, menu_rx) = watch::channel(MenuState::build(&settings, &[]));
        let side = Self {
            store,
            settings,
            devices: Vec::new(),
            presentation,
            menu,
        };
        (side, menu_rx)
    }

    pub fn settings(&self) -> &VideoSettings {
        &self.settings
    }

    pub fn devices(&self) -> &[DeviceInfo] {
        &self.devices
    }

    /// Hand the loaded settings to the presentation side
    pub async fn initialize(&mut self) -> Result<()> {
        info!("Initializing presentation side with persisted settings");
        self.send(PresentationMessage::Initialize(self.settings.clone()))
            .await
    }

    /// Process inbound messages until shutdown or until every sender is gone
    pub async fn run(mut self, mut inbox: mpsc::Receiver<ControlMessage>) -> Result<VideoSettings> {
        self.initialize().await?;

        while let Some(message) = inbox.recv().await {
            match message {
                ControlMessage::Command(command) => {
                    if let Err(e) = self.handle(command).await {
                        warn!("Control command failed: {}", e);
                        if matches!(e, PipError::Channel { .. }) {
                            break;
                        }
                    }
                }
                ControlMessage::GetSettings(reply) => {
                    let _ = reply.send(self.settings.clone());
                }
                ControlMessage::Shutdown => {
                    info!("Control side shutting down");
                    self.store.save(&self.settings);
                    if self.presentation.send(PresentationMessage::Shutdown).await.is_err() {
                        debug!("Presentation side already gone");
                    }
                    break;
                }
            }
        }

        debug!("Control side exited");
        Ok(self.settings)
    }

    /// Dispatch one command
    pub async fn handle(&mut self, command: ControlCommand) -> Result<()> {
        debug!("Handling {} ({:?})", command.name(), command.shape());

        let outbound = match command {
            ControlCommand::SelectDevice(device_id) => {
                let device_id = device_id.trim();
                self.settings.selected_device_id =
                    (!device_id.is_empty()).then(|| device_id.to_string());
                self.persist();
                Some(PresentationMessage::DeviceSelected(self.settings.clone()))
            }
            ControlCommand::ChangeResolution(resolution) => {
                if resolution == self.settings.resolution {
                    debug!("Resolution already {}, not restarting", resolution);
                    None
                } else {
                    self.settings.resolution = resolution;
                    self.persist();
                    Some(PresentationMessage::CaptureSettingsChanged(
                        self.settings.clone(),
                    ))
                }
            }
            ControlCommand::ChangeFrameRate(frame_rate) => {
                if frame_rate == self.settings.frame_rate {
                    debug!("Frame rate already {}, not restarting", frame_rate.label());
                    None
                } else {
                    self.settings.frame_rate = frame_rate;
                    self.persist();
                    Some(PresentationMessage::CaptureSettingsChanged(
                        self.settings.clone(),
                    ))
                }
            }
            ControlCommand::ChangeFlip(mode) => {
                self.settings.flip_mode = mode;
                self.persist();
                Some(PresentationMessage::SettingsChanged(self.settings.clone()))
            }
            ControlCommand::ToggleInfoOverlay => {
                self.settings.show_info_overlay = !self.settings.show_info_overlay;
                self.persist();
                Some(PresentationMessage::SettingsChanged(self.settings.clone()))
            }
            ControlCommand::ToggleAlwaysOnTop => {
                self.settings.always_on_top = !self.settings.always_on_top;
                info!("Always on top: {}", self.settings.always_on_top);
                self.persist();
                None
            }
            ControlCommand::Zoom(ZoomCommand::Nudge(direction)) => {
                Some(PresentationMessage::ZoomNudge(direction))
            }
            ControlCommand::Zoom(ZoomCommand::Set(level)) => {
                self.settings.set_zoom(level);
                self.persist();
                None
            }
            ControlCommand::Offset(OffsetCommand::Nudge(direction)) => {
                Some(PresentationMessage::OffsetNudge(direction))
            }
            ControlCommand::Offset(OffsetCommand::Set { x, y }) => {
                self.settings.set_offset(x, y);
                self.persist();
                None
            }
            ControlCommand::DevicesUpdated(devices) => {
                info!("{} video input device(s) available", devices.len());
                self.devices = devices;
                None
            }
            ControlCommand::DeviceActive(device_id) => {
                if self.settings.selected_device_id.as_deref() != Some(device_id.as_str()) {
                    self.settings.selected_device_id = Some(device_id);
                    self.persist();
                }
                None
            }
            ControlCommand::AutoFlipStateChanged(active) => {
                if self.settings.auto_flip_active != active {
                    self.settings.auto_flip_active = active;
                    self.persist();
                }
                None
            }
        };

        self.publish_menu();

        match outbound {
            Some(message) => self.send(message).await,
            None => Ok(()),
        }
    }

    fn persist(&self) {
        self.store.save(&self.settings);
    }

    fn publish_menu(&self) {
        self.menu
            .send_replace(MenuState::build(&self.settings, &self.devices));
    }

    async fn send(&self, message: PresentationMessage) -> Result<()> {
        self.presentation
            .send(message)
            .await
            .map_err(|_| PipError::channel("presentation side closed"))
    }
}
