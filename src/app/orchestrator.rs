use super::types::{ComponentState, ShutdownReason};
use crate::capture::CaptureBackend;
use crate::config::PipConfig;
use crate::control::KeyboardControl;
use crate::error::{PipError, Result};
use crate::settings::{SettingsStore, VideoSettings};
use crate::surface::PresentationSurface;
use crate::sync::{ControlMessage, MenuState, PresentationMessage, SurfaceEvent};
use crate::transform::{GeometrySample, ScreenGeometry, WatchGeometrySource, WindowGeometry};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Wires the control side, the presentation side and the keyboard surface
pub struct PipOrchestrator {
    pub(super) config: PipConfig,
    pub(super) backend: Arc<dyn CaptureBackend>,
    pub(super) surface: Arc<dyn PresentationSurface>,
    pub(super) store: Arc<dyn SettingsStore>,

    // Channels
    pub(super) control_tx: mpsc::Sender<ControlMessage>,
    pub(super) control_rx: Option<mpsc::Receiver<ControlMessage>>,
    pub(super) presentation_tx: mpsc::Sender<PresentationMessage>,
    pub(super) presentation_rx: Option<mpsc::Receiver<PresentationMessage>>,
    pub(super) surface_events_tx: mpsc::Sender<SurfaceEvent>,
    pub(super) surface_events_rx: Option<mpsc::Receiver<SurfaceEvent>>,
    pub(super) geometry_tx: watch::Sender<Option<GeometrySample>>,
    pub(super) geometry: Arc<WatchGeometrySource>,
    pub(super) menu_rx: Option<watch::Receiver<MenuState>>,

    // Components
    pub(super) control_task: Option<JoinHandle<Result<VideoSettings>>>,
    pub(super) presentation_task: Option<JoinHandle<()>>,
    pub(super) keyboard: Option<KeyboardControl>,
    pub(super) keyboard_enabled: bool,

    // Lifecycle management
    pub(super) component_states: Arc<Mutex<HashMap<String, ComponentState>>>,
    pub(super) shutdown_sender: Arc<Mutex<Option<oneshot::Sender<ShutdownReason>>>>,
    pub(super) shutdown_receiver: Option<oneshot::Receiver<ShutdownReason>>,
    pub(super) quit_token: CancellationToken,
    pub(super) cancellation_token: CancellationToken,
}

impl PipOrchestrator {
    pub fn new(
        config: PipConfig,
        backend: Arc<dyn CaptureBackend>,
        surface: Arc<dyn PresentationSurface>,
        store: Arc<dyn SettingsStore>,
    ) -> Self {
        let capacity = config.system.channel_capacity;
        let (control_tx, control_rx) = mpsc::channel(capacity);
        let (presentation_tx, presentation_rx) = mpsc::channel(capacity);
        let (surface_events_tx, surface_events_rx) = mpsc::channel(capacity);
        let (geometry_tx, geometry) = WatchGeometrySource::new(Some(initial_geometry(&config)));
        let (shutdown_sender, shutdown_receiver) = oneshot::channel();
        let keyboard_enabled = config.control.keyboard;

        Self {
            config,
            backend,
            surface,
            store,
            control_tx,
            control_rx: Some(control_rx),
            presentation_tx,
            presentation_rx: Some(presentation_rx),
            surface_events_tx,
            surface_events_rx: Some(surface_events_rx),
            geometry_tx,
            geometry: Arc::new(geometry),
            menu_rx: None,
            control_task: None,
            presentation_task: None,
            keyboard: None,
            keyboard_enabled,
            component_states: Arc::new(Mutex::new(HashMap::new())),
            shutdown_sender: Arc::new(Mutex::new(Some(shutdown_sender))),
            shutdown_receiver: Some(shutdown_receiver),
            quit_token: CancellationToken::new(),
            cancellation_token: CancellationToken::new(),
        }
    }

    pub fn set_keyboard_enabled(&mut self, enabled: bool) {
        self.keyboard_enabled = enabled;
    }

    pub fn config(&self) -> &PipConfig {
        &self.config
    }

    /// Sender for commands from any control surface
    pub fn control_handle(&self) -> mpsc::Sender<ControlMessage> {
        self.control_tx.clone()
    }

    /// Sender for focus, visibility, resize and gesture events of the window
    pub fn surface_events(&self) -> mpsc::Sender<SurfaceEvent> {
        self.surface_events_tx.clone()
    }

    /// Publish a new window/screen measurement, or `None` when unavailable
    pub fn publish_geometry(&self, sample: Option<GeometrySample>) {
        self.geometry_tx.send_replace(sample);
    }

    /// Menu model, available once started
    pub fn menu(&self) -> Option<watch::Receiver<MenuState>> {
        self.menu_rx.clone()
    }

    /// Current persisted settings as held by the control side
    pub async fn settings_snapshot(&self) -> Result<VideoSettings> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.control_tx
            .send(ControlMessage::GetSettings(reply_tx))
            .await
            .map_err(|_| PipError::channel("control side closed"))?;
        reply_rx
            .await
            .map_err(|_| PipError::channel("control side dropped the settings request"))
    }

    /// Ask `run` to shut down; later requests are ignored
    pub async fn request_shutdown(&self, reason: ShutdownReason) {
        if let Some(sender) = self.shutdown_sender.lock().await.take() {
            info!("Shutdown requested: {:?}", reason);
            let _ = sender.send(reason);
        }
    }
}

fn initial_geometry(config: &PipConfig) -> GeometrySample {
    GeometrySample {
        window: WindowGeometry {
            x: config.window.x,
            y: config.window.y,
            width: config.window.width,
            height: config.window.height,
        },
        screen: ScreenGeometry {
            x: 0,
            width: config.window.screen_width,
        },
    }
}
