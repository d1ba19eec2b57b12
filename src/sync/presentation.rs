use super::protocol::{
    ControlCommand, ControlMessage, OffsetCommand, PresentationMessage, SurfaceEvent, ZoomCommand,
};
use crate::capture::{CaptureBackend, CaptureSessionManager, DeviceInfo, StartOutcome};
use crate::config::PipConfig;
use crate::error::CaptureErrorClass;
use crate::settings::{clamp_offset, FlipMode, VideoSettings};
use crate::surface::PresentationSurface;
use crate::transform::{
    nudge_offset, nudge_zoom, AutoFlipController, AutoFlipState, EffectiveFlip, FlipTimerFired,
    GeometrySource, HysteresisBand, OffsetDirection, TransformState, ZoomDirection,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

enum Step {
    Message(Option<PresentationMessage>),
    Surface(SurfaceEvent),
    Sample,
    FlipTimer(FlipTimerFired),
    CaptureDone(StartOutcome),
}

/// Side of the protocol that owns the live stream and renders the transform
///
/// Zoom and offset are owned here once initialized: nudges are resolved
/// against the local values and the results reported to the control side as
/// direct commands.
pub struct PresentationSide {
    session: CaptureSessionManager,
    surface: Arc<dyn PresentationSurface>,
    geometry: Arc<dyn GeometrySource>,
    control: mpsc::Sender<ControlMessage>,
    settings: VideoSettings,
    zoom_level: f64,
    offset: (i32, i32),
    transform: TransformState,
    auto_flip: AutoFlipController,
    flip_timer_rx: mpsc::UnboundedReceiver<FlipTimerFired>,
    starts: JoinSet<StartOutcome>,
    zoom_step: f64,
    offset_step: i32,
    sample_interval: Duration,
    enumeration_retry_delay: Duration,
    fallback_surface_size: (u32, u32),
}

impl PresentationSide {
    pub fn new(
        config: &PipConfig,
        session: CaptureSessionManager,
        surface: Arc<dyn PresentationSurface>,
        geometry: Arc<dyn GeometrySource>,
        control: mpsc::Sender<ControlMessage>,
    ) -> Self {
        let (flip_timer_tx, flip_timer_rx) = mpsc::unbounded_channel();
        let band = HysteresisBand {
            activation: config.auto_flip.activation_threshold,
            deactivation: config.auto_flip.deactivation_threshold,
        };

        Self {
            session,
            surface,
            geometry,
            control,
            settings: VideoSettings::default(),
            zoom_level: 1.0,
            offset: (0, 0),
            transform: TransformState::default(),
            auto_flip: AutoFlipController::new(
                band,
                AutoFlipState::Inactive,
                config.auto_flip.debounce(),
                flip_timer_tx,
            ),
            flip_timer_rx,
            starts: JoinSet::new(),
            zoom_step: config.transform.zoom_step,
            offset_step: config.transform.offset_step,
            sample_interval: config.auto_flip.sample_interval(),
            enumeration_retry_delay: config.capture.retry_delay(),
            fallback_surface_size: (config.window.width, config.window.height),
        }
    }

    pub fn transform(&self) -> TransformState {
        self.transform
    }

    pub fn auto_flip_state(&self) -> AutoFlipState {
        self.auto_flip.state()
    }

    /// Run until `Shutdown` or until the control side hangs up
    pub async fn run(
        mut self,
        mut inbox: mpsc::Receiver<PresentationMessage>,
        mut events: mpsc::Receiver<SurfaceEvent>,
    ) {
        let mut sampler = interval(self.sample_interval);
        sampler.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let step = tokio::select! {
                message = inbox.recv() => Step::Message(message),
                Some(event) = events.recv() => Step::Surface(event),
                _ = sampler.tick() => Step::Sample,
                Some(fired) = self.flip_timer_rx.recv() => Step::FlipTimer(fired),
                Some(joined) = self.starts.join_next() => match joined {
                    Ok(outcome) => Step::CaptureDone(outcome),
                    Err(e) => {
                        warn!("Capture start task failed: {}", e);
                        continue;
                    }
                },
            };

            match step {
                Step::Message(None) | Step::Message(Some(PresentationMessage::Shutdown)) => break,
                Step::Message(Some(message)) => self.handle_message(message),
                Step::Surface(event) => self.handle_surface_event(event),
                Step::Sample => self.sample_position(),
                Step::FlipTimer(fired) => self.flip_timer_fired(fired),
                Step::CaptureDone(outcome) => self.capture_finished(outcome),
            }
        }

        self.shutdown().await;
    }

    pub fn handle_message(&mut self, message: PresentationMessage) {
        match message {
            PresentationMessage::Initialize(settings) => {
                let settings = settings.clamped();
                self.zoom_level = settings.zoom_level;
                self.offset = (settings.offset_x, settings.offset_y);
                self.auto_flip
                    .restore(AutoFlipState::from_active(settings.auto_flip_active));
                let device_id = settings.selected_device_id.clone();
                self.settings = settings;
                self.render();
                self.spawn_start(device_id);
            }
            PresentationMessage::DeviceSelected(settings) => {
                let device_id = settings.selected_device_id.clone();
                self.adopt(settings);
                self.spawn_start(device_id);
            }
            PresentationMessage::CaptureSettingsChanged(settings) => {
                self.adopt(settings);
                self.spawn_restart();
            }
            PresentationMessage::SettingsChanged(settings) => {
                let capture_drift = settings.resolution != self.settings.resolution
                    || settings.frame_rate != self.settings.frame_rate;
                self.adopt(settings);
                if capture_drift {
                    debug!("Capture settings drifted, restarting");
                    self.spawn_restart();
                }
            }
            PresentationMessage::ZoomNudge(direction) => self.nudge_zoom(direction),
            PresentationMessage::OffsetNudge(direction) => self.nudge_offset(direction),
            PresentationMessage::Shutdown => {}
        }
    }

    pub fn handle_surface_event(&mut self, event: SurfaceEvent) {
        match event {
            SurfaceEvent::Focused | SurfaceEvent::VisibilityRestored => {
                if self.settings.flip_mode == FlipMode::Auto {
                    let p = self.position();
                    if let Some(state) = self.auto_flip.resolve_now(p) {
                        self.auto_flip_changed(state);
                    }
                }
                self.render();
            }
            SurfaceEvent::Resized => self.render(),
            SurfaceEvent::Zoom(direction) => self.nudge_zoom(direction),
            SurfaceEvent::Pan { dx, dy } => {
                self.offset = (
                    clamp_offset(self.offset.0.saturating_add(dx)),
                    clamp_offset(self.offset.1.saturating_add(dy)),
                );
                self.render();
                self.report_offset();
            }
        }
    }

    /// Periodic position sample; only meaningful in auto mode
    pub fn sample_position(&mut self) {
        if self.settings.flip_mode != FlipMode::Auto {
            return;
        }
        let p = self.position();
        trace!("Window position sample: {:?}", p);
        self.auto_flip.sample(p);
        self.render();
    }

    pub fn flip_timer_fired(&mut self, fired: FlipTimerFired) {
        let p = self.position();
        if let Some(state) = self.auto_flip.timer_fired(fired, p) {
            self.auto_flip_changed(state);
        }
    }

    pub fn capture_finished(&mut self, outcome: StartOutcome) {
        match &outcome {
            StartOutcome::Started(info) | StartOutcome::StartedWithFallback(info) => {
                if let Some(device_id) = &info.device_id {
                    self.settings.selected_device_id = Some(device_id.clone());
                    self.report(ControlCommand::DeviceActive(device_id.clone()));
                }
                // Natural dimensions are known now
                self.render();
                if self.settings.show_info_overlay {
                    self.surface.show_info(Some(info));
                }
            }
            StartOutcome::Failed(error) => {
                debug!("Capture start failed: {}", error);
            }
            StartOutcome::Superseded => return,
        }
        self.spawn_enumeration();
    }

    /// Take a new settings document, keeping the local zoom and offset
    fn adopt(&mut self, settings: VideoSettings) {
        let previous = std::mem::replace(&mut self.settings, settings);

        if self.settings.flip_mode == FlipMode::Auto {
            if previous.flip_mode != FlipMode::Auto {
                info!("Entering auto flip mode");
                self.auto_flip
                    .restore(AutoFlipState::from_active(self.settings.auto_flip_active));
            }
        } else {
            self.auto_flip.cancel_timer();
        }

        if previous.show_info_overlay != self.settings.show_info_overlay {
            self.refresh_info_overlay();
        }

        self.render();
    }

    fn nudge_zoom(&mut self, direction: ZoomDirection) {
        self.zoom_level = nudge_zoom(self.zoom_level, direction, self.zoom_step);
        self.render();
        self.report(ControlCommand::Zoom(ZoomCommand::Set(self.zoom_level)));
    }

    fn nudge_offset(&mut self, direction: OffsetDirection) {
        self.offset = nudge_offset(self.offset, direction, self.offset_step);
        self.render();
        self.report_offset();
    }

    fn report_offset(&self) {
        let (x, y) = self.offset;
        self.report(ControlCommand::Offset(OffsetCommand::Set { x, y }));
    }

    fn auto_flip_changed(&mut self, state: AutoFlipState) {
        self.settings.auto_flip_active = state.is_active();
        self.render();
        self.report(ControlCommand::AutoFlipStateChanged(state.is_active()));
    }

    fn refresh_info_overlay(&self) {
        let session = self.session.clone();
        let surface = Arc::clone(&self.surface);
        if self.settings.show_info_overlay {
            tokio::spawn(async move {
                let info = session.active_stream_info().await;
                surface.show_info(info.as_ref());
            });
        } else {
            surface.show_info(None);
        }
    }

    fn position(&self) -> Option<f64> {
        self.geometry
            .sample()
            .and_then(|sample| sample.horizontal_fraction())
    }

    fn surface_size(&self) -> (u32, u32) {
        self.geometry
            .sample()
            .map(|sample| sample.surface_size())
            .unwrap_or(self.fallback_surface_size)
    }

    fn render(&mut self) {
        let flip = EffectiveFlip::resolve(
            self.settings.flip_mode,
            self.auto_flip.state().is_active(),
        );
        self.transform = TransformState::compose(
            self.offset,
            self.zoom_level,
            flip,
            self.surface_size(),
            self.surface.natural_size(),
        );
        self.surface.apply_transform(&self.transform);
    }

    fn spawn_start(&mut self, device_id: Option<String>) {
        let session = self.session.clone();
        let settings = self.settings.clone();
        self.starts
            .spawn(async move { session.start(device_id, &settings).await });
    }

    fn spawn_restart(&mut self) {
        let session = self.session.clone();
        let settings = self.settings.clone();
        self.starts
            .spawn(async move { session.restart(&settings).await });
    }

    fn spawn_enumeration(&self) {
        let backend = self.session.backend();
        let control = self.control.clone();
        let retry_delay = self.enumeration_retry_delay;
        tokio::spawn(async move {
            if let Some(devices) = enumerate_devices(backend.as_ref(), retry_delay).await {
                let report = ControlMessage::Command(ControlCommand::DevicesUpdated(devices));
                if control.send(report).await.is_err() {
                    debug!("Control side gone, dropping device list");
                }
            }
        });
    }

    fn report(&self, command: ControlCommand) {
        let name = command.name();
        debug!("Reporting {}", name);
        if let Err(e) = self.control.try_send(ControlMessage::Command(command)) {
            warn!("Dropped {} report: {}", name, e);
        }
    }

    async fn shutdown(&mut self) {
        info!("Presentation side shutting down");
        self.auto_flip.cancel_timer();
        self.starts.abort_all();
        self.session.stop().await;
    }
}

/// Enumerate video inputs with the labels shown to the user
///
/// Permission failures report an empty list; other failures are retried once.
pub async fn enumerate_devices(
    backend: &dyn CaptureBackend,
    retry_delay: Duration,
) -> Option<Vec<DeviceInfo>> {
    let mut retried = false;
    loop {
        match backend.enumerate_devices().await {
            Ok(devices) => {
                return Some(
                    devices
                        .into_iter()
                        .map(|device| {
                            let label = device.display_label();
                            DeviceInfo::new(device.device_id, label)
                        })
                        .collect(),
                );
            }
            Err(e) if e.class() == CaptureErrorClass::PermissionDenied => {
                warn!("Device enumeration not permitted: {}", e);
                return Some(Vec::new());
            }
            Err(e) if !retried => {
                warn!("Device enumeration failed ({}), retrying in {:?}", e, retry_delay);
                retried = true;
                tokio::time::sleep(retry_delay).await;
            }
            Err(e) => {
                warn!("Device enumeration failed again, giving up: {}", e);
                return None;
            }
        }
    }
}
