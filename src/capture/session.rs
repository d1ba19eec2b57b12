use super::backend::{CaptureBackend, StreamInfo, VideoStream};
use super::constraints::VideoConstraints;
use super::recovery::{CaptureRecovery, RecoveryAction};
use crate::config::CaptureConfig;
use crate::error::CaptureError;
use crate::settings::VideoSettings;
use crate::surface::PresentationSurface;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use uuid::Uuid;

const EXHAUSTED_MESSAGE: &str = "Unable to connect to the webcam after several attempts";

/// Result of one start request
#[derive(Debug, Clone, PartialEq)]
pub enum StartOutcome {
    Started(StreamInfo),
    /// Started only after falling back to conservative constraints
    StartedWithFallback(StreamInfo),
    /// Gave up; the error has been surfaced to the user
    Failed(CaptureError),
    /// A later start or stop took over before this one completed
    Superseded,
}

impl StartOutcome {
    pub fn stream_info(&self) -> Option<&StreamInfo> {
        match self {
            StartOutcome::Started(info) | StartOutcome::StartedWithFallback(info) => Some(info),
            _ => None,
        }
    }
}

struct ActiveSession {
    id: Uuid,
    device_id: Option<String>,
    stream: Box<dyn VideoStream>,
}

#[derive(Default)]
struct SessionState {
    active: Option<ActiveSession>,
    retry_count: u32,
}

/// Owns at most one live capture stream attached to the presentation surface
///
/// Start and stop are serialized through an async mutex held across the
/// release-then-acquire step. Retry delays are slept outside the lock so they
/// only hold up their own sequence. Every start or stop bumps a generation
/// counter; a sequence that finds itself outdated discards its result.
#[derive(Clone)]
pub struct CaptureSessionManager {
    backend: Arc<dyn CaptureBackend>,
    surface: Arc<dyn PresentationSurface>,
    config: CaptureConfig,
    state: Arc<Mutex<SessionState>>,
    generation: Arc<AtomicU64>,
    requested_device: Arc<parking_lot::Mutex<Option<String>>>,
}

impl CaptureSessionManager {
    pub fn new(
        backend: Arc<dyn CaptureBackend>,
        surface: Arc<dyn PresentationSurface>,
        config: CaptureConfig,
    ) -> Self {
        Self {
            backend,
            surface,
            config,
            state: Arc::new(Mutex::new(SessionState::default())),
            generation: Arc::new(AtomicU64::new(0)),
            requested_device: Arc::new(parking_lot::Mutex::new(None)),
        }
    }

    pub fn backend(&self) -> Arc<dyn CaptureBackend> {
        Arc::clone(&self.backend)
    }

    /// Start a session, replacing any active one
    pub async fn start(&self, device_id: Option<String>, settings: &VideoSettings) -> StartOutcome {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.requested_device.lock() = device_id.clone();
        self.state.lock().await.retry_count = 0;

        info!(
            "Starting capture session on {}",
            device_id.as_deref().unwrap_or("default device")
        );

        let mut recovery = CaptureRecovery::new(&self.config);

        loop {
            recovery.record_attempt();
            let constraints = VideoConstraints::from_settings(device_id.as_deref(), settings);

            let failure = match self.attempt(generation, &constraints).await {
                Ok(Some(info)) => return StartOutcome::Started(info),
                Ok(None) => return StartOutcome::Superseded,
                Err(e) => e,
            };

            let mut action = recovery.handle_failure(&failure);
            if action == RecoveryAction::Fallback {
                let fallback = VideoConstraints::fallback(device_id.as_deref(), &self.config);
                action = match self.attempt(generation, &fallback).await {
                    Ok(Some(info)) => {
                        info!("Capture started with fallback constraints ({})", fallback);
                        return StartOutcome::StartedWithFallback(info);
                    }
                    Ok(None) => return StartOutcome::Superseded,
                    Err(e) => recovery.handle_fallback_failure(&e),
                };
            }

            match action {
                RecoveryAction::RetryAfterDelay(delay) => {
                    self.state.lock().await.retry_count = recovery.retries();
                    sleep(delay).await;
                    if self.is_superseded(generation) {
                        debug!("Retry sequence superseded, abandoning");
                        return StartOutcome::Superseded;
                    }
                }
                RecoveryAction::Surface(error) => {
                    if !self.is_superseded(generation) {
                        self.surface.show_error(&error.user_message());
                    }
                    return StartOutcome::Failed(error);
                }
                RecoveryAction::GiveUp(error) => {
                    if !self.is_superseded(generation) {
                        self.surface.show_error(EXHAUSTED_MESSAGE);
                    }
                    return StartOutcome::Failed(error);
                }
                RecoveryAction::Fallback => {
                    // handle_fallback_failure never asks for a second fallback
                    return StartOutcome::Failed(failure);
                }
            }
        }
    }

    /// Restart with the currently active (or last requested) device
    pub async fn restart(&self, settings: &VideoSettings) -> StartOutcome {
        let device_id = self.active_device_id().await;
        self.start(device_id, settings).await
    }

    /// Stop the active session, if any; safe to call repeatedly
    pub async fn stop(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().await;
        self.release(&mut state);
    }

    pub async fn is_active(&self) -> bool {
        self.state.lock().await.active.is_some()
    }

    pub async fn active_stream_info(&self) -> Option<StreamInfo> {
        self.state
            .lock()
            .await
            .active
            .as_ref()
            .map(|session| session.stream.info())
    }

    /// Device of the active session, falling back to the last requested one
    pub async fn active_device_id(&self) -> Option<String> {
        let state = self.state.lock().await;
        state
            .active
            .as_ref()
            .and_then(|session| session.device_id.clone())
            .or_else(|| self.requested_device.lock().clone())
    }

    pub async fn retry_count(&self) -> u32 {
        self.state.lock().await.retry_count
    }

    fn is_superseded(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }

    /// One acquire attempt under the session lock
    ///
    /// `Ok(None)` means the attempt was superseded and nothing was attached.
    async fn attempt(
        &self,
        generation: u64,
        constraints: &VideoConstraints,
    ) -> Result<Option<StreamInfo>, CaptureError> {
        let mut state = self.state.lock().await;
        if self.is_superseded(generation) {
            return Ok(None);
        }

        // Never hold two device handles at once
        self.release(&mut state);

        debug!("Requesting stream with constraints: {}", constraints);
        let mut stream = self.backend.acquire(constraints).await?;

        if self.is_superseded(generation) {
            debug!("Discarding stream acquired by a superseded start");
            stream.stop();
            return Ok(None);
        }

        let mut info = stream.info();
        if info.device_id.is_none() {
            info.device_id = constraints.device_id.clone();
        }

        self.surface.attach(stream.as_ref());
        let session = ActiveSession {
            id: Uuid::new_v4(),
            device_id: info.device_id.clone(),
            stream,
        };
        info!(
            "Capture session {} started: {}",
            session.id,
            info.summary()
        );
        state.active = Some(session);
        state.retry_count = 0;

        Ok(Some(info))
    }

    fn release(&self, state: &mut SessionState) {
        if let Some(mut session) = state.active.take() {
            session.stream.stop();
            self.surface.detach();
            info!("Capture session {} stopped", session.id);
        }
    }
}

impl std::fmt::Debug for CaptureSessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSessionManager")
            .field("config", &self.config)
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish()
    }
}

impl Drop for SessionState {
    fn drop(&mut self) {
        if let Some(session) = self.active.as_mut() {
            warn!("Capture session {} dropped while active", session.id);
            session.stream.stop();
        }
    }
}
