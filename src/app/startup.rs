use super::{ComponentState, PipOrchestrator};
use crate::capture::CaptureSessionManager;
use crate::control::KeyboardControl;
use crate::error::{PipError, Result};
use crate::sync::{ControlSide, PresentationSide};
use std::sync::Arc;
use tracing::{error, info};

impl PipOrchestrator {
    /// Register every component as stopped
    pub async fn initialize(&mut self) -> Result<()> {
        info!("Initializing pipcam components");

        let mut states = self.component_states.lock().await;
        states.insert("presentation".to_string(), ComponentState::Stopped);
        states.insert("control".to_string(), ComponentState::Stopped);
        if self.keyboard_enabled {
            states.insert("keyboard".to_string(), ComponentState::Stopped);
        }
        drop(states);

        Ok(())
    }

    /// Start the presentation side, then the control side, then the keyboard
    pub async fn start(&mut self) -> Result<()> {
        info!("Starting pipcam");

        let presentation_rx = self
            .presentation_rx
            .take()
            .ok_or_else(|| PipError::system("Presentation channel already taken"))?;
        let surface_events_rx = self
            .surface_events_rx
            .take()
            .ok_or_else(|| PipError::system("Surface event channel already taken"))?;
        let control_rx = self
            .control_rx
            .take()
            .ok_or_else(|| PipError::system("Control channel already taken"))?;

        // Presentation side
        self.set_component_state("presentation", ComponentState::Starting)
            .await;
        let session = CaptureSessionManager::new(
            Arc::clone(&self.backend),
            Arc::clone(&self.surface),
            self.config.capture.clone(),
        );
        let presentation = PresentationSide::new(
            &self.config,
            session,
            Arc::clone(&self.surface),
            self.geometry.clone(),
            self.control_tx.clone(),
        );
        self.presentation_task = Some(tokio::spawn(
            presentation.run(presentation_rx, surface_events_rx),
        ));
        self.set_component_state("presentation", ComponentState::Running)
            .await;

        // Control side
        self.set_component_state("control", ComponentState::Starting)
            .await;
        let (control, menu_rx) =
            ControlSide::new(Arc::clone(&self.store), self.presentation_tx.clone());
        self.menu_rx = Some(menu_rx.clone());
        self.control_task = Some(tokio::spawn(control.run(control_rx)));
        self.set_component_state("control", ComponentState::Running)
            .await;

        // Keyboard control surface
        if self.keyboard_enabled {
            self.set_component_state("keyboard", ComponentState::Starting)
                .await;
            let keyboard = KeyboardControl::new(
                self.control_tx.clone(),
                menu_rx,
                self.config.control.key_debounce(),
                self.quit_token.clone(),
            );
            let handle = keyboard.start();
            tokio::spawn(async move {
                if let Err(e) = handle.await {
                    error!("Keyboard control task failed: {}", e);
                }
            });
            self.keyboard = Some(keyboard);
            self.set_component_state("keyboard", ComponentState::Running)
                .await;
        }

        info!("pipcam started");
        Ok(())
    }
}
