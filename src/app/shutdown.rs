use super::{ComponentState, PipOrchestrator};
use crate::error::{PipError, Result};
use crate::sync::{ControlMessage, PresentationMessage};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info, warn};

const STOP_TIMEOUT: Duration = Duration::from_secs(5);

impl PipOrchestrator {
    /// Stop the keyboard, then let the control side write final settings and
    /// stop the presentation side, which releases the capture device
    pub async fn shutdown(&mut self) -> Result<i32> {
        info!("Beginning graceful shutdown");

        self.cancellation_token.cancel();

        let mut exit_code = 0;

        if self.keyboard.is_some() {
            if let Err(e) = self.stop_component("keyboard").await {
                error!("Error stopping keyboard: {}", e);
                exit_code = 1;
            }
        }

        if let Err(e) = self.stop_component("control").await {
            error!("Error stopping control side: {}", e);
            exit_code = 1;
        }

        if let Err(e) = self.stop_component("presentation").await {
            error!("Error stopping presentation side: {}", e);
            exit_code = 1;
        }

        info!("Graceful shutdown completed with exit code: {}", exit_code);
        Ok(exit_code)
    }

    async fn stop_component(&mut self, component: &str) -> Result<()> {
        info!("Stopping {} component", component);
        self.set_component_state(component, ComponentState::Stopping)
            .await;

        let result = match component {
            "keyboard" => {
                if let Some(keyboard) = &self.keyboard {
                    keyboard.stop().await;
                }
                Ok(())
            }
            "control" => match self.control_task.take() {
                Some(task) => {
                    if self.control_tx.send(ControlMessage::Shutdown).await.is_err() {
                        warn!("Control side already stopped");
                    }
                    match timeout(STOP_TIMEOUT, task).await {
                        Ok(Ok(Ok(settings))) => {
                            info!("Final settings: {:?}", settings);
                            Ok(())
                        }
                        Ok(Ok(Err(e))) => Err(e),
                        Ok(Err(e)) => Err(PipError::component(
                            component.to_string(),
                            format!("task failed: {}", e),
                        )),
                        Err(_) => Err(PipError::component(
                            component.to_string(),
                            "stop timeout".to_string(),
                        )),
                    }
                }
                None => Ok(()),
            },
            "presentation" => match self.presentation_task.take() {
                Some(task) => {
                    // Normally forwarded by the control side already
                    let _ = self.presentation_tx.try_send(PresentationMessage::Shutdown);
                    match timeout(STOP_TIMEOUT, task).await {
                        Ok(Ok(())) => Ok(()),
                        Ok(Err(e)) => Err(PipError::component(
                            component.to_string(),
                            format!("task failed: {}", e),
                        )),
                        Err(_) => Err(PipError::component(
                            component.to_string(),
                            "stop timeout".to_string(),
                        )),
                    }
                }
                None => Ok(()),
            },
            other => Err(PipError::system(format!("Unknown component: {}", other))),
        };

        match &result {
            Ok(()) => {
                self.set_component_state(component, ComponentState::Stopped)
                    .await;
                info!("{} component stopped", component);
            }
            Err(e) => {
                self.set_component_state(component, ComponentState::Failed)
                    .await;
                error!("Error stopping {} component: {}", component, e);
            }
        }
        result
    }
}
