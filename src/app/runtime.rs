use super::{PipOrchestrator, ShutdownReason};
use crate::error::{PipError, Result};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::{oneshot, Mutex};
use tracing::{error, info};

impl PipOrchestrator {
    /// Run until a signal, a quit key or `request_shutdown`, then shut down
    pub async fn run(&mut self) -> Result<i32> {
        info!("pipcam is running");

        let shutdown_receiver = self
            .shutdown_receiver
            .take()
            .ok_or_else(|| PipError::system("Shutdown receiver already taken"))?;

        self.setup_signal_handlers().await;
        self.watch_quit_key();

        let shutdown_reason = shutdown_receiver
            .await
            .map_err(|_| PipError::system("Shutdown channel closed unexpectedly"))?;

        info!("Shutdown initiated: {:?}", shutdown_reason);

        let exit_code = self.shutdown().await?;

        info!("pipcam shutdown complete");
        Ok(exit_code)
    }

    async fn setup_signal_handlers(&self) {
        // SIGTERM (service stop) - Unix only
        #[cfg(unix)]
        {
            let sender = Arc::clone(&self.shutdown_sender);
            let token = self.cancellation_token.clone();
            tokio::spawn(async move {
                let mut sigterm =
                    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                        Ok(sigterm) => sigterm,
                        Err(e) => {
                            error!("Failed to register SIGTERM handler: {}", e);
                            return;
                        }
                    };
                tokio::select! {
                    Some(()) = sigterm.recv() => {
                        info!("Received SIGTERM signal");
                        send_reason(&sender, ShutdownReason::Signal("SIGTERM".to_string())).await;
                    }
                    _ = token.cancelled() => {}
                }
            });
        }

        // SIGINT (Ctrl+C) - cross-platform
        let sender = Arc::clone(&self.shutdown_sender);
        let token = self.cancellation_token.clone();
        tokio::spawn(async move {
            tokio::select! {
                Ok(()) = signal::ctrl_c() => {
                    info!("Received SIGINT signal (Ctrl+C)");
                    send_reason(&sender, ShutdownReason::Signal("SIGINT".to_string())).await;
                }
                _ = token.cancelled() => {}
            }
        });
    }

    fn watch_quit_key(&self) {
        let sender = Arc::clone(&self.shutdown_sender);
        let quit = self.quit_token.clone();
        let token = self.cancellation_token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = quit.cancelled() => {
                    send_reason(&sender, ShutdownReason::UserRequest).await;
                }
                _ = token.cancelled() => {}
            }
        });
    }
}

async fn send_reason(
    sender: &Mutex<Option<oneshot::Sender<ShutdownReason>>>,
    reason: ShutdownReason,
) {
    if let Some(sender) = sender.lock().await.take() {
        let _ = sender.send(reason);
    }
}
