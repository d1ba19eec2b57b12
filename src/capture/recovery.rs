use crate::config::CaptureConfig;
use crate::error::{CaptureError, CaptureErrorClass};
use std::time::Duration;
use tracing::{error, info, warn};

/// Recovery action to take after a failed start attempt
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryAction {
    /// Retry once with conservative constraints
    Fallback,
    /// Retry with the same device after a delay
    RetryAfterDelay(Duration),
    /// Terminal failure; surface it and stop
    Surface(CaptureError),
    /// Attempts exhausted; surface it and stop
    GiveUp(CaptureError),
}

/// Per-sequence retry bookkeeping for capture starts
///
/// A fresh instance is used for every start request, so retries never carry
/// over between device selections.
#[derive(Debug, Clone)]
pub struct CaptureRecovery {
    max_attempts: u32,
    retry_delay: Duration,
    attempts: u32,
    retries: u32,
    fallback_used: bool,
}

impl CaptureRecovery {
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            retry_delay: config.retry_delay(),
            attempts: 0,
            retries: 0,
            fallback_used: false,
        }
    }

    /// Count a primary attempt (fallback attempts are not counted)
    pub fn record_attempt(&mut self) {
        self.attempts += 1;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn fallback_used(&self) -> bool {
        self.fallback_used
    }

    /// Decide what to do after a primary attempt failed
    pub fn handle_failure(&mut self, error: &CaptureError) -> RecoveryAction {
        match error.class() {
            CaptureErrorClass::DeviceUnavailable
            | CaptureErrorClass::PermissionDenied
            | CaptureErrorClass::DeviceBusy => {
                warn!("Capture failed with terminal error: {}", error);
                RecoveryAction::Surface(error.clone())
            }
            CaptureErrorClass::ConstraintsUnsatisfiable if !self.fallback_used => {
                self.fallback_used = true;
                info!("Constraints rejected ({}), trying fallback constraints", error);
                RecoveryAction::Fallback
            }
            _ => self.schedule_retry(error),
        }
    }

    /// Decide what to do after the fallback attempt failed as well
    pub fn handle_fallback_failure(&mut self, error: &CaptureError) -> RecoveryAction {
        if error.is_terminal() {
            warn!("Fallback capture failed with terminal error: {}", error);
            return RecoveryAction::Surface(error.clone());
        }
        let as_transient = CaptureError::transient(format!("fallback failed: {}", error));
        self.schedule_retry(&as_transient)
    }

    fn schedule_retry(&mut self, error: &CaptureError) -> RecoveryAction {
        if self.attempts >= self.max_attempts {
            error!(
                "Capture failed after {} attempts, giving up: {}",
                self.attempts, error
            );
            return RecoveryAction::GiveUp(error.clone());
        }

        self.retries += 1;
        warn!(
            "Capture failed ({}), retrying in {:?} (attempt {}/{})",
            error,
            self.retry_delay,
            self.attempts + 1,
            self.max_attempts
        );
        RecoveryAction::RetryAfterDelay(self.retry_delay)
    }
}
