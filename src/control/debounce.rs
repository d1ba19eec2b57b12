use std::time::{Duration, Instant};

/// Drops key-down events arriving closer than `interval` to the last accepted one
#[derive(Debug, Clone)]
pub struct KeyDebouncer {
    interval: Duration,
    last_accepted: Option<Instant>,
}

impl KeyDebouncer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_accepted: None,
        }
    }

    pub fn accept(&mut self, now: Instant) -> bool {
        match self.last_accepted {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last_accepted = Some(now);
                true
            }
        }
    }

    pub fn reset(&mut self) {
        self.last_accepted = None;
    }
}
