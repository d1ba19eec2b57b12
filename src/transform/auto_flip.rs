use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoFlipState {
    Inactive,
    Active,
}

impl AutoFlipState {
    pub fn from_active(active: bool) -> Self {
        if active {
            AutoFlipState::Active
        } else {
            AutoFlipState::Inactive
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, AutoFlipState::Active)
    }
}

/// Activation/deactivation thresholds; positions between them hold the state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HysteresisBand {
    pub activation: f64,
    pub deactivation: f64,
}

impl Default for HysteresisBand {
    fn default() -> Self {
        Self {
            activation: 0.6,
            deactivation: 0.4,
        }
    }
}

impl HysteresisBand {
    /// State called for by position `p` starting from `current`
    pub fn target(&self, current: AutoFlipState, p: f64) -> AutoFlipState {
        match current {
            AutoFlipState::Inactive if p > self.activation => AutoFlipState::Active,
            AutoFlipState::Active if p < self.deactivation => AutoFlipState::Inactive,
            _ => current,
        }
    }
}

/// What a periodic sample asks the driver to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    /// Nothing to do
    Hold,
    /// A transition is called for and the debounce timer must be armed
    ArmTimer,
    /// A timer is already pending; it will re-check on expiry
    AlreadyPending,
}

/// Hysteresis plus debounce decision logic, free of any timer mechanics
#[derive(Debug, Clone)]
pub struct AutoFlipStateMachine {
    band: HysteresisBand,
    state: AutoFlipState,
    pending: bool,
}

impl AutoFlipStateMachine {
    pub fn new(band: HysteresisBand, initial: AutoFlipState) -> Self {
        Self {
            band,
            state: initial,
            pending: false,
        }
    }

    pub fn state(&self) -> AutoFlipState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Overwrite the state, e.g. when restoring the persisted value
    pub fn restore(&mut self, state: AutoFlipState) {
        self.state = state;
        self.pending = false;
    }

    /// Feed a periodic position sample; `None` means geometry was unavailable
    pub fn observe(&mut self, p: Option<f64>) -> SampleOutcome {
        if self.pending {
            return SampleOutcome::AlreadyPending;
        }
        let Some(p) = p else {
            return SampleOutcome::Hold;
        };
        if self.band.target(self.state, p) == self.state {
            SampleOutcome::Hold
        } else {
            self.pending = true;
            SampleOutcome::ArmTimer
        }
    }

    /// Debounce expiry: re-check and apply only if still warranted
    pub fn on_timer(&mut self, p: Option<f64>) -> Option<AutoFlipState> {
        if !self.pending {
            return None;
        }
        self.pending = false;
        self.apply(p)
    }

    /// Settle immediately, discarding any pending debounce
    pub fn resolve_now(&mut self, p: Option<f64>) -> Option<AutoFlipState> {
        self.pending = false;
        self.apply(p)
    }

    fn apply(&mut self, p: Option<f64>) -> Option<AutoFlipState> {
        let target = self.band.target(self.state, p?);
        if target == self.state {
            return None;
        }
        self.state = target;
        Some(target)
    }
}

/// Message sent when the debounce timer expires; `token` identifies the arm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlipTimerFired {
    pub token: u64,
}

/// Drives an [`AutoFlipStateMachine`] with a single cancellable tokio timer
pub struct AutoFlipController {
    machine: AutoFlipStateMachine,
    debounce: Duration,
    timer: Option<JoinHandle<()>>,
    token: u64,
    fired_tx: mpsc::UnboundedSender<FlipTimerFired>,
}

impl AutoFlipController {
    pub fn new(
        band: HysteresisBand,
        initial: AutoFlipState,
        debounce: Duration,
        fired_tx: mpsc::UnboundedSender<FlipTimerFired>,
    ) -> Self {
        Self {
            machine: AutoFlipStateMachine::new(band, initial),
            debounce,
            timer: None,
            token: 0,
            fired_tx,
        }
    }

    pub fn state(&self) -> AutoFlipState {
        self.machine.state()
    }

    pub fn has_pending_timer(&self) -> bool {
        self.timer.is_some()
    }

    pub fn restore(&mut self, state: AutoFlipState) {
        self.cancel_timer();
        self.machine.restore(state);
    }

    /// Periodic sample; arms the debounce timer when a transition is called for
    pub fn sample(&mut self, p: Option<f64>) {
        match self.machine.observe(p) {
            SampleOutcome::ArmTimer => self.arm_timer(),
            SampleOutcome::AlreadyPending => trace!("Auto-flip debounce already pending"),
            SampleOutcome::Hold => {}
        }
    }

    /// Handle a timer expiry; stale expiries from cancelled timers are ignored
    pub fn timer_fired(&mut self, fired: FlipTimerFired, p: Option<f64>) -> Option<AutoFlipState> {
        if fired.token != self.token || self.timer.is_none() {
            debug!("Ignoring stale auto-flip timer {}", fired.token);
            return None;
        }
        self.timer = None;
        let transition = self.machine.on_timer(p);
        if let Some(state) = transition {
            info!("Auto-flip resolved to {:?} after debounce", state);
        }
        transition
    }

    /// Focus or visibility restore: cancel any pending timer and settle now
    pub fn resolve_now(&mut self, p: Option<f64>) -> Option<AutoFlipState> {
        self.cancel_timer();
        let transition = self.machine.resolve_now(p);
        if let Some(state) = transition {
            info!("Auto-flip resolved to {:?} immediately", state);
        }
        transition
    }

    pub fn cancel_timer(&mut self) {
        if let Some(handle) = self.timer.take() {
            handle.abort();
        }
    }

    fn arm_timer(&mut self) {
        self.cancel_timer();
        self.token = self.token.wrapping_add(1);

        let token = self.token;
        let delay = self.debounce;
        let fired_tx = self.fired_tx.clone();
        debug!("Arming auto-flip debounce timer for {:?}", delay);

        self.timer = Some(tokio::spawn(async move {
            sleep(delay).await;
            let _ = fired_tx.send(FlipTimerFired { token });
        }));
    }
}

impl Drop for AutoFlipController {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}
