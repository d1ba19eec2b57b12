use super::debounce::KeyDebouncer;
use crate::sync::{ControlCommand, ControlMessage, MenuState, OffsetCommand, ZoomCommand};
use crate::transform::{OffsetDirection, ZoomDirection};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tokio::task::{self, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

/// What a key press asks for
#[derive(Debug, Clone, PartialEq)]
pub enum KeyAction {
    Commands(Vec<ControlCommand>),
    Quit,
}

/// Translate a key press into control commands
///
/// "Next" choices are computed from the menu state last reported by the
/// control side.
pub fn map_key(key: &KeyEvent, menu: &MenuState) -> Option<KeyAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let single = |command: ControlCommand| Some(KeyAction::Commands(vec![command]));

    if ctrl {
        return match key.code {
            KeyCode::Char('=') | KeyCode::Char('+') => {
                single(ControlCommand::Zoom(ZoomCommand::Nudge(ZoomDirection::In)))
            }
            KeyCode::Char('-') => {
                single(ControlCommand::Zoom(ZoomCommand::Nudge(ZoomDirection::Out)))
            }
            KeyCode::Char('0') => Some(KeyAction::Commands(vec![
                ControlCommand::Zoom(ZoomCommand::Nudge(ZoomDirection::Reset)),
                ControlCommand::Offset(OffsetCommand::Nudge(OffsetDirection::Reset)),
            ])),
            KeyCode::Up => single(offset(OffsetDirection::Up)),
            KeyCode::Down => single(offset(OffsetDirection::Down)),
            KeyCode::Left => single(offset(OffsetDirection::Left)),
            KeyCode::Right => single(offset(OffsetDirection::Right)),
            KeyCode::Char('i') => single(ControlCommand::ToggleInfoOverlay),
            KeyCode::Char('c') => Some(KeyAction::Quit),
            _ => None,
        };
    }

    match key.code {
        // Most terminals deliver Ctrl+I as Tab
        KeyCode::Tab => single(ControlCommand::ToggleInfoOverlay),
        KeyCode::Char('d') => menu.next_device_id().map(|id| {
            KeyAction::Commands(vec![ControlCommand::SelectDevice(id)])
        }),
        KeyCode::Char('r') => single(ControlCommand::ChangeResolution(menu.resolution().next())),
        KeyCode::Char('f') => single(ControlCommand::ChangeFrameRate(menu.frame_rate().next())),
        KeyCode::Char('m') => single(ControlCommand::ChangeFlip(menu.flip_mode().next())),
        KeyCode::Char('t') => single(ControlCommand::ToggleAlwaysOnTop),
        KeyCode::Char('q') | KeyCode::Esc => Some(KeyAction::Quit),
        _ => None,
    }
}

/// Map a key, then apply the key-repeat debounce to mapped keys only
///
/// Unmapped keys never touch the debounce timestamp.
pub fn filter_key(
    key: &KeyEvent,
    menu: &MenuState,
    debouncer: &mut KeyDebouncer,
    now: Instant,
) -> Option<KeyAction> {
    let action = map_key(key, menu)?;
    if debouncer.accept(now) {
        Some(action)
    } else {
        trace!("Dropping repeated key {:?}", key.code);
        None
    }
}

fn offset(direction: OffsetDirection) -> ControlCommand {
    ControlCommand::Offset(OffsetCommand::Nudge(direction))
}

/// Terminal keyboard control surface
pub struct KeyboardControl {
    commands: mpsc::Sender<ControlMessage>,
    menu: watch::Receiver<MenuState>,
    key_debounce: Duration,
    quit: CancellationToken,
    cancellation_token: CancellationToken,
}

impl KeyboardControl {
    /// `quit` is cancelled when the user asks to quit
    pub fn new(
        commands: mpsc::Sender<ControlMessage>,
        menu: watch::Receiver<MenuState>,
        key_debounce: Duration,
        quit: CancellationToken,
    ) -> Self {
        Self {
            commands,
            menu,
            key_debounce,
            quit,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Start listening for keyboard input on a blocking thread
    pub fn start(&self) -> JoinHandle<()> {
        info!("Starting keyboard control - Ctrl+=/- zoom, Ctrl+arrows pan, q to quit");

        let commands = self.commands.clone();
        let menu = self.menu.clone();
        let quit = self.quit.clone();
        let cancellation_token = self.cancellation_token.clone();
        let mut debouncer = KeyDebouncer::new(self.key_debounce);

        task::spawn_blocking(move || {
            if let Err(e) = enable_raw_mode() {
                error!("Failed to enable raw mode for keyboard input: {}", e);
                return;
            }
            debug!("Raw mode enabled - keyboard control active");

            while !cancellation_token.is_cancelled() {
                match event::poll(Duration::from_millis(100)) {
                    Ok(true) => {
                        let key = match event::read() {
                            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => key,
                            Ok(_) => continue,
                            Err(e) => {
                                warn!("Error reading keyboard event: {}", e);
                                continue;
                            }
                        };

                        let snapshot = menu.borrow().clone();
                        match filter_key(&key, &snapshot, &mut debouncer, Instant::now()) {
                            Some(KeyAction::Commands(batch)) => {
                                for command in batch {
                                    debug!("Key {:?} -> {}", key.code, command.name());
                                    if commands.blocking_send(command.into()).is_err() {
                                        warn!("Control side closed, stopping keyboard control");
                                        cancellation_token.cancel();
                                        break;
                                    }
                                }
                            }
                            Some(KeyAction::Quit) => {
                                info!("Quit key pressed - requesting shutdown");
                                quit.cancel();
                                break;
                            }
                            None => debug!("Ignored key: {:?}", key.code),
                        }
                    }
                    Ok(false) => {}
                    Err(e) => warn!("Error polling for keyboard events: {}", e),
                }
            }

            if let Err(e) = disable_raw_mode() {
                error!("Failed to disable raw mode: {}", e);
            } else {
                debug!("Raw mode disabled");
            }
            debug!("Keyboard control task exited");
        })
    }

    pub async fn stop(&self) {
        info!("Stopping keyboard control");
        self.cancellation_token.cancel();

        // Give the poll loop a moment to leave raw mode itself
        tokio::time::sleep(Duration::from_millis(200)).await;
        let _ = disable_raw_mode();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }
}
