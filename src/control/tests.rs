use super::*;
use crate::capture::DeviceInfo;
use crate::settings::{FlipMode, FrameRate, Resolution, VideoSettings};
use crate::sync::{ControlCommand, MenuState, OffsetCommand, ZoomCommand};
use crate::transform::{OffsetDirection, ZoomDirection};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

fn ctrl(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::CONTROL)
}

fn plain(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn commands(action: Option<KeyAction>) -> Vec<ControlCommand> {
    match action {
        Some(KeyAction::Commands(commands)) => commands,
        other => panic!("expected commands, got {:?}", other),
    }
}

#[test]
fn test_debouncer_drops_key_repeat() {
    let mut debouncer = KeyDebouncer::new(Duration::from_millis(150));
    let start = Instant::now();

    assert!(debouncer.accept(start));
    assert!(!debouncer.accept(start + Duration::from_millis(50)));
    assert!(!debouncer.accept(start + Duration::from_millis(149)));
    assert!(debouncer.accept(start + Duration::from_millis(150)));

    debouncer.reset();
    assert!(debouncer.accept(start + Duration::from_millis(160)));
}

#[test]
fn test_unmapped_keys_do_not_consume_debounce() {
    let menu = MenuState::default();
    let mut debouncer = KeyDebouncer::new(Duration::from_millis(150));
    let start = Instant::now();

    assert_eq!(filter_key(&plain(KeyCode::Char('x')), &menu, &mut debouncer, start), None);
    assert_eq!(
        commands(filter_key(
            &ctrl(KeyCode::Char('=')),
            &menu,
            &mut debouncer,
            start + Duration::from_millis(50),
        )),
        vec![ControlCommand::Zoom(ZoomCommand::Nudge(ZoomDirection::In))]
    );
    // A repeat of a real shortcut is still dropped
    assert_eq!(
        filter_key(
            &ctrl(KeyCode::Char('=')),
            &menu,
            &mut debouncer,
            start + Duration::from_millis(100),
        ),
        None
    );
}

#[test]
fn test_zoom_shortcuts() {
    let menu = MenuState::default();

    assert_eq!(
        commands(map_key(&ctrl(KeyCode::Char('=')), &menu)),
        vec![ControlCommand::Zoom(ZoomCommand::Nudge(ZoomDirection::In))]
    );
    assert_eq!(
        commands(map_key(&ctrl(KeyCode::Char('+')), &menu)),
        vec![ControlCommand::Zoom(ZoomCommand::Nudge(ZoomDirection::In))]
    );
    assert_eq!(
        commands(map_key(&ctrl(KeyCode::Char('-')), &menu)),
        vec![ControlCommand::Zoom(ZoomCommand::Nudge(ZoomDirection::Out))]
    );
    assert_eq!(
        commands(map_key(&ctrl(KeyCode::Char('0')), &menu)),
        vec![
            ControlCommand::Zoom(ZoomCommand::Nudge(ZoomDirection::Reset)),
            ControlCommand::Offset(OffsetCommand::Nudge(OffsetDirection::Reset)),
        ]
    );
}

#[test]
fn test_arrows_need_control() {
    let menu = MenuState::default();

    assert_eq!(
        commands(map_key(&ctrl(KeyCode::Left), &menu)),
        vec![ControlCommand::Offset(OffsetCommand::Nudge(OffsetDirection::Left))]
    );
    assert!(map_key(&plain(KeyCode::Left), &menu).is_none());
}

#[test]
fn test_cycle_keys_follow_menu_state() {
    let settings = VideoSettings {
        resolution: Resolution::Hd720,
        frame_rate: FrameRate::Fps24,
        flip_mode: FlipMode::Flipped,
        selected_device_id: Some("cam-a".to_string()),
        ..VideoSettings::default()
    };
    let devices = vec![
        DeviceInfo::new("cam-a", "Front"),
        DeviceInfo::new("cam-b", "Back"),
    ];
    let menu = MenuState::build(&settings, &devices);

    assert_eq!(
        commands(map_key(&plain(KeyCode::Char('r')), &menu)),
        vec![ControlCommand::ChangeResolution(Resolution::Hd720.next())]
    );
    assert_eq!(
        commands(map_key(&plain(KeyCode::Char('f')), &menu)),
        vec![ControlCommand::ChangeFrameRate(FrameRate::Default)]
    );
    assert_eq!(
        commands(map_key(&plain(KeyCode::Char('m')), &menu)),
        vec![ControlCommand::ChangeFlip(FlipMode::Auto)]
    );
    assert_eq!(
        commands(map_key(&plain(KeyCode::Char('d')), &menu)),
        vec![ControlCommand::SelectDevice("cam-b".to_string())]
    );
}

#[test]
fn test_device_key_without_devices() {
    assert!(map_key(&plain(KeyCode::Char('d')), &MenuState::default()).is_none());
}

#[test]
fn test_quit_and_toggles() {
    let menu = MenuState::default();

    assert_eq!(map_key(&plain(KeyCode::Char('q')), &menu), Some(KeyAction::Quit));
    assert_eq!(map_key(&plain(KeyCode::Esc), &menu), Some(KeyAction::Quit));
    assert_eq!(
        commands(map_key(&ctrl(KeyCode::Char('i')), &menu)),
        vec![ControlCommand::ToggleInfoOverlay]
    );
    assert_eq!(
        commands(map_key(&plain(KeyCode::Char('t')), &menu)),
        vec![ControlCommand::ToggleAlwaysOnTop]
    );
    assert!(map_key(&plain(KeyCode::Char('x')), &menu).is_none());
}

#[tokio::test]
async fn test_keyboard_control_creation() {
    let (commands_tx, _commands_rx) = mpsc::channel(8);
    let (_menu_tx, menu_rx) = watch::channel(MenuState::default());
    let control = KeyboardControl::new(
        commands_tx,
        menu_rx,
        Duration::from_millis(150),
        CancellationToken::new(),
    );

    assert!(!control.is_stopped());
}
